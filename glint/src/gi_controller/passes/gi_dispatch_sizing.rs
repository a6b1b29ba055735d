use spirv_std::glam::uvec2;

use crate::{gpu, Engine, GiBuffers, GiComputePass, GiConfig, GiController};

#[derive(Debug)]
pub struct GiDispatchSizingPass {
    pass: GiComputePass<gpu::GiDispatchSizingPassParams>,
}

impl GiDispatchSizingPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &GiConfig,
        buffers: &GiBuffers,
    ) -> Self {
        let pass = GiComputePass::builder("gi_dispatch_sizing")
            .bind([
                &buffers.item_counts.bind_readable(),
                &buffers.dispatch_args.bind_writable(),
            ])
            .build(device, &engine.shaders.gi_dispatch_sizing);

        Self { pass }
    }

    pub fn run(&self, gi: &GiController, encoder: &mut wgpu::CommandEncoder) {
        // This pass is a single thread that writes all the slots:
        self.pass.run(
            encoder,
            uvec2(1, 1),
            gi.config().dispatch_sizing_params(),
        );
    }
}
