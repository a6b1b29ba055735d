use spirv_std::glam::uvec2;

use crate::{gpu, Engine, GiBuffers, GiComputePass, GiConfig, GiController};

#[derive(Debug)]
pub struct GiRetraceRequestingPass {
    pass: GiComputePass<gpu::GiValidationPassParams>,
}

impl GiRetraceRequestingPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &GiConfig,
        buffers: &GiBuffers,
    ) -> Self {
        let pass = GiComputePass::builder("gi_retrace_requesting")
            .bind([
                &buffers.prim_depth.bind_readable(),
                &buffers.gi_history.bind_readable(),
                &buffers.gi_retrace_requests.bind_writable(),
            ])
            .build(device, &engine.shaders.gi_retrace_requesting);

        Self { pass }
    }

    pub fn run(&self, gi: &GiController, encoder: &mut wgpu::CommandEncoder) {
        let params = gi.validation_params();

        // This pass uses 8x8 warps:
        self.pass
            .run_threads(encoder, params.gi_size(), uvec2(8, 8), params);
    }
}
