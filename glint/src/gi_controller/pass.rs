use std::marker::PhantomData;
use std::mem;
use std::ops::Range;

use bytemuck::Pod;
use log::debug;
use spirv_std::glam::UVec2;

use crate::gpu::DispatchSlot;
use crate::{BindGroup, BindGroupBuilder, Bindable, StorageBuffer};

#[derive(Debug)]
pub struct GiComputePass<P> {
    label: String,
    bind_groups: Vec<BindGroup>,
    pipeline: wgpu::ComputePipeline,
    _params: PhantomData<P>,
}

impl<P> GiComputePass<P>
where
    P: Pod,
{
    pub fn builder<'a>(label: impl ToString) -> GiComputePassBuilder<'a, P> {
        GiComputePassBuilder {
            label: label.to_string(),
            bind_groups: Default::default(),
            _params: Default::default(),
        }
    }

    /// Dispatches given number of workgroups.
    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        size: UVec2,
        params: P,
    ) {
        let mut pass = self.begin(encoder, params);

        pass.dispatch_workgroups(size.x, size.y, 1);
    }

    /// Dispatches as many workgroups as needed to cover given number of
    /// threads, rounding up.
    pub fn run_threads(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        threads: UVec2,
        group_size: UVec2,
        params: P,
    ) {
        self.run(encoder, groups_for_threads(threads, group_size), params);
    }

    /// Dispatches workgroups according to the arguments written by the
    /// dispatch-sizing pass into given slot of `args`.
    ///
    /// Glint itself doesn't dispatch anything indirectly; this is the entry
    /// point for cell-clearing and surfel-binning passes, which live outside
    /// of Glint and consume `GiBuffers::dispatch_args`.
    pub fn run_indirect(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        args: &StorageBuffer,
        slot: DispatchSlot,
        params: P,
    ) {
        let mut pass = self.begin(encoder, params);

        pass.dispatch_workgroups_indirect(args.buffer(), indirect_offset(slot));
    }

    fn begin<'a>(
        &'a self,
        encoder: &'a mut wgpu::CommandEncoder,
        params: P,
    ) -> wgpu::ComputePass<'a> {
        let label = format!("glint_{}_pass", self.label);

        let mut pass =
            encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&label),
                timestamp_writes: None,
            });

        pass.set_pipeline(&self.pipeline);

        if mem::size_of::<P>() > 0 {
            pass.set_push_constants(0, bytemuck::bytes_of(&params));
        }

        for (bind_group_idx, bind_group) in self.bind_groups.iter().enumerate()
        {
            pass.set_bind_group(bind_group_idx as u32, bind_group.get(), &[]);
        }

        pass
    }
}

pub struct GiComputePassBuilder<'a, P> {
    label: String,
    bind_groups: Vec<BindGroupBuilder<'a>>,
    _params: PhantomData<P>,
}

impl<'a, P> GiComputePassBuilder<'a, P>
where
    P: Pod,
{
    pub fn bind<const N: usize>(
        mut self,
        items: [&'a dyn Bindable; N],
    ) -> Self {
        let mut bind_group = BindGroup::builder(format!(
            "{}_bg{}",
            self.label,
            self.bind_groups.len()
        ));

        for item in items {
            bind_group = bind_group.add(item);
        }

        self.bind_groups.push(bind_group);
        self
    }

    pub fn build(
        self,
        device: &wgpu::Device,
        (module, entry_point): &(wgpu::ShaderModule, &'static str),
    ) -> GiComputePass<P> {
        debug!("Initializing pass: {}:{}", self.label, entry_point);

        let bind_groups: Vec<_> = self
            .bind_groups
            .into_iter()
            .map(|bg| bg.build(device))
            .collect();

        let bind_group_layouts: Vec<_> =
            bind_groups.iter().map(|bg| bg.layout()).collect();

        let push_constant_ranges = if mem::size_of::<P>() > 0 {
            vec![wgpu::PushConstantRange {
                stages: wgpu::ShaderStages::COMPUTE,
                range: Range {
                    start: 0,
                    end: mem::size_of::<P>() as u32,
                },
            }]
        } else {
            vec![]
        };

        let pipeline_layout_label =
            format!("glint_{}_pipeline_layout", self.label);

        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&pipeline_layout_label),
                bind_group_layouts: &bind_group_layouts,
                push_constant_ranges: &push_constant_ranges,
            });

        let pipeline_label = format!("glint_{}_pipeline", self.label);

        let pipeline =
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(&pipeline_label),
                layout: Some(&pipeline_layout),
                module,
                entry_point,
            });

        GiComputePass {
            label: self.label,
            bind_groups,
            pipeline,
            _params: PhantomData,
        }
    }
}

/// Returns the number of workgroups needed to cover `threads`, rounding up
/// on each axis.
pub fn groups_for_threads(threads: UVec2, group_size: UVec2) -> UVec2 {
    let group_size = group_size.max(UVec2::ONE);

    (threads + group_size - UVec2::ONE) / group_size
}

/// Returns the byte offset of given slot within the dispatch-args buffer.
pub fn indirect_offset(slot: DispatchSlot) -> wgpu::BufferAddress {
    slot.offset() as wgpu::BufferAddress
}
