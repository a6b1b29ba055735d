use std::mem;

use log::debug;
use spirv_std::glam::{UVec2, Vec4};

use crate::{gpu, GiConfig, StorageBuffer};

#[derive(Debug)]
pub struct GiBuffers {
    pub item_counts: StorageBuffer,
    pub dispatch_args: StorageBuffer,
    pub prim_depth: StorageBuffer,

    /// Rays to trace again, see [`gpu::RetraceRequest`]; written by Glint,
    /// read by the [`crate::GiRetracer`].
    pub gi_retrace_requests: StorageBuffer,

    /// Paths traced for the requests, see [`gpu::TracedPath`]; written by the
    /// [`crate::GiRetracer`], read by Glint.
    pub gi_retraced: StorageBuffer,
    pub gi_history: StorageBuffer,
    pub gi_invalidity: StorageBuffer,
}

impl GiBuffers {
    pub fn new(
        device: &wgpu::Device,
        config: &GiConfig,
        screen_size: UVec2,
    ) -> Self {
        debug!("Initializing GI buffers");

        let screen_pixels = (screen_size.x * screen_size.y) as usize;

        let gi_pixels = {
            let size = config
                .validation_params(gpu::Frame::default(), screen_size)
                .gi_size();

            (size.x * size.y) as usize
        };

        let item_counts = StorageBuffer::new(
            device,
            "glint_item_counts",
            gpu::ItemCounts::LEN * mem::size_of::<u32>(),
        );

        let dispatch_args = StorageBuffer::new_indirect(
            device,
            "glint_dispatch_args",
            gpu::DispatchSlot::COUNT
                * gpu::DispatchArgs::LEN
                * mem::size_of::<u32>(),
        );

        let prim_depth = StorageBuffer::new(
            device,
            "glint_prim_depth",
            screen_pixels * mem::size_of::<f32>(),
        );

        let gi_retrace_requests = StorageBuffer::new(
            device,
            "glint_gi_retrace_requests",
            gi_pixels * gpu::RetraceRequest::STRIDE * mem::size_of::<Vec4>(),
        );

        let gi_retraced = StorageBuffer::new(
            device,
            "glint_gi_retraced",
            gi_pixels * mem::size_of::<Vec4>(),
        );

        let gi_history = StorageBuffer::new(
            device,
            "glint_gi_history",
            gi_pixels * gpu::GiHistory::STRIDE * mem::size_of::<Vec4>(),
        );

        let gi_invalidity = StorageBuffer::new(
            device,
            "glint_gi_invalidity",
            gi_pixels * mem::size_of::<f32>(),
        );

        Self {
            item_counts,
            dispatch_args,
            prim_depth,
            gi_retrace_requests,
            gi_retraced,
            gi_history,
            gi_invalidity,
        }
    }

    /// Uploads the number of live grid cells and surfels, to be picked up by
    /// the next dispatch-sizing pass.
    pub fn write_item_counts(
        &self,
        queue: &wgpu::Queue,
        counts: gpu::ItemCounts,
    ) {
        self.item_counts.write(queue, &[counts]);
    }
}
