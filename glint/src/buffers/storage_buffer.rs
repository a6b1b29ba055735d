use bytemuck::Pod;
use log::info;

use crate::Bindable;

/// Storage buffer that exists only in VRAM.
///
/// This kind of storage buffer should be used for data structures that are
/// produced and consumed by shaders; the host can only upload data into it.
#[derive(Debug)]
pub struct StorageBuffer {
    buffer: wgpu::Buffer,
}

impl StorageBuffer {
    pub fn new(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: usize,
    ) -> Self {
        Self::new_ex(device, label, size, wgpu::BufferUsages::empty())
    }

    /// Creates a storage buffer that can also be used as a source of
    /// indirect-dispatch arguments.
    pub fn new_indirect(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: usize,
    ) -> Self {
        Self::new_ex(device, label, size, wgpu::BufferUsages::INDIRECT)
    }

    fn new_ex(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: usize,
        usage: wgpu::BufferUsages,
    ) -> Self {
        let label = label.as_ref();
        let size = pad_size(size);

        info!("Allocating storage buffer `{label}`; size={size}");

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC
                | usage,
            size: size as _,
            mapped_at_creation: false,
        });

        Self { buffer }
    }

    pub fn write<T>(&self, queue: &wgpu::Queue, data: &[T])
    where
        T: Pod,
    {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    // TODO should bind with `read_only: true`, but rust-gpu is not able to
    //      emit appropriate attributes yet, causing naga to reject the shader
    pub fn bind_readable(&self) -> impl Bindable + '_ {
        StorageBufferBinder { parent: self }
    }

    pub fn bind_writable(&self) -> impl Bindable + '_ {
        StorageBufferBinder { parent: self }
    }
}

pub struct StorageBufferBinder<'a> {
    parent: &'a StorageBuffer,
}

impl Bindable for StorageBufferBinder<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        let layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let resource = self.parent.buffer.as_entire_binding();

        vec![(layout, resource)]
    }
}

/// Rounds buffer's size up to a non-zero multiple of 16 bytes, which keeps
/// both copies and `Vec4`-typed bindings happy.
fn pad_size(size: usize) -> usize {
    (size.max(1) + 15) & !15
}
