use std::marker::PhantomData;

use bytemuck::Pod;
use wgpu::util::DeviceExt;

/// Uniform buffer holding one `T`.
///
/// Write a new value each frame with [`write`](Self::write); bind it once
/// through [`ShaderProgram::bind_uniforms`](super::ShaderProgram::bind_uniforms).
pub struct UniformBuffer<T> {
    buffer: wgpu::Buffer,
    _marker: PhantomData<T>,
}

impl<T: Pod> UniformBuffer<T> {
    pub fn new(device: &wgpu::Device, label: &str, initial: &T) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            buffer,
            _marker: PhantomData,
        }
    }

    /// Queues an upload; it lands before the next submitted command buffer.
    pub fn write(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }

    pub fn binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }

    pub fn release(&self) {
        self.buffer.destroy();
    }
}
