use bytemuck::Pod;
use wgpu::util::DeviceExt;

/// Binding target of a [`GeometryBuffer`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferKind {
    /// Per-vertex (or per-instance) attribute data.
    Vertex,
    /// `u16` triangle indices.
    Index,
}

impl BufferKind {
    fn usage(self) -> wgpu::BufferUsages {
        match self {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        }
    }
}

/// Static-draw GPU buffer.
///
/// Contents are uploaded once at creation. The buffer is destroyed by
/// [`release`](Self::release); the owner must call it before dropping a buffer
/// it replaces.
#[derive(Debug)]
pub struct GeometryBuffer {
    buffer: wgpu::Buffer,
    kind: BufferKind,
    len: u32,
}

impl GeometryBuffer {
    /// Uploads vertex data. `len` is the number of `T` elements.
    pub fn vertex<T: Pod>(device: &wgpu::Device, label: &str, data: &[T]) -> Self {
        Self::create(device, label, BufferKind::Vertex, bytemuck::cast_slice(data), data.len())
    }

    /// Uploads `u16` indices.
    pub fn index(device: &wgpu::Device, label: &str, indices: &[u16]) -> Self {
        Self::create(device, label, BufferKind::Index, bytemuck::cast_slice(indices), indices.len())
    }

    fn create(
        device: &wgpu::Device,
        label: &str,
        kind: BufferKind,
        contents: &[u8],
        len: usize,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: kind.usage(),
        });
        log::debug!("{label}: {kind:?} buffer, {len} elements, {} bytes", contents.len());

        Self {
            buffer,
            kind,
            len: len as u32,
        }
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Element count given at creation.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Frees the GPU memory. Any later use is a validation error.
    pub fn release(&self) {
        self.buffer.destroy();
    }
}
