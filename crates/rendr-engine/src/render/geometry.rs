use super::{BufferKind, GeometryBuffer, ShaderError, VertexArray};

/// What a [`Geometry`] draws.
#[derive(Debug)]
pub enum DrawRange {
    /// `count` vertices, no index buffer.
    Arrays { count: u32 },
    /// Every index of a `u16` index buffer.
    Indexed { indices: GeometryBuffer },
}

/// Vertex array + triangle-list draw range.
///
/// Immutable after construction. Owns its buffers; [`release`](Self::release)
/// frees all of them.
#[derive(Debug)]
pub struct Geometry {
    vertices: VertexArray,
    range: DrawRange,
}

impl Geometry {
    /// Non-indexed geometry drawing `count` vertices.
    pub fn arrays(vertices: VertexArray, count: u32) -> Self {
        Self {
            vertices,
            range: DrawRange::Arrays { count },
        }
    }

    /// Indexed geometry drawing every index in `indices`.
    pub fn indexed(vertices: VertexArray, indices: GeometryBuffer) -> Result<Self, ShaderError> {
        if indices.kind() != BufferKind::Index {
            return Err(ShaderError::WrongBufferKind {
                name: "<indices>".to_string(),
                kind: indices.kind(),
            });
        }
        Ok(Self {
            vertices,
            range: DrawRange::Indexed { indices },
        })
    }

    /// Elements submitted per draw (vertices or indices).
    pub fn element_count(&self) -> u32 {
        match &self.range {
            DrawRange::Arrays { count } => *count,
            DrawRange::Indexed { indices } => indices.len(),
        }
    }

    pub fn range(&self) -> &DrawRange {
        &self.range
    }

    /// Binds the vertex array and issues one draw call.
    ///
    /// The program must already be active on `pass`. Empty geometry issues nothing.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.element_count() == 0 || self.vertices.has_empty_buffer() {
            return;
        }

        self.vertices.bind(pass);
        match &self.range {
            DrawRange::Arrays { count } => pass.draw(0..*count, 0..1),
            DrawRange::Indexed { indices } => {
                pass.set_index_buffer(indices.raw().slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..indices.len(), 0, 0..1);
            }
        }
    }

    pub fn release(&self) {
        self.vertices.release();
        if let DrawRange::Indexed { indices } = &self.range {
            indices.release();
        }
    }
}
