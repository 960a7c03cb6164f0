use super::ShaderError;

/// Scalar component type of a vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ScalarKind {
    Float32,
    Float16,
    Uint8,
    Sint8,
    Uint16,
    Sint16,
    Uint32,
    Sint32,
}

/// Declarative description of one vertex attribute.
///
/// Component count, scalar type and buffer layout, plus an optional instance
/// divisor. Each attribute is fed by its own buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttribDesc {
    /// Components per element, `1..=4`.
    pub size: u8,
    pub kind: ScalarKind,
    /// Map integer data to `[0, 1]` / `[-1, 1]` floats. Ignored for float kinds.
    pub normalized: bool,
    /// Bytes between consecutive elements; `None` means tightly packed.
    pub stride: Option<u64>,
    /// Byte offset of the first element.
    pub offset: u64,
    /// `None`/`Some(0)`: advance per vertex. `Some(1)`: advance per instance.
    pub divisor: Option<u32>,
}

impl AttribDesc {
    pub const fn new(size: u8, kind: ScalarKind) -> Self {
        Self {
            size,
            kind,
            normalized: false,
            stride: None,
            offset: 0,
            divisor: None,
        }
    }

    /// `size` x `f32`, the common case.
    pub const fn float(size: u8) -> Self {
        Self::new(size, ScalarKind::Float32)
    }

    pub const fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }

    pub const fn stride(mut self, stride: u64) -> Self {
        self.stride = Some(stride);
        self
    }

    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub const fn divisor(mut self, divisor: u32) -> Self {
        self.divisor = Some(divisor);
        self
    }

    /// Vertex format for this declaration, if the combination exists.
    ///
    /// Three-component 8- and 16-bit formats do not exist; neither do
    /// normalized 32-bit integers.
    pub fn vertex_format(&self) -> Option<wgpu::VertexFormat> {
        use wgpu::VertexFormat as F;
        use ScalarKind as K;

        let norm = self.normalized;
        let format = match (self.kind, self.size) {
            (K::Float32, 1) => F::Float32,
            (K::Float32, 2) => F::Float32x2,
            (K::Float32, 3) => F::Float32x3,
            (K::Float32, 4) => F::Float32x4,

            (K::Float16, 1) => F::Float16,
            (K::Float16, 2) => F::Float16x2,
            (K::Float16, 4) => F::Float16x4,

            (K::Uint8, 1) => if norm { F::Unorm8 } else { F::Uint8 },
            (K::Uint8, 2) => if norm { F::Unorm8x2 } else { F::Uint8x2 },
            (K::Uint8, 4) => if norm { F::Unorm8x4 } else { F::Uint8x4 },
            (K::Sint8, 1) => if norm { F::Snorm8 } else { F::Sint8 },
            (K::Sint8, 2) => if norm { F::Snorm8x2 } else { F::Sint8x2 },
            (K::Sint8, 4) => if norm { F::Snorm8x4 } else { F::Sint8x4 },

            (K::Uint16, 1) => if norm { F::Unorm16 } else { F::Uint16 },
            (K::Uint16, 2) => if norm { F::Unorm16x2 } else { F::Uint16x2 },
            (K::Uint16, 4) => if norm { F::Unorm16x4 } else { F::Uint16x4 },
            (K::Sint16, 1) => if norm { F::Snorm16 } else { F::Sint16 },
            (K::Sint16, 2) => if norm { F::Snorm16x2 } else { F::Sint16x2 },
            (K::Sint16, 4) => if norm { F::Snorm16x4 } else { F::Sint16x4 },

            (K::Uint32 | K::Sint32, _) if norm => return None,
            (K::Uint32, 1) => F::Uint32,
            (K::Uint32, 2) => F::Uint32x2,
            (K::Uint32, 3) => F::Uint32x3,
            (K::Uint32, 4) => F::Uint32x4,
            (K::Sint32, 1) => F::Sint32,
            (K::Sint32, 2) => F::Sint32x2,
            (K::Sint32, 3) => F::Sint32x3,
            (K::Sint32, 4) => F::Sint32x4,

            _ => return None,
        };
        Some(format)
    }

    /// Scalar kind the shader input receives.
    pub fn shader_scalar(&self) -> naga::ScalarKind {
        use ScalarKind as K;
        match self.kind {
            K::Float32 | K::Float16 => naga::ScalarKind::Float,
            _ if self.normalized => naga::ScalarKind::Float,
            K::Uint8 | K::Uint16 | K::Uint32 => naga::ScalarKind::Uint,
            K::Sint8 | K::Sint16 | K::Sint32 => naga::ScalarKind::Sint,
        }
    }

    /// Step mode implied by the divisor.
    pub fn step_mode(&self, name: &str) -> Result<wgpu::VertexStepMode, ShaderError> {
        match self.divisor {
            None | Some(0) => Ok(wgpu::VertexStepMode::Vertex),
            Some(1) => Ok(wgpu::VertexStepMode::Instance),
            Some(divisor) => Err(ShaderError::UnsupportedDivisor {
                name: name.to_string(),
                divisor,
            }),
        }
    }

    /// Element stride in bytes: the explicit stride, else the packed format size.
    pub fn array_stride(&self, format: wgpu::VertexFormat) -> u64 {
        self.stride.unwrap_or(self.offset + format.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_sizes_map_to_float32_formats() {
        assert_eq!(AttribDesc::float(1).vertex_format(), Some(wgpu::VertexFormat::Float32));
        assert_eq!(AttribDesc::float(2).vertex_format(), Some(wgpu::VertexFormat::Float32x2));
        assert_eq!(AttribDesc::float(4).vertex_format(), Some(wgpu::VertexFormat::Float32x4));
    }

    #[test]
    fn normalization_selects_unorm() {
        let d = AttribDesc::new(4, ScalarKind::Uint8).normalized();
        assert_eq!(d.vertex_format(), Some(wgpu::VertexFormat::Unorm8x4));
        let d = AttribDesc::new(2, ScalarKind::Sint16).normalized();
        assert_eq!(d.vertex_format(), Some(wgpu::VertexFormat::Snorm16x2));
    }

    #[test]
    fn normalized_float_is_plain_float() {
        let d = AttribDesc::float(3).normalized();
        assert_eq!(d.vertex_format(), Some(wgpu::VertexFormat::Float32x3));
    }

    #[test]
    fn missing_formats_are_rejected() {
        assert_eq!(AttribDesc::new(3, ScalarKind::Uint8).vertex_format(), None);
        assert_eq!(AttribDesc::new(3, ScalarKind::Float16).vertex_format(), None);
        assert_eq!(AttribDesc::new(2, ScalarKind::Uint32).normalized().vertex_format(), None);
        assert_eq!(AttribDesc::float(5).vertex_format(), None);
        assert_eq!(AttribDesc::float(0).vertex_format(), None);
    }

    #[test]
    fn shader_scalar_follows_normalization() {
        assert_eq!(AttribDesc::float(2).shader_scalar(), naga::ScalarKind::Float);
        assert_eq!(AttribDesc::new(2, ScalarKind::Float16).shader_scalar(), naga::ScalarKind::Float);
        assert_eq!(AttribDesc::new(4, ScalarKind::Uint8).shader_scalar(), naga::ScalarKind::Uint);
        assert_eq!(
            AttribDesc::new(4, ScalarKind::Uint8).normalized().shader_scalar(),
            naga::ScalarKind::Float
        );
        assert_eq!(AttribDesc::new(1, ScalarKind::Sint32).shader_scalar(), naga::ScalarKind::Sint);
    }

    #[test]
    fn divisor_maps_to_step_mode() {
        assert_eq!(AttribDesc::float(2).step_mode("a").unwrap(), wgpu::VertexStepMode::Vertex);
        assert_eq!(
            AttribDesc::float(2).divisor(0).step_mode("a").unwrap(),
            wgpu::VertexStepMode::Vertex
        );
        assert_eq!(
            AttribDesc::float(2).divisor(1).step_mode("a").unwrap(),
            wgpu::VertexStepMode::Instance
        );
        assert_eq!(
            AttribDesc::float(2).divisor(3).step_mode("a_off"),
            Err(ShaderError::UnsupportedDivisor { name: "a_off".into(), divisor: 3 })
        );
    }

    #[test]
    fn packed_stride_includes_offset() {
        let f = wgpu::VertexFormat::Float32x2;
        assert_eq!(AttribDesc::float(2).array_stride(f), 8);
        assert_eq!(AttribDesc::float(2).offset(8).array_stride(f), 16);
        assert_eq!(AttribDesc::float(2).stride(24).offset(8).array_stride(f), 24);
    }
}
