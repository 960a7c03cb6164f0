use winit::dpi::PhysicalSize;

/// Drawable size in physical pixels.
///
/// GPU textures cannot be zero-sized, so targets are created from
/// [`clamped`](Self::clamped) sizes while the raw value is kept for projection math.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the size with each dimension raised to at least one pixel.
    #[inline]
    pub fn clamped(self) -> Self {
        Self::new(self.width.max(1), self.height.max(1))
    }

    #[inline]
    pub fn extent(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

impl From<PhysicalSize<u32>> for PixelSize {
    fn from(s: PhysicalSize<u32>) -> Self {
        Self::new(s.width, s.height)
    }
}
