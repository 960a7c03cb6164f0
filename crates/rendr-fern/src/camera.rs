use glam::Mat4;
use rendr_engine::coords::PixelSize;

/// Viewport pixels per world unit.
///
/// A 1280x720 window shows about 14.2 x 8 units of the fern.
pub const PIXELS_PER_UNIT: f32 = 90.0;

/// Orthographic projection centered on the origin.
///
/// The visible area is `size / pixels_per_unit` world units, so the fern keeps
/// its on-screen size when the window grows. Depth spans `[-1, 1]`.
pub fn projection(size: PixelSize, pixels_per_unit: f32) -> Mat4 {
    let size = size.clamped();
    let w = size.width as f32 / pixels_per_unit;
    let h = size.height as f32 / pixels_per_unit;
    Mat4::orthographic_rh(-w / 2.0, w / 2.0, -h / 2.0, h / 2.0, -1.0, 1.0)
}
