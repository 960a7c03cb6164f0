//! Size and color types shared between the runtime and the renderers.
//!
//! Sizes are physical pixels. Colors are linear RGBA; sRGB encoding is left to
//! the render target format.

mod color;
mod size;

pub use color::ColorRgba;
pub use size::PixelSize;
