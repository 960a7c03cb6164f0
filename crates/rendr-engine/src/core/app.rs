use winit::event::WindowEvent;

use crate::coords::PixelSize;
use crate::render::RenderCtx;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// The runtime calls these in order: `on_start` once the GPU context exists,
/// then `on_resize` for every size change and `on_frame` for every redraw.
/// None of them are called when the GPU context could not be acquired.
pub trait App {
    /// Creates GPU resources. An error here is logged and ends the run.
    fn on_start(&mut self, ctx: &RenderCtx<'_>) -> anyhow::Result<()>;

    /// Called after the surface has been reconfigured to `size`.
    fn on_resize(&mut self, ctx: &RenderCtx<'_>, size: PixelSize) {
        let _ = (ctx, size);
    }

    /// Called for window events before the runtime handles them.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
