use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use rendr_engine::coords::PixelSize;
use rendr_engine::core::{App, AppControl, FrameCtx};
use rendr_engine::render::RenderCtx;

use crate::mesh::FernMesh;
use crate::scene::{FernScene, SceneConfig};

/// Owns the scene and feeds it runtime events.
///
/// Keys: `Escape` quits, `O` toggles the outline.
pub struct FernApp {
    mesh: FernMesh,
    config: SceneConfig,
    scene: Option<FernScene>,
}

impl FernApp {
    pub fn new(mesh: FernMesh, config: SceneConfig) -> Self {
        Self {
            mesh,
            config,
            scene: None,
        }
    }

    pub fn scene(&self) -> Option<&FernScene> {
        self.scene.as_ref()
    }

    fn toggle_outline(&mut self) {
        self.config.outline = !self.config.outline;
        if let Some(scene) = self.scene.as_mut() {
            scene.set_outline(self.config.outline);
        }
        log::info!("outline {}", if self.config.outline { "on" } else { "off" });
    }
}

impl App for FernApp {
    fn on_start(&mut self, ctx: &RenderCtx<'_>) -> anyhow::Result<()> {
        self.scene = Some(FernScene::new(ctx, &self.mesh, self.config)?);
        Ok(())
    }

    fn on_resize(&mut self, ctx: &RenderCtx<'_>, size: PixelSize) {
        if let Some(scene) = self.scene.as_mut() {
            scene.resize(ctx.device, size);
        }
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed || event.repeat {
            return AppControl::Continue;
        }

        match &event.logical_key {
            Key::Named(NamedKey::Escape) => return AppControl::Exit,
            Key::Character(c) if c.eq_ignore_ascii_case("o") => self.toggle_outline(),
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(scene) = self.scene.as_mut() else {
            return AppControl::Continue;
        };
        ctx.render(|rctx, target| Ok(scene.frame(rctx, target)?))
    }
}
