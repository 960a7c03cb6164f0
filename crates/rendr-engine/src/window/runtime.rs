use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::coords::PixelSize;
use crate::core::{App as CoreApp, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};

/// Title shown instead of the configured one when no GPU context exists.
pub const FALLBACK_TITLE: &str = "GPU rendering is not available on this system";

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "rendr".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and drives `app` until the window closes.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    /// `None` when device or surface acquisition failed; the window then
    /// stays open showing [`FALLBACK_TITLE`] and nothing is rendered.
    #[borrows(window)]
    #[covariant]
    gpu: Option<Gpu<'this>>,
}

impl WindowEntry {
    fn id(&self) -> WindowId {
        self.with_window(|w| w.id())
    }

    fn has_gpu(&self) -> bool {
        self.with_gpu(|gpu| gpu.is_some())
    }
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryBuilder {
            window,
            gpu_builder: |w| match pollster::block_on(Gpu::new(w, gpu_init)) {
                Ok(gpu) => Some(gpu),
                Err(e) => {
                    log::error!("GPU initialization failed: {e:#}");
                    w.set_title(FALLBACK_TITLE);
                    None
                }
            },
        }
        .build();

        Ok(entry)
    }

    /// Resizes the surface, then lets the app rebuild its size-dependent resources.
    fn resize(&mut self, size: PixelSize) {
        let (app, entry) = (&mut self.app, &mut self.entry);
        let Some(entry) = entry.as_mut() else { return };

        entry.with_gpu_mut(|gpu| {
            let Some(gpu) = gpu.as_mut() else { return };
            gpu.resize(size);
            if !size.is_empty() {
                app.on_resize(&gpu.render_ctx(), size);
            }
        });
        entry.with_window(|w| w.request_redraw());
    }

    fn redraw(&mut self, window_id: WindowId) -> AppControl {
        let (app, entry) = (&mut self.app, &mut self.entry);
        let Some(entry) = entry.as_mut() else {
            return AppControl::Continue;
        };

        entry.with_mut(|fields| {
            let Some(gpu) = fields.gpu.as_mut() else {
                return AppControl::Continue;
            };
            if gpu.size().is_empty() {
                return AppControl::Continue;
            }

            let mut ctx = FrameCtx {
                window: WindowCtx {
                    id: window_id,
                    window: fields.window,
                },
                gpu,
            };
            app.on_frame(&mut ctx)
        })
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        let entry = match self.create_window_entry(event_loop) {
            Ok(entry) => entry,
            Err(e) => {
                log::error!("failed to create window: {e:#}");
                self.request_exit();
                event_loop.exit();
                return;
            }
        };

        let app = &mut self.app;
        let started = entry.with_gpu(|gpu| match gpu {
            Some(gpu) => app.on_start(&gpu.render_ctx()),
            None => Ok(()),
        });
        if let Err(e) = started {
            log::error!("application failed to start: {e:#}");
            self.request_exit();
            event_loop.exit();
            return;
        }

        log::info!(
            "window {:?} ready (gpu: {})",
            entry.id(),
            if entry.has_gpu() { "yes" } else { "no" }
        );
        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw while there is something to draw with.
        if let Some(entry) = self.entry.as_ref().filter(|e| e.has_gpu()) {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.entry.as_ref().map(WindowEntry::id) != Some(window_id) {
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.request_exit();
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.entry = None;
                self.request_exit();
            }

            WindowEvent::Resized(new_size) => self.resize(PixelSize::from(*new_size)),

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = self
                    .entry
                    .as_ref()
                    .map(|e| e.with_window(|w| PixelSize::from(w.inner_size())));
                if let Some(size) = size {
                    self.resize(size);
                }
            }

            WindowEvent::RedrawRequested => {
                if self.redraw(window_id) == AppControl::Exit {
                    self.request_exit();
                }
            }

            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}
