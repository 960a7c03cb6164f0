//! Multisampled render target with a sampleable resolve target.
//!
//! The surface itself is never multisampled. Scenes render into a
//! multisampled texture instead, which cannot be bound as a shader input. To
//! present it, the samples are first resolved into a single-sample texture
//! ("blit"), and that texture is what the composite pass samples. The two
//! textures are created, resized and released together.

use crate::coords::{ColorRgba, PixelSize};

use super::FrameError;

/// Sample count used when none is configured. Supported for every
/// renderable color format on every backend.
pub const DEFAULT_SAMPLE_COUNT: u32 = 4;

/// Where an [`MsaaFrame`] is in its per-frame cycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FrameState {
    /// No pass is open; the frame may be bound or resized.
    Unbound,
    /// Draws land in the multisampled target.
    Bound,
    /// Samples copied into the resolve texture; ready to be composited.
    Resolved,
    /// Targets destroyed. Only a resize brings the frame back.
    Released,
}

impl FrameState {
    /// Validates one step of `Unbound → Bound → Resolved → Unbound`, or a
    /// release from any live state.
    pub fn advance(self, to: FrameState) -> Result<FrameState, FrameError> {
        use FrameState::*;
        match (self, to) {
            (Unbound, Bound) | (Bound, Resolved) | (Resolved, Unbound) => Ok(to),
            (from, Released) if from != Released => Ok(Released),
            (from, to) => Err(FrameError::InvalidTransition { from, to }),
        }
    }
}

/// MSAA frame configuration.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MsaaConfig {
    /// Samples per pixel of the render target. Must be greater than one.
    pub sample_count: u32,
    /// Color the render target is cleared to on every bind.
    pub background: ColorRgba,
}

impl Default for MsaaConfig {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            background: ColorRgba::black(),
        }
    }
}

struct Targets {
    render: wgpu::Texture,
    render_view: wgpu::TextureView,
    resolve: wgpu::Texture,
    resolve_view: wgpu::TextureView,
}

impl Targets {
    fn create(
        device: &wgpu::Device,
        size: PixelSize,
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let [render_desc, resolve_desc] = target_descriptors(size, format, sample_count);
        let render = device.create_texture(&render_desc);
        let resolve = device.create_texture(&resolve_desc);
        let render_view = render.create_view(&wgpu::TextureViewDescriptor::default());
        let resolve_view = resolve.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            render,
            render_view,
            resolve,
            resolve_view,
        }
    }

    fn release(&self) {
        self.render.destroy();
        self.resolve.destroy();
    }
}

/// Descriptors for the `[render, resolve]` pair at `size`.
///
/// Both share size and format. Only the resolve texture can be sampled.
pub(crate) fn target_descriptors(
    size: PixelSize,
    format: wgpu::TextureFormat,
    sample_count: u32,
) -> [wgpu::TextureDescriptor<'static>; 2] {
    let size = size.clamped().extent();
    [
        wgpu::TextureDescriptor {
            label: Some("rendr msaa render target"),
            size,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        },
        wgpu::TextureDescriptor {
            label: Some("rendr msaa resolve target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        },
    ]
}

/// Multisampled render target + resolve target of identical size.
pub struct MsaaFrame {
    format: wgpu::TextureFormat,
    sample_count: u32,
    background: ColorRgba,
    targets: Targets,
    generation: u64,
    state: FrameState,
}

impl MsaaFrame {
    pub fn new(
        device: &wgpu::Device,
        size: PixelSize,
        format: wgpu::TextureFormat,
        config: MsaaConfig,
    ) -> Self {
        debug_assert!(config.sample_count > 1, "msaa frame needs more than one sample");
        let targets = Targets::create(device, size, format, config.sample_count);
        log::debug!(
            "msaa frame created: {}x{} {:?} x{}",
            targets.render.width(),
            targets.render.height(),
            format,
            config.sample_count
        );

        Self {
            format,
            sample_count: config.sample_count,
            background: config.background,
            targets,
            generation: 0,
            state: FrameState::Unbound,
        }
    }

    /// Opens a pass on the multisampled target, cleared to the background.
    ///
    /// Everything drawn through the returned pass lands in the multisampled
    /// target. Drop the pass before calling [`blit`](Self::blit).
    pub fn bind<'e>(
        &mut self,
        encoder: &'e mut wgpu::CommandEncoder,
    ) -> Result<wgpu::RenderPass<'e>, FrameError> {
        self.state = self.state.advance(FrameState::Bound)?;

        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("rendr msaa render pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.targets.render_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.background.into()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        Ok(pass)
    }

    /// Resolves the multisampled target into the resolve texture.
    ///
    /// Full-rect, same-size copy; no scaling happens so no filtering applies.
    /// The multisampled contents are discarded afterwards.
    pub fn blit(&mut self, encoder: &mut wgpu::CommandEncoder) -> Result<(), FrameError> {
        self.state = self.state.advance(FrameState::Resolved)?;

        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("rendr msaa resolve pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.targets.render_view,
                resolve_target: Some(&self.targets.resolve_view),
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Discard,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        Ok(())
    }

    /// Ends the cycle once the resolve texture has been consumed.
    pub fn unbind(&mut self) -> Result<(), FrameError> {
        self.state = self.state.advance(FrameState::Unbound)?;
        Ok(())
    }

    /// Releases both targets and recreates them at `size`.
    ///
    /// Views handed out earlier (e.g. inside bind groups) refer to released
    /// textures afterwards and must be rebuilt. A released frame becomes
    /// usable again.
    pub fn resize(&mut self, device: &wgpu::Device, size: PixelSize) {
        match self.state {
            FrameState::Unbound => self.targets.release(),
            FrameState::Released => {}
            state => {
                log::warn!("msaa frame resized while {state:?}; cycle reset");
                self.targets.release();
            }
        }

        self.targets = Targets::create(device, size, self.format, self.sample_count);
        self.generation += 1;
        self.state = FrameState::Unbound;

        log::debug!(
            "msaa frame resized to {}x{} (generation {})",
            self.targets.render.width(),
            self.targets.render.height(),
            self.generation
        );
    }

    /// Destroys both textures. Called on drop as well.
    ///
    /// The frame refuses to bind until it is resized. Releasing twice is a
    /// no-op.
    pub fn release(&mut self) {
        if let Ok(state) = self.state.advance(FrameState::Released) {
            self.targets.release();
            self.state = state;
            log::debug!("msaa frame released (generation {})", self.generation);
        }
    }

    pub fn is_released(&self) -> bool {
        self.state == FrameState::Released
    }

    pub fn render_size(&self) -> PixelSize {
        PixelSize::new(self.targets.render.width(), self.targets.render.height())
    }

    pub fn resolve_size(&self) -> PixelSize {
        PixelSize::new(self.targets.resolve.width(), self.targets.resolve.height())
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Bumped on every resize.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// View of the single-sample texture the composite pass samples.
    pub fn resolve_view(&self) -> &wgpu::TextureView {
        &self.targets.resolve_view
    }
}

impl Drop for MsaaFrame {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── state machine ─────────────────────────────────────────────────────

    #[test]
    fn full_cycle_is_valid() {
        let s = FrameState::Unbound;
        let s = s.advance(FrameState::Bound).unwrap();
        let s = s.advance(FrameState::Resolved).unwrap();
        let s = s.advance(FrameState::Unbound).unwrap();
        assert_eq!(s, FrameState::Unbound);
    }

    #[test]
    fn blit_before_bind_is_rejected() {
        assert_eq!(
            FrameState::Unbound.advance(FrameState::Resolved),
            Err(FrameError::InvalidTransition {
                from: FrameState::Unbound,
                to: FrameState::Resolved,
            })
        );
    }

    #[test]
    fn double_bind_is_rejected() {
        assert!(FrameState::Bound.advance(FrameState::Bound).is_err());
    }

    #[test]
    fn unbind_before_resolve_is_rejected() {
        assert!(FrameState::Bound.advance(FrameState::Unbound).is_err());
    }

    #[test]
    fn any_live_state_can_be_released() {
        for s in [FrameState::Unbound, FrameState::Bound, FrameState::Resolved] {
            assert_eq!(s.advance(FrameState::Released), Ok(FrameState::Released));
        }
    }

    #[test]
    fn released_frame_cannot_advance() {
        for to in [
            FrameState::Unbound,
            FrameState::Bound,
            FrameState::Resolved,
            FrameState::Released,
        ] {
            assert_eq!(
                FrameState::Released.advance(to),
                Err(FrameError::InvalidTransition {
                    from: FrameState::Released,
                    to,
                })
            );
        }
    }

    // ── descriptors ───────────────────────────────────────────────────────

    #[test]
    fn targets_share_size_and_format() {
        for (w, h) in [(1, 1), (100, 100), (1920, 1080), (333, 7)] {
            let [render, resolve] =
                target_descriptors(PixelSize::new(w, h), wgpu::TextureFormat::Rgba8Unorm, 4);
            assert_eq!(render.size, resolve.size);
            assert_eq!((render.size.width, render.size.height), (w, h));
            assert_eq!(render.format, resolve.format);
        }
    }

    #[test]
    fn only_resolve_target_is_sampleable() {
        let [render, resolve] =
            target_descriptors(PixelSize::new(64, 32), wgpu::TextureFormat::Bgra8UnormSrgb, 4);
        assert_eq!(render.sample_count, 4);
        assert_eq!(resolve.sample_count, 1);
        assert!(!render.usage.contains(wgpu::TextureUsages::TEXTURE_BINDING));
        assert!(resolve.usage.contains(wgpu::TextureUsages::TEXTURE_BINDING));
        assert!(render.usage.contains(wgpu::TextureUsages::RENDER_ATTACHMENT));
        assert!(resolve.usage.contains(wgpu::TextureUsages::RENDER_ATTACHMENT));
    }

    #[test]
    fn zero_size_is_clamped() {
        let [render, resolve] =
            target_descriptors(PixelSize::new(0, 0), wgpu::TextureFormat::Rgba8Unorm, 4);
        assert_eq!((render.size.width, render.size.height), (1, 1));
        assert_eq!(render.size, resolve.size);
    }

    #[test]
    fn default_config_is_multisampled_black() {
        let c = MsaaConfig::default();
        assert!(c.sample_count > 1);
        assert_eq!(c.background, ColorRgba::black());
    }

    // ── gpu ───────────────────────────────────────────────────────────────

    fn small_frame(gpu: &crate::device::HeadlessGpu) -> MsaaFrame {
        MsaaFrame::new(
            gpu.device(),
            PixelSize::new(16, 16),
            wgpu::TextureFormat::Rgba8Unorm,
            MsaaConfig::default(),
        )
    }

    fn encoder(gpu: &crate::device::HeadlessGpu) -> wgpu::CommandEncoder {
        gpu.device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None })
    }

    #[test]
    fn bind_after_release_is_rejected() {
        let Ok(gpu) = crate::device::HeadlessGpu::block_on_new() else { return };
        let mut frame = small_frame(&gpu);
        frame.release();
        frame.release();
        assert!(frame.is_released());

        let mut enc = encoder(&gpu);
        assert!(matches!(
            frame.bind(&mut enc),
            Err(FrameError::InvalidTransition {
                from: FrameState::Released,
                to: FrameState::Bound,
            })
        ));
        assert!(frame.blit(&mut enc).is_err());
    }

    #[test]
    fn resize_revives_released_frame() {
        let Ok(gpu) = crate::device::HeadlessGpu::block_on_new() else { return };
        let mut frame = small_frame(&gpu);
        frame.release();
        frame.resize(gpu.device(), PixelSize::new(8, 4));
        assert_eq!(frame.state(), FrameState::Unbound);
        assert_eq!(frame.render_size(), PixelSize::new(8, 4));

        let mut enc = encoder(&gpu);
        drop(frame.bind(&mut enc).unwrap());
        frame.blit(&mut enc).unwrap();
        frame.unbind().unwrap();
        gpu.queue().submit([enc.finish()]);
    }
}
