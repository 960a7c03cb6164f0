use crate::coords::PixelSize;

use super::{
    AttribDesc, FrameError, FrameState, Geometry, GeometryBuffer, MsaaConfig, MsaaFrame,
    ProgramDesc, ProgramTarget, RenderCtx, RenderTarget, ShaderError, ShaderProgram, StageDesc,
    VertexStageDesc,
};

const SPLASH_VS: &str = include_str!("shaders/splash.vert.wgsl");
const SPLASH_FS: &str = include_str!("shaders/splash.frag.wgsl");

const SPLASH_ATTRIBUTES: &[(&str, AttribDesc)] = &[
    ("a_pos", AttribDesc::float(2)),
    ("a_tex", AttribDesc::float(2)),
];

/// Two triangles covering clip space.
const QUAD_POSITIONS: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
];

/// Texture origin is top-left, so clip-space bottom maps to `v = 1`.
const QUAD_TEX_COORDS: [[f32; 2]; 6] = [
    [0.0, 1.0],
    [1.0, 1.0],
    [0.0, 0.0],
    [0.0, 0.0],
    [1.0, 1.0],
    [1.0, 0.0],
];

/// Renders a scene with multisampling and composites it onto the output.
///
/// Per frame:
/// 1. bind the [`MsaaFrame`] (clears the multisampled target)
/// 2. run the caller's draws
/// 3. resolve into the single-sample texture
/// 4. draw that texture over the output with a fullscreen quad
///
/// Programs drawn inside [`with_msaa`](Self::with_msaa) must target
/// [`format`](Self::format) with [`sample_count`](Self::sample_count) samples.
pub struct CompositePass {
    frame: MsaaFrame,
    program: ShaderProgram,
    quad: Geometry,
    sampler: wgpu::Sampler,
    slots: TextureSlots,
    texture_bind_group: wgpu::BindGroup,
}

/// Where the splash shader expects the resolve texture and its sampler.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct TextureSlots {
    group: u32,
    texture: u32,
    sampler: u32,
}

impl TextureSlots {
    fn resolve(program: &ShaderProgram) -> Result<Self, ShaderError> {
        let (group, bindings) = program
            .layout()
            .resolve_uniforms(&["u_diffuse", "u_sampler"])?;
        match bindings[..] {
            [texture, sampler] => Ok(Self {
                group,
                texture,
                sampler,
            }),
            _ => Err(ShaderError::Link(
                "splash texture bindings did not resolve".to_string(),
            )),
        }
    }
}

impl CompositePass {
    /// Creates the frame at `ctx.size` in the output format.
    pub fn new(ctx: &RenderCtx<'_>, config: MsaaConfig) -> Result<Self, ShaderError> {
        let frame = MsaaFrame::new(ctx.device, ctx.size, ctx.surface_format, config);

        let program = ShaderProgram::new(
            ctx.device,
            &ProgramDesc {
                label: "rendr splash program",
                vertex: VertexStageDesc {
                    source: SPLASH_VS,
                    entry_point: "vs_main",
                    attributes: SPLASH_ATTRIBUTES,
                },
                fragment: StageDesc {
                    source: SPLASH_FS,
                    entry_point: "fs_main",
                },
                target: ProgramTarget::opaque(ctx.surface_format),
            },
        )?;

        let vertices = program.make_vertex_array([
            (
                "a_pos",
                GeometryBuffer::vertex(ctx.device, "rendr splash positions", &QUAD_POSITIONS),
            ),
            (
                "a_tex",
                GeometryBuffer::vertex(ctx.device, "rendr splash tex coords", &QUAD_TEX_COORDS),
            ),
        ])?;
        let quad = Geometry::arrays(vertices, QUAD_POSITIONS.len() as u32);

        // Same-size copy: nearest is exact.
        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("rendr splash sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let slots = TextureSlots::resolve(&program)?;
        let texture_bind_group =
            Self::bind_resolve_texture(&program, ctx.device, slots, &frame, &sampler);

        Ok(Self {
            frame,
            program,
            quad,
            sampler,
            slots,
            texture_bind_group,
        })
    }

    /// Bind group sampling the current resolve texture at `slots`.
    fn bind_resolve_texture(
        program: &ShaderProgram,
        device: &wgpu::Device,
        slots: TextureSlots,
        frame: &MsaaFrame,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("rendr splash bind group"),
            layout: &program.bind_group_layout(slots.group),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: slots.texture,
                    resource: wgpu::BindingResource::TextureView(frame.resolve_view()),
                },
                wgpu::BindGroupEntry {
                    binding: slots.sampler,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// Runs `render` against the multisampled target, then composites the
    /// result onto `target.color_view`.
    ///
    /// If `ctx.size` no longer matches the frame, the frame is resized first.
    pub fn with_msaa(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        render: impl FnOnce(&mut wgpu::RenderPass<'_>),
    ) -> Result<(), FrameError> {
        if ctx.size.clamped() != self.frame.render_size() {
            self.resize(ctx.device, ctx.size);
        }

        {
            let mut pass = self.frame.bind(target.encoder)?;
            render(&mut pass);
        }

        self.frame.blit(target.encoder)?;

        {
            let mut pass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("rendr splash pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            self.program.use_in(&mut pass);
            pass.set_bind_group(self.slots.group, &self.texture_bind_group, &[]);
            self.quad.draw(&mut pass);
        }

        self.frame.unbind()?;
        log::trace!("composited frame {:?}", self.frame.render_size());
        Ok(())
    }

    /// Recreates the MSAA targets and rebinds the new resolve texture.
    pub fn resize(&mut self, device: &wgpu::Device, size: PixelSize) {
        self.frame.resize(device, size);
        self.texture_bind_group = Self::bind_resolve_texture(
            &self.program,
            device,
            self.slots,
            &self.frame,
            &self.sampler,
        );
    }

    pub fn frame(&self) -> &MsaaFrame {
        &self.frame
    }

    pub fn state(&self) -> FrameState {
        self.frame.state()
    }

    pub fn sample_count(&self) -> u32 {
        self.frame.sample_count()
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.frame.format()
    }

    /// Target description for programs drawn inside [`with_msaa`](Self::with_msaa).
    pub fn scene_target(&self) -> ProgramTarget {
        ProgramTarget::opaque(self.format()).with_samples(self.sample_count())
    }
}

impl Drop for CompositePass {
    fn drop(&mut self) {
        self.quad.release();
    }
}
