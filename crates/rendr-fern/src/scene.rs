use anyhow::{Context, Result};
use glam::Mat4;

use rendr_engine::coords::{ColorRgba, PixelSize};
use rendr_engine::render::{
    AttribDesc, CompositePass, FrameError, Geometry, GeometryBuffer, MsaaConfig, ProgramDesc,
    RenderCtx, RenderTarget, ShaderProgram, StageDesc, UniformBuffer, VertexStageDesc,
};

use crate::camera::{self, PIXELS_PER_UNIT};
use crate::mesh::FernMesh;

const DEFAULT_VS: &str = include_str!("shaders/default.vert.wgsl");
const DEFAULT_FS: &str = include_str!("shaders/default.frag.wgsl");

const FERN_ATTRIBUTES: &[(&str, AttribDesc)] = &[("a_pos", AttribDesc::float(2))];

/// Inset factor of the outline triangles. Tuned by eye.
pub const INSET_SCALE: f32 = 0.78;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SceneConfig {
    pub pixels_per_unit: f32,
    pub inset_scale: f32,
    /// Draw the inset triangles over the fern, leaving only the rims visible.
    pub outline: bool,
    pub fern_color: ColorRgba,
    /// Color of the inset triangles. Matches the background by default.
    pub fill_color: ColorRgba,
    pub msaa: MsaaConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let msaa = MsaaConfig::default();
        Self {
            pixels_per_unit: PIXELS_PER_UNIT,
            inset_scale: INSET_SCALE,
            outline: true,
            fern_color: ColorRgba::opaque(0.18, 0.55, 0.2),
            fill_color: msaa.background,
            msaa,
        }
    }
}

/// Color uniform + the bind group pairing it with the shared projection.
struct Tint {
    color: UniformBuffer<[f32; 4]>,
    group: u32,
    bind_group: wgpu::BindGroup,
}

impl Tint {
    fn new(
        ctx: &RenderCtx<'_>,
        program: &ShaderProgram,
        mvp: &UniformBuffer<Mat4>,
        label: &str,
        color: ColorRgba,
    ) -> Result<Self> {
        let color = UniformBuffer::new(ctx.device, label, &color.to_array());
        let (group, bind_group) = program
            .bind_uniforms(
                ctx.device,
                label,
                [("u_mvp", mvp.binding()), ("u_color", color.binding())],
            )
            .with_context(|| format!("failed to bind {label}"))?;
        Ok(Self {
            color,
            group,
            bind_group,
        })
    }

    fn apply(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(self.group, &self.bind_group, &[]);
    }
}

/// The fern, drawn with MSAA every frame.
pub struct FernScene {
    config: SceneConfig,
    size: PixelSize,

    program: ShaderProgram,
    mvp: UniformBuffer<Mat4>,
    fern_tint: Tint,
    fill_tint: Tint,

    fern: Geometry,
    inset: Geometry,

    pass: CompositePass,
}

impl FernScene {
    pub fn new(ctx: &RenderCtx<'_>, mesh: &FernMesh, config: SceneConfig) -> Result<Self> {
        let pass = CompositePass::new(ctx, config.msaa).context("failed to create MSAA pass")?;

        let program = ShaderProgram::new(
            ctx.device,
            &ProgramDesc {
                label: "fern program",
                vertex: VertexStageDesc {
                    source: DEFAULT_VS,
                    entry_point: "vs_main",
                    attributes: FERN_ATTRIBUTES,
                },
                fragment: StageDesc {
                    source: DEFAULT_FS,
                    entry_point: "fs_main",
                },
                target: pass.scene_target(),
            },
        )
        .context("failed to build fern program")?;

        let projection = camera::projection(ctx.size, config.pixels_per_unit);
        let mvp = UniformBuffer::new(ctx.device, "fern u_mvp", &projection);
        let fern_tint = Tint::new(ctx, &program, &mvp, "fern tint", config.fern_color)?;
        let fill_tint = Tint::new(ctx, &program, &mvp, "fern fill tint", config.fill_color)?;

        let fern_vao = program.make_vertex_array([(
            "a_pos",
            GeometryBuffer::vertex(ctx.device, "fern positions", &mesh.vertices),
        )])?;
        let fern = Geometry::indexed(
            fern_vao,
            GeometryBuffer::index(ctx.device, "fern indices", &mesh.indices),
        )?;

        let inset_vertices = mesh.inset_triangles(config.inset_scale);
        let inset_vao = program.make_vertex_array([(
            "a_pos",
            GeometryBuffer::vertex(ctx.device, "fern inset positions", &inset_vertices),
        )])?;
        let inset = Geometry::arrays(inset_vao, inset_vertices.len() as u32);

        log::info!(
            "fern scene ready: {} triangles, {}x msaa, outline {}",
            mesh.triangle_count(),
            pass.sample_count(),
            if config.outline { "on" } else { "off" }
        );

        Ok(Self {
            config,
            size: ctx.size,
            program,
            mvp,
            fern_tint,
            fill_tint,
            fern,
            inset,
            pass,
        })
    }

    /// Recreates size-dependent targets. The projection follows on the next frame.
    pub fn resize(&mut self, device: &wgpu::Device, size: PixelSize) {
        self.size = size;
        self.pass.resize(device, size);
    }

    pub fn set_outline(&mut self, outline: bool) {
        self.config.outline = outline;
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    /// Projection uploaded for the current size.
    pub fn projection(&self) -> Mat4 {
        camera::projection(self.size, self.config.pixels_per_unit)
    }

    /// Records one frame into `target`.
    pub fn frame(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
    ) -> Result<(), FrameError> {
        self.size = ctx.size;
        self.mvp.write(ctx.queue, &self.projection());

        let Self {
            config,
            program,
            fern_tint,
            fill_tint,
            fern,
            inset,
            pass,
            ..
        } = self;

        pass.with_msaa(ctx, target, |rp| {
            program.use_in(rp);

            fern_tint.apply(rp);
            fern.draw(rp);

            if config.outline {
                fill_tint.apply(rp);
                inset.draw(rp);
            }
        })
    }
}

impl Drop for FernScene {
    fn drop(&mut self) {
        self.fern.release();
        self.inset.release();
        self.mvp.release();
        self.fern_tint.color.release();
        self.fill_tint.color.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rendr_engine::device::HeadlessGpu;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    fn gpu() -> Option<HeadlessGpu> {
        HeadlessGpu::block_on_new()
            .map_err(|e| eprintln!("skipping GPU test: {e:#}"))
            .ok()
    }

    fn render(gpu: &HeadlessGpu, scene: &mut FernScene, size: PixelSize) -> Vec<u8> {
        let output = gpu.create_target(FORMAT, size);
        let view = output.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let ctx = gpu.render_ctx(FORMAT, size);
            let mut target = RenderTarget::new(&mut encoder, &view);
            scene.frame(&ctx, &mut target).unwrap();
        }
        gpu.queue().submit([encoder.finish()]);
        gpu.read_rgba8(&output).unwrap()
    }

    // ── config ────────────────────────────────────────────────────────────

    #[test]
    fn default_config_keeps_tuned_constants() {
        let c = SceneConfig::default();
        assert_eq!(c.pixels_per_unit, 90.0);
        assert_eq!(c.inset_scale, 0.78);
        assert_eq!(c.fill_color, c.msaa.background);
    }

    #[test]
    fn fern_program_links() {
        let layout = rendr_engine::render::ProgramLayout::link(&ProgramDesc {
            label: "fern",
            vertex: VertexStageDesc {
                source: DEFAULT_VS,
                entry_point: "vs_main",
                attributes: FERN_ATTRIBUTES,
            },
            fragment: StageDesc {
                source: DEFAULT_FS,
                entry_point: "fs_main",
            },
            target: rendr_engine::render::ProgramTarget::opaque(FORMAT).with_samples(4),
        })
        .unwrap();
        let mvp = layout.uniform("u_mvp").unwrap();
        let color = layout.uniform("u_color").unwrap();
        assert_eq!(mvp.group, color.group);
        assert_ne!(mvp.binding, color.binding);
    }

    // ── gpu ───────────────────────────────────────────────────────────────

    #[test]
    fn frames_are_deterministic() {
        let Some(gpu) = gpu() else { return };
        let size = PixelSize::new(160, 120);
        let mesh = FernMesh::builtin().unwrap();
        let mut scene =
            FernScene::new(&gpu.render_ctx(FORMAT, size), &mesh, SceneConfig::default()).unwrap();

        let first = render(&gpu, &mut scene, size);
        let second = render(&gpu, &mut scene, size);
        assert_eq!(first, second);
        assert!(first.chunks_exact(4).any(|px| px[1] > 0), "fern not drawn");
    }

    #[test]
    fn resize_then_render() {
        let Some(gpu) = gpu() else { return };
        let mesh = FernMesh::builtin().unwrap();
        let mut scene = FernScene::new(
            &gpu.render_ctx(FORMAT, PixelSize::new(100, 100)),
            &mesh,
            SceneConfig::default(),
        )
        .unwrap();

        let size = PixelSize::new(240, 180);
        scene.resize(gpu.device(), size);
        let data = render(&gpu, &mut scene, size);
        assert_eq!(data.len(), (240 * 180 * 4) as usize);
        assert_eq!(scene.projection(), camera::projection(size, PIXELS_PER_UNIT));
    }
}
