use std::collections::HashMap;

use super::{AttribDesc, BufferKind, GeometryBuffer, ShaderError, ShaderStage};

/// Source + entry point of one stage.
#[derive(Debug, Copy, Clone)]
pub struct StageDesc<'a> {
    pub source: &'a str,
    pub entry_point: &'a str,
}

/// Vertex stage plus the attributes it consumes, in buffer-slot order.
#[derive(Debug, Copy, Clone)]
pub struct VertexStageDesc<'a> {
    pub source: &'a str,
    pub entry_point: &'a str,
    pub attributes: &'a [(&'a str, AttribDesc)],
}

/// Color target the program renders into.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProgramTarget {
    pub format: wgpu::TextureFormat,
    pub sample_count: u32,
    pub blend: Option<wgpu::BlendState>,
}

impl ProgramTarget {
    /// Opaque, single-sample target.
    pub const fn opaque(format: wgpu::TextureFormat) -> Self {
        Self {
            format,
            sample_count: 1,
            blend: None,
        }
    }

    pub const fn with_samples(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }
}

#[derive(Debug, Copy, Clone)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub vertex: VertexStageDesc<'a>,
    pub fragment: StageDesc<'a>,
    pub target: ProgramTarget,
}

/// Resolved attribute: where it lives in the shader and which buffer slot feeds it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttribSlot {
    /// `@location` in the vertex entry point.
    pub location: u32,
    /// Vertex buffer slot (declaration order).
    pub slot: u32,
    pub desc: AttribDesc,
    pub format: wgpu::VertexFormat,
    pub step_mode: wgpu::VertexStepMode,
    pub array_stride: u64,
}

/// Resolved uniform (or texture/sampler) binding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UniformSlot {
    pub group: u32,
    pub binding: u32,
}

/// Name tables of a linked program.
///
/// Built purely from the WGSL sources, before any GPU object exists.
#[derive(Debug, Clone, Default)]
pub struct ProgramLayout {
    attribs: Vec<(String, AttribSlot)>,
    uniforms: HashMap<String, UniformSlot>,
}

impl ProgramLayout {
    /// Compiles both stages and resolves every declared attribute and uniform.
    pub fn link(desc: &ProgramDesc<'_>) -> Result<Self, ShaderError> {
        let vs = compile(ShaderStage::Vertex, desc.vertex.source)?;
        let fs = compile(ShaderStage::Fragment, desc.fragment.source)?;

        let vs_entry = entry_point(&vs, ShaderStage::Vertex, desc.vertex.entry_point)?;
        let fs_entry = entry_point(&fs, ShaderStage::Fragment, desc.fragment.entry_point)?;

        let mut inputs = Vec::new();
        for arg in &vs_entry.function.arguments {
            io_locations(&vs, arg.ty, arg.binding.as_ref(), arg.name.as_ref(), &mut inputs);
        }

        let mut varyings_out = Vec::new();
        if let Some(result) = &vs_entry.function.result {
            io_locations(&vs, result.ty, result.binding.as_ref(), None, &mut varyings_out);
        }
        let mut varyings_in = Vec::new();
        for arg in &fs_entry.function.arguments {
            io_locations(&fs, arg.ty, arg.binding.as_ref(), arg.name.as_ref(), &mut varyings_in);
        }
        for (name, location, _) in &varyings_in {
            if !varyings_out.iter().any(|(_, l, _)| l == location) {
                return Err(ShaderError::Link(format!(
                    "fragment input {} @location({location}) is not written by the vertex stage",
                    name.as_deref().unwrap_or("<unnamed>"),
                )));
            }
        }

        let mut attribs: Vec<(String, AttribSlot)> = Vec::with_capacity(desc.vertex.attributes.len());
        for (slot, (name, attr)) in desc.vertex.attributes.iter().enumerate() {
            if attribs.iter().any(|(n, _)| n == name) {
                return Err(ShaderError::Link(format!("attribute `{name}` declared twice")));
            }
            let (location, ty) = inputs
                .iter()
                .find(|(n, _, _)| n.as_deref() == Some(*name))
                .map(|(_, l, ty)| (*l, *ty))
                .ok_or_else(|| {
                    ShaderError::Link(format!(
                        "attribute `{name}` is not an input of `{}`",
                        desc.vertex.entry_point
                    ))
                })?;
            let format = attr.vertex_format().ok_or_else(|| ShaderError::UnsupportedFormat {
                name: name.to_string(),
                size: attr.size,
                kind: attr.kind,
                normalized: attr.normalized,
            })?;
            check_input_type(&vs, ty, name, location, attr)?;
            let step_mode = attr.step_mode(name)?;

            attribs.push((
                name.to_string(),
                AttribSlot {
                    location,
                    slot: slot as u32,
                    desc: *attr,
                    format,
                    step_mode,
                    array_stride: attr.array_stride(format),
                },
            ));
        }

        if let Some((name, location, _)) = inputs
            .iter()
            .find(|(_, l, _)| !attribs.iter().any(|(_, a)| a.location == *l))
        {
            return Err(ShaderError::Link(format!(
                "vertex input {} @location({location}) has no declared attribute",
                name.as_deref().unwrap_or("<unnamed>"),
            )));
        }

        let mut uniforms = HashMap::new();
        collect_uniforms(&vs, &mut uniforms)?;
        collect_uniforms(&fs, &mut uniforms)?;

        Ok(Self { attribs, uniforms })
    }

    pub fn attribute(&self, name: &str) -> Option<&AttribSlot> {
        self.attribs.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    /// Declared attributes in slot order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttribSlot)> {
        self.attribs.iter().map(|(n, a)| (n.as_str(), a))
    }

    pub fn uniform(&self, name: &str) -> Option<UniformSlot> {
        self.uniforms.get(name).copied()
    }

    /// Matches buffer bindings to declared attributes.
    ///
    /// Returns `(slot, binding index)` for every attribute, in slot order.
    /// Unknown names are reported first, then the first attribute that is
    /// unbound or fed an index buffer, then any name bound twice.
    pub fn resolve_buffers(
        &self,
        bindings: &[(&str, BufferKind)],
    ) -> Result<Vec<(u32, usize)>, ShaderError> {
        if let Some((name, _)) = bindings.iter().find(|(n, _)| self.attribute(n).is_none()) {
            return Err(ShaderError::UnknownAttribute(name.to_string()));
        }

        let mut used = vec![false; bindings.len()];
        let mut resolved = Vec::with_capacity(self.attribs.len());
        for (name, attr) in &self.attribs {
            let idx = bindings
                .iter()
                .position(|(n, _)| *n == name.as_str())
                .ok_or_else(|| ShaderError::MissingBinding(name.clone()))?;
            let kind = bindings[idx].1;
            if kind != BufferKind::Vertex {
                return Err(ShaderError::WrongBufferKind {
                    name: name.clone(),
                    kind,
                });
            }
            used[idx] = true;
            resolved.push((attr.slot, idx));
        }

        if let Some(((name, _), _)) = bindings.iter().zip(&used).find(|(_, used)| !**used) {
            return Err(ShaderError::DuplicateBinding(name.to_string()));
        }

        Ok(resolved)
    }

    /// Resolves uniform names to one `@group` and the binding of each name.
    pub fn resolve_uniforms(&self, names: &[&str]) -> Result<(u32, Vec<u32>), ShaderError> {
        let mut group = None;
        let mut bindings = Vec::with_capacity(names.len());

        for name in names {
            let slot = self
                .uniform(name)
                .ok_or_else(|| ShaderError::UnknownUniform(name.to_string()))?;
            match group {
                None => group = Some(slot.group),
                Some(expected) if expected != slot.group => {
                    return Err(ShaderError::MixedUniformGroups {
                        expected,
                        found: slot.group,
                    });
                }
                Some(_) => {}
            }
            bindings.push(slot.binding);
        }

        let group = group.ok_or(ShaderError::NoUniforms)?;
        Ok((group, bindings))
    }
}

/// Linked vertex + fragment pair.
///
/// Owns the render pipeline and the name → location tables resolved from the
/// shader sources. Vertex arrays and bind groups are built by name through it,
/// so a typo in an attribute or uniform name fails at construction rather than
/// at draw time.
pub struct ShaderProgram {
    label: String,
    pipeline: wgpu::RenderPipeline,
    layout: ProgramLayout,
    target: ProgramTarget,
}

impl ShaderProgram {
    pub fn new(device: &wgpu::Device, desc: &ProgramDesc<'_>) -> Result<Self, ShaderError> {
        let layout = ProgramLayout::link(desc)?;

        let vs_label = format!("{} vertex", desc.label);
        let vs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&vs_label),
            source: wgpu::ShaderSource::Wgsl(desc.vertex.source.into()),
        });
        let fs_label = format!("{} fragment", desc.label);
        let fs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&fs_label),
            source: wgpu::ShaderSource::Wgsl(desc.fragment.source.into()),
        });

        // One buffer slot per attribute.
        let attributes: Vec<wgpu::VertexAttribute> = layout
            .attribs
            .iter()
            .map(|(_, a)| wgpu::VertexAttribute {
                format: a.format,
                offset: a.desc.offset,
                shader_location: a.location,
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = layout
            .attribs
            .iter()
            .zip(&attributes)
            .map(|((_, a), attr)| wgpu::VertexBufferLayout {
                array_stride: a.array_stride,
                step_mode: a.step_mode,
                attributes: std::slice::from_ref(attr),
            })
            .collect();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            // Derived from the shaders; bind groups come from `get_bind_group_layout`.
            layout: None,

            vertex: wgpu::VertexState {
                module: &vs,
                entry_point: Some(desc.vertex.entry_point),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &fs,
                entry_point: Some(desc.fragment.entry_point),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: desc.target.format,
                    blend: desc.target.blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: desc.target.sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },

            multiview_mask: None,
            cache: None,
        });

        log::debug!(
            "{}: linked {} attribute(s), {} uniform(s), {}x samples",
            desc.label,
            layout.attribs.len(),
            layout.uniforms.len(),
            desc.target.sample_count
        );

        Ok(Self {
            label: desc.label.to_string(),
            pipeline,
            layout,
            target: desc.target,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn layout(&self) -> &ProgramLayout {
        &self.layout
    }

    pub fn target(&self) -> ProgramTarget {
        self.target
    }

    /// `(group, binding)` of a named uniform, texture or sampler.
    pub fn uniform_location(&self, name: &str) -> Option<UniformSlot> {
        self.layout.uniform(name)
    }

    /// Makes this program the active pipeline of `pass`.
    pub fn use_in(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
    }

    /// Binds one buffer to every declared attribute.
    ///
    /// The vertex array takes ownership of the buffers. Every declared attribute
    /// needs exactly one vertex buffer and every binding must name a declared
    /// attribute.
    pub fn make_vertex_array<'n>(
        &self,
        bindings: impl IntoIterator<Item = (&'n str, GeometryBuffer)>,
    ) -> Result<VertexArray, ShaderError> {
        let (names, buffers): (Vec<&str>, Vec<GeometryBuffer>) = bindings.into_iter().unzip();
        let kinds: Vec<(&str, BufferKind)> =
            names.iter().zip(&buffers).map(|(n, b)| (*n, b.kind())).collect();
        let resolved = self.layout.resolve_buffers(&kinds)?;

        let mut buffers: Vec<Option<GeometryBuffer>> = buffers.into_iter().map(Some).collect();
        let slots = resolved
            .into_iter()
            .filter_map(|(slot, idx)| buffers[idx].take().map(|b| (slot, b)))
            .collect();

        Ok(VertexArray { slots })
    }

    /// Bind group layout of `@group(group)`, derived from the shaders.
    pub fn bind_group_layout(&self, group: u32) -> wgpu::BindGroupLayout {
        self.pipeline.get_bind_group_layout(group)
    }

    /// Creates a bind group from uniform names.
    ///
    /// All names must resolve to the same `@group`.
    pub fn bind_uniforms<'r>(
        &self,
        device: &wgpu::Device,
        label: &str,
        entries: impl IntoIterator<Item = (&'r str, wgpu::BindingResource<'r>)>,
    ) -> Result<(u32, wgpu::BindGroup), ShaderError> {
        let (names, resources): (Vec<&str>, Vec<wgpu::BindingResource<'r>>) =
            entries.into_iter().unzip();
        let (group, bindings) = self.layout.resolve_uniforms(&names)?;

        let resolved: Vec<wgpu::BindGroupEntry<'_>> = bindings
            .into_iter()
            .zip(resources)
            .map(|(binding, resource)| wgpu::BindGroupEntry { binding, resource })
            .collect();
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.bind_group_layout(group),
            entries: &resolved,
        });

        Ok((group, bind_group))
    }
}

/// Attribute → buffer associations of one program, ready to bind for a draw.
#[derive(Debug)]
pub struct VertexArray {
    slots: Vec<(u32, GeometryBuffer)>,
}

impl VertexArray {
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        for (slot, buffer) in &self.slots {
            pass.set_vertex_buffer(*slot, buffer.raw().slice(..));
        }
    }

    /// True when any bound buffer holds no elements (nothing can be drawn).
    pub fn has_empty_buffer(&self) -> bool {
        self.slots.iter().any(|(_, b)| b.is_empty())
    }

    pub fn release(&self) {
        for (_, buffer) in &self.slots {
            buffer.release();
        }
    }
}

fn compile(stage: ShaderStage, source: &str) -> Result<naga::Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Compile {
        stage,
        log: e.emit_to_string(source),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| ShaderError::Compile {
        stage,
        log: e.emit_to_string(source),
    })?;

    Ok(module)
}

fn entry_point<'m>(
    module: &'m naga::Module,
    stage: ShaderStage,
    name: &str,
) -> Result<&'m naga::EntryPoint, ShaderError> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage.naga() && ep.name == name)
        .ok_or_else(|| ShaderError::Link(format!("no {stage} entry point named `{name}`")))
}

/// Flattens `@location` bindings of an argument or result, descending into structs.
fn io_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    name: Option<&String>,
    out: &mut Vec<(Option<String>, u32, naga::Handle<naga::Type>)>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.push((name.cloned(), *location, ty))
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    io_locations(module, m.ty, m.binding.as_ref(), m.name.as_ref(), out);
                }
            }
        }
    }
}

/// Rejects attributes whose data the shader input cannot receive.
///
/// Float and normalized formats feed `f32` inputs; integer formats feed
/// `i32`/`u32` inputs of matching signedness.
fn check_input_type(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    name: &str,
    location: u32,
    attr: &AttribDesc,
) -> Result<(), ShaderError> {
    let scalar = match &module.types[ty].inner {
        naga::TypeInner::Scalar(scalar) | naga::TypeInner::Vector { scalar, .. } => *scalar,
        _ => {
            return Err(ShaderError::Link(format!(
                "vertex input `{name}` @location({location}) is not a scalar or vector"
            )));
        }
    };
    let expected = attr.shader_scalar();
    if scalar.kind != expected || scalar.width != 4 {
        return Err(ShaderError::Link(format!(
            "attribute `{name}` supplies {expected:?} data but @location({location}) is {:?}{}",
            scalar.kind,
            scalar.width * 8
        )));
    }
    Ok(())
}

fn collect_uniforms(
    module: &naga::Module,
    out: &mut HashMap<String, UniformSlot>,
) -> Result<(), ShaderError> {
    for (_, var) in module.global_variables.iter() {
        let (Some(name), Some(rb)) = (&var.name, &var.binding) else { continue };
        let slot = UniformSlot {
            group: rb.group,
            binding: rb.binding,
        };
        if let Some(prev) = out.insert(name.clone(), slot) {
            if prev != slot {
                return Err(ShaderError::Link(format!(
                    "uniform `{name}` bound at ({}, {}) and ({}, {})",
                    prev.group, prev.binding, slot.group, slot.binding
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ScalarKind;

    const VS: &str = r#"
struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) tex: vec2<f32>,
};

@group(0) @binding(0) var<uniform> u_mvp: mat4x4<f32>;

@vertex
fn vs_main(@location(3) a_pos: vec2<f32>, @location(1) a_tex: vec2<f32>) -> VertexOut {
    var out: VertexOut;
    out.position = u_mvp * vec4<f32>(a_pos, 0.0, 1.0);
    out.tex = a_tex;
    return out;
}
"#;

    const VS_STRUCT: &str = r#"
struct VertexIn {
    @location(2) a_pos: vec2<f32>,
    @location(5) a_offset: vec2<f32>,
};

@vertex
fn vs_main(in: VertexIn) -> @builtin(position) vec4<f32> {
    return vec4<f32>(in.a_pos + in.a_offset, 0.0, 1.0);
}
"#;

    const FS: &str = r#"
@group(0) @binding(1) var u_diffuse: texture_2d<f32>;
@group(0) @binding(2) var u_sampler: sampler;

@fragment
fn fs_main(@location(0) tex: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(u_diffuse, u_sampler, tex);
}
"#;

    const FS_SOLID: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
"#;

    const ATTRS: &[(&str, AttribDesc)] = &[
        ("a_pos", AttribDesc::float(2)),
        ("a_tex", AttribDesc::float(2)),
    ];

    fn desc<'a>(
        vs: &'a str,
        fs: &'a str,
        attributes: &'a [(&'a str, AttribDesc)],
    ) -> ProgramDesc<'a> {
        ProgramDesc {
            label: "test program",
            vertex: VertexStageDesc {
                source: vs,
                entry_point: "vs_main",
                attributes,
            },
            fragment: StageDesc {
                source: fs,
                entry_point: "fs_main",
            },
            target: ProgramTarget::opaque(wgpu::TextureFormat::Rgba8Unorm),
        }
    }

    // ── compile ───────────────────────────────────────────────────────────

    #[test]
    fn vertex_syntax_error_names_vertex_stage() {
        let err = ProgramLayout::link(&desc("@vertex fn vs_main( {", FS, ATTRS)).unwrap_err();
        assert!(matches!(err, ShaderError::Compile { stage: ShaderStage::Vertex, .. }));
        assert!(err.to_string().contains("VERTEX"), "{err}");
    }

    #[test]
    fn fragment_type_error_names_fragment_stage() {
        let bad = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1.0; }";
        let err = ProgramLayout::link(&desc(VS, bad, ATTRS)).unwrap_err();
        assert!(matches!(err, ShaderError::Compile { stage: ShaderStage::Fragment, .. }));
        assert!(err.to_string().contains("FRAGMENT"), "{err}");
    }

    #[test]
    fn compile_log_is_kept() {
        let ShaderError::Compile { log, .. } =
            ProgramLayout::link(&desc("not wgsl at all", FS, ATTRS)).unwrap_err()
        else {
            panic!("expected compile error");
        };
        assert!(!log.is_empty());
    }

    // ── link ──────────────────────────────────────────────────────────────

    #[test]
    fn attribute_locations_resolved_from_arguments() {
        let layout = ProgramLayout::link(&desc(VS, FS, ATTRS)).unwrap();
        let pos = layout.attribute("a_pos").unwrap();
        let tex = layout.attribute("a_tex").unwrap();
        assert_eq!((pos.location, pos.slot), (3, 0));
        assert_eq!((tex.location, tex.slot), (1, 1));
        assert_eq!(pos.format, wgpu::VertexFormat::Float32x2);
        assert_eq!(pos.array_stride, 8);
    }

    #[test]
    fn attribute_locations_resolved_from_struct_members() {
        let attrs = [
            ("a_pos", AttribDesc::float(2)),
            ("a_offset", AttribDesc::float(2).divisor(1)),
        ];
        let layout = ProgramLayout::link(&desc(VS_STRUCT, FS_SOLID, &attrs)).unwrap();
        assert_eq!(layout.attribute("a_pos").unwrap().location, 2);
        let offset = layout.attribute("a_offset").unwrap();
        assert_eq!(offset.location, 5);
        assert_eq!(offset.step_mode, wgpu::VertexStepMode::Instance);
    }

    #[test]
    fn attributes_keep_declaration_order() {
        let layout = ProgramLayout::link(&desc(VS, FS, ATTRS)).unwrap();
        let names: Vec<&str> = layout.attributes().map(|(n, _)| n).collect();
        assert_eq!(names, ["a_pos", "a_tex"]);
    }

    #[test]
    fn undeclared_shader_input_fails_link() {
        let attrs = [("a_color", AttribDesc::float(4))];
        let err = ProgramLayout::link(&desc(VS, FS, &attrs)).unwrap_err();
        assert!(matches!(err, ShaderError::Link(ref m) if m.contains("a_color")), "{err}");
    }

    #[test]
    fn duplicate_attribute_fails_link() {
        let attrs = [("a_pos", AttribDesc::float(2)), ("a_pos", AttribDesc::float(2))];
        assert!(matches!(
            ProgramLayout::link(&desc(VS, FS, &attrs)),
            Err(ShaderError::Link(_))
        ));
    }

    #[test]
    fn unsupported_format_reported() {
        let attrs = [
            ("a_pos", AttribDesc::new(3, ScalarKind::Uint8)),
            ("a_tex", AttribDesc::float(2)),
        ];
        assert!(matches!(
            ProgramLayout::link(&desc(VS, FS, &attrs)),
            Err(ShaderError::UnsupportedFormat { size: 3, .. })
        ));
    }

    #[test]
    fn missing_entry_point_fails_link() {
        let mut d = desc(VS, FS, ATTRS);
        d.fragment.entry_point = "main";
        let err = ProgramLayout::link(&d).unwrap_err();
        assert!(err.to_string().contains("FRAGMENT entry point"), "{err}");
    }

    #[test]
    fn unwritten_varying_fails_link() {
        let err = ProgramLayout::link(&desc(VS_STRUCT, FS, &[
            ("a_pos", AttribDesc::float(2)),
            ("a_offset", AttribDesc::float(2)),
        ]))
        .unwrap_err();
        assert!(matches!(err, ShaderError::Link(ref m) if m.contains("@location(0)")), "{err}");
    }

    #[test]
    fn unbound_shader_input_fails_link() {
        let vs = r#"
@vertex
fn vs_main(@location(0) a_pos: vec2<f32>, @location(1) a_color: vec4<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(a_pos, 0.0, 1.0) * a_color.a;
}
"#;
        let err = ProgramLayout::link(&desc(vs, FS_SOLID, &[("a_pos", AttribDesc::float(2))]))
            .unwrap_err();
        assert!(
            matches!(err, ShaderError::Link(ref m) if m.contains("a_color") && m.contains("@location(1)")),
            "{err}"
        );
    }

    #[test]
    fn float_data_into_integer_input_fails_link() {
        let vs = r#"
@vertex
fn vs_main(@location(0) a_cell: vec2<u32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(vec2<f32>(a_cell), 0.0, 1.0);
}
"#;
        let err = ProgramLayout::link(&desc(vs, FS_SOLID, &[("a_cell", AttribDesc::float(2))]))
            .unwrap_err();
        assert!(matches!(err, ShaderError::Link(ref m) if m.contains("a_cell")), "{err}");

        let attrs = [("a_cell", AttribDesc::new(2, ScalarKind::Sint16))];
        assert!(matches!(
            ProgramLayout::link(&desc(vs, FS_SOLID, &attrs)),
            Err(ShaderError::Link(_))
        ));

        let attrs = [("a_cell", AttribDesc::new(2, ScalarKind::Uint16))];
        let layout = ProgramLayout::link(&desc(vs, FS_SOLID, &attrs)).unwrap();
        assert_eq!(layout.attribute("a_cell").unwrap().format, wgpu::VertexFormat::Uint16x2);
    }

    #[test]
    fn normalized_integers_feed_float_inputs() {
        let attrs = [
            ("a_pos", AttribDesc::new(2, ScalarKind::Sint16).normalized()),
            ("a_tex", AttribDesc::new(2, ScalarKind::Uint16).normalized()),
        ];
        let layout = ProgramLayout::link(&desc(VS, FS, &attrs)).unwrap();
        assert_eq!(layout.attribute("a_tex").unwrap().format, wgpu::VertexFormat::Unorm16x2);

        let attrs = [
            ("a_pos", AttribDesc::new(2, ScalarKind::Sint16)),
            ("a_tex", AttribDesc::float(2)),
        ];
        assert!(matches!(
            ProgramLayout::link(&desc(VS, FS, &attrs)),
            Err(ShaderError::Link(ref m)) if m.contains("a_pos")
        ));
    }

    #[test]
    fn uniforms_collected_from_both_stages() {
        let layout = ProgramLayout::link(&desc(VS, FS, ATTRS)).unwrap();
        assert_eq!(layout.uniform("u_mvp"), Some(UniformSlot { group: 0, binding: 0 }));
        assert_eq!(layout.uniform("u_diffuse"), Some(UniformSlot { group: 0, binding: 1 }));
        assert_eq!(layout.uniform("u_sampler"), Some(UniformSlot { group: 0, binding: 2 }));
        assert_eq!(layout.uniform("u_missing"), None);
    }

    // ── buffer bindings ───────────────────────────────────────────────────

    fn linked() -> ProgramLayout {
        ProgramLayout::link(&desc(VS, FS, ATTRS)).unwrap()
    }

    #[test]
    fn buffers_resolve_in_slot_order() {
        let resolved = linked()
            .resolve_buffers(&[("a_tex", BufferKind::Vertex), ("a_pos", BufferKind::Vertex)])
            .unwrap();
        assert_eq!(resolved, [(0, 1), (1, 0)]);
    }

    #[test]
    fn unknown_attribute_binding_rejected() {
        assert_eq!(
            linked().resolve_buffers(&[
                ("a_pos", BufferKind::Vertex),
                ("a_tex", BufferKind::Vertex),
                ("a_normal", BufferKind::Vertex),
            ]),
            Err(ShaderError::UnknownAttribute("a_normal".into()))
        );
    }

    #[test]
    fn unbound_attribute_rejected() {
        assert_eq!(
            linked().resolve_buffers(&[("a_pos", BufferKind::Vertex)]),
            Err(ShaderError::MissingBinding("a_tex".into()))
        );
    }

    #[test]
    fn index_buffer_as_attribute_rejected() {
        assert_eq!(
            linked().resolve_buffers(&[("a_pos", BufferKind::Index), ("a_tex", BufferKind::Vertex)]),
            Err(ShaderError::WrongBufferKind {
                name: "a_pos".into(),
                kind: BufferKind::Index,
            })
        );
    }

    #[test]
    fn attribute_bound_twice_rejected() {
        assert_eq!(
            linked().resolve_buffers(&[
                ("a_pos", BufferKind::Vertex),
                ("a_tex", BufferKind::Vertex),
                ("a_pos", BufferKind::Vertex),
            ]),
            Err(ShaderError::DuplicateBinding("a_pos".into()))
        );
    }

    // ── uniform bindings ──────────────────────────────────────────────────

    #[test]
    fn uniforms_resolve_to_one_group() {
        assert_eq!(
            linked().resolve_uniforms(&["u_sampler", "u_mvp"]),
            Ok((0, vec![2, 0]))
        );
    }

    #[test]
    fn unknown_uniform_rejected() {
        assert_eq!(
            linked().resolve_uniforms(&["u_mvp", "u_normal"]),
            Err(ShaderError::UnknownUniform("u_normal".into()))
        );
    }

    #[test]
    fn uniforms_across_groups_rejected() {
        let fs = r#"
@group(1) @binding(0) var<uniform> u_tint: vec4<f32>;

@fragment
fn fs_main(@location(0) tex: vec2<f32>) -> @location(0) vec4<f32> {
    return u_tint * vec4<f32>(tex, 0.0, 1.0);
}
"#;
        let layout = ProgramLayout::link(&desc(VS, fs, ATTRS)).unwrap();
        assert_eq!(
            layout.resolve_uniforms(&["u_mvp", "u_tint"]),
            Err(ShaderError::MixedUniformGroups {
                expected: 0,
                found: 1,
            })
        );
    }

    #[test]
    fn empty_uniform_list_rejected() {
        assert_eq!(linked().resolve_uniforms(&[]), Err(ShaderError::NoUniforms));
    }
}
