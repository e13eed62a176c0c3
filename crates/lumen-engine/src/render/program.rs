//! Shader programs: validated WGSL, a binding table, and a render pipeline.

use super::bindings::{self, Binding, BindingError};
use super::RenderCtx;

/// Fixed-function state a program is built with.
pub struct ProgramDesc<'a> {
    pub label: &'static str,
    pub vertex_source: &'a str,
    pub fragment_source: &'a str,
    pub bindings: &'static [Binding],
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub targets: &'a [Option<wgpu::ColorTargetState>],
    pub depth_stencil: Option<wgpu::DepthStencilState>,
    pub cull_mode: Option<wgpu::Face>,
}

/// Why a program has no pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("{stage} shader of `{label}` failed to parse:\n{message}")]
    Parse {
        label: &'static str,
        stage: &'static str,
        message: String,
    },

    #[error("{stage} shader of `{label}` failed validation: {message}")]
    Validate {
        label: &'static str,
        stage: &'static str,
        message: String,
    },

    #[error("{stage} shader of `{label}` has no `{entry_point}` entry point")]
    MissingEntryPoint {
        label: &'static str,
        stage: &'static str,
        entry_point: &'static str,
    },

    #[error("stages of `{label}` do not link")]
    Interface {
        label: &'static str,
        #[source]
        source: InterfaceError,
    },

    #[error("binding table of `{label}` does not match its shaders")]
    Bindings {
        label: &'static str,
        #[source]
        source: BindingError,
    },
}

/// A mismatch between the stages of a program or its fixed-function state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterfaceError {
    #[error("fragment input @location({0}) is not written by the vertex stage")]
    UnwrittenVarying(u32),

    #[error("@location({0}) has different types in the vertex and fragment stages")]
    VaryingType(u32),

    #[error("vertex input @location({0}) has no vertex attribute")]
    MissingAttribute(u32),

    #[error("vertex input @location({0}) cannot read attribute format {1:?}")]
    AttributeFormat(u32, wgpu::VertexFormat),

    #[error("fragment output @location({0}) has no color target")]
    MissingTarget(u32),
}

/// Fixed-function state the entry points are linked against.
#[derive(Clone, Copy)]
pub struct PipelineInterface<'a> {
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub color_targets: usize,
}

impl PipelineInterface<'static> {
    /// A fullscreen pass: no vertex buffers and one color target.
    pub const FULLSCREEN: PipelineInterface<'static> = PipelineInterface {
        vertex_buffers: &[],
        color_targets: 1,
    };
}

/// Parses and validates one WGSL stage on the CPU.
pub fn validate_wgsl(
    label: &'static str,
    stage: &'static str,
    source: &str,
) -> Result<naga::Module, ProgramError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ProgramError::Parse {
        label,
        stage,
        message: e.emit_to_string(source),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| ProgramError::Validate {
        label,
        stage,
        message: format!("{e:?}"),
    })?;

    Ok(module)
}

/// Runs every CPU-side check a program goes through before pipeline creation.
pub fn check_program(
    label: &'static str,
    vertex_source: &str,
    fragment_source: &str,
    table: &[Binding],
    interface: PipelineInterface<'_>,
) -> Result<(), ProgramError> {
    let vs = validate_wgsl(label, "vertex", vertex_source)?;
    let fs = validate_wgsl(label, "fragment", fragment_source)?;
    let vs_main = require_entry_point(label, &vs, "vertex", "vs_main", naga::ShaderStage::Vertex)?;
    let fs_main =
        require_entry_point(label, &fs, "fragment", "fs_main", naga::ShaderStage::Fragment)?;
    check_interface(&vs, vs_main, &fs, fs_main, interface)
        .map_err(|source| ProgramError::Interface { label, source })?;
    bindings::validate_table(table)
        .and_then(|()| bindings::check_against_modules(table, &[&vs, &fs]))
        .map_err(|source| ProgramError::Bindings { label, source })
}

fn require_entry_point<'m>(
    label: &'static str,
    module: &'m naga::Module,
    stage_name: &'static str,
    entry_point: &'static str,
    stage: naga::ShaderStage,
) -> Result<&'m naga::EntryPoint, ProgramError> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.name == entry_point && ep.stage == stage)
        .ok_or(ProgramError::MissingEntryPoint {
            label,
            stage: stage_name,
            entry_point,
        })
}

/// Links vertex inputs to attributes, varyings across stages and fragment
/// outputs to color targets.
fn check_interface(
    vs: &naga::Module,
    vs_main: &naga::EntryPoint,
    fs: &naga::Module,
    fs_main: &naga::EntryPoint,
    interface: PipelineInterface<'_>,
) -> Result<(), InterfaceError> {
    let attributes: Vec<&wgpu::VertexAttribute> = interface
        .vertex_buffers
        .iter()
        .flat_map(|buffer| buffer.attributes.iter())
        .collect();

    for (location, inner) in argument_locations(vs, vs_main) {
        let attribute = attributes
            .iter()
            .find(|a| a.shader_location == location)
            .ok_or(InterfaceError::MissingAttribute(location))?;
        if let (Some(format_float), Some(shader_float)) =
            (format_is_float(attribute.format), scalar_is_float(&inner))
        {
            if format_float != shader_float {
                return Err(InterfaceError::AttributeFormat(location, attribute.format));
            }
        }
    }

    let varyings = result_locations(vs, vs_main);
    for (location, inner) in argument_locations(fs, fs_main) {
        let (_, written) = varyings
            .iter()
            .find(|(l, _)| *l == location)
            .ok_or(InterfaceError::UnwrittenVarying(location))?;
        if *written != inner {
            return Err(InterfaceError::VaryingType(location));
        }
    }

    for (location, _) in result_locations(fs, fs_main) {
        if location as usize >= interface.color_targets {
            return Err(InterfaceError::MissingTarget(location));
        }
    }

    Ok(())
}

fn argument_locations(module: &naga::Module, ep: &naga::EntryPoint) -> Vec<(u32, naga::TypeInner)> {
    let mut out = Vec::new();
    for arg in &ep.function.arguments {
        collect_locations(module, arg.ty, arg.binding.as_ref(), &mut out);
    }
    out
}

fn result_locations(module: &naga::Module, ep: &naga::EntryPoint) -> Vec<(u32, naga::TypeInner)> {
    let mut out = Vec::new();
    if let Some(result) = &ep.function.result {
        collect_locations(module, result.ty, result.binding.as_ref(), &mut out);
    }
    out
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<(u32, naga::TypeInner)>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.push((*location, module.types[ty].inner.clone()));
        }
        Some(_) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn scalar_is_float(inner: &naga::TypeInner) -> Option<bool> {
    match inner {
        naga::TypeInner::Scalar(scalar) | naga::TypeInner::Vector { scalar, .. } => {
            Some(scalar.kind == naga::ScalarKind::Float)
        }
        _ => None,
    }
}

fn format_is_float(format: wgpu::VertexFormat) -> Option<bool> {
    use wgpu::VertexFormat as F;
    match format {
        F::Float32 | F::Float32x2 | F::Float32x3 | F::Float32x4 => Some(true),
        F::Float16x2 | F::Float16x4 => Some(true),
        F::Unorm8x4 | F::Snorm8x4 | F::Unorm16x2 | F::Unorm16x4 => Some(true),
        F::Uint32 | F::Uint32x2 | F::Uint32x3 | F::Uint32x4 => Some(false),
        F::Sint32 | F::Sint32x2 | F::Sint32x3 | F::Sint32x4 => Some(false),
        _ => None,
    }
}

/// An immutable compiled program.
///
/// A program whose sources fail validation keeps its bind group layout but has
/// no pipeline; passes skip their draw when [`ShaderProgram::pipeline`] is `None`.
pub struct ShaderProgram {
    pub label: &'static str,
    pub bindings: &'static [Binding],
    pub bind_group_layout: wgpu::BindGroupLayout,
    pipeline: Option<wgpu::RenderPipeline>,
}

impl ShaderProgram {
    pub fn new(ctx: &RenderCtx<'_>, desc: &ProgramDesc<'_>) -> Self {
        let bind_group_layout =
            ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(desc.label),
                entries: &bindings::layout_entries(desc.bindings),
            });

        let pipeline = match check_program(
            desc.label,
            desc.vertex_source,
            desc.fragment_source,
            desc.bindings,
            PipelineInterface {
                vertex_buffers: desc.vertex_buffers,
                color_targets: desc.targets.len(),
            },
        ) {
            Ok(()) => Some(Self::create_pipeline(ctx, desc, &bind_group_layout)),
            Err(err) => {
                log::error!("{err}");
                match &err {
                    ProgramError::Bindings { source, .. } => log::error!("  {source}"),
                    ProgramError::Interface { source, .. } => log::error!("  {source}"),
                    _ => {}
                }
                None
            }
        };

        if pipeline.is_some() {
            log::debug!("program `{}` ready", desc.label);
        }

        Self {
            label: desc.label,
            bindings: desc.bindings,
            bind_group_layout,
            pipeline,
        }
    }

    pub fn pipeline(&self) -> Option<&wgpu::RenderPipeline> {
        self.pipeline.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Creates a bind group for this program. `resources` are given in table
    /// order.
    pub fn bind_group(
        &self,
        device: &wgpu::Device,
        label: &str,
        resources: &[wgpu::BindingResource<'_>],
    ) -> wgpu::BindGroup {
        let entries: Vec<wgpu::BindGroupEntry<'_>> = self
            .bindings
            .iter()
            .zip(resources.iter().cloned())
            .map(|(b, resource)| wgpu::BindGroupEntry {
                binding: b.slot,
                resource,
            })
            .collect();

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.bind_group_layout,
            entries: &entries,
        })
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn create_pipeline(
        ctx: &RenderCtx<'_>,
        desc: &ProgramDesc<'_>,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let vs = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.vertex_source.into()),
        });
        let fs = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.fragment_source.into()),
        });

        let layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(desc.label),
            bind_group_layouts: &[bind_group_layout],
            immediate_size: 0,
        });

        ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &vs,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: desc.vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fs,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: desc.targets,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: desc.cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: desc.depth_stencil.clone(),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }
}

/// Color target without blending.
pub fn opaque_target(format: wgpu::TextureFormat) -> Option<wgpu::ColorTargetState> {
    Some(wgpu::ColorTargetState {
        format,
        blend: None,
        write_mask: wgpu::ColorWrites::ALL,
    })
}
