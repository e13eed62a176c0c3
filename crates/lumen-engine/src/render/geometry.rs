//! Geometry pass: draws the mesh with the PBR program into the HDR set.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::assets::{ImageRgba8, ShaderKind, ShaderSource};
use crate::scene::{Camera, MeshData, ResolvedMaterial, Vertex, LIGHT_COUNT};
use crate::shading::PointLight;

use super::bindings::{Binding, BindingKind};
use super::program::{opaque_target, ProgramDesc, ShaderProgram};
use super::targets::{FramebufferSet, DEPTH_FORMAT};
use super::RenderCtx;

const VS_FS: wgpu::ShaderStages = wgpu::ShaderStages::VERTEX_FRAGMENT;

pub const GEOMETRY_BINDINGS: &[Binding] = &[
    Binding::new("frame", 0, BindingKind::Uniform, VS_FS),
    Binding::fragment("albedo_map", 1, BindingKind::Texture),
    Binding::fragment("normal_map", 2, BindingKind::Texture),
    Binding::fragment("metallic_map", 3, BindingKind::Texture),
    Binding::fragment("roughness_map", 4, BindingKind::Texture),
    Binding::fragment("ao_map", 5, BindingKind::Texture),
    Binding::fragment("material_sampler", 6, BindingKind::Sampler),
];

/// Per-frame uniforms shared by both geometry stages.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FrameUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub light_positions: [[f32; 4]; LIGHT_COUNT],
    pub light_colors: [[f32; 4]; LIGHT_COUNT],
}

impl FrameUniforms {
    pub fn new(model: Mat4, camera: &Camera, aspect: f32, lights: &[PointLight; LIGHT_COUNT]) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            projection: camera.projection_matrix(aspect).to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            light_positions: std::array::from_fn(|i| lights[i].position.extend(1.0).to_array()),
            light_colors: std::array::from_fn(|i| lights[i].color.extend(1.0).to_array()),
        }
    }
}

/// Vertex and index buffers of the uploaded mesh.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// Whether a `width`×`height` 2D texture can be created under `limits`.
pub fn fits_limits(width: u32, height: u32, limits: &wgpu::Limits) -> bool {
    width > 0
        && height > 0
        && width <= limits.max_texture_dimension_2d
        && height <= limits.max_texture_dimension_2d
}

/// Whether both mesh buffers can be created under `limits`.
pub fn mesh_fits_limits(mesh: &MeshData, limits: &wgpu::Limits) -> bool {
    let vertex_bytes = std::mem::size_of_val(mesh.vertices.as_slice()) as u64;
    let index_bytes = std::mem::size_of_val(mesh.indices.as_slice()) as u64;
    vertex_bytes <= limits.max_buffer_size
        && index_bytes <= limits.max_buffer_size
        && u32::try_from(mesh.indices.len()).is_ok()
}

/// What the geometry pass records after its clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryDraw {
    Indexed(u32),
    ClearOnly,
}

impl GeometryDraw {
    pub fn plan(program_valid: bool, index_count: Option<u32>) -> Self {
        match index_count {
            Some(count) if program_valid && count > 0 => Self::Indexed(count),
            _ => Self::ClearOnly,
        }
    }
}

impl GpuMesh {
    /// Uploads `mesh`; an empty mesh, or one too large for the device,
    /// yields `None`.
    pub fn upload(device: &wgpu::Device, mesh: &MeshData) -> Option<Self> {
        if mesh.is_empty() {
            return None;
        }
        if !mesh_fits_limits(mesh, &device.limits()) {
            log::warn!(
                "mesh with {} vertices exceeds device buffer limits; not uploading",
                mesh.vertices.len()
            );
            return None;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen mesh vbo"),
            contents: bytemuck::cast_slice::<Vertex, u8>(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen mesh ibo"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Some(Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        })
    }
}

/// Uploads an RGBA8 image with its full mip chain as a sampled 2D texture.
pub fn upload_texture(
    ctx: &RenderCtx<'_>,
    label: &str,
    image: &ImageRgba8,
) -> (wgpu::Texture, wgpu::TextureView) {
    let levels = image.mip_chain();
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: levels.len() as u32,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    for (mip_level, level) in (0u32..).zip(&levels) {
        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &level.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(level.bytes_per_row()),
                rows_per_image: Some(level.height),
            },
            wgpu::Extent3d {
                width: level.width,
                height: level.height,
                depth_or_array_layers: 1,
            },
        );
    }
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

pub struct GeometryPass {
    program: ShaderProgram,
    frame_ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    mesh: Option<GpuMesh>,
    // Kept alive for the bind group.
    _textures: Vec<wgpu::Texture>,
}

impl GeometryPass {
    pub fn new(
        ctx: &RenderCtx<'_>,
        shaders: &dyn ShaderSource,
        hdr: &FramebufferSet,
        mesh: &MeshData,
        material: &ResolvedMaterial,
    ) -> Self {
        let vertex_source = shaders.source(ShaderKind::GeometryVertex);
        let fragment_source = shaders.source(ShaderKind::PbrFragment);
        let targets: Vec<_> = hdr.color_formats().into_iter().map(opaque_target).collect();

        let program = ShaderProgram::new(
            ctx,
            &ProgramDesc {
                label: "lumen geometry",
                vertex_source: &vertex_source,
                fragment_source: &fragment_source,
                bindings: GEOMETRY_BINDINGS,
                vertex_buffers: &[Vertex::layout()],
                targets: &targets,
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                cull_mode: Some(wgpu::Face::Back),
            },
        );

        let frame_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lumen frame ubo"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lumen material sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        let limits = ctx.device.limits();
        let material = material
            .clone()
            .fit(|image| fits_limits(image.width, image.height, &limits));
        let (textures, views): (Vec<_>, Vec<_>) = material
            .maps()
            .iter()
            .map(|(name, image)| upload_texture(ctx, name, image))
            .unzip();

        let mut resources = vec![frame_ubo.as_entire_binding()];
        resources.extend(views.iter().map(wgpu::BindingResource::TextureView));
        resources.push(wgpu::BindingResource::Sampler(&sampler));
        let bind_group = program.bind_group(ctx.device, "lumen geometry bind group", &resources);

        let mesh = GpuMesh::upload(ctx.device, mesh);
        if mesh.is_none() {
            log::warn!("no mesh to draw; geometry pass will only clear");
        }

        Self {
            program,
            frame_ubo,
            bind_group,
            mesh,
            _textures: textures,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.program.is_valid()
    }

    /// Clears the HDR set and draws the mesh. The clear always happens; the
    /// draw is skipped when the mesh or the program is missing.
    pub fn record(
        &self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        hdr: &FramebufferSet,
        uniforms: &FrameUniforms,
    ) {
        ctx.queue.write_buffer(&self.frame_ubo, 0, bytemuck::bytes_of(uniforms));

        let color_attachments: Vec<_> = hdr.colors.iter().map(|t| Some(t.clear_attachment())).collect();
        let depth_stencil_attachment =
            hdr.depth.as_ref().map(|d| wgpu::RenderPassDepthStencilAttachment {
                view: &d.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            });

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen geometry pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let plan = GeometryDraw::plan(
            self.program.is_valid(),
            self.mesh.as_ref().map(|m| m.index_count),
        );
        let (GeometryDraw::Indexed(index_count), Some(pipeline), Some(mesh)) =
            (plan, self.program.pipeline(), self.mesh.as_ref())
        else {
            return;
        };

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..index_count, 0, 0..1);
    }
}
