//! Final composite: scene plus bloom, tone mapped, written to the surface.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::assets::{ShaderKind, ShaderSource};
use crate::shading::post::DISPLAY_GAMMA;

use super::bindings::{Binding, BindingKind};
use super::fullscreen::{draw_fullscreen, fullscreen_program};
use super::program::ShaderProgram;
use super::targets::{PingPongPair, RenderTarget};
use super::RenderCtx;

pub const COMPOSITE_BINDINGS: &[Binding] = &[
    Binding::fragment("params", 0, BindingKind::Uniform),
    Binding::fragment("scene", 1, BindingKind::Texture),
    Binding::fragment("bloom", 2, BindingKind::Texture),
    Binding::fragment("post_sampler", 3, BindingKind::Sampler),
];

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CompositeParams {
    /// x: exposure, y: bloom intensity, z: display gamma.
    pub values: [f32; 4],
}

impl CompositeParams {
    pub fn new(exposure: f32, intensity: f32) -> Self {
        Self {
            values: [exposure, intensity, DISPLAY_GAMMA, 0.0],
        }
    }
}

pub struct CompositePass {
    program: ShaderProgram,
    /// One per possible bloom source buffer.
    bind_groups: [wgpu::BindGroup; 2],
    _params: wgpu::Buffer,
}

impl CompositePass {
    pub fn new(
        ctx: &RenderCtx<'_>,
        shaders: &dyn ShaderSource,
        scene: &RenderTarget,
        ping_pong: &PingPongPair,
        sampler: &wgpu::Sampler,
        exposure: f32,
        intensity: f32,
    ) -> Self {
        let program = fullscreen_program(
            ctx,
            "lumen composite pass",
            &shaders.source(ShaderKind::FullscreenVertex),
            &shaders.source(ShaderKind::CompositeFragment),
            COMPOSITE_BINDINGS,
            ctx.surface_format,
        );

        let params = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen composite params"),
            contents: bytemuck::bytes_of(&CompositeParams::new(exposure, intensity)),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_groups = [0usize, 1].map(|bloom| {
            program.bind_group(
                ctx.device,
                "lumen composite bind group",
                &[
                    params.as_entire_binding(),
                    wgpu::BindingResource::TextureView(&scene.view),
                    wgpu::BindingResource::TextureView(&ping_pong.get(bloom).view),
                    wgpu::BindingResource::Sampler(sampler),
                ],
            )
        });

        Self {
            program,
            bind_groups,
            _params: params,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.program.is_valid()
    }

    pub fn record(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView, bloom_index: usize) {
        draw_fullscreen(
            encoder,
            "lumen composite pass",
            output,
            &self.program,
            &self.bind_groups[bloom_index & 1],
        );
    }
}
