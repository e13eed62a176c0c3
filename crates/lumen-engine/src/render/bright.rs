//! Bright-pass extraction into ping-pong buffer 0.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::assets::{ShaderKind, ShaderSource};
use crate::shading::LUMINANCE_WEIGHTS;

use super::bindings::{Binding, BindingKind};
use super::fullscreen::{draw_fullscreen, fullscreen_program};
use super::program::ShaderProgram;
use super::targets::{PingPongPair, RenderTarget};
use super::RenderCtx;

pub const BRIGHT_BINDINGS: &[Binding] = &[
    Binding::fragment("params", 0, BindingKind::Uniform),
    Binding::fragment("source", 1, BindingKind::Texture),
    Binding::fragment("source_sampler", 2, BindingKind::Sampler),
];

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct BrightParams {
    /// xyz: luminance weights, w: threshold.
    pub luminance: [f32; 4],
}

impl BrightParams {
    pub fn new(threshold: f32) -> Self {
        Self {
            luminance: LUMINANCE_WEIGHTS.extend(threshold).to_array(),
        }
    }
}

pub struct BrightPass {
    program: ShaderProgram,
    bind_group: wgpu::BindGroup,
    _params: wgpu::Buffer,
}

impl BrightPass {
    pub fn new(
        ctx: &RenderCtx<'_>,
        shaders: &dyn ShaderSource,
        source: &RenderTarget,
        sampler: &wgpu::Sampler,
        output_format: wgpu::TextureFormat,
        threshold: f32,
    ) -> Self {
        let program = fullscreen_program(
            ctx,
            "lumen bright pass",
            &shaders.source(ShaderKind::FullscreenVertex),
            &shaders.source(ShaderKind::BrightFragment),
            BRIGHT_BINDINGS,
            output_format,
        );

        let params = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen bright params"),
            contents: bytemuck::bytes_of(&BrightParams::new(threshold)),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group = program.bind_group(
            ctx.device,
            "lumen bright bind group",
            &[
                params.as_entire_binding(),
                wgpu::BindingResource::TextureView(&source.view),
                wgpu::BindingResource::Sampler(sampler),
            ],
        );

        Self {
            program,
            bind_group,
            _params: params,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.program.is_valid()
    }

    pub fn record(&self, encoder: &mut wgpu::CommandEncoder, ping_pong: &PingPongPair) {
        draw_fullscreen(
            encoder,
            "lumen bright pass",
            &ping_pong.get(0).view,
            &self.program,
            &self.bind_group,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_pack_weights_and_threshold() {
        let p = BrightParams::new(1.0);
        assert_eq!(p.luminance, [0.2126, 0.7152, 0.0722, 1.0]);
        assert_eq!(std::mem::size_of::<BrightParams>(), 16);
    }
}
