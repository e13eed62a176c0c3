//! Ping-pong separable Gaussian blur.
//!
//! Bind groups are prepared once for every (source buffer, direction) pair
//! the schedule can produce, so recording a frame only selects among them.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::assets::{ShaderKind, ShaderSource};
use crate::shading::GAUSSIAN_WEIGHTS;

use super::bindings::{Binding, BindingKind};
use super::fullscreen::{draw_fullscreen, fullscreen_program};
use super::program::ShaderProgram;
use super::state::{BlurSchedule, PipelineState};
use super::targets::PingPongPair;
use super::RenderCtx;

pub const BLUR_BINDINGS: &[Binding] = &[
    Binding::fragment("params", 0, BindingKind::Uniform),
    Binding::fragment("image", 1, BindingKind::Texture),
    Binding::fragment("image_sampler", 2, BindingKind::Sampler),
];

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BlurParams {
    /// Taps 0..3 in the first vector, tap 4 in `.x` of the second.
    pub weights: [[f32; 4]; 2],
    /// Unit step along the active axis in `.xy`.
    pub direction: [f32; 4],
}

impl BlurParams {
    pub fn new(horizontal: bool) -> Self {
        let w = GAUSSIAN_WEIGHTS;
        let direction = if horizontal {
            [1.0, 0.0, 0.0, 0.0]
        } else {
            [0.0, 1.0, 0.0, 0.0]
        };
        Self {
            weights: [[w[0], w[1], w[2], w[3]], [w[4], 0.0, 0.0, 0.0]],
            direction,
        }
    }
}

pub struct BlurPass {
    program: ShaderProgram,
    /// Indexed by `[source buffer][horizontal as usize]`.
    bind_groups: [[wgpu::BindGroup; 2]; 2],
    _params: [wgpu::Buffer; 2],
    iterations: u32,
}

impl BlurPass {
    pub fn new(
        ctx: &RenderCtx<'_>,
        shaders: &dyn ShaderSource,
        ping_pong: &PingPongPair,
        sampler: &wgpu::Sampler,
        iterations: u32,
    ) -> Self {
        let program = fullscreen_program(
            ctx,
            "lumen blur pass",
            &shaders.source(ShaderKind::FullscreenVertex),
            &shaders.source(ShaderKind::BlurFragment),
            BLUR_BINDINGS,
            ping_pong.format(),
        );

        let params = [false, true].map(|horizontal| {
            ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("lumen blur params"),
                contents: bytemuck::bytes_of(&BlurParams::new(horizontal)),
                usage: wgpu::BufferUsages::UNIFORM,
            })
        });

        let bind_groups = [0usize, 1].map(|src| {
            [0usize, 1].map(|dir| {
                program.bind_group(
                    ctx.device,
                    "lumen blur bind group",
                    &[
                        params[dir].as_entire_binding(),
                        wgpu::BindingResource::TextureView(&ping_pong.get(src).view),
                        wgpu::BindingResource::Sampler(sampler),
                    ],
                )
            })
        });

        Self {
            program,
            bind_groups,
            _params: params,
            iterations,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.program.is_valid()
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Records every blur iteration and returns the index of the ping-pong
    /// buffer holding the result. `state` is reset first and left at its
    /// end-of-frame value.
    pub fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        ping_pong: &PingPongPair,
        state: &mut PipelineState,
    ) -> usize {
        let mut schedule = BlurSchedule::resume(state.clone(), self.iterations);
        for step in schedule.by_ref() {
            let bind_group = &self.bind_groups[step.read.index()][usize::from(step.horizontal)];
            log::trace!(
                "blur {}: {} {} -> {}",
                step.iteration,
                if step.horizontal { "h" } else { "v" },
                step.read.index(),
                step.write
            );
            draw_fullscreen(
                encoder,
                "lumen blur pass",
                &ping_pong.get(step.write).view,
                &self.program,
                bind_group,
            );
        }
        *state = schedule.state().clone();
        state.final_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_carry_kernel_and_axis() {
        let h = BlurParams::new(true);
        let v = BlurParams::new(false);
        assert_eq!(h.direction[..2], [1.0, 0.0]);
        assert_eq!(v.direction[..2], [0.0, 1.0]);
        assert_eq!(h.weights[0][0], 0.227027);
        assert_eq!(h.weights[1][0], 0.016216);
        assert_eq!(h.weights, v.weights);
        assert_eq!(std::mem::size_of::<BlurParams>(), 48);
    }
}
