//! The full frame: geometry → bright pass → blur → composite.

use anyhow::Context;

use crate::assets::ShaderSource;
use crate::config::BloomConfig;
use crate::scene::{MeshData, ResolvedMaterial};

use super::blur::BlurPass;
use super::bright::BrightPass;
use super::composite::CompositePass;
use super::fullscreen::post_sampler;
use super::geometry::{FrameUniforms, GeometryPass};
use super::state::PipelineState;
use super::targets::{FramebufferSet, PingPongPair};
use super::{RenderCtx, SurfaceTarget};

/// Owns every GPU resource of the bloom pipeline. Everything is created once
/// at surface size and released on drop.
pub struct BloomPipeline {
    hdr: FramebufferSet,
    ping_pong: PingPongPair,
    _sampler: wgpu::Sampler,
    geometry: GeometryPass,
    bright: BrightPass,
    blur: BlurPass,
    composite: CompositePass,
    state: PipelineState,
    width: u32,
    height: u32,
}

impl BloomPipeline {
    /// Allocates targets and builds all programs.
    ///
    /// An incomplete framebuffer is fatal. Programs that fail validation are
    /// logged and their passes skip drawing.
    pub fn new(
        ctx: &RenderCtx<'_>,
        shaders: &dyn ShaderSource,
        bloom: &BloomConfig,
        mesh: &MeshData,
        material: &ResolvedMaterial,
    ) -> anyhow::Result<Self> {
        let (width, height) = (ctx.surface_size.width, ctx.surface_size.height);

        let hdr = FramebufferSet::hdr(ctx.device, width, height)
            .context("HDR framebuffer is incomplete")?;
        let ping_pong = PingPongPair::new(ctx.device, width, height)
            .context("ping-pong framebuffer is incomplete")?;
        let bright_source = hdr
            .color("bright")
            .context("HDR framebuffer has no bright attachment")?;
        let scene = hdr
            .color("scene")
            .context("HDR framebuffer has no scene attachment")?;

        let sampler = post_sampler(ctx.device);

        let geometry = GeometryPass::new(ctx, shaders, &hdr, mesh, material);
        let bright = BrightPass::new(
            ctx,
            shaders,
            bright_source,
            &sampler,
            ping_pong.format(),
            bloom.threshold,
        );
        let blur = BlurPass::new(ctx, shaders, &ping_pong, &sampler, bloom.blur_iterations);
        let composite = CompositePass::new(
            ctx,
            shaders,
            scene,
            &ping_pong,
            &sampler,
            bloom.exposure,
            bloom.intensity,
        );

        let invalid: Vec<&str> = [
            ("geometry", geometry.is_valid()),
            ("bright", bright.is_valid()),
            ("blur", blur.is_valid()),
            ("composite", composite.is_valid()),
        ]
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name)
        .collect();
        if invalid.is_empty() {
            log::info!(
                "bloom pipeline ready ({width}x{height}, {} blur iterations)",
                blur.iterations()
            );
        } else {
            log::warn!("bloom pipeline built with invalid programs: {}", invalid.join(", "));
        }

        Ok(Self {
            hdr,
            ping_pong,
            _sampler: sampler,
            geometry,
            bright,
            blur,
            composite,
            state: PipelineState::default(),
            width,
            height,
        })
    }

    /// Aspect ratio of the off-screen targets.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Records all four passes into `target.encoder`, in dependency order.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut SurfaceTarget<'_>, uniforms: &FrameUniforms) {
        self.geometry.record(ctx, target.encoder, &self.hdr, uniforms);
        self.bright.record(target.encoder, &self.ping_pong);
        let bloom_index = self.blur.record(target.encoder, &self.ping_pong, &mut self.state);
        self.composite.record(target.encoder, target.color_view, bloom_index);
    }
}
