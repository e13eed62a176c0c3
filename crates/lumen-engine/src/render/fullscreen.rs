//! Shared pieces of the fullscreen post passes.

use super::program::{opaque_target, ProgramDesc, ShaderProgram};
use super::bindings::Binding;
use super::RenderCtx;

/// Builds a program that draws one fullscreen triangle with no vertex buffers.
pub fn fullscreen_program(
    ctx: &RenderCtx<'_>,
    label: &'static str,
    vertex_source: &str,
    fragment_source: &str,
    bindings: &'static [Binding],
    format: wgpu::TextureFormat,
) -> ShaderProgram {
    ShaderProgram::new(
        ctx,
        &ProgramDesc {
            label,
            vertex_source,
            fragment_source,
            bindings,
            vertex_buffers: &[],
            targets: &[opaque_target(format)],
            depth_stencil: None,
            cull_mode: None,
        },
    )
}

/// Clamp-to-edge linear sampler for post passes.
pub fn post_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("lumen post sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Clears `view` and draws the fullscreen triangle. Skips the draw when the
/// program has no pipeline.
pub fn draw_fullscreen(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    view: &wgpu::TextureView,
    program: &ShaderProgram,
    bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
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

    let Some(pipeline) = program.pipeline() else { return };
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}
