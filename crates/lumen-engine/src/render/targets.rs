//! Off-screen render targets.
//!
//! All targets are allocated once at surface size and never resized.

use thiserror::Error;

/// HDR color format used by every off-screen color target.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Depth format of the geometry pass.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("framebuffer `{set}` has no color attachment")]
    NoColorAttachment { set: &'static str },

    #[error("framebuffer `{set}`: attachment `{name}` is {width}x{height}, expected {expected_width}x{expected_height}")]
    SizeMismatch {
        set: &'static str,
        name: &'static str,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("framebuffer `{set}`: attachment `{name}` has zero size")]
    ZeroSize { set: &'static str, name: &'static str },

    #[error("framebuffer `{set}`: {format:?} is not a renderable color format (attachment `{name}`)")]
    NotColorRenderable {
        set: &'static str,
        name: &'static str,
        format: wgpu::TextureFormat,
    },

    #[error("framebuffer `{set}`: {format:?} is not a depth format")]
    NotDepth {
        set: &'static str,
        format: wgpu::TextureFormat,
    },
}

/// A color or depth texture with its default view.
pub struct RenderTarget {
    pub name: &'static str,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

impl RenderTarget {
    pub fn new(
        device: &wgpu::Device,
        name: &'static str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        if !format.has_depth_aspect() {
            usage |= wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::COPY_DST;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(name),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            name,
            texture,
            view,
            width,
            height,
            format,
        }
    }

    pub fn hdr(device: &wgpu::Device, name: &'static str, width: u32, height: u32) -> Self {
        Self::new(device, name, width, height, HDR_FORMAT)
    }

    pub fn info(&self) -> AttachmentInfo {
        AttachmentInfo {
            name: self.name,
            width: self.width,
            height: self.height,
            format: self.format,
        }
    }

    /// Color attachment that clears to opaque black and stores.
    pub fn clear_attachment(&self) -> wgpu::RenderPassColorAttachment<'_> {
        wgpu::RenderPassColorAttachment {
            view: &self.view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        }
    }
}

/// Description of one attachment, enough to check completeness.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttachmentInfo {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

/// Checks that a set of attachments can be rendered to together.
pub fn check_complete(
    set: &'static str,
    colors: &[AttachmentInfo],
    depth: Option<&AttachmentInfo>,
) -> Result<(), TargetError> {
    let first = colors.first().ok_or(TargetError::NoColorAttachment { set })?;
    let (w, h) = (first.width, first.height);

    for a in colors.iter().chain(depth) {
        if a.width == 0 || a.height == 0 {
            return Err(TargetError::ZeroSize { set, name: a.name });
        }
        if (a.width, a.height) != (w, h) {
            return Err(TargetError::SizeMismatch {
                set,
                name: a.name,
                width: a.width,
                height: a.height,
                expected_width: w,
                expected_height: h,
            });
        }
    }

    for a in colors {
        if a.format.has_depth_aspect() || a.format.has_stencil_aspect() || a.format.is_compressed() {
            return Err(TargetError::NotColorRenderable {
                set,
                name: a.name,
                format: a.format,
            });
        }
    }

    if let Some(d) = depth {
        if !d.format.has_depth_aspect() {
            return Err(TargetError::NotDepth { set, format: d.format });
        }
    }

    Ok(())
}

/// Named color targets with an optional shared depth target.
pub struct FramebufferSet {
    pub name: &'static str,
    pub colors: Vec<RenderTarget>,
    pub depth: Option<RenderTarget>,
}

impl FramebufferSet {
    /// Wraps the targets after a completeness check.
    pub fn new(
        name: &'static str,
        colors: Vec<RenderTarget>,
        depth: Option<RenderTarget>,
    ) -> Result<Self, TargetError> {
        let infos: Vec<AttachmentInfo> = colors.iter().map(RenderTarget::info).collect();
        let depth_info = depth.as_ref().map(RenderTarget::info);
        check_complete(name, &infos, depth_info.as_ref())?;
        Ok(Self { name, colors, depth })
    }

    /// The HDR set of the geometry pass: `scene` and `bright` color outputs
    /// plus depth.
    pub fn hdr(device: &wgpu::Device, width: u32, height: u32) -> Result<Self, TargetError> {
        Self::new(
            "hdr",
            vec![
                RenderTarget::hdr(device, "scene", width, height),
                RenderTarget::hdr(device, "bright", width, height),
            ],
            Some(RenderTarget::new(device, "depth", width, height, DEPTH_FORMAT)),
        )
    }

    pub fn color(&self, name: &str) -> Option<&RenderTarget> {
        self.colors.iter().find(|t| t.name == name)
    }

    pub fn color_formats(&self) -> Vec<wgpu::TextureFormat> {
        self.colors.iter().map(|t| t.format).collect()
    }
}

/// Two identically formatted targets used alternately as blur source and
/// destination.
pub struct PingPongPair {
    targets: [RenderTarget; 2],
}

impl PingPongPair {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Result<Self, TargetError> {
        let targets = [
            RenderTarget::hdr(device, "ping-pong 0", width, height),
            RenderTarget::hdr(device, "ping-pong 1", width, height),
        ];
        check_complete("ping-pong", &[targets[0].info(), targets[1].info()], None)?;
        Ok(Self { targets })
    }

    pub fn get(&self, index: usize) -> &RenderTarget {
        &self.targets[index & 1]
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.targets[0].format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &'static str, width: u32, height: u32, format: wgpu::TextureFormat) -> AttachmentInfo {
        AttachmentInfo {
            name,
            width,
            height,
            format,
        }
    }

    #[test]
    fn hdr_layout_is_complete() {
        let colors = [
            info("scene", 1600, 900, HDR_FORMAT),
            info("bright", 1600, 900, HDR_FORMAT),
        ];
        let depth = info("depth", 1600, 900, DEPTH_FORMAT);
        assert_eq!(check_complete("hdr", &colors, Some(&depth)), Ok(()));
    }

    #[test]
    fn empty_set_is_incomplete() {
        assert_eq!(
            check_complete("hdr", &[], None),
            Err(TargetError::NoColorAttachment { set: "hdr" })
        );
    }

    #[test]
    fn mismatched_sizes_are_rejected() {
        let colors = [
            info("scene", 1600, 900, HDR_FORMAT),
            info("bright", 800, 450, HDR_FORMAT),
        ];
        assert!(matches!(
            check_complete("hdr", &colors, None),
            Err(TargetError::SizeMismatch { name: "bright", .. })
        ));

        let depth = info("depth", 1280, 720, DEPTH_FORMAT);
        assert!(matches!(
            check_complete("hdr", &colors[..1], Some(&depth)),
            Err(TargetError::SizeMismatch { name: "depth", .. })
        ));
    }

    #[test]
    fn zero_size_is_rejected() {
        let colors = [info("scene", 0, 0, HDR_FORMAT)];
        assert!(matches!(
            check_complete("hdr", &colors, None),
            Err(TargetError::ZeroSize { .. })
        ));
    }

    #[test]
    fn depth_as_color_is_rejected() {
        let colors = [info("scene", 16, 9, DEPTH_FORMAT)];
        assert!(matches!(
            check_complete("hdr", &colors, None),
            Err(TargetError::NotColorRenderable { .. })
        ));
    }

    #[test]
    fn color_as_depth_is_rejected() {
        let colors = [info("scene", 16, 9, HDR_FORMAT)];
        let depth = info("depth", 16, 9, HDR_FORMAT);
        assert!(matches!(
            check_complete("hdr", &colors, Some(&depth)),
            Err(TargetError::NotDepth { .. })
        ));
    }
}
