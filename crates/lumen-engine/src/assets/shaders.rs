use std::path::PathBuf;

/// The WGSL stages the pipeline is built from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderKind {
    GeometryVertex,
    PbrFragment,
    FullscreenVertex,
    BrightFragment,
    BlurFragment,
    CompositeFragment,
}

impl ShaderKind {
    pub const ALL: [ShaderKind; 6] = [
        ShaderKind::GeometryVertex,
        ShaderKind::PbrFragment,
        ShaderKind::FullscreenVertex,
        ShaderKind::BrightFragment,
        ShaderKind::BlurFragment,
        ShaderKind::CompositeFragment,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ShaderKind::GeometryVertex => "geometry_vs.wgsl",
            ShaderKind::PbrFragment => "pbr_fs.wgsl",
            ShaderKind::FullscreenVertex => "fullscreen_vs.wgsl",
            ShaderKind::BrightFragment => "bright_fs.wgsl",
            ShaderKind::BlurFragment => "blur_fs.wgsl",
            ShaderKind::CompositeFragment => "composite_fs.wgsl",
        }
    }

    fn embedded(self) -> &'static str {
        match self {
            ShaderKind::GeometryVertex => include_str!("../render/shaders/geometry_vs.wgsl"),
            ShaderKind::PbrFragment => include_str!("../render/shaders/pbr_fs.wgsl"),
            ShaderKind::FullscreenVertex => include_str!("../render/shaders/fullscreen_vs.wgsl"),
            ShaderKind::BrightFragment => include_str!("../render/shaders/bright_fs.wgsl"),
            ShaderKind::BlurFragment => include_str!("../render/shaders/blur_fs.wgsl"),
            ShaderKind::CompositeFragment => include_str!("../render/shaders/composite_fs.wgsl"),
        }
    }
}

/// Supplies WGSL text. Empty text is passed through; program validation
/// rejects it.
pub trait ShaderSource {
    fn source(&self, kind: ShaderKind) -> String;
}

/// Sources compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedShaders;

impl ShaderSource for EmbeddedShaders {
    fn source(&self, kind: ShaderKind) -> String {
        kind.embedded().to_string()
    }
}

/// Sources read from a directory at startup.
#[derive(Debug, Clone)]
pub struct ShaderDir {
    pub root: PathBuf,
}

impl ShaderDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ShaderSource for ShaderDir {
    fn source(&self, kind: ShaderKind) -> String {
        let path = self.root.join(kind.file_name());
        match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => {
                log::error!("shader {} is empty", path.display());
                text
            }
            Ok(text) => text,
            Err(err) => {
                log::error!("failed to read shader {}: {err}", path.display());
                String::new()
            }
        }
    }
}
