//! Startup configuration.
//!
//! Every tuning constant of the viewer lives here. Defaults reproduce the
//! reference look; a TOML file can override any subset of fields.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("window size {width}x{height} is not 16:9")]
    AspectRatio { width: u32, height: u32 },

    #[error("invalid value for {field}: {value}")]
    OutOfRange { field: &'static str, value: f32 },
}

/// Full viewer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LumenConfig {
    pub window: WindowConfig,
    pub animation: AnimationConfig,
    pub bloom: BloomConfig,
    pub assets: AssetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Physical pixels. Render targets are allocated at this size once.
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "PBR + Bloom".to_string(),
            width: 1600,
            height: 900,
        }
    }
}

/// Model animation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Angular speed of the walk oscillation, radians per second.
    pub walk_speed: f32,
    /// Half-length of the walk path along X (object space, before scale).
    pub walk_range: f32,
    /// Constant Y offset of the walk path.
    pub walk_height: f32,
    /// Uniform object scale.
    pub scale: f32,
    /// Spin about +Y, degrees per second.
    pub spin_degrees_per_second: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            walk_speed: 2.0,
            walk_range: 4.0,
            walk_height: 0.0,
            scale: 3.0,
            spin_degrees_per_second: 60.0,
        }
    }
}

/// Bloom and tone-mapping parameters.
///
/// Threshold, exposure and intensity are tuned by eye; they have no physical
/// derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    pub blur_iterations: u32,
    pub threshold: f32,
    pub exposure: f32,
    pub intensity: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            blur_iterations: 15,
            threshold: 1.0,
            exposure: 8.0,
            intensity: 8.2,
        }
    }
}

/// Asset locations. Relative paths resolve against the working directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub model: PathBuf,
    pub albedo: PathBuf,
    pub normal: PathBuf,
    pub metallic: PathBuf,
    pub roughness: PathBuf,
    pub ao: PathBuf,
    /// Directory with WGSL overrides. `None` uses the sources built into the binary.
    pub shader_dir: Option<PathBuf>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from("resources/model.obj"),
            albedo: PathBuf::from("resources/albedo.png"),
            normal: PathBuf::from("resources/normal.png"),
            metallic: PathBuf::from("resources/metallic.png"),
            roughness: PathBuf::from("resources/roughness.png"),
            ao: PathBuf::from("resources/ao.png"),
            shader_dir: None,
        }
    }
}

impl LumenConfig {
    /// Loads configuration from `path`.
    ///
    /// A missing file yields the defaults; an unreadable or malformed file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no config at {}; using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Checks the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let WindowConfig { width, height, .. } = self.window;
        if width == 0 || height == 0 || u64::from(width) * 9 != u64::from(height) * 16 {
            return Err(ConfigError::AspectRatio { width, height });
        }

        let bloom = &self.bloom;
        check("bloom.threshold", bloom.threshold, |v| v >= 0.0)?;
        check("bloom.exposure", bloom.exposure, |v| v > 0.0)?;
        check("bloom.intensity", bloom.intensity, |v| v >= 0.0)?;

        let anim = &self.animation;
        check("animation.scale", anim.scale, |v| v > 0.0)?;
        check("animation.walk_speed", anim.walk_speed, |_| true)?;
        check("animation.walk_range", anim.walk_range, |_| true)?;
        check("animation.walk_height", anim.walk_height, |_| true)?;
        check("animation.spin_degrees_per_second", anim.spin_degrees_per_second, |_| true)?;

        Ok(())
    }
}

fn check(field: &'static str, value: f32, ok: impl Fn(f32) -> bool) -> Result<(), ConfigError> {
    if value.is_finite() && ok(value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let c = LumenConfig::default();
        assert_eq!(c.bloom.blur_iterations, 15);
        assert_eq!(c.bloom.threshold, 1.0);
        assert_eq!(c.bloom.exposure, 8.0);
        assert_eq!(c.bloom.intensity, 8.2);
        assert_eq!(c.animation.walk_speed, 2.0);
        assert_eq!(c.animation.walk_range, 4.0);
        assert_eq!(c.animation.scale, 3.0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_overrides_only_given_fields() {
        let c = LumenConfig::from_toml(
            r#"
            [bloom]
            exposure = 2.5

            [window]
            width = 1280
            height = 720
            "#,
        )
        .unwrap();
        assert_eq!(c.bloom.exposure, 2.5);
        assert_eq!(c.bloom.intensity, 8.2);
        assert_eq!(c.window.width, 1280);
        assert_eq!(c.window.title, WindowConfig::default().title);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn non_widescreen_size_is_rejected() {
        let mut c = LumenConfig::default();
        c.window.width = 1024;
        c.window.height = 768;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::AspectRatio { width: 1024, height: 768 })
        ));
    }

    #[test]
    fn non_positive_exposure_is_rejected() {
        let mut c = LumenConfig::default();
        c.bloom.exposure = 0.0;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::OutOfRange { field: "bloom.exposure", .. })
        ));

        c.bloom.exposure = f32::NAN;
        assert!(c.validate().is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let c = LumenConfig::load("definitely/not/here/lumen.toml").unwrap();
        assert_eq!(c, LumenConfig::default());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(LumenConfig::from_toml("[bloom\nexposure = ").is_err());
    }
}
