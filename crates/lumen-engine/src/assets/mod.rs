//! Asset loading: textures, meshes and shader sources.
//!
//! Loaders degrade instead of failing: a texture that cannot be decoded is
//! `None`, a mesh that cannot be read is empty, and shader text is passed
//! through for validation downstream.

pub mod image;
pub mod obj;
pub mod shaders;

pub use self::image::{load_texture, ImageRgba8};
pub use obj::load_mesh;
pub use shaders::{EmbeddedShaders, ShaderDir, ShaderKind, ShaderSource};
