//! CPU reference of the per-fragment math.
//!
//! The GPU evaluates these formulas in WGSL (`render/shaders`). This module
//! carries the same formulas in Rust so the invariants of the shading model and
//! of the post-process chain can be checked without a device. Constants shared
//! with the shaders (luminance weights, Gaussian kernel) are defined here and
//! uploaded as uniforms, so both sides read one definition.

pub mod brdf;
pub mod post;

pub use brdf::{shade, PointLight, SurfaceSample};
pub use post::{HdrImage, GAUSSIAN_WEIGHTS, LUMINANCE_WEIGHTS};
