//! Lumen engine crate.
//!
//! Platform runtime (window, device, input, time) plus the physically based
//! shading and HDR bloom pipeline driven by the viewer.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod config;
pub mod assets;
pub mod scene;
pub mod shading;
pub mod render;
