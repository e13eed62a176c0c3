//! GPU rendering subsystem.
//!
//! One frame runs four passes on a single encoder:
//! - geometry: PBR shading of the mesh into the HDR framebuffer set
//! - bright: luminance threshold into ping-pong buffer 0
//! - blur: alternating horizontal/vertical Gaussian over the ping-pong pair
//! - composite: scene + bloom, tone mapped, onto the surface
//!
//! Every resource is created once by [`BloomPipeline::new`] at surface size.

mod ctx;

pub mod bindings;
pub mod blur;
pub mod bright;
pub mod composite;
pub mod fullscreen;
pub mod geometry;
pub mod pipeline;
pub mod program;
pub mod state;
pub mod targets;

#[cfg(test)]
mod offscreen;

pub use bindings::{Binding, BindingError, BindingKind};
pub use ctx::{RenderCtx, SurfaceTarget};
pub use geometry::FrameUniforms;
pub use pipeline::BloomPipeline;
pub use program::{InterfaceError, PipelineInterface, ProgramError, ShaderProgram};
pub use state::{BlurSchedule, BlurSource, BlurStep, PipelineState};
pub use targets::{FramebufferSet, PingPongPair, RenderTarget, TargetError, DEPTH_FORMAT, HDR_FORMAT};
