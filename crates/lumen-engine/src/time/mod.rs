//! Time subsystem.
//!
//! Provides frame timing without coupling to the runtime.
//! - one `FrameClock` per render loop
//! - call `tick()` once per presented frame to obtain `FrameTime`
//!
//! `FrameTime::elapsed` drives animation and lights; `FrameTime::dt` drives
//! camera movement.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
