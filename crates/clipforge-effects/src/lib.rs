//! ClipForge Effects - Transition and overlay resolution
//!
//! Turns clip adjacency and per-clip parameters into concrete effect
//! descriptors the render planner can compile. Resolution is pure and
//! deterministic; nothing here touches ffmpeg.

pub mod descriptor;
pub mod resolver;

pub use descriptor::{xfade_name, EffectDescriptor};
pub use resolver::resolve;
