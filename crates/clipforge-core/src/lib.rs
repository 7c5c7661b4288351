//! ClipForge Core - Foundation types for the composition engine
//!
//! This crate provides the types shared by every other ClipForge crate:
//! - Time representation (RationalTime, FrameRate, TimeRange)
//! - The error taxonomy and `Result` alias

pub mod error;
pub mod time;

pub use error::{ClipForgeError, Result};
pub use time::{FrameRate, RationalTime, TimeRange};
