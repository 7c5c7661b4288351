//! ClipForge Timeline - The composition data model
//!
//! Implements the in-memory representation of a project:
//! - Asset registry and media kinds
//! - Tracks containing non-overlapping clips
//! - The timeline aggregate with atomic editing operations
//! - Read-only preview queries
//! - Versioned project persistence

pub mod asset;
pub mod clip;
pub mod preview;
pub mod serialization;
pub mod timeline;
pub mod track;

pub use asset::{Asset, MediaKind};
pub use clip::{Clip, ClipSource, TextAlignment, TextClip, TextStyle, TransitionParams, TransitionStyle};
pub use preview::{active_clips_at, ActiveClip};
pub use serialization::ProjectFile;
pub use timeline::Timeline;
pub use track::{Track, TrackKind};
