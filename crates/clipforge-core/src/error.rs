//! Error taxonomy for ClipForge.
//!
//! Three families, matching how callers must react:
//! validation errors (synchronous, recoverable, never corrupt state),
//! resource errors (surfaced with path/reason, no automatic retry),
//! execution errors (arise only while an export runs; the timeline is
//! never touched and partial output is discarded).

use crate::time::{RationalTime, TimeRange};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ClipForgeError {
    // ── Validation ──────────────────────────────────────────────

    #[error("clip range {incoming:?} overlaps existing clip {existing} on track {track}")]
    Overlap {
        track: Uuid,
        existing: Uuid,
        incoming: TimeRange,
    },

    #[error("invalid range: {reason}")]
    InvalidRange { reason: String },

    #[error("time {at} is outside clip {clip} span")]
    OutOfRange { clip: Uuid, at: RationalTime },

    #[error("timeline has no video or audio clips to render")]
    EmptyTimeline,

    #[error("track {track} still contains {clips} clip(s); pass force to remove")]
    TrackNotEmpty { track: Uuid, clips: usize },

    #[error("clip of kind {clip_kind} cannot be placed on a {track_kind} track")]
    TrackKindMismatch {
        clip_kind: &'static str,
        track_kind: &'static str,
    },

    #[error("clip {clip} lacks {shortfall} of spare source material for a {needed} transition")]
    InsufficientMaterial {
        clip: Uuid,
        needed: RationalTime,
        shortfall: RationalTime,
    },

    #[error("an export is already in progress for this project")]
    ExportInProgress,

    // ── Resources ───────────────────────────────────────────────

    #[error("asset not found at {path}: {reason}")]
    MissingAsset { path: PathBuf, reason: String },

    #[error("output path {path} is not writable: {reason}")]
    Output { path: PathBuf, reason: String },

    #[error("unsupported format for {path}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    // ── Execution ───────────────────────────────────────────────

    #[error("encoder failed (exit {status:?}): {diagnostics}")]
    Encode {
        status: Option<i32>,
        diagnostics: String,
    },

    #[error("export cancelled")]
    Cancelled,

    // ── Ambient ─────────────────────────────────────────────────

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ClipForgeError {
    /// Convenience constructor used throughout the timeline operations.
    pub fn invalid_range(reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClipForgeError>;
