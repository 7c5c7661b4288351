//! Media assets and the project asset registry.

use clipforge_core::{FrameRate, RationalTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Kind of media an asset (or the clip referencing it) carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Video,
    Audio,
    Image,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Image => "image",
        }
    }
}

/// A reference to an external media file, immutable once probed.
///
/// Owned by the timeline's asset registry; clips reference assets by id
/// and never own them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub path: PathBuf,
    pub kind: MediaKind,
    /// Probed duration. Zero for still images.
    pub duration: RationalTime,
    /// Video streams only.
    pub frame_rate: Option<FrameRate>,
    /// Video and image assets.
    pub resolution: Option<(u32, u32)>,
    /// Audio streams only.
    pub sample_rate: Option<u32>,
}

impl Asset {
    pub fn new(path: impl Into<PathBuf>, kind: MediaKind, duration: RationalTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            kind,
            duration,
            frame_rate: None,
            resolution: None,
            sample_rate: None,
        }
    }

    pub fn with_frame_rate(mut self, rate: FrameRate) -> Self {
        self.frame_rate = Some(rate);
        self
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = Some((width, height));
        self
    }

    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = Some(rate);
        self
    }

    /// Display name derived from the file name.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}
