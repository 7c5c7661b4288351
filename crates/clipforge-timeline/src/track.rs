//! Track types for the timeline.

use clipforge_core::{RationalTime, TimeRange};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::asset::MediaKind;
use crate::clip::Clip;

/// Kind of track. Overlay tracks hold text clips; image clips sit on
/// video tracks alongside footage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Video,
    Audio,
    Overlay,
}

impl TrackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Overlay => "overlay",
        }
    }

    /// Whether an asset of the given media kind may be placed here.
    pub fn accepts(self, kind: MediaKind) -> bool {
        matches!(
            (self, kind),
            (Self::Video, MediaKind::Video)
                | (Self::Video, MediaKind::Image)
                | (Self::Audio, MediaKind::Audio)
        )
    }
}

/// An ordered, non-overlapping lane of clips of one media kind.
///
/// The clip vector is kept sorted by timeline start; the timeline's
/// operations validate before inserting so the no-overlap invariant
/// holds at every public observation point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: Uuid,
    pub name: String,
    pub kind: TrackKind,
    pub clips: Vec<Clip>,
    pub muted: bool,
    pub locked: bool,
}

impl Track {
    pub fn new(kind: TrackKind, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            clips: Vec::new(),
            muted: false,
            locked: false,
        }
    }

    /// End of the last clip, or zero for an empty track.
    pub fn duration(&self) -> RationalTime {
        self.clips
            .last()
            .map(|c| c.end())
            .unwrap_or(RationalTime::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn find_clip(&self, id: Uuid) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    pub fn find_clip_mut(&mut self, id: Uuid) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == id)
    }

    pub fn clip_index(&self, id: Uuid) -> Option<usize> {
        self.clips.iter().position(|c| c.id == id)
    }

    /// The clip whose span contains the given time, if any.
    pub fn clip_at_time(&self, time: RationalTime) -> Option<&Clip> {
        self.clips.iter().find(|c| c.span().contains(time))
    }

    /// First clip whose span overlaps `range`, excluding `exclude`.
    /// Used by every placement validation.
    pub fn conflicting_clip(&self, range: TimeRange, exclude: Option<Uuid>) -> Option<&Clip> {
        self.clips
            .iter()
            .find(|c| Some(c.id) != exclude && c.span().overlaps(range))
    }

    /// Insert keeping the start-order invariant. The caller has already
    /// validated that no overlap results.
    pub fn insert_sorted(&mut self, clip: Clip) {
        let at = self
            .clips
            .iter()
            .position(|c| c.start > clip.start)
            .unwrap_or(self.clips.len());
        self.clips.insert(at, clip);
    }

    pub fn remove_clip(&mut self, id: Uuid) -> Option<Clip> {
        let at = self.clip_index(id)?;
        Some(self.clips.remove(at))
    }

    /// Verify the sorted/non-overlap invariant. Cheap enough to assert
    /// in tests after every mutation.
    pub fn is_well_formed(&self) -> bool {
        self.clips.windows(2).all(|w| w[0].end() <= w[1].start)
    }
}
