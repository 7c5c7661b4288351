//! Resolved effect descriptors.
//!
//! Descriptors are transient: the resolver recomputes them from clip
//! adjacency and user-set parameters on every export. They are never
//! persisted as clip state.

use clipforge_core::{RationalTime, TimeRange};
use clipforge_timeline::{TextStyle, TransitionStyle};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A ready-to-render description of a transition or overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectDescriptor {
    /// Cross-transition between two zero-gap adjacent clips.
    Transition {
        from_clip: Uuid,
        to_clip: Uuid,
        /// Output region the transition occupies, centred on the cut.
        region: TimeRange,
        style: TransitionStyle,
        duration: RationalTime,
    },
    /// A text clip anchored to its timeline span.
    TextOverlay {
        clip: Uuid,
        region: TimeRange,
        text: String,
        style: TextStyle,
    },
}

impl EffectDescriptor {
    pub fn region(&self) -> TimeRange {
        match self {
            Self::Transition { region, .. } | Self::TextOverlay { region, .. } => *region,
        }
    }
}

/// The ffmpeg `xfade` transition name for a style.
pub fn xfade_name(style: TransitionStyle) -> &'static str {
    match style {
        TransitionStyle::Fade => "fade",
        TransitionStyle::Dissolve => "dissolve",
        TransitionStyle::WipeLeft => "wipeleft",
        TransitionStyle::WipeRight => "wiperight",
        TransitionStyle::SlideLeft => "slideleft",
        TransitionStyle::SlideRight => "slideright",
        TransitionStyle::ZoomIn => "zoomin",
        TransitionStyle::ZoomOut => "zoomout",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_style_maps_to_a_filter() {
        for style in TransitionStyle::ALL {
            assert!(!xfade_name(style).is_empty());
        }
    }
}
