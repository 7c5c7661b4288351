//! Clip types for the timeline.

use clipforge_core::{RationalTime, TimeRange};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transition style applied at the cut out of a clip.
///
/// Names follow ffmpeg's `xfade` transitions; the render crate maps them
/// to the filter syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionStyle {
    Fade,
    Dissolve,
    WipeLeft,
    WipeRight,
    SlideLeft,
    SlideRight,
    ZoomIn,
    ZoomOut,
}

impl TransitionStyle {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Fade => "Fade",
            Self::Dissolve => "Dissolve",
            Self::WipeLeft => "Wipe Left",
            Self::WipeRight => "Wipe Right",
            Self::SlideLeft => "Slide Left",
            Self::SlideRight => "Slide Right",
            Self::ZoomIn => "Zoom In",
            Self::ZoomOut => "Zoom Out",
        }
    }

    pub const ALL: [Self; 8] = [
        Self::Fade,
        Self::Dissolve,
        Self::WipeLeft,
        Self::WipeRight,
        Self::SlideLeft,
        Self::SlideRight,
        Self::ZoomIn,
        Self::ZoomOut,
    ];
}

/// User-assigned transition parameters on a clip's outgoing cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionParams {
    pub style: TransitionStyle,
    pub duration: RationalTime,
}

impl Default for TransitionParams {
    fn default() -> Self {
        Self {
            style: TransitionStyle::Fade,
            duration: RationalTime::from_millis(500),
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlignment {
    Left,
    Center,
    Right,
}

/// Styling for a text overlay clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: u32,
    /// Hex color, e.g. "#FFFFFF".
    pub color: String,
    pub background: Option<String>,
    /// Pixel position of the text anchor in output coordinates.
    pub position: (i32, i32),
    pub alignment: TextAlignment,
    pub fade_in: RationalTime,
    pub fade_out: RationalTime,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".into(),
            font_size: 48,
            color: "#FFFFFF".into(),
            background: None,
            position: (960, 540),
            alignment: TextAlignment::Center,
            fade_in: RationalTime::ZERO,
            fade_out: RationalTime::ZERO,
        }
    }
}

/// Inline text content carried by overlay clips instead of an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextClip {
    pub text: String,
    pub style: TextStyle,
}

impl TextClip {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }
}

/// What a clip plays: a trimmed window of an asset, or inline text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClipSource {
    Asset(Uuid),
    Text(TextClip),
}

/// A clip on the timeline.
///
/// Identity is immutable; extent (trim points, position) is mutated only
/// through the timeline's operations so invariants hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    pub id: Uuid,
    pub name: String,
    pub source: ClipSource,
    /// Trim in-point within the source.
    pub source_in: RationalTime,
    /// Trim out-point within the source (exclusive).
    pub source_out: RationalTime,
    /// Position on the timeline.
    pub start: RationalTime,
    /// Transition applied at the cut out of this clip, if any.
    pub transition: Option<TransitionParams>,
    pub opacity: f64,
    pub volume: f64,
}

impl Clip {
    pub fn new(
        name: impl Into<String>,
        source: ClipSource,
        source_in: RationalTime,
        source_out: RationalTime,
        start: RationalTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            source,
            source_in,
            source_out,
            start,
            transition: None,
            opacity: 1.0,
            volume: 1.0,
        }
    }

    /// Timeline duration, derived from the trimmed source window.
    #[inline]
    pub fn duration(&self) -> RationalTime {
        self.source_out - self.source_in
    }

    /// End position on the timeline (exclusive).
    #[inline]
    pub fn end(&self) -> RationalTime {
        self.start + self.duration()
    }

    /// Occupied timeline span.
    #[inline]
    pub fn span(&self) -> TimeRange {
        TimeRange::new(self.start, self.duration())
    }

    /// Trimmed window within the source.
    #[inline]
    pub fn source_range(&self) -> TimeRange {
        TimeRange::from_start_end(self.source_in, self.source_out)
    }

    pub fn is_text(&self) -> bool {
        matches!(self.source, ClipSource::Text(_))
    }

    pub fn asset_id(&self) -> Option<Uuid> {
        match self.source {
            ClipSource::Asset(id) => Some(id),
            ClipSource::Text(_) => None,
        }
    }
}
