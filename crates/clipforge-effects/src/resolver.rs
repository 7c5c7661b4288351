//! Effect resolution.
//!
//! Walks the timeline in a fixed order (tracks in order, clips by start)
//! and produces the descriptor sequence the render planner consumes.
//! Identical timelines always resolve to identical sequences.

use clipforge_core::{ClipForgeError, RationalTime, Result, TimeRange};
use clipforge_timeline::{Clip, ClipSource, MediaKind, Timeline, TrackKind};

use crate::descriptor::EffectDescriptor;

/// Resolve every transition and text overlay needed to export `timeline`.
pub fn resolve(timeline: &Timeline) -> Result<Vec<EffectDescriptor>> {
    let mut descriptors = Vec::new();

    for track in &timeline.tracks {
        match track.kind {
            TrackKind::Video => {
                for pair in track.clips.windows(2) {
                    if let Some(d) = resolve_transition(timeline, &pair[0], &pair[1])? {
                        descriptors.push(d);
                    }
                }
            }
            TrackKind::Overlay => {
                for clip in &track.clips {
                    if let ClipSource::Text(text) = &clip.source {
                        descriptors.push(EffectDescriptor::TextOverlay {
                            clip: clip.id,
                            region: clip.span(),
                            text: text.text.clone(),
                            style: text.style.clone(),
                        });
                    }
                }
            }
            TrackKind::Audio => {}
        }
    }

    tracing::debug!(count = descriptors.len(), "resolved effect descriptors");
    Ok(descriptors)
}

/// Emit a transition descriptor for two neighbouring clips when they cut
/// directly into each other and the first carries a transition.
///
/// The transition occupies `[cut, cut + duration)`: the outgoing clip is
/// extended past its out point into trimmed-away material, so both clips
/// need at least the transition duration of spare source on the relevant
/// side. Checked here so the failure surfaces at resolution time, never
/// mid-encode.
fn resolve_transition(
    timeline: &Timeline,
    first: &Clip,
    second: &Clip,
) -> Result<Option<EffectDescriptor>> {
    let Some(params) = first.transition else {
        return Ok(None);
    };
    // A transition needs a zero-gap cut; anything else is just two clips.
    if first.end() != second.start {
        return Ok(None);
    }

    let tail_spare = spare_tail(timeline, first);
    if let Some(spare) = tail_spare {
        if spare < params.duration {
            return Err(ClipForgeError::InsufficientMaterial {
                clip: first.id,
                needed: params.duration,
                shortfall: params.duration - spare,
            });
        }
    }
    let head_spare = spare_head(timeline, second);
    if let Some(spare) = head_spare {
        if spare < params.duration {
            return Err(ClipForgeError::InsufficientMaterial {
                clip: second.id,
                needed: params.duration,
                shortfall: params.duration - spare,
            });
        }
    }

    Ok(Some(EffectDescriptor::Transition {
        from_clip: first.id,
        to_clip: second.id,
        region: TimeRange::new(first.end(), params.duration),
        style: params.style,
        duration: params.duration,
    }))
}

/// Source material available past a clip's out point. `None` means
/// unbounded (still images).
fn spare_tail(timeline: &Timeline, clip: &Clip) -> Option<RationalTime> {
    match &clip.source {
        ClipSource::Text(_) => Some(RationalTime::ZERO),
        ClipSource::Asset(id) => {
            let asset = timeline.asset(*id)?;
            (asset.kind != MediaKind::Image).then(|| asset.duration - clip.source_out)
        }
    }
}

/// Source material available before a clip's in point.
fn spare_head(timeline: &Timeline, clip: &Clip) -> Option<RationalTime> {
    match &clip.source {
        ClipSource::Text(_) => Some(RationalTime::ZERO),
        ClipSource::Asset(id) => {
            let asset = timeline.asset(*id)?;
            (asset.kind != MediaKind::Image).then_some(clip.source_in)
        }
    }
}
