//! Compilation of a timeline into a linear execution plan.
//!
//! Planning is pure: same timeline and descriptors in, same plan out,
//! no filesystem or process access. The plan is what the command
//! builder translates into a single ffmpeg invocation.

use clipforge_core::{ClipForgeError, RationalTime, Result, TimeRange};
use clipforge_effects::EffectDescriptor;
use clipforge_timeline::{Clip, MediaKind, TextStyle, Timeline, TrackKind, TransitionStyle};
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::settings::OutputSettings;

/// One stage of the execution plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanStage {
    /// A trimmed span of a video asset in the output program.
    VideoSegment {
        clip: Uuid,
        input: PathBuf,
        /// Window within the source, already extended for an outgoing
        /// transition where one applies.
        source: TimeRange,
        /// Position in the output program.
        output: TimeRange,
    },
    /// A still image held for its clip duration.
    ImageSegment {
        clip: Uuid,
        input: PathBuf,
        output: TimeRange,
    },
    /// Cross-transition between the two preceding program segments.
    Transition {
        from_clip: Uuid,
        to_clip: Uuid,
        style: TransitionStyle,
        duration: RationalTime,
        /// Output time at which the transition begins.
        offset: RationalTime,
    },
    /// A trimmed span of an audio asset mixed in at a fixed position.
    AudioSegment {
        clip: Uuid,
        input: PathBuf,
        source: TimeRange,
        /// Output time the segment starts playing.
        at: RationalTime,
        volume: f64,
    },
    /// Text drawn over the program for its region.
    TextOverlay {
        clip: Uuid,
        region: TimeRange,
        text: String,
        style: TextStyle,
    },
}

/// The compiled plan handed to the encoding backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub stages: Vec<PlanStage>,
    pub total_duration: RationalTime,
    pub settings: OutputSettings,
}

impl RenderPlan {
    /// Input paths the plan references, in stage order.
    pub fn inputs(&self) -> Vec<&PathBuf> {
        self.stages
            .iter()
            .filter_map(|s| match s {
                PlanStage::VideoSegment { input, .. }
                | PlanStage::ImageSegment { input, .. }
                | PlanStage::AudioSegment { input, .. } => Some(input),
                _ => None,
            })
            .collect()
    }
}

/// Compile `timeline` plus resolved effects into an execution plan.
///
/// Video clips are laid out in start order with gaps collapsed; audio
/// keeps its timeline positions. Fails with `EmptyTimeline` when no
/// video or audio track contains a clip.
pub fn build_plan(
    timeline: &Timeline,
    descriptors: &[EffectDescriptor],
    settings: &OutputSettings,
) -> Result<RenderPlan> {
    let has_av_clips = timeline
        .tracks
        .iter()
        .filter(|t| matches!(t.kind, TrackKind::Video | TrackKind::Audio))
        .any(|t| !t.clips.is_empty());
    if !has_av_clips {
        return Err(ClipForgeError::EmptyTimeline);
    }

    let transitions: HashMap<Uuid, &EffectDescriptor> = descriptors
        .iter()
        .filter_map(|d| match d {
            EffectDescriptor::Transition { from_clip, .. } => Some((*from_clip, d)),
            _ => None,
        })
        .collect();

    // Video program: every clip on a video track, ordered by timeline
    // start (ties broken by track order, which the enumeration index
    // preserves).
    let mut program: Vec<&Clip> = timeline
        .tracks
        .iter()
        .filter(|t| t.kind == TrackKind::Video && !t.muted)
        .flat_map(|t| t.clips.iter())
        .collect();
    program.sort_by_key(|c| c.start);

    let mut stages = Vec::new();
    let mut cursor = RationalTime::ZERO;
    for (i, clip) in program.iter().enumerate() {
        let asset = clip
            .asset_id()
            .and_then(|id| timeline.asset(id))
            .ok_or_else(|| ClipForgeError::NotFound(format!("asset for clip {}", clip.id)))?;

        let output = TimeRange::new(cursor, clip.duration());
        cursor = output.end();

        // An outgoing transition extends this segment's source window
        // into the spare material the resolver already validated.
        let mut source = clip.source_range();
        let mut transition_stage = None;
        if let Some(EffectDescriptor::Transition {
            to_clip,
            style,
            duration,
            ..
        }) = transitions.get(&clip.id)
        {
            let next_is_target = program
                .get(i + 1)
                .map(|next| next.id == *to_clip)
                .unwrap_or(false);
            if next_is_target {
                source = TimeRange::from_start_end(source.start, source.end() + *duration);
                transition_stage = Some(PlanStage::Transition {
                    from_clip: clip.id,
                    to_clip: *to_clip,
                    style: *style,
                    duration: *duration,
                    offset: output.end(),
                });
            }
        }

        stages.push(match asset.kind {
            MediaKind::Image => PlanStage::ImageSegment {
                clip: clip.id,
                input: asset.path.clone(),
                output,
            },
            _ => PlanStage::VideoSegment {
                clip: clip.id,
                input: asset.path.clone(),
                source,
                output,
            },
        });
        if let Some(stage) = transition_stage {
            stages.push(stage);
        }
    }
    let mut total = cursor;

    for track in timeline.tracks.iter().filter(|t| t.kind == TrackKind::Audio) {
        if track.muted {
            continue;
        }
        for clip in &track.clips {
            let asset = clip
                .asset_id()
                .and_then(|id| timeline.asset(id))
                .ok_or_else(|| ClipForgeError::NotFound(format!("asset for clip {}", clip.id)))?;
            stages.push(PlanStage::AudioSegment {
                clip: clip.id,
                input: asset.path.clone(),
                source: clip.source_range(),
                at: clip.start,
                volume: clip.volume,
            });
            total = total.max(clip.end());
        }
    }

    for descriptor in descriptors {
        if let EffectDescriptor::TextOverlay {
            clip,
            region,
            text,
            style,
        } = descriptor
        {
            stages.push(PlanStage::TextOverlay {
                clip: *clip,
                region: *region,
                text: text.clone(),
                style: style.clone(),
            });
            total = total.max(region.end());
        }
    }

    tracing::debug!(
        stages = stages.len(),
        duration = %total,
        "compiled render plan"
    );
    Ok(RenderPlan {
        stages,
        total_duration: total,
        settings: settings.clone(),
    })
}
