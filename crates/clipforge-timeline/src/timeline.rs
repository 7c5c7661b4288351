//! The timeline aggregate and its editing operations.
//!
//! Every mutation validates first and applies second, so a rejected
//! operation leaves the timeline exactly as it was. Callers serialize
//! edits themselves (single-writer discipline); the aggregate provides
//! no internal locking.

use clipforge_core::{ClipForgeError, FrameRate, RationalTime, Result, TimeRange};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::asset::{Asset, MediaKind};
use crate::clip::{Clip, ClipSource, TextClip, TransitionParams};
use crate::track::{Track, TrackKind};

/// The aggregate root: ordered tracks, global export metadata, and the
/// asset registry. All other entities are reached only through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    pub id: Uuid,
    pub name: String,
    pub frame_rate: FrameRate,
    pub width: u32,
    pub height: u32,
    pub tracks: Vec<Track>,
    pub assets: HashMap<Uuid, Asset>,
}

impl Timeline {
    pub fn new(name: impl Into<String>, width: u32, height: u32, frame_rate: FrameRate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            frame_rate,
            width,
            height,
            tracks: Vec::new(),
            assets: HashMap::new(),
        }
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Total duration: the furthest clip end across all tracks.
    /// Computed on demand, so it can never go stale.
    pub fn duration(&self) -> RationalTime {
        self.tracks
            .iter()
            .map(|t| t.duration())
            .max()
            .unwrap_or(RationalTime::ZERO)
    }

    pub fn track(&self, id: Uuid) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    fn track_mut(&mut self, id: Uuid) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    /// The track holding the given clip, with the clip itself.
    pub fn locate_clip(&self, clip_id: Uuid) -> Option<(&Track, &Clip)> {
        self.tracks
            .iter()
            .find_map(|t| t.find_clip(clip_id).map(|c| (t, c)))
    }

    pub fn asset(&self, id: Uuid) -> Option<&Asset> {
        self.assets.get(&id)
    }

    /// Media kind of a clip's payload (text clips report as overlay text).
    fn clip_kind_label(&self, clip: &Clip) -> &'static str {
        match &clip.source {
            ClipSource::Text(_) => "text",
            ClipSource::Asset(id) => self
                .assets
                .get(id)
                .map(|a| a.kind.as_str())
                .unwrap_or("unknown"),
        }
    }

    // ── Asset registry ──────────────────────────────────────────

    /// Register an imported asset and return its id.
    pub fn register_asset(&mut self, asset: Asset) -> Uuid {
        let id = asset.id;
        self.assets.insert(id, asset);
        id
    }

    /// Drop assets no clip references. Returns how many were removed.
    pub fn release_unused_assets(&mut self) -> usize {
        let referenced: Vec<Uuid> = self
            .tracks
            .iter()
            .flat_map(|t| t.clips.iter())
            .filter_map(|c| c.asset_id())
            .collect();
        let before = self.assets.len();
        self.assets.retain(|id, _| referenced.contains(id));
        before - self.assets.len()
    }

    // ── Track operations ────────────────────────────────────────

    pub fn add_track(&mut self, kind: TrackKind, name: impl Into<String>) -> Uuid {
        let track = Track::new(kind, name);
        let id = track.id;
        self.tracks.push(track);
        id
    }

    /// Remove a track. Refuses while clips remain unless `force`, in
    /// which case the contained clips are deleted first.
    pub fn remove_track(&mut self, track_id: Uuid, force: bool) -> Result<()> {
        let at = self
            .tracks
            .iter()
            .position(|t| t.id == track_id)
            .ok_or_else(|| ClipForgeError::NotFound(format!("track {track_id}")))?;

        let clips = self.tracks[at].clips.len();
        if clips > 0 && !force {
            return Err(ClipForgeError::TrackNotEmpty {
                track: track_id,
                clips,
            });
        }
        self.tracks.remove(at);
        Ok(())
    }

    // ── Clip operations ─────────────────────────────────────────

    /// Insert a trimmed window of an asset onto a track.
    pub fn insert_clip(
        &mut self,
        track_id: Uuid,
        asset_id: Uuid,
        source_in: RationalTime,
        source_out: RationalTime,
        start: RationalTime,
    ) -> Result<Uuid> {
        let asset = self
            .assets
            .get(&asset_id)
            .ok_or_else(|| ClipForgeError::NotFound(format!("asset {asset_id}")))?;
        let track = self
            .track(track_id)
            .ok_or_else(|| ClipForgeError::NotFound(format!("track {track_id}")))?;

        if !track.kind.accepts(asset.kind) {
            return Err(ClipForgeError::TrackKindMismatch {
                clip_kind: asset.kind.as_str(),
                track_kind: track.kind.as_str(),
            });
        }

        validate_source_window(source_in, source_out, asset)?;
        if start.is_negative() {
            return Err(ClipForgeError::invalid_range("timeline start must be >= 0"));
        }

        let span = TimeRange::from_start_end(start, start + (source_out - source_in));
        if let Some(existing) = track.conflicting_clip(span, None) {
            return Err(ClipForgeError::Overlap {
                track: track_id,
                existing: existing.id,
                incoming: span,
            });
        }

        let name = asset.display_name();
        let clip = Clip::new(name, ClipSource::Asset(asset_id), source_in, source_out, start);
        let clip_id = clip.id;
        self.track_mut(track_id)
            .expect("track existence checked above")
            .insert_sorted(clip);
        tracing::debug!(%clip_id, %track_id, "inserted clip");
        Ok(clip_id)
    }

    /// Place an inline text clip on an overlay track.
    pub fn insert_text_clip(
        &mut self,
        track_id: Uuid,
        text: TextClip,
        start: RationalTime,
        duration: RationalTime,
    ) -> Result<Uuid> {
        let track = self
            .track(track_id)
            .ok_or_else(|| ClipForgeError::NotFound(format!("track {track_id}")))?;
        if track.kind != TrackKind::Overlay {
            return Err(ClipForgeError::TrackKindMismatch {
                clip_kind: "text",
                track_kind: track.kind.as_str(),
            });
        }
        if duration <= RationalTime::ZERO {
            return Err(ClipForgeError::invalid_range("text duration must be > 0"));
        }
        if start.is_negative() {
            return Err(ClipForgeError::invalid_range("timeline start must be >= 0"));
        }

        let span = TimeRange::new(start, duration);
        if let Some(existing) = track.conflicting_clip(span, None) {
            return Err(ClipForgeError::Overlap {
                track: track_id,
                existing: existing.id,
                incoming: span,
            });
        }

        // Truncate by characters, not bytes; names must never split a
        // multi-byte code point.
        let name = if text.text.chars().count() > 20 {
            let head: String = text.text.chars().take(20).collect();
            format!("{head}...")
        } else {
            text.text.clone()
        };
        let clip = Clip::new(
            name,
            ClipSource::Text(text),
            RationalTime::ZERO,
            duration,
            start,
        );
        let clip_id = clip.id;
        self.track_mut(track_id)
            .expect("track existence checked above")
            .insert_sorted(clip);
        Ok(clip_id)
    }

    /// Adjust trim points without moving the timeline start. The clip may
    /// grow or shrink as long as the window stays inside the source and
    /// no overlap results.
    pub fn trim_clip(
        &mut self,
        clip_id: Uuid,
        new_source_in: Option<RationalTime>,
        new_source_out: Option<RationalTime>,
    ) -> Result<()> {
        let (track, clip) = self
            .locate_clip(clip_id)
            .ok_or_else(|| ClipForgeError::NotFound(format!("clip {clip_id}")))?;
        let track_id = track.id;

        let source_in = new_source_in.unwrap_or(clip.source_in);
        let source_out = new_source_out.unwrap_or(clip.source_out);

        match &clip.source {
            ClipSource::Asset(asset_id) => {
                let asset = self
                    .assets
                    .get(asset_id)
                    .ok_or_else(|| ClipForgeError::NotFound(format!("asset {asset_id}")))?;
                validate_source_window(source_in, source_out, asset)?;
            }
            ClipSource::Text(_) => {
                if source_in != RationalTime::ZERO {
                    return Err(ClipForgeError::invalid_range(
                        "text clips have no source to trim into",
                    ));
                }
                if source_out <= RationalTime::ZERO {
                    return Err(ClipForgeError::invalid_range("duration must be > 0"));
                }
            }
        }

        let span = TimeRange::new(clip.start, source_out - source_in);
        let track = self.track(track_id).expect("located above");
        if let Some(existing) = track.conflicting_clip(span, Some(clip_id)) {
            return Err(ClipForgeError::Overlap {
                track: track_id,
                existing: existing.id,
                incoming: span,
            });
        }

        let clip = self
            .track_mut(track_id)
            .and_then(|t| t.find_clip_mut(clip_id))
            .expect("located above");
        clip.source_in = source_in;
        clip.source_out = source_out;
        Ok(())
    }

    /// Split a clip at a timeline instant strictly inside its span.
    ///
    /// The two halves partition the original's source and timeline
    /// coverage exactly; the outgoing transition stays with the right
    /// half, whose end is the original cut. Returns (left, right) ids.
    pub fn split_clip(&mut self, clip_id: Uuid, at: RationalTime) -> Result<(Uuid, Uuid)> {
        let (track, clip) = self
            .locate_clip(clip_id)
            .ok_or_else(|| ClipForgeError::NotFound(format!("clip {clip_id}")))?;
        let track_id = track.id;

        if at <= clip.start || at >= clip.end() {
            return Err(ClipForgeError::OutOfRange { clip: clip_id, at });
        }

        let offset = at - clip.start;
        let split_source = clip.source_in + offset;

        let track = self.track_mut(track_id).expect("located above");
        let clip = track.find_clip_mut(clip_id).expect("located above");

        let mut right = clip.clone();
        right.id = Uuid::new_v4();
        right.name = format!("{} (split)", clip.name);
        right.source_in = split_source;
        right.start = at;

        clip.source_out = split_source;
        clip.transition = None;

        let right_id = right.id;
        track.insert_sorted(right);
        Ok((clip_id, right_id))
    }

    /// Move a clip to a new start position, optionally onto another track.
    pub fn move_clip(
        &mut self,
        clip_id: Uuid,
        new_start: RationalTime,
        new_track: Option<Uuid>,
    ) -> Result<()> {
        let (src_track, clip) = self
            .locate_clip(clip_id)
            .ok_or_else(|| ClipForgeError::NotFound(format!("clip {clip_id}")))?;
        let src_track_id = src_track.id;
        let dst_track_id = new_track.unwrap_or(src_track_id);

        if new_start.is_negative() {
            return Err(ClipForgeError::invalid_range("timeline start must be >= 0"));
        }

        let dst_track = self
            .track(dst_track_id)
            .ok_or_else(|| ClipForgeError::NotFound(format!("track {dst_track_id}")))?;

        // Cross-track moves must respect the destination's media kind.
        if dst_track_id != src_track_id {
            let compatible = match &clip.source {
                ClipSource::Text(_) => dst_track.kind == TrackKind::Overlay,
                ClipSource::Asset(asset_id) => self
                    .assets
                    .get(asset_id)
                    .map(|a| dst_track.kind.accepts(a.kind))
                    .unwrap_or(false),
            };
            if !compatible {
                return Err(ClipForgeError::TrackKindMismatch {
                    clip_kind: self.clip_kind_label(clip),
                    track_kind: dst_track.kind.as_str(),
                });
            }
        }

        let span = TimeRange::new(new_start, clip.duration());
        let exclude = (dst_track_id == src_track_id).then_some(clip_id);
        if let Some(existing) = dst_track.conflicting_clip(span, exclude) {
            return Err(ClipForgeError::Overlap {
                track: dst_track_id,
                existing: existing.id,
                incoming: span,
            });
        }

        let mut moved = self
            .track_mut(src_track_id)
            .and_then(|t| t.remove_clip(clip_id))
            .expect("located above");
        moved.start = new_start;
        self.track_mut(dst_track_id)
            .expect("destination checked above")
            .insert_sorted(moved);
        Ok(())
    }

    /// Remove a clip. Later clips keep their positions.
    pub fn delete_clip(&mut self, clip_id: Uuid) -> Result<()> {
        for track in &mut self.tracks {
            if track.remove_clip(clip_id).is_some() {
                return Ok(());
            }
        }
        Err(ClipForgeError::NotFound(format!("clip {clip_id}")))
    }

    /// Remove a clip and shift every later clip on the same track left
    /// by the removed duration. Explicitly opted into; plain
    /// `delete_clip` never shifts.
    pub fn ripple_delete(&mut self, clip_id: Uuid) -> Result<()> {
        let (track, clip) = self
            .locate_clip(clip_id)
            .ok_or_else(|| ClipForgeError::NotFound(format!("clip {clip_id}")))?;
        let track_id = track.id;
        let removed_start = clip.start;
        let shift = clip.duration();

        let track = self.track_mut(track_id).expect("located above");
        track.remove_clip(clip_id);
        for clip in &mut track.clips {
            if clip.start >= removed_start {
                clip.start = clip.start - shift;
            }
        }
        Ok(())
    }

    /// Assign or clear the transition on a clip's outgoing cut.
    pub fn set_clip_transition(
        &mut self,
        clip_id: Uuid,
        transition: Option<TransitionParams>,
    ) -> Result<()> {
        for track in &mut self.tracks {
            if let Some(clip) = track.find_clip_mut(clip_id) {
                clip.transition = transition;
                return Ok(());
            }
        }
        Err(ClipForgeError::NotFound(format!("clip {clip_id}")))
    }
}

impl Default for Timeline {
    fn default() -> Self {
        let mut timeline = Self::new("Untitled Project", 1920, 1080, FrameRate::FPS_30);
        timeline.add_track(TrackKind::Video, "V1");
        timeline.add_track(TrackKind::Audio, "A1");
        timeline
    }
}

/// Shared source-window validation: 0 <= in < out <= asset duration.
/// Still images have no intrinsic duration, so their window is free.
fn validate_source_window(
    source_in: RationalTime,
    source_out: RationalTime,
    asset: &Asset,
) -> Result<()> {
    if source_in.is_negative() {
        return Err(ClipForgeError::invalid_range("source in must be >= 0"));
    }
    if source_in >= source_out {
        return Err(ClipForgeError::invalid_range(
            "source in must be before source out",
        ));
    }
    if asset.kind != MediaKind::Image && source_out > asset.duration {
        return Err(ClipForgeError::invalid_range(format!(
            "source out {} exceeds asset duration {}",
            source_out, asset.duration
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_asset(secs: i64) -> Asset {
        Asset::new("/media/shot.mp4", MediaKind::Video, RationalTime::from_secs(secs))
            .with_frame_rate(FrameRate::FPS_30)
            .with_resolution(1920, 1080)
    }

    fn timeline_with_video_track() -> (Timeline, Uuid, Uuid) {
        let mut tl = Timeline::new("test", 1920, 1080, FrameRate::FPS_30);
        let track = tl.add_track(TrackKind::Video, "V1");
        let asset = tl.register_asset(video_asset(60));
        (tl, track, asset)
    }

    #[test]
    fn test_insert_clip_and_duration() {
        let (mut tl, track, asset) = timeline_with_video_track();
        // Source window [2s, 7s) at timeline start 0 → 5 s clip.
        tl.insert_clip(
            track,
            asset,
            RationalTime::from_secs(2),
            RationalTime::from_secs(7),
            RationalTime::ZERO,
        )
        .unwrap();

        let t = tl.track(track).unwrap();
        assert_eq!(t.clips.len(), 1);
        assert_eq!(t.clips[0].duration(), RationalTime::from_secs(5));
        assert_eq!(tl.duration(), RationalTime::from_secs(5));
    }

    #[test]
    fn test_overlapping_insert_rejected_and_track_unchanged() {
        let (mut tl, track, asset) = timeline_with_video_track();
        tl.insert_clip(
            track,
            asset,
            RationalTime::from_secs(2),
            RationalTime::from_secs(7),
            RationalTime::ZERO,
        )
        .unwrap();

        let err = tl
            .insert_clip(
                track,
                asset,
                RationalTime::ZERO,
                RationalTime::from_secs(4),
                RationalTime::from_secs(3),
            )
            .unwrap_err();
        assert!(matches!(err, ClipForgeError::Overlap { .. }));
        assert_eq!(tl.track(track).unwrap().clips.len(), 1);
        assert!(tl.track(track).unwrap().is_well_formed());
    }

    #[test]
    fn test_insert_rejects_bad_source_window() {
        let (mut tl, track, asset) = timeline_with_video_track();
        let err = tl
            .insert_clip(
                track,
                asset,
                RationalTime::from_secs(7),
                RationalTime::from_secs(2),
                RationalTime::ZERO,
            )
            .unwrap_err();
        assert!(matches!(err, ClipForgeError::InvalidRange { .. }));

        let err = tl
            .insert_clip(
                track,
                asset,
                RationalTime::ZERO,
                RationalTime::from_secs(120),
                RationalTime::ZERO,
            )
            .unwrap_err();
        assert!(matches!(err, ClipForgeError::InvalidRange { .. }));
        assert!(tl.track(track).unwrap().is_empty());
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let (mut tl, _, _) = timeline_with_video_track();
        let audio_track = tl.add_track(TrackKind::Audio, "A1");
        let video = tl.register_asset(video_asset(10));
        let err = tl
            .insert_clip(
                audio_track,
                video,
                RationalTime::ZERO,
                RationalTime::from_secs(5),
                RationalTime::ZERO,
            )
            .unwrap_err();
        assert!(matches!(err, ClipForgeError::TrackKindMismatch { .. }));
    }

    #[test]
    fn test_trim_keeps_start_fixed() {
        let (mut tl, track, asset) = timeline_with_video_track();
        let clip = tl
            .insert_clip(
                track,
                asset,
                RationalTime::from_secs(2),
                RationalTime::from_secs(7),
                RationalTime::from_secs(1),
            )
            .unwrap();

        tl.trim_clip(clip, Some(RationalTime::from_secs(3)), None)
            .unwrap();
        let (_, c) = tl.locate_clip(clip).unwrap();
        assert_eq!(c.start, RationalTime::from_secs(1));
        assert_eq!(c.duration(), RationalTime::from_secs(4));
    }

    #[test]
    fn test_trim_growth_cannot_overlap() {
        let (mut tl, track, asset) = timeline_with_video_track();
        let first = tl
            .insert_clip(
                track,
                asset,
                RationalTime::ZERO,
                RationalTime::from_secs(5),
                RationalTime::ZERO,
            )
            .unwrap();
        tl.insert_clip(
            track,
            asset,
            RationalTime::ZERO,
            RationalTime::from_secs(5),
            RationalTime::from_secs(5),
        )
        .unwrap();

        let err = tl
            .trim_clip(first, None, Some(RationalTime::from_secs(6)))
            .unwrap_err();
        assert!(matches!(err, ClipForgeError::Overlap { .. }));
        let (_, c) = tl.locate_clip(first).unwrap();
        assert_eq!(c.source_out, RationalTime::from_secs(5));
    }

    #[test]
    fn test_split_partitions_exactly() {
        let (mut tl, track, asset) = timeline_with_video_track();
        // Timeline [0, 10), source [5, 15), split at 4.
        let clip = tl
            .insert_clip(
                track,
                asset,
                RationalTime::from_secs(5),
                RationalTime::from_secs(15),
                RationalTime::ZERO,
            )
            .unwrap();

        let (left, right) = tl.split_clip(clip, RationalTime::from_secs(4)).unwrap();

        let (_, l) = tl.locate_clip(left).unwrap();
        let (_, r) = tl.locate_clip(right).unwrap();
        assert_eq!(l.span(), TimeRange::new(RationalTime::ZERO, RationalTime::from_secs(4)));
        assert_eq!(
            r.span(),
            TimeRange::new(RationalTime::from_secs(4), RationalTime::from_secs(6))
        );
        // Source windows are contiguous: [5,9) then [9,15).
        assert_eq!(l.source_out, RationalTime::from_secs(9));
        assert_eq!(r.source_in, RationalTime::from_secs(9));
        assert_eq!(r.source_out, RationalTime::from_secs(15));
        assert!(tl.track(track).unwrap().is_well_formed());
    }

    #[test]
    fn test_split_outside_span_rejected() {
        let (mut tl, track, asset) = timeline_with_video_track();
        let clip = tl
            .insert_clip(
                track,
                asset,
                RationalTime::ZERO,
                RationalTime::from_secs(5),
                RationalTime::ZERO,
            )
            .unwrap();

        for at in [RationalTime::ZERO, RationalTime::from_secs(5), RationalTime::from_secs(9)] {
            let err = tl.split_clip(clip, at).unwrap_err();
            assert!(matches!(err, ClipForgeError::OutOfRange { .. }));
        }
        assert_eq!(tl.track(track).unwrap().clips.len(), 1);
    }

    #[test]
    fn test_split_moves_transition_to_right_half() {
        let (mut tl, _, asset) = timeline_with_video_track();
        let track = tl.tracks[0].id;
        let clip = tl
            .insert_clip(
                track,
                asset,
                RationalTime::ZERO,
                RationalTime::from_secs(10),
                RationalTime::ZERO,
            )
            .unwrap();
        tl.set_clip_transition(clip, Some(TransitionParams::default()))
            .unwrap();

        let (left, right) = tl.split_clip(clip, RationalTime::from_secs(4)).unwrap();
        assert!(tl.locate_clip(left).unwrap().1.transition.is_none());
        assert!(tl.locate_clip(right).unwrap().1.transition.is_some());
    }

    #[test]
    fn test_move_clip_across_tracks() {
        let (mut tl, track, asset) = timeline_with_video_track();
        let other = tl.add_track(TrackKind::Video, "V2");
        let clip = tl
            .insert_clip(
                track,
                asset,
                RationalTime::ZERO,
                RationalTime::from_secs(5),
                RationalTime::ZERO,
            )
            .unwrap();

        tl.move_clip(clip, RationalTime::from_secs(2), Some(other))
            .unwrap();
        assert!(tl.track(track).unwrap().is_empty());
        let (t, c) = tl.locate_clip(clip).unwrap();
        assert_eq!(t.id, other);
        assert_eq!(c.start, RationalTime::from_secs(2));
    }

    #[test]
    fn test_move_conflict_rejected() {
        let (mut tl, track, asset) = timeline_with_video_track();
        let a = tl
            .insert_clip(
                track,
                asset,
                RationalTime::ZERO,
                RationalTime::from_secs(5),
                RationalTime::ZERO,
            )
            .unwrap();
        tl.insert_clip(
            track,
            asset,
            RationalTime::ZERO,
            RationalTime::from_secs(5),
            RationalTime::from_secs(6),
        )
        .unwrap();

        let err = tl
            .move_clip(a, RationalTime::from_secs(4), None)
            .unwrap_err();
        assert!(matches!(err, ClipForgeError::Overlap { .. }));
        assert_eq!(tl.locate_clip(a).unwrap().1.start, RationalTime::ZERO);
    }

    #[test]
    fn test_delete_does_not_shift() {
        let (mut tl, track, asset) = timeline_with_video_track();
        let a = tl
            .insert_clip(
                track,
                asset,
                RationalTime::ZERO,
                RationalTime::from_secs(3),
                RationalTime::ZERO,
            )
            .unwrap();
        let b = tl
            .insert_clip(
                track,
                asset,
                RationalTime::ZERO,
                RationalTime::from_secs(3),
                RationalTime::from_secs(5),
            )
            .unwrap();

        tl.delete_clip(a).unwrap();
        assert_eq!(tl.locate_clip(b).unwrap().1.start, RationalTime::from_secs(5));
    }

    #[test]
    fn test_ripple_delete_shifts_later_clips() {
        let (mut tl, track, asset) = timeline_with_video_track();
        let a = tl
            .insert_clip(
                track,
                asset,
                RationalTime::ZERO,
                RationalTime::from_secs(3),
                RationalTime::ZERO,
            )
            .unwrap();
        let b = tl
            .insert_clip(
                track,
                asset,
                RationalTime::ZERO,
                RationalTime::from_secs(3),
                RationalTime::from_secs(5),
            )
            .unwrap();

        tl.ripple_delete(a).unwrap();
        assert_eq!(tl.locate_clip(b).unwrap().1.start, RationalTime::from_secs(2));
        assert!(tl.track(track).unwrap().is_well_formed());
    }

    #[test]
    fn test_remove_track_requires_force() {
        let (mut tl, track, asset) = timeline_with_video_track();
        tl.insert_clip(
            track,
            asset,
            RationalTime::ZERO,
            RationalTime::from_secs(3),
            RationalTime::ZERO,
        )
        .unwrap();

        let err = tl.remove_track(track, false).unwrap_err();
        assert!(matches!(err, ClipForgeError::TrackNotEmpty { .. }));
        assert!(tl.track(track).is_some());

        tl.remove_track(track, true).unwrap();
        assert!(tl.track(track).is_none());
    }

    #[test]
    fn test_text_clip_only_on_overlay_track() {
        let (mut tl, video_track, _) = timeline_with_video_track();
        let err = tl
            .insert_text_clip(
                video_track,
                TextClip::new("Title"),
                RationalTime::ZERO,
                RationalTime::from_secs(3),
            )
            .unwrap_err();
        assert!(matches!(err, ClipForgeError::TrackKindMismatch { .. }));

        let overlay = tl.add_track(TrackKind::Overlay, "T1");
        let clip = tl
            .insert_text_clip(
                overlay,
                TextClip::new("Title"),
                RationalTime::from_secs(1),
                RationalTime::from_secs(3),
            )
            .unwrap();
        assert_eq!(tl.locate_clip(clip).unwrap().1.duration(), RationalTime::from_secs(3));
    }

    #[test]
    fn test_text_clip_name_truncates_on_char_boundary() {
        let mut tl = Timeline::new("test", 1920, 1080, FrameRate::FPS_30);
        let overlay = tl.add_track(TrackKind::Overlay, "T1");
        // The 20th byte falls inside the two-byte 'é'.
        let clip = tl
            .insert_text_clip(
                overlay,
                TextClip::new("aaaaaaaaaaaaaaaaaaaé la suite du titre"),
                RationalTime::ZERO,
                RationalTime::from_secs(2),
            )
            .unwrap();
        let (_, c) = tl.locate_clip(clip).unwrap();
        assert_eq!(c.name, "aaaaaaaaaaaaaaaaaaaé...");

        // Short names pass through untouched.
        let short = tl
            .insert_text_clip(
                overlay,
                TextClip::new("Générique"),
                RationalTime::from_secs(3),
                RationalTime::from_secs(2),
            )
            .unwrap();
        assert_eq!(tl.locate_clip(short).unwrap().1.name, "Générique");
    }

    #[test]
    fn test_release_unused_assets() {
        let (mut tl, track, asset) = timeline_with_video_track();
        let orphan = tl.register_asset(video_asset(10));
        tl.insert_clip(
            track,
            asset,
            RationalTime::ZERO,
            RationalTime::from_secs(3),
            RationalTime::ZERO,
        )
        .unwrap();

        assert_eq!(tl.release_unused_assets(), 1);
        assert!(tl.asset(asset).is_some());
        assert!(tl.asset(orphan).is_none());
    }

    #[test]
    fn test_no_overlap_after_mutation_sequence() {
        let (mut tl, track, asset) = timeline_with_video_track();
        let a = tl
            .insert_clip(
                track,
                asset,
                RationalTime::ZERO,
                RationalTime::from_secs(4),
                RationalTime::ZERO,
            )
            .unwrap();
        let b = tl
            .insert_clip(
                track,
                asset,
                RationalTime::from_secs(4),
                RationalTime::from_secs(8),
                RationalTime::from_secs(4),
            )
            .unwrap();
        assert!(tl.track(track).unwrap().is_well_formed());

        tl.trim_clip(a, Some(RationalTime::from_secs(1)), None).unwrap();
        assert!(tl.track(track).unwrap().is_well_formed());

        tl.move_clip(b, RationalTime::from_secs(10), None).unwrap();
        assert!(tl.track(track).unwrap().is_well_formed());

        tl.split_clip(b, RationalTime::from_secs(12)).unwrap();
        assert!(tl.track(track).unwrap().is_well_formed());
    }
}
