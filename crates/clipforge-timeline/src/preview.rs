//! Read-only preview queries.
//!
//! The preview collaborator renders frames itself; this module only
//! answers "which clips are live at this instant, and where inside
//! their sources". It never mutates the timeline.

use clipforge_core::RationalTime;
use uuid::Uuid;

use crate::timeline::Timeline;

/// A clip active at a queried timeline instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveClip {
    pub track_id: Uuid,
    pub clip_id: Uuid,
    /// Resolved position within the clip's source at the queried time.
    pub source_offset: RationalTime,
}

/// Resolve the clips active at `time`, in track order. Muted tracks are
/// skipped; the preview has nothing to show for them.
pub fn active_clips_at(timeline: &Timeline, time: RationalTime) -> Vec<ActiveClip> {
    timeline
        .tracks
        .iter()
        .filter(|track| !track.muted)
        .filter_map(|track| {
            track.clip_at_time(time).map(|clip| ActiveClip {
                track_id: track.id,
                clip_id: clip.id,
                source_offset: clip.source_in + (time - clip.start),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Asset, MediaKind};
    use crate::track::TrackKind;
    use clipforge_core::FrameRate;

    #[test]
    fn test_active_clips_resolve_source_offsets() {
        let mut tl = Timeline::new("t", 1920, 1080, FrameRate::FPS_30);
        let video = tl.add_track(TrackKind::Video, "V1");
        let audio = tl.add_track(TrackKind::Audio, "A1");
        let v = tl.register_asset(Asset::new(
            "/m/v.mp4",
            MediaKind::Video,
            RationalTime::from_secs(30),
        ));
        let a = tl.register_asset(Asset::new(
            "/m/a.mp3",
            MediaKind::Audio,
            RationalTime::from_secs(30),
        ));

        // Video [2, 12) of source starting at 5; audio [0, 8) untrimmed.
        let vc = tl
            .insert_clip(
                video,
                v,
                RationalTime::from_secs(5),
                RationalTime::from_secs(15),
                RationalTime::from_secs(2),
            )
            .unwrap();
        tl.insert_clip(
            audio,
            a,
            RationalTime::ZERO,
            RationalTime::from_secs(8),
            RationalTime::ZERO,
        )
        .unwrap();

        let active = active_clips_at(&tl, RationalTime::from_secs(4));
        assert_eq!(active.len(), 2);
        let video_hit = active.iter().find(|c| c.clip_id == vc).unwrap();
        // 2 s into the clip → source 5 + 2.
        assert_eq!(video_hit.source_offset, RationalTime::from_secs(7));
    }

    #[test]
    fn test_gap_yields_nothing() {
        let mut tl = Timeline::new("t", 1920, 1080, FrameRate::FPS_30);
        let video = tl.add_track(TrackKind::Video, "V1");
        let v = tl.register_asset(Asset::new(
            "/m/v.mp4",
            MediaKind::Video,
            RationalTime::from_secs(30),
        ));
        tl.insert_clip(
            video,
            v,
            RationalTime::ZERO,
            RationalTime::from_secs(2),
            RationalTime::from_secs(5),
        )
        .unwrap();

        assert!(active_clips_at(&tl, RationalTime::from_secs(3)).is_empty());
    }

    #[test]
    fn test_muted_track_skipped() {
        let mut tl = Timeline::new("t", 1920, 1080, FrameRate::FPS_30);
        let video = tl.add_track(TrackKind::Video, "V1");
        let v = tl.register_asset(Asset::new(
            "/m/v.mp4",
            MediaKind::Video,
            RationalTime::from_secs(30),
        ));
        tl.insert_clip(
            video,
            v,
            RationalTime::ZERO,
            RationalTime::from_secs(5),
            RationalTime::ZERO,
        )
        .unwrap();
        tl.tracks[0].muted = true;

        assert!(active_clips_at(&tl, RationalTime::from_secs(1)).is_empty());
    }
}
