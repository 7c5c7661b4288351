//! Asset probing via ffprobe.
//!
//! Runs `ffprobe -print_format json -show_format -show_streams` and maps
//! the result onto an [`Asset`]. Parsing is split out as a pure function
//! so classification is testable without the binary.

use clipforge_core::{ClipForgeError, FrameRate, RationalTime, Result};
use clipforge_timeline::{Asset, MediaKind};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    format_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    sample_rate: Option<String>,
}

/// Probe a media file and register-ready [`Asset`] metadata.
pub fn probe_asset(backend: &crate::FfmpegBackend, path: &Path) -> Result<Asset> {
    if !path.exists() {
        return Err(ClipForgeError::MissingAsset {
            path: path.to_path_buf(),
            reason: "file does not exist".into(),
        });
    }

    let output = Command::new(&backend.ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()?;

    if !output.status.success() {
        return Err(ClipForgeError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: format!("ffprobe exited with {}", output.status),
        });
    }

    classify(path, &output.stdout)
}

/// Turn raw ffprobe JSON into an [`Asset`]. Fails with
/// `UnsupportedFormat` when no usable stream is present.
pub fn classify(path: &Path, probe_json: &[u8]) -> Result<Asset> {
    let probe: ProbeOutput =
        serde_json::from_slice(probe_json).map_err(|e| ClipForgeError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: format!("unparseable probe output: {e}"),
        })?;

    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .map(RationalTime::from_seconds_f64);
    let is_image_container = probe
        .format
        .as_ref()
        .and_then(|f| f.format_name.as_deref())
        .map(|name| name.contains("image2") || name.ends_with("_pipe"))
        .unwrap_or(false);

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let audio = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));

    let mut asset = match (video, audio) {
        (Some(v), _) if is_image_container || duration.is_none() => {
            // Still images carry no intrinsic duration.
            let mut a = Asset::new(path, MediaKind::Image, RationalTime::ZERO);
            if let (Some(w), Some(h)) = (v.width, v.height) {
                a = a.with_resolution(w, h);
            }
            a
        }
        (Some(v), _) => {
            let mut a = Asset::new(
                path,
                MediaKind::Video,
                duration.unwrap_or(RationalTime::ZERO),
            );
            if let (Some(w), Some(h)) = (v.width, v.height) {
                a = a.with_resolution(w, h);
            }
            if let Some(rate) = v.r_frame_rate.as_deref().and_then(parse_frame_rate) {
                a = a.with_frame_rate(rate);
            }
            a
        }
        (None, Some(a_stream)) => {
            let duration = duration.ok_or_else(|| ClipForgeError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: "audio stream with no duration".into(),
            })?;
            let mut a = Asset::new(path, MediaKind::Audio, duration);
            if let Some(rate) = a_stream
                .sample_rate
                .as_deref()
                .and_then(|s| s.parse::<u32>().ok())
            {
                a = a.with_sample_rate(rate);
            }
            a
        }
        (None, None) => {
            return Err(ClipForgeError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: "no video or audio stream".into(),
            });
        }
    };

    if let Some(a_stream) = audio {
        if asset.kind == MediaKind::Video {
            if let Some(rate) = a_stream
                .sample_rate
                .as_deref()
                .and_then(|s| s.parse::<u32>().ok())
            {
                asset = asset.with_sample_rate(rate);
            }
        }
    }

    tracing::debug!(path = %path.display(), kind = asset.kind.as_str(), "probed asset");
    Ok(asset)
}

/// Parse ffprobe's `r_frame_rate` ("30000/1001" or "25").
fn parse_frame_rate(s: &str) -> Option<FrameRate> {
    match s.split_once('/') {
        Some((num, den)) => {
            let numerator: u32 = num.parse().ok()?;
            let denominator: u32 = den.parse().ok()?;
            (numerator > 0 && denominator > 0).then_some(FrameRate::new(numerator, denominator))
        }
        None => {
            let numerator: u32 = s.parse().ok()?;
            (numerator > 0).then_some(FrameRate::new(numerator, 1))
        }
    }
}
