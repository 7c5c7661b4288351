//! Locating the ffmpeg toolchain.

use clipforge_core::{ClipForgeError, Result};
use std::path::{Path, PathBuf};

/// Install locations checked when the binaries are not on PATH.
const FFMPEG_FALLBACKS: &[&str] = &[
    "/usr/local/bin/ffmpeg",
    "/usr/bin/ffmpeg",
    "/opt/homebrew/bin/ffmpeg",
    "C:\\ffmpeg\\bin\\ffmpeg.exe",
    "C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe",
];

/// Resolved paths to the external encoding backend.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl FfmpegBackend {
    /// Locate ffmpeg and ffprobe: PATH first, then well-known install
    /// locations, with ffprobe falling back to ffmpeg's directory.
    pub fn locate() -> Result<Self> {
        let ffmpeg = which::which("ffmpeg")
            .ok()
            .or_else(|| {
                FFMPEG_FALLBACKS
                    .iter()
                    .map(PathBuf::from)
                    .find(|p| p.exists())
            })
            .ok_or_else(|| ClipForgeError::NotFound("ffmpeg executable".into()))?;

        let ffprobe = which::which("ffprobe")
            .ok()
            .or_else(|| sibling_ffprobe(&ffmpeg))
            .ok_or_else(|| ClipForgeError::NotFound("ffprobe executable".into()))?;

        tracing::info!(ffmpeg = %ffmpeg.display(), ffprobe = %ffprobe.display(), "located backend");
        Ok(Self { ffmpeg, ffprobe })
    }

    /// Build a backend from explicit paths (used by tests and callers
    /// that bundle their own binaries).
    pub fn with_paths(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

fn sibling_ffprobe(ffmpeg: &Path) -> Option<PathBuf> {
    let file_name = ffmpeg.file_name()?.to_str()?;
    let candidate = ffmpeg.with_file_name(file_name.replace("ffmpeg", "ffprobe"));
    candidate.exists().then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_paths() {
        let backend = FfmpegBackend::with_paths("/opt/ffmpeg", "/opt/ffprobe");
        assert_eq!(backend.ffmpeg, PathBuf::from("/opt/ffmpeg"));
        assert_eq!(backend.ffprobe, PathBuf::from("/opt/ffprobe"));
    }
}
