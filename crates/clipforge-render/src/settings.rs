//! Output settings and export presets.

use clipforge_core::FrameRate;
use serde::{Deserialize, Serialize};

/// Video codec for the exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoCodec {
    H264,
    H265,
    Vp9,
}

impl VideoCodec {
    /// ffmpeg encoder name.
    pub fn encoder(self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::H265 => "libx265",
            Self::Vp9 => "libvpx-vp9",
        }
    }

    /// Container extension for this codec.
    pub fn extension(self) -> &'static str {
        match self {
            Self::H264 | Self::H265 => "mp4",
            Self::Vp9 => "webm",
        }
    }
}

/// Audio codec for the exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCodec {
    Aac,
    Mp3,
    Opus,
}

impl AudioCodec {
    /// ffmpeg encoder name.
    pub fn encoder(self) -> &'static str {
        match self {
            Self::Aac => "aac",
            Self::Mp3 => "libmp3lame",
            Self::Opus => "libopus",
        }
    }
}

/// Encoder speed/size trade-off, passed to `-preset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncoderSpeed {
    Ultrafast,
    Fast,
    Medium,
    Slow,
    Veryslow,
}

impl EncoderSpeed {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ultrafast => "ultrafast",
            Self::Fast => "fast",
            Self::Medium => "medium",
            Self::Slow => "slow",
            Self::Veryslow => "veryslow",
        }
    }
}

/// Full output configuration for an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    pub video_codec: VideoCodec,
    pub audio_codec: AudioCodec,
    /// Video bitrate in kbps. `None` falls back to CRF.
    pub video_bitrate: Option<u32>,
    /// CRF value (0-51, lower is better) when no bitrate is set.
    pub crf: Option<u32>,
    /// Audio bitrate in kbps.
    pub audio_bitrate: u32,
    pub speed: EncoderSpeed,
}

impl OutputSettings {
    fn h264(width: u32, height: u32, video_bitrate: u32) -> Self {
        Self {
            width,
            height,
            frame_rate: FrameRate::FPS_30,
            video_codec: VideoCodec::H264,
            audio_codec: AudioCodec::Aac,
            video_bitrate: Some(video_bitrate),
            crf: None,
            audio_bitrate: 192,
            speed: EncoderSpeed::Medium,
        }
    }

    /// Web HD (720p).
    pub fn web_hd() -> Self {
        Self::h264(1280, 720, 5_000)
    }

    /// Full HD (1080p).
    pub fn full_hd() -> Self {
        Self::h264(1920, 1080, 10_000)
    }

    /// Quad HD (1440p).
    pub fn quad_hd() -> Self {
        Self::h264(2560, 1440, 20_000)
    }

    /// 4K Ultra HD.
    pub fn uhd_4k() -> Self {
        Self::h264(3840, 2160, 40_000)
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self::full_hd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_scale_bitrate_with_resolution() {
        let presets = [
            OutputSettings::web_hd(),
            OutputSettings::full_hd(),
            OutputSettings::quad_hd(),
            OutputSettings::uhd_4k(),
        ];
        for pair in presets.windows(2) {
            assert!(pair[0].height < pair[1].height);
            assert!(pair[0].video_bitrate < pair[1].video_bitrate);
        }
    }

    #[test]
    fn test_codec_names() {
        assert_eq!(VideoCodec::H264.encoder(), "libx264");
        assert_eq!(VideoCodec::Vp9.extension(), "webm");
        assert_eq!(AudioCodec::Aac.encoder(), "aac");
    }
}
