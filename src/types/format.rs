//! Video format and audio configuration identifiers

use serde::{Deserialize, Serialize};

/// Video codec negotiated with the host.
/// Maps to the engine's `VIDEO_FORMAT_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum VideoFormat {
    /// H.264 (VIDEO_FORMAT_H264)
    H264,
    /// HEVC Main profile (VIDEO_FORMAT_H265)
    H265,
    /// HEVC Main10 profile (VIDEO_FORMAT_H265_MAIN10)
    H265Main10,
    /// Value the engine reported that this crate does not know about
    Unknown(i32),
}

impl VideoFormat {
    pub const H264_RAW: i32 = 0x0001;
    pub const H265_RAW: i32 = 0x0100;
    pub const H265_MAIN10_RAW: i32 = 0x0200;

    pub fn from_raw(raw: i32) -> Self {
        match raw {
            Self::H264_RAW => VideoFormat::H264,
            Self::H265_RAW => VideoFormat::H265,
            Self::H265_MAIN10_RAW => VideoFormat::H265Main10,
            other => VideoFormat::Unknown(other),
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            VideoFormat::H264 => Self::H264_RAW,
            VideoFormat::H265 => Self::H265_RAW,
            VideoFormat::H265Main10 => Self::H265_MAIN10_RAW,
            VideoFormat::Unknown(raw) => raw,
        }
    }

    /// Whether the format carries a VPS in addition to SPS/PPS.
    pub fn is_hevc(self) -> bool {
        matches!(self, VideoFormat::H265 | VideoFormat::H265Main10)
    }
}

/// Audio channel layout negotiated with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum AudioConfiguration {
    /// Two channels (AUDIO_CONFIGURATION_STEREO)
    #[default]
    Stereo,
    /// Six channels (AUDIO_CONFIGURATION_51_SURROUND)
    Surround51,
}

impl AudioConfiguration {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(AudioConfiguration::Stereo),
            1 => Some(AudioConfiguration::Surround51),
            _ => None,
        }
    }

    pub const fn as_raw(self) -> i32 {
        match self {
            AudioConfiguration::Stereo => 0,
            AudioConfiguration::Surround51 => 1,
        }
    }

    pub const fn channel_count(self) -> u8 {
        match self {
            AudioConfiguration::Stereo => 2,
            AudioConfiguration::Surround51 => 6,
        }
    }
}
