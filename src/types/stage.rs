//! Connection establishment stages

use serde::{Deserialize, Serialize};

/// Stage of connection establishment reported by the engine.
/// Maps to the engine's `STAGE_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum Stage {
    None,
    PlatformInit,
    NameResolution,
    AudioStreamInit,
    RtspHandshake,
    ControlStreamInit,
    VideoStreamInit,
    InputStreamInit,
    ControlStreamStart,
    VideoStreamStart,
    AudioStreamStart,
    InputStreamStart,
    /// Stage id this crate does not recognize
    Unknown(i32),
}

const STAGES: [Stage; 12] = [
    Stage::None,
    Stage::PlatformInit,
    Stage::NameResolution,
    Stage::AudioStreamInit,
    Stage::RtspHandshake,
    Stage::ControlStreamInit,
    Stage::VideoStreamInit,
    Stage::InputStreamInit,
    Stage::ControlStreamStart,
    Stage::VideoStreamStart,
    Stage::AudioStreamStart,
    Stage::InputStreamStart,
];

impl Stage {
    pub fn from_raw(raw: i32) -> Self {
        usize::try_from(raw)
            .ok()
            .and_then(|idx| STAGES.get(idx).copied())
            .unwrap_or(Stage::Unknown(raw))
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Stage::Unknown(raw) => raw,
            known => STAGES.iter().position(|s| *s == known).map(|idx| idx as i32).unwrap_or(-1),
        }
    }

    /// Human-readable name, matching the engine's stage name table.
    pub fn name(self) -> &'static str {
        match self {
            Stage::None => "none",
            Stage::PlatformInit => "platform initialization",
            Stage::NameResolution => "name resolution",
            Stage::AudioStreamInit => "audio stream initialization",
            Stage::RtspHandshake => "RTSP handshake",
            Stage::ControlStreamInit => "control stream initialization",
            Stage::VideoStreamInit => "video stream initialization",
            Stage::InputStreamInit => "input stream initialization",
            Stage::ControlStreamStart => "control stream establishment",
            Stage::VideoStreamStart => "video stream establishment",
            Stage::AudioStreamStart => "audio stream establishment",
            Stage::InputStreamStart => "input stream establishment",
            Stage::Unknown(_) => "unknown",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
