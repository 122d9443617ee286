//! Stream configuration supplied once before the connection starts.
//!
//! The configuration is plain data: this crate validates the values it depends on and
//! otherwise passes the payload through to the engine untouched. The remote-input AES key
//! and IV are opaque byte sequences and are never logged.
//!
//! ```rust
//! use moonlight_interop::StreamConfiguration;
//!
//! let config = StreamConfiguration::from_yaml_str(
//!     r#"
//! width: 1920
//! height: 1080
//! fps: 60
//! bitrate: 20000
//! supports_hevc: true
//! "#,
//! )?;
//!
//! assert_eq!(config.width, 1920);
//! assert_eq!(config.packet_size, 1024);
//! # Ok::<(), moonlight_interop::StreamError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::types::{AudioConfiguration, VideoFormat};
use crate::{Result, StreamError};

/// Session configuration payload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default, deny_unknown_fields)]
pub struct StreamConfiguration {
    /// Stream width in pixels
    pub width: u32,
    /// Stream height in pixels
    pub height: u32,
    /// Target frame rate
    pub fps: u32,
    /// Target bitrate in kbps
    pub bitrate: u32,
    /// Maximum video packet size in bytes
    pub packet_size: u32,
    /// Whether the host is reached over the internet rather than the LAN
    pub streaming_remotely: bool,
    /// Audio channel layout
    pub audio_configuration: AudioConfiguration,
    /// Whether the client can decode HEVC
    pub supports_hevc: bool,
    /// Percentage of the H.264 bitrate to request when streaming HEVC
    pub hevc_bitrate_percentage_multiplier: u32,
    /// Request an HDR (HEVC Main10) stream
    pub enable_hdr: bool,
    /// Client display refresh rate multiplied by 100
    pub client_refresh_rate_x100: u32,
    /// Remote input encryption key, opaque to this crate
    pub remote_input_aes_key: Vec<u8>,
    /// Remote input encryption IV, opaque to this crate
    pub remote_input_aes_iv: Vec<u8>,
}

impl Default for StreamConfiguration {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 60,
            bitrate: 10_000,
            packet_size: 1024,
            streaming_remotely: false,
            audio_configuration: AudioConfiguration::Stereo,
            supports_hevc: false,
            hevc_bitrate_percentage_multiplier: 75,
            enable_hdr: false,
            client_refresh_rate_x100: 6000,
            remote_input_aes_key: Vec::new(),
            remote_input_aes_iv: Vec::new(),
        }
    }
}

impl StreamConfiguration {
    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: StreamConfiguration = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        debug!(?config, "Loaded stream configuration");
        Ok(config)
    }

    /// Read, parse and validate a YAML configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| StreamError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check the values this crate depends on.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StreamError::config(format!(
                "stream dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }

        if self.fps == 0 {
            return Err(StreamError::config("frame rate must be positive"));
        }

        if self.bitrate == 0 {
            return Err(StreamError::config("bitrate must be positive"));
        }

        if self.packet_size == 0 {
            return Err(StreamError::config("packet size must be positive"));
        }

        if self.supports_hevc && !(1..=100).contains(&self.hevc_bitrate_percentage_multiplier) {
            return Err(StreamError::config(format!(
                "HEVC bitrate multiplier must be within 1..=100, got {}",
                self.hevc_bitrate_percentage_multiplier
            )));
        }

        if self.enable_hdr && !self.supports_hevc {
            return Err(StreamError::config("HDR streaming requires HEVC support"));
        }

        Ok(())
    }

    /// Video format the client will ask the host for.
    pub fn preferred_video_format(&self) -> VideoFormat {
        match (self.supports_hevc, self.enable_hdr) {
            (true, true) => VideoFormat::H265Main10,
            (true, false) => VideoFormat::H265,
            _ => VideoFormat::H264,
        }
    }

    /// Client refresh rate in Hz.
    pub fn client_refresh_rate(&self) -> f64 {
        self.client_refresh_rate_x100 as f64 / 100.0
    }
}

impl std::fmt::Debug for StreamConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConfiguration")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fps", &self.fps)
            .field("bitrate", &self.bitrate)
            .field("packet_size", &self.packet_size)
            .field("streaming_remotely", &self.streaming_remotely)
            .field("audio_configuration", &self.audio_configuration)
            .field("supports_hevc", &self.supports_hevc)
            .field("hevc_bitrate_percentage_multiplier", &self.hevc_bitrate_percentage_multiplier)
            .field("enable_hdr", &self.enable_hdr)
            .field("client_refresh_rate_x100", &self.client_refresh_rate_x100)
            .field("remote_input_aes_key", &format_args!("<{} bytes>", self.remote_input_aes_key.len()))
            .field("remote_input_aes_iv", &format_args!("<{} bytes>", self.remote_input_aes_iv.len()))
            .finish()
    }
}
