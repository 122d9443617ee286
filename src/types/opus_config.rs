//! Opus multistream decoder parameters

use serde::{Deserialize, Serialize};

use crate::{Result, StreamError};

/// Largest channel count the engine negotiates.
pub const MAX_OPUS_CHANNELS: u8 = 8;

/// Parameters for creating a multistream Opus decoder.
/// Mirrors the engine's `OPUS_MULTISTREAM_CONFIGURATION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct OpusMultistreamConfig {
    /// Output sample rate in Hz (48000 for every host stream)
    pub sample_rate: u32,
    /// Number of output channels
    pub channel_count: u8,
    /// Total number of Opus streams in each packet
    pub streams: u8,
    /// Number of those streams that are coupled (stereo)
    pub coupled_streams: u8,
    /// Output channel to decoded stream channel mapping
    pub mapping: Vec<u8>,
}

impl OpusMultistreamConfig {
    /// Standard stereo layout: one coupled stream.
    pub fn stereo() -> Self {
        Self { sample_rate: 48_000, channel_count: 2, streams: 1, coupled_streams: 1, mapping: vec![0, 1] }
    }

    /// Standard 5.1 layout: four streams, two of them coupled.
    pub fn surround51() -> Self {
        Self {
            sample_rate: 48_000,
            channel_count: 6,
            streams: 4,
            coupled_streams: 2,
            mapping: vec![0, 4, 1, 5, 2, 3],
        }
    }

    /// Check the parameters are acceptable to a multistream decoder.
    pub fn validate(&self) -> Result<()> {
        if self.channel_count == 0 || self.channel_count > MAX_OPUS_CHANNELS {
            return Err(StreamError::codec_init(
                format!("channel count {} outside 1..={}", self.channel_count, MAX_OPUS_CHANNELS),
                None,
            ));
        }

        if self.streams == 0 || self.coupled_streams > self.streams {
            return Err(StreamError::codec_init(
                format!(
                    "invalid stream layout: {} streams, {} coupled",
                    self.streams, self.coupled_streams
                ),
                None,
            ));
        }

        if self.mapping.len() != self.channel_count as usize {
            return Err(StreamError::codec_init(
                format!(
                    "mapping has {} entries for {} channels",
                    self.mapping.len(),
                    self.channel_count
                ),
                None,
            ));
        }

        // 255 marks a silent output channel
        let decoded_channels = self.streams as usize + self.coupled_streams as usize;
        if let Some(bad) = self.mapping.iter().find(|&&m| m != 255 && m as usize >= decoded_channels) {
            return Err(StreamError::codec_init(
                format!("mapping entry {} exceeds {} decoded channels", bad, decoded_channels),
                None,
            ));
        }

        Ok(())
    }
}

impl Default for OpusMultistreamConfig {
    fn default() -> Self {
        Self::stereo()
    }
}
