//! Audio decode and playback routing.
//!
//! Each compressed packet is decoded into the codec session's fixed PCM buffer and, when
//! the decoder produced samples, the whole buffer is handed to the audio renderer.

use tracing::{error, info, trace, warn};

use crate::codec::{CodecSession, DecoderFactory};
use crate::renderer::AudioRenderer;
use crate::types::{AudioConfiguration, OpusMultistreamConfig};
use crate::{Result, StreamError};

/// Counters for the lifetime of an audio pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioStats {
    pub packets_decoded: u64,
    pub packets_dropped: u64,
}

/// Audio half of a streaming session.
pub struct AudioPipeline {
    renderer: Box<dyn AudioRenderer>,
    factory: Box<dyn DecoderFactory>,
    codec: CodecSession,
    stats: AudioStats,
}

impl AudioPipeline {
    pub fn new(renderer: Box<dyn AudioRenderer>, factory: Box<dyn DecoderFactory>) -> Self {
        Self { renderer, factory, codec: CodecSession::new(), stats: AudioStats::default() }
    }

    /// Initialize the renderer, then create the decoder and its PCM buffer.
    ///
    /// A renderer refusal is returned as-is. A decoder failure runs a full
    /// [`cleanup`](Self::cleanup) before the error is returned.
    pub fn init(
        &mut self,
        configuration: AudioConfiguration,
        opus_config: &OpusMultistreamConfig,
        flags: i32,
    ) -> Result<()> {
        info!(?configuration, flags, "Initializing audio renderer");

        let status = self.renderer.initialize(configuration);
        if status != 0 {
            warn!(status, "Audio renderer refused initialization");
            return Err(StreamError::renderer_rejected("audio initialize", status));
        }

        if let Err(e) = self.codec.create(self.factory.as_ref(), opus_config) {
            error!(error = %e, "Audio initialization failed, cleaning up");
            self.cleanup();
            return Err(e);
        }

        Ok(())
    }

    pub fn start(&mut self) {
        info!("Starting audio renderer");
        self.renderer.start();
    }

    pub fn stop(&mut self) {
        info!("Stopping audio renderer");
        self.renderer.stop();
    }

    /// Destroy the decoder, free the PCM buffer and clean up the renderer.
    pub fn cleanup(&mut self) {
        info!(stats = ?self.stats, "Cleaning up audio pipeline");
        self.codec.destroy();
        self.renderer.cleanup();
    }

    /// Decode one packet and forward the full PCM buffer if any samples came out.
    ///
    /// Returns the decoder's sample count.
    pub fn decode_and_play_sample(&mut self, packet: &[u8]) -> Result<i32> {
        let decoded = match self.codec.decode(packet) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, "Dropping audio packet");
                self.stats.packets_dropped += 1;
                return Err(e);
            }
        };

        match self.codec.pcm() {
            Some(pcm) if decoded > 0 => {
                self.renderer.handle_frame(pcm.as_bytes());
                self.stats.packets_decoded += 1;
            }
            _ => {
                trace!(decoded, packet_len = packet.len(), "Decoder produced no samples");
                self.stats.packets_dropped += 1;
            }
        }

        Ok(decoded)
    }

    /// Size of the PCM buffer forwarded per packet, if a decoder is active.
    pub fn pcm_buffer_len(&self) -> Option<usize> {
        self.codec.pcm().map(|pcm| pcm.byte_len())
    }

    pub fn has_decoder(&self) -> bool {
        self.codec.is_active()
    }

    pub fn stats(&self) -> AudioStats {
        self.stats
    }
}

impl std::fmt::Debug for AudioPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioPipeline")
            .field("codec", &self.codec)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
