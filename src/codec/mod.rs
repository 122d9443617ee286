//! Multistream Opus decoder integration.
//!
//! The decode algorithm itself lives behind [`MultistreamDecoder`]; this module owns the
//! decoder's lifetime and the fixed PCM buffer it decodes into.
//!
//! - [`DecoderFactory`] builds a decoder from an [`OpusMultistreamConfig`]
//! - [`CodecSession`] holds at most one decoder plus its [`PcmBuffer`]
//!
//! With the `libopus` feature enabled, [`opus::LibOpusFactory`] links the system libopus.

#[cfg(feature = "libopus")]
pub mod opus;

use tracing::{debug, error, info, trace, warn};

use crate::buffer::PcmBuffer;
use crate::types::OpusMultistreamConfig;
use crate::{Result, StreamError};

/// Samples per channel in every audio packet the host sends (5 ms at 48 kHz).
pub const PCM_FRAME_SIZE: usize = 240;

/// A multistream audio decoder instance.
pub trait MultistreamDecoder: Send {
    /// Decode one packet into interleaved `pcm`, producing at most `frame_size` samples per
    /// channel.
    ///
    /// Returns the number of samples per channel decoded, or a negative decoder error code.
    fn decode(&mut self, packet: &[u8], pcm: &mut [i16], frame_size: usize) -> i32;
}

/// Creates decoders for new audio sessions.
pub trait DecoderFactory: Send {
    fn create(&self, config: &OpusMultistreamConfig) -> Result<Box<dyn MultistreamDecoder>>;
}

impl<F> DecoderFactory for F
where
    F: Fn(&OpusMultistreamConfig) -> Result<Box<dyn MultistreamDecoder>> + Send,
{
    fn create(&self, config: &OpusMultistreamConfig) -> Result<Box<dyn MultistreamDecoder>> {
        self(config)
    }
}

/// Lifetime owner for one decoder and its output buffer.
#[derive(Default)]
pub struct CodecSession {
    decoder: Option<Box<dyn MultistreamDecoder>>,
    pcm: Option<PcmBuffer>,
}

impl CodecSession {
    pub fn new() -> Self {
        Self { decoder: None, pcm: None }
    }

    /// Create the decoder and size the PCM buffer.
    ///
    /// Any failure destroys whatever was already constructed before returning a
    /// [`StreamError::CodecInit`].
    pub fn create(
        &mut self,
        factory: &dyn DecoderFactory,
        config: &OpusMultistreamConfig,
    ) -> Result<()> {
        if self.is_active() {
            warn!("Codec session created twice without cleanup, destroying previous decoder");
            self.destroy();
        }

        if let Err(e) = config.validate() {
            error!(error = %e, "Rejected Opus configuration");
            return Err(e);
        }

        let decoder = match factory.create(config) {
            Ok(decoder) => decoder,
            Err(e) => {
                error!(error = %e, "Failed to create multistream decoder");
                self.destroy();
                return Err(match e {
                    StreamError::CodecInit { .. } => e,
                    other => StreamError::codec_init(other.to_string(), None),
                });
            }
        };

        self.decoder = Some(decoder);
        self.pcm = Some(PcmBuffer::new(
            config.channel_count as usize,
            config.sample_rate,
            PCM_FRAME_SIZE,
        ));

        info!(
            sample_rate = config.sample_rate,
            channels = config.channel_count,
            streams = config.streams,
            coupled_streams = config.coupled_streams,
            "Created multistream decoder"
        );
        Ok(())
    }

    /// Decode one packet into the fixed PCM buffer.
    ///
    /// Returns the decoder's sample count; zero or negative means nothing usable was
    /// produced.
    pub fn decode(&mut self, packet: &[u8]) -> Result<i32> {
        let (Some(decoder), Some(pcm)) = (self.decoder.as_mut(), self.pcm.as_mut()) else {
            return Err(StreamError::CodecNotInitialized);
        };

        let frame_size = pcm.frame_sample_count();
        let decoded = decoder.decode(packet, pcm.samples_mut(), frame_size);
        trace!(packet_len = packet.len(), decoded, "Decoded audio packet");
        Ok(decoded)
    }

    /// The PCM buffer, present while the session is active.
    pub fn pcm(&self) -> Option<&PcmBuffer> {
        self.pcm.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.decoder.is_some()
    }

    /// Release the decoder and PCM buffer. Safe to call when nothing exists.
    pub fn destroy(&mut self) {
        if self.decoder.take().is_some() {
            debug!("Destroyed multistream decoder");
        }
        self.pcm = None;
    }
}

impl std::fmt::Debug for CodecSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecSession")
            .field("active", &self.is_active())
            .field("pcm_bytes", &self.pcm.as_ref().map(PcmBuffer::byte_len))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedDecoderFactory, failing_factory};

    #[test]
    fn create_sizes_buffer_from_channel_count() {
        let factory = ScriptedDecoderFactory::new(vec![240]);
        let mut session = CodecSession::new();

        session.create(&factory, &OpusMultistreamConfig::stereo()).unwrap();
        assert!(session.is_active());
        assert_eq!(session.pcm().map(PcmBuffer::byte_len), Some(960));

        session.destroy();
        session.create(&factory, &OpusMultistreamConfig::surround51()).unwrap();
        assert_eq!(session.pcm().map(PcmBuffer::byte_len), Some(6 * 240 * 2));
    }

    #[test]
    fn decode_writes_into_fixed_buffer() {
        let factory = ScriptedDecoderFactory::new(vec![240, 120]);
        let mut session = CodecSession::new();
        session.create(&factory, &OpusMultistreamConfig::stereo()).unwrap();

        assert_eq!(session.decode(&[1, 2, 3]).unwrap(), 240);
        assert_eq!(session.pcm().unwrap().byte_len(), 960);
        let expected: Vec<i16> = (0..480).map(|i| i as i16).collect();
        assert_eq!(session.pcm().unwrap().samples(), &expected[..]);
        assert_eq!(session.decode(&[4]).unwrap(), 120);
        assert_eq!(session.pcm().unwrap().byte_len(), 960);
        assert_eq!(factory.frame_sizes_seen(), vec![240, 240]);
    }

    #[test]
    fn factory_failure_leaves_nothing_behind() {
        let mut session = CodecSession::new();
        let err = session.create(&failing_factory(-3), &OpusMultistreamConfig::stereo()).unwrap_err();

        assert!(matches!(err, StreamError::CodecInit { code: Some(-3), .. }));
        assert_eq!(err.status_code(), -1);
        assert!(!session.is_active());
        assert!(session.pcm().is_none());
    }

    #[test]
    fn invalid_config_is_rejected_before_factory() {
        let factory = ScriptedDecoderFactory::new(vec![]);
        let mut config = OpusMultistreamConfig::stereo();
        config.mapping = vec![0, 1, 2];

        let mut session = CodecSession::new();
        assert!(session.create(&factory, &config).is_err());
        assert_eq!(factory.created(), 0);
    }

    #[test]
    fn decode_without_decoder_errors() {
        let mut session = CodecSession::new();
        assert!(matches!(session.decode(&[0]), Err(StreamError::CodecNotInitialized)));
    }

    #[test]
    fn destroy_is_idempotent() {
        let factory = ScriptedDecoderFactory::new(vec![]);
        let mut session = CodecSession::new();
        session.destroy();

        session.create(&factory, &OpusMultistreamConfig::stereo()).unwrap();
        session.destroy();
        session.destroy();
        assert!(!session.is_active());
        assert!(session.pcm().is_none());
    }

    #[test]
    fn closures_act_as_factories() {
        let factory = |config: &OpusMultistreamConfig| -> Result<Box<dyn MultistreamDecoder>> {
            Err(StreamError::config(format!("no decoder for {} channels", config.channel_count)))
        };

        let mut session = CodecSession::new();
        let err = session.create(&factory, &OpusMultistreamConfig::stereo()).unwrap_err();
        assert!(matches!(err, StreamError::CodecInit { code: None, .. }));
        assert!(err.to_string().contains("2 channels"));
    }
}
