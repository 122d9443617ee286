//! System libopus multistream backend.
//!
//! Declares the three multistream entry points the audio pipeline needs and wraps the
//! decoder handle so it is destroyed exactly once.

use libc::{c_int, c_uchar};
use std::ptr::NonNull;
use tracing::debug;

use super::{DecoderFactory, MultistreamDecoder};
use crate::types::OpusMultistreamConfig;
use crate::{Result, StreamError};

const OPUS_OK: c_int = 0;
const OPUS_BAD_ARG: c_int = -1;

/// Opus multistream decoder opaque type
#[repr(C)]
pub struct OpusMSDecoder {
    _private: [u8; 0],
}

#[link(name = "opus")]
unsafe extern "C" {
    fn opus_multistream_decoder_create(
        sample_rate: c_int,
        channels: c_int,
        streams: c_int,
        coupled_streams: c_int,
        mapping: *const c_uchar,
        error: *mut c_int,
    ) -> *mut OpusMSDecoder;

    fn opus_multistream_decode(
        st: *mut OpusMSDecoder,
        data: *const c_uchar,
        len: c_int,
        pcm: *mut i16,
        frame_size: c_int,
        decode_fec: c_int,
    ) -> c_int;

    fn opus_multistream_decoder_destroy(st: *mut OpusMSDecoder);
}

/// Owned libopus multistream decoder handle.
pub struct LibOpusDecoder {
    raw: NonNull<OpusMSDecoder>,
    channels: usize,
}

// SAFETY: the handle is exclusively owned and libopus decoder state has no thread affinity.
unsafe impl Send for LibOpusDecoder {}

impl LibOpusDecoder {
    pub fn new(config: &OpusMultistreamConfig) -> Result<Self> {
        config.validate()?;

        let mut err: c_int = OPUS_OK;
        let raw = unsafe {
            opus_multistream_decoder_create(
                config.sample_rate as c_int,
                config.channel_count as c_int,
                config.streams as c_int,
                config.coupled_streams as c_int,
                config.mapping.as_ptr(),
                &mut err,
            )
        };

        match NonNull::new(raw) {
            Some(raw) if err == OPUS_OK => {
                debug!("libopus multistream decoder created");
                Ok(Self { raw, channels: config.channel_count as usize })
            }
            Some(raw) => {
                // Handle came back alongside an error status
                unsafe { opus_multistream_decoder_destroy(raw.as_ptr()) };
                Err(StreamError::codec_init("opus_multistream_decoder_create", Some(err)))
            }
            None => Err(StreamError::codec_init("opus_multistream_decoder_create", Some(err))),
        }
    }
}

impl MultistreamDecoder for LibOpusDecoder {
    fn decode(&mut self, packet: &[u8], pcm: &mut [i16], frame_size: usize) -> i32 {
        let max_frame = frame_size.min(pcm.len() / self.channels);
        let (Ok(len), Ok(max_frame)) = (c_int::try_from(packet.len()), c_int::try_from(max_frame))
        else {
            return OPUS_BAD_ARG;
        };

        unsafe {
            opus_multistream_decode(
                self.raw.as_ptr(),
                packet.as_ptr(),
                len,
                pcm.as_mut_ptr(),
                max_frame,
                0,
            )
        }
    }
}

impl Drop for LibOpusDecoder {
    fn drop(&mut self) {
        unsafe { opus_multistream_decoder_destroy(self.raw.as_ptr()) };
    }
}

/// Factory producing [`LibOpusDecoder`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibOpusFactory;

impl DecoderFactory for LibOpusFactory {
    fn create(&self, config: &OpusMultistreamConfig) -> Result<Box<dyn MultistreamDecoder>> {
        Ok(Box::new(LibOpusDecoder::new(config)?))
    }
}
