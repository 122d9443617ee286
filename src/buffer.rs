//! Scratch buffers owned by the video and audio pipelines.
//!
//! Both buffers are owned exclusively by one pipeline and lent out as borrows for the
//! duration of a single engine callback. Neither type synchronizes internally; the engine
//! serializes calls within a pipeline and `&mut self` carries that guarantee.

use tracing::{debug, warn};

use crate::{Result, StreamError};

/// Width in bytes of one decoded PCM sample.
pub const SAMPLE_WIDTH: usize = std::mem::size_of::<i16>();

/// Growable scratch buffer for reassembling decode units.
///
/// Capacity only ever grows, and always to exactly the size requested. It returns to zero
/// only through [`FrameBuffer::release`].
#[derive(Debug, Default)]
pub struct FrameBuffer {
    data: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Current usable capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Make sure at least `required` bytes are available and return the whole buffer.
    ///
    /// When the buffer is too small it is replaced by one of exactly `required` bytes;
    /// previous contents are not preserved. On allocation failure the existing buffer is
    /// kept and [`StreamError::Allocation`] is returned.
    pub fn ensure_capacity(&mut self, required: usize) -> Result<&mut [u8]> {
        if self.data.len() < required {
            let mut grown = Vec::new();
            if let Err(e) = grown.try_reserve_exact(required) {
                warn!(requested = required, current = self.data.len(), "Frame buffer allocation failed");
                return Err(StreamError::Allocation { requested: required, source: Some(e) });
            }
            grown.resize(required, 0);

            debug!(from = self.data.len(), to = required, "Grew frame buffer");
            self.data = grown;
        }

        Ok(&mut self.data[..])
    }

    /// Free the buffer and reset capacity to zero. Safe to call repeatedly.
    pub fn release(&mut self) {
        if !self.data.is_empty() {
            debug!(capacity = self.data.len(), "Releasing frame buffer");
        }
        self.data = Vec::new();
    }
}

/// Fixed-size PCM output buffer for one decoded audio packet.
///
/// Sized once from the channel count and per-packet sample count; there is no resize path.
/// A different shape needs a new buffer.
#[derive(Debug)]
pub struct PcmBuffer {
    samples: Vec<i16>,
    channel_count: usize,
    sample_rate: u32,
    frame_sample_count: usize,
}

impl PcmBuffer {
    pub fn new(channel_count: usize, sample_rate: u32, frame_sample_count: usize) -> Self {
        let samples = vec![0i16; channel_count * frame_sample_count];
        debug!(
            channel_count,
            sample_rate,
            frame_sample_count,
            bytes = samples.len() * SAMPLE_WIDTH,
            "Allocated PCM buffer"
        );
        Self { samples, channel_count, sample_rate, frame_sample_count }
    }

    /// Size of the buffer in bytes: channels × samples per frame × sample width.
    pub fn byte_len(&self) -> usize {
        self.samples.len() * SAMPLE_WIDTH
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Maximum number of samples per channel a single decode may produce.
    pub fn frame_sample_count(&self) -> usize {
        self.frame_sample_count
    }

    /// Interleaved sample storage for the decoder to write into.
    pub fn samples_mut(&mut self) -> &mut [i16] {
        &mut self.samples
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// The whole buffer as native-endian bytes.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: any initialized i16 is two initialized bytes, u8 has alignment 1, and the
        // length covers exactly the sample storage.
        unsafe { std::slice::from_raw_parts(self.samples.as_ptr().cast::<u8>(), self.byte_len()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn grows_to_exact_size() {
        let mut buffer = FrameBuffer::new();
        assert_eq!(buffer.capacity(), 0);

        assert_eq!(buffer.ensure_capacity(100).unwrap().len(), 100);
        assert_eq!(buffer.capacity(), 100);

        // Smaller requests reuse the existing buffer
        assert_eq!(buffer.ensure_capacity(10).unwrap().len(), 100);
        assert_eq!(buffer.capacity(), 100);

        assert_eq!(buffer.ensure_capacity(101).unwrap().len(), 101);
        assert_eq!(buffer.capacity(), 101);
    }

    #[test]
    fn allocation_failure_keeps_existing_buffer() {
        let mut buffer = FrameBuffer::new();
        buffer.ensure_capacity(64).unwrap();

        let err = buffer.ensure_capacity(usize::MAX).unwrap_err();
        assert!(matches!(err, StreamError::Allocation { requested: usize::MAX, source: Some(_) }));
        assert!(err.is_recoverable());
        assert_eq!(buffer.capacity(), 64);
    }

    #[test]
    fn release_is_idempotent() {
        let mut buffer = FrameBuffer::new();
        buffer.ensure_capacity(4096).unwrap();

        buffer.release();
        assert_eq!(buffer.capacity(), 0);
        buffer.release();
        assert_eq!(buffer.capacity(), 0);

        // Usable again after release
        assert_eq!(buffer.ensure_capacity(8).unwrap().len(), 8);
    }

    #[test]
    fn stereo_pcm_buffer_is_960_bytes() {
        let mut pcm = PcmBuffer::new(2, 48_000, 240);
        assert_eq!(pcm.byte_len(), 960);
        assert_eq!(pcm.as_bytes().len(), 960);
        assert_eq!(pcm.samples_mut().len(), 480);
        assert_eq!(pcm.frame_sample_count(), 240);
        assert_eq!(pcm.sample_rate(), 48_000);
    }

    #[test]
    fn pcm_bytes_view_samples_in_native_order() {
        let mut pcm = PcmBuffer::new(1, 48_000, 2);
        pcm.samples_mut().copy_from_slice(&[0x1234, -2]);

        let mut expected = Vec::new();
        expected.extend_from_slice(&0x1234i16.to_ne_bytes());
        expected.extend_from_slice(&(-2i16).to_ne_bytes());
        assert_eq!(pcm.as_bytes(), expected.as_slice());
    }

    proptest! {
        #[test]
        fn prop_capacity_is_running_maximum(requests in prop::collection::vec(0usize..65536, 1..32)) {
            let mut buffer = FrameBuffer::new();
            let mut max_seen = 0usize;

            for required in requests {
                let previous = buffer.capacity();
                let len = buffer.ensure_capacity(required).unwrap().len();
                max_seen = max_seen.max(required);

                prop_assert!(len >= required);
                prop_assert!(buffer.capacity() >= previous);
                prop_assert_eq!(buffer.capacity(), max_seen);
            }
        }

        #[test]
        fn prop_pcm_size_is_channels_times_frame(channels in 1usize..=8, frame in 1usize..2048) {
            let pcm = PcmBuffer::new(channels, 48_000, frame);
            prop_assert_eq!(pcm.byte_len(), channels * frame * SAMPLE_WIDTH);
        }
    }
}
