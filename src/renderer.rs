//! Collaborator traits implemented by the application.
//!
//! Renderers are owned by their pipeline for the whole session and are only ever called
//! from that pipeline's engine thread, so every method takes `&mut self` and the traits
//! require `Send` but not `Sync`.

use crate::status::DecodeStatus;
use crate::types::{AudioConfiguration, BufferType, VideoFormat};

/// Consumer of reassembled video frames.
pub trait VideoRenderer: Send {
    /// Prepare for a stream of the given format. Returns `0` on success; any other value is
    /// reported back to the engine.
    fn initialize(&mut self, format: VideoFormat, width: u32, height: u32, refresh_rate: u32) -> i32;

    fn start(&mut self);

    fn stop(&mut self);

    fn cleanup(&mut self);

    /// Handle one complete frame.
    ///
    /// Parameter sets arrive one per call with their own [`BufferType`]; picture data
    /// arrives as a single contiguous access unit tagged [`BufferType::PictureData`]. The
    /// slice is only valid for the duration of the call.
    fn handle_frame(
        &mut self,
        data: &[u8],
        buffer_type: BufferType,
        frame_number: i32,
        receive_time_ms: u64,
    ) -> DecodeStatus;
}

/// Consumer of decoded PCM audio.
pub trait AudioRenderer: Send {
    /// Prepare for the given channel layout. Returns `0` on success.
    fn initialize(&mut self, configuration: AudioConfiguration) -> i32;

    fn start(&mut self);

    fn stop(&mut self);

    fn cleanup(&mut self);

    /// Handle one packet worth of interleaved 16-bit native-endian PCM.
    fn handle_frame(&mut self, pcm: &[u8]);
}

/// Receiver of connection lifecycle notifications.
///
/// Stage identifiers have already been translated to human-readable names.
pub trait ConnectionListener: Send {
    fn stage_starting(&mut self, stage: &str);

    fn stage_complete(&mut self, stage: &str);

    fn stage_failed(&mut self, stage: &str, error_code: i64);

    fn connection_started(&mut self);

    fn connection_terminated(&mut self, error_code: i64);

    fn display_message(&mut self, message: &str);

    fn display_transient_message(&mut self, message: &str);

    fn log_message(&mut self, message: &str);
}
