//! Safe Rust bindings between a game-streaming engine and an application's media stack.
//!
//! The streaming engine delivers compressed video and audio through C callbacks and reports
//! connection progress through a listener table. This crate owns the parts in between:
//!
//! - **Video**: reassembles fragmented decode units into one contiguous access unit,
//!   forwarding parameter sets individually, in a buffer that is reused across frames
//! - **Audio**: decodes multistream Opus packets into a fixed PCM buffer and forwards it
//! - **Connection**: translates stage ids into names and renders engine log templates into
//!   bounded strings
//!
//! Applications implement [`VideoRenderer`], [`AudioRenderer`] and [`ConnectionListener`]
//! and bind them to a [`StreamSession`].
//!
//! # Quick Start
//!
//! ```rust
//! use moonlight_interop::{
//!     AudioConfiguration, AudioRenderer, BufferFragment, BufferType, ChannelListener,
//!     DecodeStatus, DecodeUnit, MultistreamDecoder, OpusMultistreamConfig,
//!     StreamConfiguration, StreamSession, VideoFormat, VideoRenderer,
//! };
//!
//! struct Screen;
//!
//! impl VideoRenderer for Screen {
//!     fn initialize(&mut self, _: VideoFormat, _: u32, _: u32, _: u32) -> i32 { 0 }
//!     fn start(&mut self) {}
//!     fn stop(&mut self) {}
//!     fn cleanup(&mut self) {}
//!     fn handle_frame(&mut self, data: &[u8], _: BufferType, _: i32, _: u64) -> DecodeStatus {
//!         println!("{} bytes", data.len());
//!         DecodeStatus::Ok
//!     }
//! }
//!
//! struct Speakers;
//!
//! impl AudioRenderer for Speakers {
//!     fn initialize(&mut self, _: AudioConfiguration) -> i32 { 0 }
//!     fn start(&mut self) {}
//!     fn stop(&mut self) {}
//!     fn cleanup(&mut self) {}
//!     fn handle_frame(&mut self, _pcm: &[u8]) {}
//! }
//!
//! struct Silence;
//!
//! impl MultistreamDecoder for Silence {
//!     fn decode(&mut self, _: &[u8], pcm: &mut [i16], frame_size: usize) -> i32 {
//!         pcm.fill(0);
//!         frame_size as i32
//!     }
//! }
//!
//! # fn main() -> moonlight_interop::Result<()> {
//! let (listener, _events) = ChannelListener::new();
//! let decoders = |_: &OpusMultistreamConfig| -> moonlight_interop::Result<Box<dyn MultistreamDecoder>> {
//!     Ok(Box::new(Silence))
//! };
//!
//! let mut session = StreamSession::new(
//!     StreamConfiguration::default(),
//!     Box::new(Screen),
//!     Box::new(Speakers),
//!     Box::new(listener),
//!     Box::new(decoders),
//! )?;
//!
//! session.video().setup(VideoFormat::H264, 1280, 720, 60, 0)?;
//! let sps = [0x67, 0x42, 0x00, 0x1F];
//! let idr = [0x65, 0x88, 0x80];
//! let unit = DecodeUnit::new(
//!     1,
//!     0,
//!     vec![BufferFragment::new(BufferType::Sps, &sps), BufferFragment::picture_data(&idr)],
//! );
//! assert_eq!(session.video().submit_decode_unit(&unit), DecodeStatus::Ok);
//!
//! session.audio().init(AudioConfiguration::Stereo, &OpusMultistreamConfig::stereo(), 0)?;
//! assert_eq!(session.audio().decode_and_play_sample(&[0xFC])?, 240);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `libopus`: link the system libopus and provide [`codec::opus::LibOpusFactory`]
//! - `tauri`: derive `specta::Type` for the serializable types
//! - `benchmark`: expose [`test_utils`] to the criterion benchmarks

// Core types and error handling
mod error;
pub mod status;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Configuration and collaborator contracts
pub mod config;
pub mod renderer;

// Pipelines
pub mod audio;
pub mod buffer;
pub mod codec;
pub mod listener;
pub mod session;
pub mod video;

// Engine boundary
pub mod ffi;

// Core exports
pub use error::*;
pub use status::DecodeStatus;
pub use types::*;

// Main API exports
pub use audio::{AudioPipeline, AudioStats};
pub use buffer::{FrameBuffer, PcmBuffer};
pub use codec::{CodecSession, DecoderFactory, MultistreamDecoder, PCM_FRAME_SIZE};
pub use config::StreamConfiguration;
pub use listener::{ChannelListener, ConnectionBridge, ConnectionEvent, LogArg};
pub use renderer::{AudioRenderer, ConnectionListener, VideoRenderer};
pub use session::{SessionParts, StreamSession};
pub use video::{VideoPipeline, VideoStats};
