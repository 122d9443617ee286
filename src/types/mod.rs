//! Core types shared by the video and audio pipelines.
//!
//! The types map directly to structures the streaming engine hands across its callback
//! boundary:
//! - [`DecodeUnit`] is one video access unit made of ordered [`BufferFragment`]s
//! - [`BufferType`] tags each fragment as picture data or a parameter set
//! - [`VideoFormat`] and [`AudioConfiguration`] identify the negotiated codecs
//! - [`OpusMultistreamConfig`] carries the multistream decoder parameters
//! - [`Stage`] identifies a connection establishment stage
//!
//! ## Usage Example
//!
//! ```rust
//! use moonlight_interop::types::{BufferFragment, BufferType, DecodeUnit};
//!
//! let sps = [0x67, 0x64, 0x00, 0x28];
//! let slice = [0x65, 0x88, 0x84, 0x00, 0x33];
//!
//! let unit = DecodeUnit::new(
//!     42,   // frame number
//!     1000, // receive time (ms)
//!     vec![
//!         BufferFragment::new(BufferType::Sps, &sps),
//!         BufferFragment::picture_data(&slice),
//!     ],
//! );
//!
//! assert_eq!(unit.full_length, 9);
//! assert_eq!(unit.parameter_set_count(), 1);
//! ```

mod decode_unit;
mod format;
mod opus_config;
mod stage;

// Re-export all public types
pub use decode_unit::{BufferFragment, BufferType, DecodeUnit};
pub use format::{AudioConfiguration, VideoFormat};
pub use opus_config::{MAX_OPUS_CHANNELS, OpusMultistreamConfig};
pub use stage::Stage;
