//! Decode unit and buffer fragment types

use serde::{Deserialize, Serialize};

/// Kind of data carried by a buffer fragment.
/// Maps to the engine's `BUFFER_TYPE_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum BufferType {
    /// Compressed picture data (maps to BUFFER_TYPE_PICDATA)
    PictureData,
    /// H.264/HEVC sequence parameter set (maps to BUFFER_TYPE_SPS)
    Sps,
    /// H.264/HEVC picture parameter set (maps to BUFFER_TYPE_PPS)
    Pps,
    /// HEVC video parameter set (maps to BUFFER_TYPE_VPS)
    Vps,
    /// Tag this crate does not recognize, passed through unchanged
    Other(i32),
}

impl BufferType {
    /// Convert the engine's raw buffer type.
    ///
    /// Unknown values keep their raw tag and are handled like parameter sets, so they are
    /// delivered to the renderer on their own rather than spliced into picture data.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => BufferType::PictureData,
            1 => BufferType::Sps,
            2 => BufferType::Pps,
            3 => BufferType::Vps,
            other => BufferType::Other(other),
        }
    }

    /// Raw value passed to renderers as the frame type.
    pub const fn as_raw(self) -> i32 {
        match self {
            BufferType::PictureData => 0,
            BufferType::Sps => 1,
            BufferType::Pps => 2,
            BufferType::Vps => 3,
            BufferType::Other(raw) => raw,
        }
    }

    /// Whether this fragment is codec configuration rather than picture data.
    pub const fn is_parameter_set(self) -> bool {
        !matches!(self, BufferType::PictureData)
    }
}

/// A tagged byte range inside a [`DecodeUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferFragment<'a> {
    pub buffer_type: BufferType,
    pub data: &'a [u8],
}

impl<'a> BufferFragment<'a> {
    pub fn new(buffer_type: BufferType, data: &'a [u8]) -> Self {
        Self { buffer_type, data }
    }

    pub fn picture_data(data: &'a [u8]) -> Self {
        Self::new(BufferType::PictureData, data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One video access unit as delivered by the engine.
///
/// Fragments borrow engine memory and are only valid for the duration of a single
/// submission; order is significant because picture data is concatenated positionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeUnit<'a> {
    /// Monotonically increasing frame number
    pub frame_number: i32,
    /// Time the first packet of this unit was received, in milliseconds
    pub receive_time_ms: u64,
    /// Total length in bytes as declared by the engine
    pub full_length: usize,
    /// Fragments in stream order
    pub fragments: Vec<BufferFragment<'a>>,
}

impl<'a> DecodeUnit<'a> {
    /// Create a decode unit whose declared length is the sum of its fragments.
    pub fn new(frame_number: i32, receive_time_ms: u64, fragments: Vec<BufferFragment<'a>>) -> Self {
        let full_length = fragments.iter().map(BufferFragment::len).sum();
        Self { frame_number, receive_time_ms, full_length, fragments }
    }

    /// Create a decode unit with an engine-declared total length.
    pub fn with_full_length(
        frame_number: i32,
        receive_time_ms: u64,
        full_length: usize,
        fragments: Vec<BufferFragment<'a>>,
    ) -> Self {
        Self { frame_number, receive_time_ms, full_length, fragments }
    }

    /// Sum of all fragment lengths.
    pub fn fragment_bytes(&self) -> usize {
        self.fragments.iter().map(BufferFragment::len).sum()
    }

    /// Number of parameter set fragments in this unit.
    pub fn parameter_set_count(&self) -> usize {
        self.fragments.iter().filter(|f| f.buffer_type.is_parameter_set()).count()
    }
}
