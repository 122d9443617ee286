//! Raw engine structures and their conversion into the safe types.
//!
//! The streaming engine hands decode units across as a C linked list of buffer entries and
//! describes the audio stream with a fixed-size Opus configuration block. The structs here
//! mirror those layouts exactly; the conversions borrow the engine's memory for the
//! duration of one callback without copying.

use libc::{c_char, c_int, c_uchar, c_ulonglong};
use std::ffi::CStr;

use tracing::warn;

use crate::types::{BufferFragment, BufferType, DecodeUnit, MAX_OPUS_CHANNELS, OpusMultistreamConfig};
use crate::{Result, StreamError};

/// One entry of the engine's fragment list.
#[repr(C)]
#[derive(Debug)]
pub struct RawBufferEntry {
    pub next: *mut RawBufferEntry,
    pub data: *mut c_char,
    pub length: c_int,
    pub buffer_type: c_int,
}

/// A decode unit as delivered by the engine.
#[repr(C)]
#[derive(Debug)]
pub struct RawDecodeUnit {
    pub frame_number: c_int,
    pub receive_time_ms: c_ulonglong,
    pub full_length: c_int,
    pub buffer_list: *mut RawBufferEntry,
}

/// Opus multistream parameters as delivered by the engine.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawOpusConfig {
    pub sample_rate: c_int,
    pub channel_count: c_int,
    pub streams: c_int,
    pub coupled_streams: c_int,
    pub mapping: [c_uchar; MAPPING_LEN],
}

const MAPPING_LEN: usize = MAX_OPUS_CHANNELS as usize;

fn raw_len(length: c_int, what: &'static str) -> usize {
    usize::try_from(length).unwrap_or_else(|_| {
        warn!(length, what, "Negative length from engine, treating as empty");
        0
    })
}

/// Borrow a raw decode unit as a [`DecodeUnit`].
///
/// Fragments keep the engine's order. Negative lengths are treated as empty and unknown
/// buffer type tags follow [`BufferType::from_raw`].
///
/// # Safety
///
/// `raw.buffer_list` must be null or the head of a properly terminated list whose entries
/// each point at `length` readable bytes (or are null with a length of zero). The list and
/// its data must stay alive and unmodified for `'a`.
pub unsafe fn decode_unit_from_raw<'a>(raw: &'a RawDecodeUnit) -> DecodeUnit<'a> {
    let mut fragments = Vec::new();
    let mut entry = raw.buffer_list as *const RawBufferEntry;

    while !entry.is_null() {
        // SAFETY: non-null entries are valid for 'a per the caller contract
        let current = unsafe { &*entry };
        let len = raw_len(current.length, "buffer entry");
        let data: &'a [u8] = if current.data.is_null() || len == 0 {
            &[]
        } else {
            // SAFETY: data points at `length` readable bytes for 'a
            unsafe { std::slice::from_raw_parts(current.data as *const u8, len) }
        };
        fragments.push(BufferFragment::new(BufferType::from_raw(current.buffer_type), data));
        entry = current.next;
    }

    DecodeUnit::with_full_length(
        raw.frame_number,
        raw.receive_time_ms,
        raw_len(raw.full_length, "decode unit"),
        fragments,
    )
}

impl RawOpusConfig {
    /// Convert into a validated [`OpusMultistreamConfig`].
    pub fn to_config(&self) -> Result<OpusMultistreamConfig> {
        let narrow = |value: c_int, field: &str| {
            u8::try_from(value).map_err(|_| {
                StreamError::codec_init(format!("{field} out of range: {value}"), None)
            })
        };

        let sample_rate = u32::try_from(self.sample_rate).map_err(|_| {
            StreamError::codec_init(format!("sample rate out of range: {}", self.sample_rate), None)
        })?;
        let channel_count = narrow(self.channel_count, "channel count")?;
        let streams = narrow(self.streams, "stream count")?;
        let coupled_streams = narrow(self.coupled_streams, "coupled stream count")?;

        if channel_count > MAX_OPUS_CHANNELS {
            return Err(StreamError::codec_init(
                format!("channel count {channel_count} exceeds {MAX_OPUS_CHANNELS}"),
                None,
            ));
        }

        let config = OpusMultistreamConfig {
            sample_rate,
            channel_count,
            streams,
            coupled_streams,
            mapping: self.mapping[..channel_count as usize].to_vec(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<&OpusMultistreamConfig> for RawOpusConfig {
    fn from(config: &OpusMultistreamConfig) -> Self {
        let mut mapping = [0; MAPPING_LEN];
        for (slot, &channel) in mapping.iter_mut().zip(&config.mapping) {
            *slot = channel;
        }
        Self {
            sample_rate: config.sample_rate as c_int,
            channel_count: c_int::from(config.channel_count),
            streams: c_int::from(config.streams),
            coupled_streams: c_int::from(config.coupled_streams),
            mapping,
        }
    }
}

/// Copy a NUL-terminated engine string, replacing invalid UTF-8.
///
/// Returns an empty string for null.
///
/// # Safety
///
/// `ptr` must be null or point at a NUL-terminated string that stays valid for the call.
pub unsafe fn c_str_to_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: non-null and NUL-terminated per the caller contract
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    struct RawList {
        // Boxed so entry addresses stay put while `next` pointers refer to them.
        entries: Vec<Box<RawBufferEntry>>,
        _payloads: Vec<Vec<u8>>,
    }

    impl RawList {
        fn build(fragments: &[(c_int, &[u8])]) -> Self {
            let mut payloads: Vec<Vec<u8>> = fragments.iter().map(|(_, d)| d.to_vec()).collect();
            let mut entries: Vec<Box<RawBufferEntry>> = fragments
                .iter()
                .zip(payloads.iter_mut())
                .map(|((tag, _), payload)| {
                    Box::new(RawBufferEntry {
                        next: ptr::null_mut(),
                        data: payload.as_mut_ptr() as *mut c_char,
                        length: payload.len() as c_int,
                        buffer_type: *tag,
                    })
                })
                .collect();

            for i in (0..entries.len().saturating_sub(1)).rev() {
                let next: *mut RawBufferEntry = &mut *entries[i + 1];
                entries[i].next = next;
            }
            Self { entries, _payloads: payloads }
        }

        fn head(&mut self) -> *mut RawBufferEntry {
            self.entries.first_mut().map_or(ptr::null_mut(), |e| &mut **e as *mut _)
        }
    }

    #[test]
    fn linked_list_becomes_ordered_fragments() {
        let mut list = RawList::build(&[(1, &[0x67, 0x42][..]), (2, &[0x68][..]), (0, &[0x65, 0x88, 0x80][..])]);
        let raw = RawDecodeUnit {
            frame_number: 42,
            receive_time_ms: 9000,
            full_length: 6,
            buffer_list: list.head(),
        };

        let unit = unsafe { decode_unit_from_raw(&raw) };
        assert_eq!(unit.frame_number, 42);
        assert_eq!(unit.receive_time_ms, 9000);
        assert_eq!(unit.full_length, 6);

        let shape: Vec<_> = unit.fragments.iter().map(|f| (f.buffer_type, f.data.to_vec())).collect();
        assert_eq!(
            shape,
            vec![
                (BufferType::Sps, vec![0x67, 0x42]),
                (BufferType::Pps, vec![0x68]),
                (BufferType::PictureData, vec![0x65, 0x88, 0x80]),
            ]
        );
    }

    #[test]
    fn unknown_tags_are_preserved() {
        let mut list = RawList::build(&[(42, &[0x06][..]), (0, &[0x65][..])]);
        let raw = RawDecodeUnit { frame_number: 5, receive_time_ms: 0, full_length: 2, buffer_list: list.head() };

        let unit = unsafe { decode_unit_from_raw(&raw) };
        let tags: Vec<_> = unit.fragments.iter().map(|f| f.buffer_type.as_raw()).collect();
        assert_eq!(tags, vec![42, 0]);
        assert_eq!(unit.fragments[0].buffer_type, BufferType::Other(42));
    }

    #[test]
    fn empty_list_and_negative_lengths() {
        let mut list = RawList::build(&[(0, &[1, 2, 3][..])]);
        list.entries[0].length = -5;

        let raw = RawDecodeUnit {
            frame_number: 1,
            receive_time_ms: 0,
            full_length: -1,
            buffer_list: list.head(),
        };
        let unit = unsafe { decode_unit_from_raw(&raw) };
        assert_eq!(unit.full_length, 0);
        assert_eq!(unit.fragments.len(), 1);
        assert!(unit.fragments[0].is_empty());

        let raw = RawDecodeUnit {
            frame_number: 2,
            receive_time_ms: 0,
            full_length: 0,
            buffer_list: ptr::null_mut(),
        };
        assert!(unsafe { decode_unit_from_raw(&raw) }.fragments.is_empty());
    }

    #[test]
    fn opus_config_converts_and_validates() {
        let raw = RawOpusConfig::from(&OpusMultistreamConfig::surround51());
        assert_eq!(raw.to_config().unwrap(), OpusMultistreamConfig::surround51());

        let mut bad = raw;
        bad.channel_count = 9;
        assert!(matches!(bad.to_config(), Err(StreamError::CodecInit { .. })));

        let mut bad = raw;
        bad.streams = -1;
        assert!(bad.to_config().is_err());

        let mut bad = RawOpusConfig::from(&OpusMultistreamConfig::stereo());
        bad.mapping[1] = 7;
        assert!(bad.to_config().is_err());
    }

    #[test]
    fn c_strings_are_copied_lossily() {
        let text = c"Starting RTSP handshake";
        assert_eq!(unsafe { c_str_to_string(text.as_ptr()) }, "Starting RTSP handshake");
        assert_eq!(unsafe { c_str_to_string(ptr::null()) }, "");

        let invalid = [0x66u8, 0xFF, 0x00];
        assert_eq!(unsafe { c_str_to_string(invalid.as_ptr() as *const c_char) }, "f\u{FFFD}");
    }
}
