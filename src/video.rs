//! Video decode unit reassembly.
//!
//! The engine hands over each access unit as an ordered list of fragments. Parameter sets
//! are forwarded to the renderer one at a time as they are encountered; picture data is
//! concatenated into the frame buffer and forwarded once as a single access unit.

use tracing::{debug, info, trace, warn};

use crate::buffer::FrameBuffer;
use crate::renderer::VideoRenderer;
use crate::status::DecodeStatus;
use crate::types::{BufferType, DecodeUnit, VideoFormat};
use crate::{Result, StreamError};

/// Counters for the lifetime of a video pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoStats {
    pub units_submitted: u64,
    pub parameter_sets_forwarded: u64,
    pub pictures_forwarded: u64,
    pub units_rejected: u64,
    pub keyframe_requests: u64,
}

/// Video half of a streaming session.
pub struct VideoPipeline {
    renderer: Box<dyn VideoRenderer>,
    frame_buffer: FrameBuffer,
    stats: VideoStats,
}

impl VideoPipeline {
    pub fn new(renderer: Box<dyn VideoRenderer>) -> Self {
        Self { renderer, frame_buffer: FrameBuffer::new(), stats: VideoStats::default() }
    }

    /// Prepare the renderer for a new stream.
    pub fn setup(
        &mut self,
        format: VideoFormat,
        width: u32,
        height: u32,
        refresh_rate: u32,
        flags: i32,
    ) -> Result<()> {
        info!(?format, width, height, refresh_rate, flags, "Setting up video renderer");

        match self.renderer.initialize(format, width, height, refresh_rate) {
            0 => Ok(()),
            status => {
                warn!(status, "Video renderer refused initialization");
                Err(StreamError::renderer_rejected("video initialize", status))
            }
        }
    }

    pub fn start(&mut self) {
        info!("Starting video renderer");
        self.renderer.start();
    }

    /// Stop rendering. The frame buffer keeps its capacity until [`cleanup`](Self::cleanup).
    pub fn stop(&mut self) {
        info!("Stopping video renderer");
        self.renderer.stop();
    }

    /// Release the frame buffer and clean up the renderer.
    pub fn cleanup(&mut self) {
        info!(stats = ?self.stats, "Cleaning up video pipeline");
        self.frame_buffer.release();
        self.renderer.cleanup();
    }

    /// Reassemble one decode unit and hand it to the renderer.
    ///
    /// Returns the renderer's status for the picture data, the first non-OK status a
    /// parameter set produced, or [`DecodeStatus::NeedKeyframe`] when the unit could not be
    /// buffered.
    pub fn submit_decode_unit(&mut self, unit: &DecodeUnit<'_>) -> DecodeStatus {
        self.stats.units_submitted += 1;
        trace!(
            frame_number = unit.frame_number,
            full_length = unit.full_length,
            fragments = unit.fragments.len(),
            "Submitting decode unit"
        );

        let buffer = match self.frame_buffer.ensure_capacity(unit.full_length) {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!(frame_number = unit.frame_number, error = %e, "Requesting IDR frame");
                self.stats.keyframe_requests += 1;
                return DecodeStatus::NeedKeyframe;
            }
        };

        let mut offset = 0usize;
        for fragment in &unit.fragments {
            let len = fragment.data.len();

            if fragment.buffer_type.is_parameter_set() {
                // The start of the buffer is free until picture data lands there; after
                // that the fragment is forwarded from engine memory so it is not clobbered.
                let data = if offset == 0 {
                    match buffer.get_mut(..len) {
                        Some(dest) => {
                            dest.copy_from_slice(fragment.data);
                            &dest[..]
                        }
                        None => return self.overrun(unit, len),
                    }
                } else {
                    fragment.data
                };

                debug!(
                    frame_number = unit.frame_number,
                    buffer_type = ?fragment.buffer_type,
                    len,
                    "Forwarding parameter set"
                );
                let status = self.renderer.handle_frame(
                    data,
                    fragment.buffer_type,
                    unit.frame_number,
                    unit.receive_time_ms,
                );
                if !status.is_ok() {
                    warn!(frame_number = unit.frame_number, ?status, "Renderer rejected parameter set");
                    self.stats.units_rejected += 1;
                    return status;
                }
                self.stats.parameter_sets_forwarded += 1;
            } else {
                match buffer.get_mut(offset..offset + len) {
                    Some(dest) => dest.copy_from_slice(fragment.data),
                    None => return self.overrun(unit, offset + len),
                }
                offset += len;
            }
        }

        let status = self.renderer.handle_frame(
            &buffer[..offset],
            BufferType::PictureData,
            unit.frame_number,
            unit.receive_time_ms,
        );
        if status.is_ok() {
            self.stats.pictures_forwarded += 1;
        } else {
            warn!(frame_number = unit.frame_number, ?status, "Renderer rejected picture data");
            self.stats.units_rejected += 1;
        }
        status
    }

    /// Fragments overran the unit's declared length.
    fn overrun(&mut self, unit: &DecodeUnit<'_>, needed: usize) -> DecodeStatus {
        warn!(
            frame_number = unit.frame_number,
            declared = unit.full_length,
            needed,
            "Decode unit fragments exceed declared length, requesting IDR frame"
        );
        self.stats.keyframe_requests += 1;
        DecodeStatus::NeedKeyframe
    }

    /// Current frame buffer capacity in bytes.
    pub fn frame_buffer_capacity(&self) -> usize {
        self.frame_buffer.capacity()
    }

    pub fn stats(&self) -> VideoStats {
        self.stats
    }
}

impl std::fmt::Debug for VideoPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoPipeline")
            .field("frame_buffer", &self.frame_buffer)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
