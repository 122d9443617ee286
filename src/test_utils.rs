//! Test doubles for renderers, listeners and decoders.
//!
//! Every recorder is cheaply cloneable and shares its state between clones, so a test can
//! hand one clone to a pipeline as a boxed trait object and keep the other to inspect
//! what the pipeline did.

#![cfg(any(test, feature = "benchmark"))]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::codec::{DecoderFactory, MultistreamDecoder};
use crate::renderer::{AudioRenderer, ConnectionListener, VideoRenderer};
use crate::status::DecodeStatus;
use crate::types::{AudioConfiguration, BufferType, OpusMultistreamConfig, VideoFormat};
use crate::{Result, StreamError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A frame delivered to [`RecordingVideoRenderer`], copied out of the frame buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFrame {
    pub data: Vec<u8>,
    pub buffer_type: BufferType,
    pub frame_number: i32,
    pub receive_time_ms: u64,
}

impl RecordedFrame {
    pub fn new(data: &[u8], buffer_type: BufferType, frame_number: i32, receive_time_ms: u64) -> Self {
        Self { data: data.to_vec(), buffer_type, frame_number, receive_time_ms }
    }
}

/// Lifecycle calls seen by [`RecordingVideoRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCall {
    Initialize { format: VideoFormat, width: u32, height: u32, refresh_rate: u32 },
    Start,
    Stop,
    Cleanup,
}

#[derive(Debug, Default)]
struct VideoState {
    initialize_status: i32,
    statuses: VecDeque<DecodeStatus>,
    frames: Vec<RecordedFrame>,
    lifecycle: Vec<VideoCall>,
}

/// Video renderer that records everything and answers with scripted statuses.
///
/// Once the scripted statuses run out every frame is accepted with [`DecodeStatus::Ok`].
#[derive(Debug, Clone, Default)]
pub struct RecordingVideoRenderer {
    state: Arc<Mutex<VideoState>>,
}

impl RecordingVideoRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_initialize_status(&self, status: i32) {
        lock(&self.state).initialize_status = status;
    }

    pub fn push_statuses(&self, statuses: impl IntoIterator<Item = DecodeStatus>) {
        lock(&self.state).statuses.extend(statuses);
    }

    pub fn frames(&self) -> Vec<RecordedFrame> {
        lock(&self.state).frames.clone()
    }

    pub fn lifecycle(&self) -> Vec<VideoCall> {
        lock(&self.state).lifecycle.clone()
    }
}

impl VideoRenderer for RecordingVideoRenderer {
    fn initialize(&mut self, format: VideoFormat, width: u32, height: u32, refresh_rate: u32) -> i32 {
        let mut state = lock(&self.state);
        state.lifecycle.push(VideoCall::Initialize { format, width, height, refresh_rate });
        state.initialize_status
    }

    fn start(&mut self) {
        lock(&self.state).lifecycle.push(VideoCall::Start);
    }

    fn stop(&mut self) {
        lock(&self.state).lifecycle.push(VideoCall::Stop);
    }

    fn cleanup(&mut self) {
        lock(&self.state).lifecycle.push(VideoCall::Cleanup);
    }

    fn handle_frame(
        &mut self,
        data: &[u8],
        buffer_type: BufferType,
        frame_number: i32,
        receive_time_ms: u64,
    ) -> DecodeStatus {
        let mut state = lock(&self.state);
        state.frames.push(RecordedFrame::new(data, buffer_type, frame_number, receive_time_ms));
        state.statuses.pop_front().unwrap_or(DecodeStatus::Ok)
    }
}

/// Lifecycle calls seen by [`RecordingAudioRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCall {
    Initialize(AudioConfiguration),
    Start,
    Stop,
    Cleanup,
}

#[derive(Debug, Default)]
struct AudioState {
    initialize_status: i32,
    frames: Vec<Vec<u8>>,
    lifecycle: Vec<AudioCall>,
}

/// Audio renderer that keeps a copy of every PCM buffer it is handed.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudioRenderer {
    state: Arc<Mutex<AudioState>>,
}

impl RecordingAudioRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_initialize_status(&self, status: i32) {
        lock(&self.state).initialize_status = status;
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        lock(&self.state).frames.clone()
    }

    pub fn lifecycle(&self) -> Vec<AudioCall> {
        lock(&self.state).lifecycle.clone()
    }
}

impl AudioRenderer for RecordingAudioRenderer {
    fn initialize(&mut self, configuration: AudioConfiguration) -> i32 {
        let mut state = lock(&self.state);
        state.lifecycle.push(AudioCall::Initialize(configuration));
        state.initialize_status
    }

    fn start(&mut self) {
        lock(&self.state).lifecycle.push(AudioCall::Start);
    }

    fn stop(&mut self) {
        lock(&self.state).lifecycle.push(AudioCall::Stop);
    }

    fn cleanup(&mut self) {
        lock(&self.state).lifecycle.push(AudioCall::Cleanup);
    }

    fn handle_frame(&mut self, pcm: &[u8]) {
        lock(&self.state).frames.push(pcm.to_vec());
    }
}

/// Notifications seen by [`RecordingListener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerCall {
    StageStarting(String),
    StageComplete(String),
    StageFailed(String, i64),
    ConnectionStarted,
    ConnectionTerminated(i64),
    DisplayMessage(String),
    DisplayTransientMessage(String),
    LogMessage(String),
}

#[derive(Debug, Clone, Default)]
pub struct RecordingListener {
    calls: Arc<Mutex<Vec<ListenerCall>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ListenerCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: ListenerCall) {
        lock(&self.calls).push(call);
    }
}

impl ConnectionListener for RecordingListener {
    fn stage_starting(&mut self, stage: &str) {
        self.record(ListenerCall::StageStarting(stage.to_string()));
    }

    fn stage_complete(&mut self, stage: &str) {
        self.record(ListenerCall::StageComplete(stage.to_string()));
    }

    fn stage_failed(&mut self, stage: &str, error_code: i64) {
        self.record(ListenerCall::StageFailed(stage.to_string(), error_code));
    }

    fn connection_started(&mut self) {
        self.record(ListenerCall::ConnectionStarted);
    }

    fn connection_terminated(&mut self, error_code: i64) {
        self.record(ListenerCall::ConnectionTerminated(error_code));
    }

    fn display_message(&mut self, message: &str) {
        self.record(ListenerCall::DisplayMessage(message.to_string()));
    }

    fn display_transient_message(&mut self, message: &str) {
        self.record(ListenerCall::DisplayTransientMessage(message.to_string()));
    }

    fn log_message(&mut self, message: &str) {
        self.record(ListenerCall::LogMessage(message.to_string()));
    }
}

#[derive(Debug, Default)]
struct DecoderScript {
    counts: VecDeque<i32>,
    frame_sizes: Vec<usize>,
}

/// Decoder factory whose decoders return a scripted sequence of sample counts.
///
/// All decoders created by one factory (and its clones) draw from the same script. When the
/// script is exhausted a decode reports zero samples. Decoders fill the PCM buffer with a
/// ramp so tests can tell a forwarded buffer from a zeroed one.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecoderFactory {
    script: Arc<Mutex<DecoderScript>>,
    created: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
}

impl ScriptedDecoderFactory {
    pub fn new(counts: Vec<i32>) -> Self {
        Self {
            script: Arc::new(Mutex::new(DecoderScript { counts: counts.into(), frame_sizes: Vec::new() })),
            ..Self::default()
        }
    }

    /// Number of decoders created so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of decoders that have not been dropped yet.
    pub fn live_decoders(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// `frame_size` argument of every decode call, in order.
    pub fn frame_sizes_seen(&self) -> Vec<usize> {
        lock(&self.script).frame_sizes.clone()
    }
}

impl DecoderFactory for ScriptedDecoderFactory {
    fn create(&self, _config: &OpusMultistreamConfig) -> Result<Box<dyn MultistreamDecoder>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedDecoder { script: Arc::clone(&self.script), live: Arc::clone(&self.live) }))
    }
}

struct ScriptedDecoder {
    script: Arc<Mutex<DecoderScript>>,
    live: Arc<AtomicUsize>,
}

impl MultistreamDecoder for ScriptedDecoder {
    fn decode(&mut self, _packet: &[u8], pcm: &mut [i16], frame_size: usize) -> i32 {
        let mut script = lock(&self.script);
        script.frame_sizes.push(frame_size);
        for (i, sample) in pcm.iter_mut().enumerate() {
            *sample = i as i16;
        }
        script.counts.pop_front().unwrap_or(0)
    }
}

impl Drop for ScriptedDecoder {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Factory that always fails the way libopus reports a bad argument.
pub fn failing_factory(code: i32) -> impl DecoderFactory {
    move |_: &OpusMultistreamConfig| -> Result<Box<dyn MultistreamDecoder>> {
        Err(StreamError::codec_init("decoder creation refused", Some(code)))
    }
}
