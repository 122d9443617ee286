//! Streaming session construction.
//!
//! A [`StreamSession`] owns everything one connection needs: the configuration, the video
//! pipeline with its frame buffer, the audio pipeline with its codec session, and the
//! connection bridge. All three collaborators are required up front, so reconnecting means
//! building a new session with a fresh set.
//!
//! The engine drives video and audio from two different threads; [`StreamSession::into_parts`]
//! hands each thread the half it owns.
//!
//! ```rust,no_run
//! use moonlight_interop::{SessionParts, StreamConfiguration, StreamSession};
//! # use moonlight_interop::{AudioRenderer, ConnectionListener, VideoRenderer, DecoderFactory};
//! # fn collaborators() -> (Box<dyn VideoRenderer>, Box<dyn AudioRenderer>, Box<dyn ConnectionListener>, Box<dyn DecoderFactory>) { unimplemented!() }
//!
//! # fn main() -> moonlight_interop::Result<()> {
//! let (video, audio, listener, decoders) = collaborators();
//! let session = StreamSession::new(StreamConfiguration::default(), video, audio, listener, decoders)?;
//!
//! let SessionParts { video, audio, connection, .. } = session.into_parts();
//! std::thread::spawn(move || drop(video));
//! std::thread::spawn(move || drop(audio));
//! # drop(connection);
//! # Ok(())
//! # }
//! ```

use tracing::info;

use crate::Result;
use crate::audio::AudioPipeline;
use crate::codec::DecoderFactory;
use crate::config::StreamConfiguration;
use crate::listener::ConnectionBridge;
use crate::renderer::{AudioRenderer, ConnectionListener, VideoRenderer};
use crate::video::VideoPipeline;

/// All state for one streaming session.
#[derive(Debug)]
pub struct StreamSession {
    config: StreamConfiguration,
    video: VideoPipeline,
    audio: AudioPipeline,
    connection: ConnectionBridge,
}

/// The independently owned pieces of a [`StreamSession`].
#[derive(Debug)]
pub struct SessionParts {
    pub config: StreamConfiguration,
    pub video: VideoPipeline,
    pub audio: AudioPipeline,
    pub connection: ConnectionBridge,
}

impl StreamSession {
    /// Validate the configuration and bind the session's collaborators.
    pub fn new(
        config: StreamConfiguration,
        video_renderer: Box<dyn VideoRenderer>,
        audio_renderer: Box<dyn AudioRenderer>,
        listener: Box<dyn ConnectionListener>,
        decoders: Box<dyn DecoderFactory>,
    ) -> Result<Self> {
        config.validate()?;

        info!(
            width = config.width,
            height = config.height,
            fps = config.fps,
            bitrate = config.bitrate,
            audio = ?config.audio_configuration,
            format = ?config.preferred_video_format(),
            "Creating stream session"
        );

        Ok(Self {
            config,
            video: VideoPipeline::new(video_renderer),
            audio: AudioPipeline::new(audio_renderer, decoders),
            connection: ConnectionBridge::new(listener),
        })
    }

    pub fn config(&self) -> &StreamConfiguration {
        &self.config
    }

    pub fn video(&mut self) -> &mut VideoPipeline {
        &mut self.video
    }

    pub fn audio(&mut self) -> &mut AudioPipeline {
        &mut self.audio
    }

    pub fn connection(&mut self) -> &mut ConnectionBridge {
        &mut self.connection
    }

    /// Split the session so each engine thread can own its pipeline.
    pub fn into_parts(self) -> SessionParts {
        SessionParts {
            config: self.config,
            video: self.video,
            audio: self.audio,
            connection: self.connection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StreamError;
    use crate::status::DecodeStatus;
    use crate::test_utils::{
        ListenerCall, RecordingAudioRenderer, RecordingListener, RecordingVideoRenderer,
        ScriptedDecoderFactory,
    };
    use crate::types::{BufferFragment, DecodeUnit, OpusMultistreamConfig, Stage};

    type Harness = (StreamSession, RecordingVideoRenderer, RecordingAudioRenderer, RecordingListener);

    fn session(config: StreamConfiguration) -> Result<Harness> {
        let video = RecordingVideoRenderer::new();
        let audio = RecordingAudioRenderer::new();
        let listener = RecordingListener::new();
        let session = StreamSession::new(
            config,
            Box::new(video.clone()),
            Box::new(audio.clone()),
            Box::new(listener.clone()),
            Box::new(ScriptedDecoderFactory::new(vec![240])),
        )?;
        Ok((session, video, audio, listener))
    }

    #[test]
    fn rejects_invalid_configuration() {
        let config = StreamConfiguration { fps: 0, ..Default::default() };
        assert!(matches!(session(config), Err(StreamError::Config { .. })));
    }

    #[test]
    fn parts_run_on_separate_threads() {
        let (session, video_renderer, audio_renderer, listener) =
            session(StreamConfiguration::default()).unwrap();
        let SessionParts { config, mut video, mut audio, mut connection } = session.into_parts();
        assert_eq!(config.width, 1280);

        let format = config.preferred_video_format();
        let (width, height, fps) = (config.width, config.height, config.fps);
        let audio_configuration = config.audio_configuration;

        let video_thread = std::thread::spawn(move || {
            video.setup(format, width, height, fps, 0).unwrap();
            let picture = [0, 0, 1, 0x65];
            let unit = DecodeUnit::new(1, 0, vec![BufferFragment::picture_data(&picture)]);
            video.submit_decode_unit(&unit)
        });

        let audio_thread = std::thread::spawn(move || {
            audio.init(audio_configuration, &OpusMultistreamConfig::stereo(), 0).unwrap();
            audio.decode_and_play_sample(&[0xFC]).unwrap()
        });

        connection.stage_complete(Stage::InputStreamStart);
        connection.connection_started();

        assert_eq!(video_thread.join().unwrap(), DecodeStatus::Ok);
        assert_eq!(audio_thread.join().unwrap(), 240);

        assert_eq!(video_renderer.frames().len(), 1);
        assert_eq!(audio_renderer.frames().len(), 1);
        assert_eq!(listener.calls().last(), Some(&ListenerCall::ConnectionStarted));
    }

    #[test]
    fn session_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<StreamSession>();
        assert_send::<SessionParts>();
    }

    #[test]
    fn accessors_reach_each_pipeline() {
        let (mut session, video, _, listener) = session(StreamConfiguration::default()).unwrap();

        session.video().start();
        session.audio().start();
        session.connection().display_message("hello");

        assert_eq!(session.config().fps, 60);
        assert_eq!(video.lifecycle().len(), 1);
        assert_eq!(listener.calls(), vec![ListenerCall::DisplayMessage("hello".to_string())]);
    }
}
