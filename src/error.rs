//! Error types for the streaming interop layer.
//!
//! Every failure is returned to the immediate caller. Nothing in this crate retries on its
//! own; the engine decides between requesting a keyframe and tearing the stream down.
//!
//! ## Error Categories
//!
//! - **Allocation Errors**: The video scratch buffer could not grow (recoverable)
//! - **Codec Errors**: The multistream audio decoder could not be created (fatal to audio)
//! - **Renderer Errors**: A collaborator refused initialization or a frame
//! - **Configuration Errors**: The stream configuration payload is unusable
//!
//! ## Recovery
//!
//! ```rust
//! use moonlight_interop::StreamError;
//!
//! let error = StreamError::allocation_failed(4 * 1024 * 1024);
//! assert!(error.is_recoverable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for interop operations.
pub type Result<T, E = StreamError> = std::result::Result<T, E>;

/// Main error type for interop operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StreamError {
    #[error("Failed to allocate {requested} bytes for the frame buffer")]
    Allocation {
        requested: usize,
        #[source]
        source: Option<std::collections::TryReserveError>,
    },

    #[error("Audio decoder initialization failed: {reason}")]
    CodecInit {
        reason: String,
        /// Native error code reported by the decoder library, if any
        code: Option<i32>,
    },

    #[error("Audio decoder is not initialized")]
    CodecNotInitialized,

    #[error("Renderer rejected {operation} with status {status}")]
    RendererRejected { operation: &'static str, status: i32 },

    #[error("Invalid stream configuration: {reason}")]
    Config { reason: String },

    #[error("Failed to parse stream configuration: {details}")]
    ConfigParse {
        details: String,
        #[source]
        source: Option<serde_yaml_ng::Error>,
    },

    #[error("Configuration file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StreamError {
    /// Returns whether the stream can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            StreamError::Allocation { .. } => true,
            StreamError::RendererRejected { .. } => true,
            StreamError::CodecInit { .. } => false,
            StreamError::CodecNotInitialized => false,
            StreamError::Config { .. } => false,
            StreamError::ConfigParse { .. } => false,
            StreamError::File { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            StreamError::Allocation { .. } => vec![
                "Request a new IDR frame from the host",
                "Lower the stream resolution or bitrate",
                "Free memory held by other processes",
            ],
            StreamError::CodecInit { .. } => vec![
                "Verify the Opus channel mapping matches the channel count",
                "Check that libopus is installed and linked",
                "Fall back to stereo audio",
            ],
            StreamError::CodecNotInitialized => vec![
                "Initialize the audio pipeline before decoding samples",
                "Do not decode samples after audio cleanup",
            ],
            StreamError::RendererRejected { .. } => vec![
                "Inspect the renderer's status code",
                "Reset the decoder and wait for the next keyframe",
            ],
            StreamError::Config { .. } => vec![
                "Check stream dimensions and frame rate are positive",
                "Verify the configuration against the host's capabilities",
            ],
            StreamError::ConfigParse { .. } => vec![
                "Check the YAML syntax",
                "Remove unknown configuration keys",
            ],
            StreamError::File { .. } => vec![
                "Check the configuration file exists and is readable",
                "Check file permissions",
            ],
        }
    }

    /// Helper constructor for frame buffer allocation failures.
    pub fn allocation_failed(requested: usize) -> Self {
        StreamError::Allocation { requested, source: None }
    }

    /// Helper constructor for decoder creation failures.
    pub fn codec_init(reason: impl Into<String>, code: Option<i32>) -> Self {
        StreamError::CodecInit { reason: reason.into(), code }
    }

    /// Helper constructor for a collaborator refusing an operation.
    pub fn renderer_rejected(operation: &'static str, status: i32) -> Self {
        StreamError::RendererRejected { operation, status }
    }

    /// Helper constructor for configuration validation errors.
    pub fn config(reason: impl Into<String>) -> Self {
        StreamError::Config { reason: reason.into() }
    }

    /// Helper constructor for configuration file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        StreamError::File { path, source }
    }

    /// Raw status code reported back to the engine for this error.
    ///
    /// Renderer rejections keep their own status; every other failure collapses into the
    /// engine's generic `-1`.
    pub fn status_code(&self) -> i32 {
        match self {
            StreamError::RendererRejected { status, .. } => *status,
            _ => -1,
        }
    }
}

impl From<serde_yaml_ng::Error> for StreamError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        StreamError::ConfigParse { details: err.to_string(), source: Some(err) }
    }
}
