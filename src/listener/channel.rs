//! Connection listener that publishes events as an async stream.

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::trace;

use crate::renderer::ConnectionListener;

/// One connection lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum ConnectionEvent {
    StageStarting { stage: String },
    StageComplete { stage: String },
    StageFailed { stage: String, error_code: i64 },
    ConnectionStarted,
    ConnectionTerminated { error_code: i64 },
    DisplayMessage { message: String },
    DisplayTransientMessage { message: String },
    LogMessage { message: String },
}

/// [`ConnectionListener`] that forwards every notification into an unbounded channel.
///
/// Sending never blocks the engine thread. Events published after the stream has been
/// dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<ConnectionEvent>,
}

impl ChannelListener {
    /// Create a listener and the stream its events are delivered on.
    pub fn new() -> (Self, impl Stream<Item = ConnectionEvent> + Send + 'static) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, UnboundedReceiverStream::new(rx))
    }

    fn publish(&self, event: ConnectionEvent) {
        if let Err(e) = self.tx.send(event) {
            trace!(event = ?e.0, "Connection event stream closed, dropping event");
        }
    }
}

impl ConnectionListener for ChannelListener {
    fn stage_starting(&mut self, stage: &str) {
        self.publish(ConnectionEvent::StageStarting { stage: stage.to_string() });
    }

    fn stage_complete(&mut self, stage: &str) {
        self.publish(ConnectionEvent::StageComplete { stage: stage.to_string() });
    }

    fn stage_failed(&mut self, stage: &str, error_code: i64) {
        self.publish(ConnectionEvent::StageFailed { stage: stage.to_string(), error_code });
    }

    fn connection_started(&mut self) {
        self.publish(ConnectionEvent::ConnectionStarted);
    }

    fn connection_terminated(&mut self, error_code: i64) {
        self.publish(ConnectionEvent::ConnectionTerminated { error_code });
    }

    fn display_message(&mut self, message: &str) {
        self.publish(ConnectionEvent::DisplayMessage { message: message.to_string() });
    }

    fn display_transient_message(&mut self, message: &str) {
        self.publish(ConnectionEvent::DisplayTransientMessage { message: message.to_string() });
    }

    fn log_message(&mut self, message: &str) {
        self.publish(ConnectionEvent::LogMessage { message: message.to_string() });
    }
}
