//! Connection lifecycle routing.
//!
//! [`ConnectionBridge`] translates the engine's raw notifications for the application's
//! [`ConnectionListener`]:
//! - stage ids become human-readable [`Stage`] names
//! - log templates are rendered into bounded strings (see [`format`])
//! - every engine log line is also emitted through `tracing`
//!
//! # Example
//!
//! ```rust
//! use futures::StreamExt;
//! use moonlight_interop::listener::{ChannelListener, ConnectionBridge, ConnectionEvent, LogArg};
//! use moonlight_interop::types::Stage;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (listener, mut events) = ChannelListener::new();
//! let mut bridge = ConnectionBridge::new(Box::new(listener));
//!
//! bridge.stage_starting(Stage::RtspHandshake);
//! bridge.log_message("Connected to %s:%d", &[LogArg::from("10.0.0.2"), LogArg::from(47989)]);
//!
//! assert_eq!(
//!     events.next().await,
//!     Some(ConnectionEvent::StageStarting { stage: "RTSP handshake".to_string() })
//! );
//! assert_eq!(
//!     events.next().await,
//!     Some(ConnectionEvent::LogMessage { message: "Connected to 10.0.0.2:47989".to_string() })
//! );
//! # }
//! ```

mod channel;
pub mod format;

pub use channel::{ChannelListener, ConnectionEvent};
pub use format::{BoundedMessage, LogArg, MAX_LOG_MESSAGE_LEN, render_args, render_template};

use tracing::{info, warn};

use crate::renderer::ConnectionListener;
use crate::types::Stage;

/// Routes connection notifications to the bound listener.
pub struct ConnectionBridge {
    listener: Box<dyn ConnectionListener>,
}

impl ConnectionBridge {
    pub fn new(listener: Box<dyn ConnectionListener>) -> Self {
        Self { listener }
    }

    pub fn stage_starting(&mut self, stage: Stage) {
        info!(stage = stage.name(), "Starting connection stage");
        self.listener.stage_starting(stage.name());
    }

    pub fn stage_complete(&mut self, stage: Stage) {
        info!(stage = stage.name(), "Completed connection stage");
        self.listener.stage_complete(stage.name());
    }

    pub fn stage_failed(&mut self, stage: Stage, error_code: i64) {
        warn!(stage = stage.name(), error_code, "Connection stage failed");
        self.listener.stage_failed(stage.name(), error_code);
    }

    pub fn connection_started(&mut self) {
        info!("Connection started");
        self.listener.connection_started();
    }

    pub fn connection_terminated(&mut self, error_code: i64) {
        warn!(error_code, "Connection terminated");
        self.listener.connection_terminated(error_code);
    }

    pub fn display_message(&mut self, message: &str) {
        self.listener.display_message(message);
    }

    pub fn display_transient_message(&mut self, message: &str) {
        self.listener.display_transient_message(message);
    }

    /// Render a printf-style engine log template and forward it.
    pub fn log_message(&mut self, template: &str, args: &[LogArg<'_>]) {
        let message = render_template(template, args);
        self.forward_log(&message);
    }

    /// Render Rust format arguments and forward them as a log message.
    pub fn log_fmt(&mut self, args: std::fmt::Arguments<'_>) {
        let message = render_args(args);
        self.forward_log(&message);
    }

    fn forward_log(&mut self, message: &str) {
        info!(target: "moonlight_interop::engine", "{}", message.trim_end());
        self.listener.log_message(message);
    }
}

impl std::fmt::Debug for ConnectionBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionBridge").finish_non_exhaustive()
    }
}
