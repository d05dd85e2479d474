use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::auth::CredentialError;

/// Lifecycle of one channel session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Created, `connect` not called yet
    Idle,
    Connecting,
    Open,
    /// Connection lost; reconnect `attempt` is scheduled after `delay`
    ClosedRetrying { attempt: u32, delay: Duration },
    /// Attempt budget exhausted, nothing further happens automatically
    ClosedGaveUp,
    /// Closed by the consumer. Terminal.
    Disconnected,
}

impl ChannelState {
    pub fn is_open(&self) -> bool {
        matches!(self, ChannelState::Open)
    }

    /// No further transitions can happen from this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChannelState::ClosedGaveUp | ChannelState::Disconnected)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Idle => f.write_str("idle"),
            ChannelState::Connecting => f.write_str("connecting"),
            ChannelState::Open => f.write_str("open"),
            ChannelState::ClosedRetrying { attempt, delay } => {
                write!(f, "reconnecting (attempt {} in {}ms)", attempt, delay.as_millis())
            }
            ChannelState::ClosedGaveUp => f.write_str("gave up"),
            ChannelState::Disconnected => f.write_str("disconnected"),
        }
    }
}

/// Close frame details, when the peer sent one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseReason {
    pub code: Option<u16>,
    pub reason: String,
}

impl CloseReason {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            reason: reason.into(),
        }
    }

    /// Any close code other than normal closure (1000) or going away (1001),
    /// e.g. 1008 when the backend rejects the token
    pub fn is_abnormal(&self) -> bool {
        matches!(self.code, Some(code) if code != 1000 && code != 1001)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.reason.is_empty()) {
            (Some(code), false) => write!(f, "{} ({})", self.reason, code),
            (Some(code), true) => write!(f, "code {}", code),
            (None, false) => f.write_str(&self.reason),
            (None, true) => f.write_str("connection closed"),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum ChannelError {
    #[error("Not logged in")]
    MissingCredential,

    #[error("Channel is not connected")]
    NotConnected,

    /// The session was disconnected by its owner and cannot be reused
    #[error("Channel session was disconnected")]
    Terminated,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// The peer closed with an abnormal code; passed to `on_error` in
    /// addition to `on_close`
    #[error("Connection closed: {0}")]
    Closed(CloseReason),

    #[error("Credential store error: {0}")]
    Credential(Arc<CredentialError>),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<CredentialError> for ChannelError {
    fn from(err: CredentialError) -> Self {
        ChannelError::Credential(Arc::new(err))
    }
}

/// Callbacks of a channel session.
///
/// Invoked from the session task, one at a time and in arrival order.
/// Every method defaults to doing nothing.
pub trait ChannelHandler: Send + Sync + 'static {
    fn on_open(&self) {}

    /// One parsed inbound message
    fn on_message(&self, _message: Value) {}

    fn on_close(&self, _reason: &CloseReason) {}

    fn on_error(&self, _error: &ChannelError) {}

    /// The session stopped retrying after `attempts` reconnects
    fn on_give_up(&self, _attempts: u32) {}

    fn on_state_change(&self, _state: ChannelState) {}
}

/// Discards every callback.
impl ChannelHandler for () {}

/// Handler callbacks as values, for consumers that prefer a stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Opened,
    Message(Value),
    Closed(CloseReason),
    Error(String),
    GaveUp { attempts: u32 },
    StateChanged(ChannelState),
}

impl ChannelHandler for mpsc::UnboundedSender<ChannelEvent> {
    fn on_open(&self) {
        let _ = self.send(ChannelEvent::Opened);
    }

    fn on_message(&self, message: Value) {
        let _ = self.send(ChannelEvent::Message(message));
    }

    fn on_close(&self, reason: &CloseReason) {
        let _ = self.send(ChannelEvent::Closed(reason.clone()));
    }

    fn on_error(&self, error: &ChannelError) {
        let _ = self.send(ChannelEvent::Error(error.to_string()));
    }

    fn on_give_up(&self, attempts: u32) {
        let _ = self.send(ChannelEvent::GaveUp { attempts });
    }

    fn on_state_change(&self, state: ChannelState) {
        let _ = self.send(ChannelEvent::StateChanged(state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_classification() {
        assert!(ChannelState::Open.is_open());
        assert!(ChannelState::Disconnected.is_terminal());
        assert!(ChannelState::ClosedGaveUp.is_terminal());
        let retrying = ChannelState::ClosedRetrying {
            attempt: 2,
            delay: Duration::from_millis(2000),
        };
        assert!(!retrying.is_terminal());
        assert_eq!(retrying.to_string(), "reconnecting (attempt 2 in 2000ms)");
    }

    #[test]
    fn test_close_reason_display() {
        assert_eq!(
            CloseReason::new(1008, "Invalid authentication token").to_string(),
            "Invalid authentication token (1008)"
        );
        assert_eq!(CloseReason::default().to_string(), "connection closed");
    }

    #[test]
    fn test_abnormal_close_codes() {
        assert!(!CloseReason::new(1000, "bye").is_abnormal());
        assert!(!CloseReason::new(1001, "").is_abnormal());
        assert!(CloseReason::new(1008, "invalid token").is_abnormal());
        assert!(CloseReason::new(1011, "").is_abnormal());
        assert!(!CloseReason::default().is_abnormal());
    }

    #[test]
    fn test_sender_handler_forwards_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.on_open();
        tx.on_message(serde_json::json!({"type": "pong"}));
        tx.on_error(&ChannelError::NotConnected);

        assert_eq!(rx.try_recv().unwrap(), ChannelEvent::Opened);
        assert_eq!(
            rx.try_recv().unwrap(),
            ChannelEvent::Message(serde_json::json!({"type": "pong"}))
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ChannelEvent::Error("Channel is not connected".into())
        );
    }
}
