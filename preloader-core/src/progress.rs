//! Progress notifications
//!
//! Operations report a handful of ordered `(percentage, message)` events
//! over a channel. Notifications are best-effort and fire-and-forget: a
//! dropped or disconnected receiver never fails the operation.

use std::sync::mpsc::{Receiver, Sender, channel};

/// One discrete progress notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Completion percentage, 0-100
    pub percent: u8,
    /// Human-readable status line
    pub message: String,
}

/// Sending half of a progress channel
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: Option<Sender<ProgressEvent>>,
}

impl ProgressSender {
    /// Create a connected sender/receiver pair
    pub fn channel() -> (Self, Receiver<ProgressEvent>) {
        let (tx, rx) = channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sender that silently discards every event
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Push one notification; never fails
    pub fn report<S: Into<String>>(&self, percent: u8, message: S) {
        let message = message.into();
        log::debug!("progress {percent}%: {message}");
        if let Some(tx) = &self.tx {
            let _ = tx.send(ProgressEvent {
                percent: percent.min(100),
                message,
            });
        }
    }
}
