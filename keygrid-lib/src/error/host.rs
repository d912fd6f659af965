//! Errors reported by the chat platform boundary

use std::time::Duration;

/// Errors returned by a [`CallbackContext`](crate::host::CallbackContext)
/// when talking to the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The message to edit no longer exists.
    #[error("Message not found")]
    MessageNotFound,

    /// The edit would not change the message.
    #[error("Message is not modified")]
    NotModified,

    /// The platform call did not finish in time.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Any other transport or API failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl HostError {
    /// Creates a new transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Returns `true` if the message is gone or already in the requested shape.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::MessageNotFound | Self::NotModified)
    }
}
