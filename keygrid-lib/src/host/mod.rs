//! Chat platform boundary
//!
//! The widgets never talk to a chat API directly. The host wraps each inbound
//! button press in a [`CallbackContext`] that can acknowledge the press and
//! edit the message the keyboard is attached to.

mod recording;

pub use recording::*;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::HostError;
use crate::keyboard::Keyboard;

/// Acknowledgement of a button press.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
    /// Notification text, if any.
    pub text: Option<String>,
    /// Show the text as a modal alert instead of a toast.
    pub show_alert: bool,
    /// How long the client may cache this answer, in seconds.
    pub cache_time: Option<u32>,
}

impl Answer {
    /// A silent acknowledgement.
    pub fn ack() -> Self {
        Self::default()
    }

    /// A silent acknowledgement the client may cache.
    pub fn cached(seconds: u32) -> Self {
        Self {
            cache_time: Some(seconds),
            ..Self::default()
        }
    }

    /// A toast notification.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// A modal alert.
    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            show_alert: true,
            cache_time: None,
        }
    }
}

/// One inbound button press, as seen by a widget.
///
/// Edits apply to the message that carries the pressed keyboard.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use keygrid_lib::error::HostError;
/// use keygrid_lib::host::{Answer, CallbackContext};
/// use keygrid_lib::keyboard::Keyboard;
///
/// struct BotQuery { /* platform client, chat and message ids */ }
///
/// #[async_trait]
/// impl CallbackContext for BotQuery {
///     async fn answer(&self, answer: Answer) -> Result<(), HostError> {
///         // answerCallbackQuery
///         todo!()
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait CallbackContext: Send + Sync {
    /// Acknowledges the press, optionally with a notice.
    async fn answer(&self, answer: Answer) -> Result<(), HostError>;

    /// Replaces the message keyboard in place.
    async fn edit_markup(&self, keyboard: Keyboard) -> Result<(), HostError>;

    /// Removes the message keyboard.
    async fn remove_markup(&self) -> Result<(), HostError>;

    /// Replaces the message text.
    async fn edit_text(&self, text: &str) -> Result<(), HostError>;
}

/// Runs a platform call whose failure must not abort the current step.
///
/// The call is bounded by `timeout`; failures are logged and dropped. A
/// message that is gone or already up to date is only worth a debug line.
pub(crate) async fn best_effort<F>(what: &str, timeout: Duration, call: F) -> Option<HostError>
where
    F: Future<Output = Result<(), HostError>>,
{
    let error = match tokio::time::timeout(timeout, call).await {
        Ok(Ok(())) => return None,
        Ok(Err(e)) => e,
        Err(_) => HostError::Timeout(timeout),
    };
    if error.is_benign() {
        log::debug!("[host] {} failed: {}", what, error);
    } else {
        log::warn!("[host] {} failed: {}", what, error);
    }
    Some(error)
}
