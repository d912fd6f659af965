//! In-memory host context

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use async_trait::async_trait;

use super::Answer;
use super::CallbackContext;
use crate::error::HostError;
use crate::keyboard::Keyboard;

/// A platform call observed by a [`RecordingContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Answer(Answer),
    EditMarkup(Keyboard),
    RemoveMarkup,
    EditText(String),
}

/// A [`CallbackContext`] that records every call instead of sending it.
///
/// Useful for tests and for driving widgets without a chat platform. Edits
/// can be made to fail to simulate a deleted message.
#[derive(Debug, Default)]
pub struct RecordingContext {
    calls: Mutex<Vec<HostCall>>,
    edit_failure: Mutex<Option<HostError>>,
}

impl RecordingContext {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following edit and removal fail with `error`.
    pub fn fail_edits(&self, error: HostError) {
        *lock(&self.edit_failure) = Some(error);
    }

    /// Lets edits succeed again.
    pub fn heal(&self) {
        *lock(&self.edit_failure) = None;
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<HostCall> {
        lock(&self.calls).clone()
    }

    /// Drops all recorded calls.
    pub fn clear(&self) {
        lock(&self.calls).clear();
    }

    /// Returns all recorded answers.
    pub fn answers(&self) -> Vec<Answer> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                HostCall::Answer(answer) => Some(answer.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the most recent answer.
    pub fn last_answer(&self) -> Option<Answer> {
        self.answers().pop()
    }

    /// Returns the most recently applied keyboard.
    pub fn last_markup(&self) -> Option<Keyboard> {
        lock(&self.calls).iter().rev().find_map(|call| match call {
            HostCall::EditMarkup(keyboard) => Some(keyboard.clone()),
            _ => None,
        })
    }

    /// Returns the most recent message text.
    pub fn last_text(&self) -> Option<String> {
        lock(&self.calls).iter().rev().find_map(|call| match call {
            HostCall::EditText(text) => Some(text.clone()),
            _ => None,
        })
    }

    /// Returns `true` if the keyboard was removed.
    pub fn markup_removed(&self) -> bool {
        lock(&self.calls).contains(&HostCall::RemoveMarkup)
    }

    fn record(&self, call: HostCall) {
        lock(&self.calls).push(call);
    }

    fn record_edit(&self, call: HostCall) -> Result<(), HostError> {
        if let Some(error) = lock(&self.edit_failure).clone() {
            return Err(error);
        }
        self.record(call);
        Ok(())
    }
}

#[async_trait]
impl CallbackContext for RecordingContext {
    async fn answer(&self, answer: Answer) -> Result<(), HostError> {
        self.record(HostCall::Answer(answer));
        Ok(())
    }

    async fn edit_markup(&self, keyboard: Keyboard) -> Result<(), HostError> {
        self.record_edit(HostCall::EditMarkup(keyboard))
    }

    async fn remove_markup(&self) -> Result<(), HostError> {
        self.record_edit(HostCall::RemoveMarkup)
    }

    async fn edit_text(&self, text: &str) -> Result<(), HostError> {
        self.record_edit(HostCall::EditText(text.to_string()))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
