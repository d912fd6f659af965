//! Widget state machines
//!
//! Each widget kind renders a [`Keyboard`](crate::keyboard::Keyboard) whose
//! buttons carry encoded actions, and consumes those actions one press at a
//! time through [`Widget::process`].

pub mod calendar;
pub mod checkbox;
pub mod paginator;
pub mod time_selector;

pub use calendar::Calendar;
pub use calendar::CalendarAction;
pub use calendar::CalendarBuilder;
pub use calendar::MonthView;
pub use checkbox::Checkbox;
pub use checkbox::CheckboxAction;
pub use checkbox::CheckboxBuilder;
pub use checkbox::CheckboxOption;
pub use checkbox::CheckboxOptions;
pub use paginator::Paginator;
pub use paginator::PaginatorAction;
pub use paginator::PaginatorBuilder;
pub use time_selector::TimeAction;
pub use time_selector::TimeSelector;
pub use time_selector::TimeSelectorBuilder;
pub use time_selector::TimeSelectorStyle;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::codec;
use crate::codec::Action;
use crate::codec::MAX_PAYLOAD_LEN;
use crate::error::BoxError;
use crate::error::ConfigError;
use crate::error::HostError;
use crate::host::Answer;
use crate::host::CallbackContext;
use crate::host::best_effort;
use crate::keyboard::Button;
use crate::registry::Handle;
use crate::registry::RegistryConfig;

/// Collaborator invoked with the value a widget produced.
pub type SelectHandler<T> = Arc<
    dyn for<'a> Fn(&'a dyn CallbackContext, T) -> BoxFuture<'a, Result<(), BoxError>>
        + Send
        + Sync,
>;

/// Collaborator invoked when the user leaves a widget without a value.
pub type BackHandler =
    Arc<dyn for<'a> Fn(&'a dyn CallbackContext) -> BoxFuture<'a, Result<(), BoxError>> + Send + Sync>;

/// What one processed press did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The widget is still interactive.
    Pending,
    /// The widget finished; `None` means the user backed out.
    Completed(Option<T>),
    /// The widget finished and handed the result to a collaborator.
    Delegated,
}

impl<T> Outcome<T> {
    /// Returns `true` if the widget's interaction ended.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }

    /// Returns the completed value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Completed(value) => value.as_ref(),
            _ => None,
        }
    }

    /// Maps the completed value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Pending => Outcome::Pending,
            Outcome::Completed(value) => Outcome::Completed(value.map(f)),
            Outcome::Delegated => Outcome::Delegated,
        }
    }
}

/// A registered widget instance that reacts to its own button presses.
#[async_trait]
pub trait Widget: Send + Sync + 'static {
    /// Actions this widget's buttons carry.
    type Action: Action;

    /// Value produced by a terminal transition.
    type Output: Send + 'static;

    /// Returns the handle this instance was registered under.
    fn handle(&self) -> &Handle;

    /// Runs one state machine step for a press on this instance.
    async fn process(
        &self,
        ctx: &dyn CallbackContext,
        action: Self::Action,
    ) -> Result<Outcome<Self::Output>, HostError>;

    /// Encodes `action` for this instance.
    fn callback(&self, action: &Self::Action) -> String {
        codec::encode(action, self.handle())
    }

    /// Creates a button that triggers `action` on this instance.
    fn button(&self, text: impl Into<String>, action: Self::Action) -> Button
    where
        Self: Sized,
    {
        Button::new(text, self.callback(&action))
    }
}

/// Hands a terminal value to `on_select`, or returns it.
///
/// A failing collaborator is logged and the press is still acknowledged so
/// the client does not keep spinning.
pub(crate) async fn deliver<A: Action, T: Send>(
    ctx: &dyn CallbackContext,
    on_select: Option<&SelectHandler<T>>,
    value: T,
    timeout: Duration,
) -> Result<Outcome<T>, HostError> {
    let Some(on_select) = on_select else {
        return Ok(Outcome::Completed(Some(value)));
    };
    if let Err(e) = on_select(ctx, value).await {
        log::error!("[{}] on_select failed: {}", A::KIND, e);
        best_effort("answer", timeout, ctx.answer(Answer::ack())).await;
    }
    Ok(Outcome::Delegated)
}

/// Runs `on_back`, or reports a terminal transition without a value.
pub(crate) async fn go_back<A: Action, T>(
    ctx: &dyn CallbackContext,
    on_back: Option<&BackHandler>,
    timeout: Duration,
) -> Result<Outcome<T>, HostError> {
    let Some(on_back) = on_back else {
        return Ok(Outcome::Completed(None));
    };
    if let Err(e) = on_back(ctx).await {
        log::error!("[{}] on_back failed: {}", A::KIND, e);
        best_effort("answer", timeout, ctx.answer(Answer::ack())).await;
    }
    Ok(Outcome::Delegated)
}

/// Checks that `action` fits the payload limit for any handle the registry
/// can hand out.
pub(crate) fn check_payload<A: Action>(
    config: &RegistryConfig,
    action: &A,
) -> Result<(), ConfigError> {
    let len = codec::encode(action, &Handle::widest(config.token_length)).len();
    ConfigError::check_range("payload length", len, 1, MAX_PAYLOAD_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_helpers() {
        let done: Outcome<u32> = Outcome::Completed(Some(3));
        assert!(done.is_terminal());
        assert_eq!(done.value(), Some(&3));
        assert_eq!(done.map(|v| v * 2), Outcome::Completed(Some(6)));
        assert!(!Outcome::<u32>::Pending.is_terminal());
        assert!(Outcome::<u32>::Delegated.is_terminal());
        assert_eq!(Outcome::<u32>::Delegated.value(), None);
    }
}
