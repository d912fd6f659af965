//! Callback routing
//!
//! The [`Router`] owns one registry per widget kind. Widgets register into
//! them when built, and every inbound press is decoded, resolved against the
//! registry of its kind and handed to the instance that rendered it.

use std::time::Duration;

use chrono::NaiveDate;
use chrono::NaiveTime;

use crate::codec;
use crate::codec::RawCallback;
use crate::codec::WidgetKind;
use crate::error::ConfigError;
use crate::error::HostError;
use crate::error::ParseError;
use crate::host::Answer;
use crate::host::CallbackContext;
use crate::host::best_effort;
use crate::i18n::Lang;
use crate::registry::InstanceRegistry;
use crate::registry::RegistryConfig;
use crate::registry::Resolution;
use crate::widgets::Calendar;
use crate::widgets::Checkbox;
use crate::widgets::CheckboxOptions;
use crate::widgets::Outcome;
use crate::widgets::Paginator;
use crate::widgets::TimeSelector;
use crate::widgets::Widget;

/// Router settings.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use keygrid_lib::RouterConfig;
/// use keygrid_lib::i18n::Lang;
/// use keygrid_lib::registry::RegistryConfig;
///
/// let config = RouterConfig::default()
///     .with_registry(RegistryConfig::default().with_capacity(50))
///     .with_lang(Lang::Ru)
///     .with_request_timeout(Duration::from_millis(500));
/// assert_eq!(config.registry.capacity, 50);
/// assert_eq!(config.request_timeout(), Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterConfig {
    /// Settings shared by the four registries, including the timeout for
    /// best-effort platform calls made by the router and the widgets.
    pub registry: RegistryConfig,

    /// Language of the expiry and invalid request notices.
    ///
    /// Default: `Lang::En`
    pub lang: Lang,
}

impl RouterConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the registry settings.
    pub fn with_registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the notice language.
    pub fn with_lang(mut self, lang: Lang) -> Self {
        self.lang = lang;
        self
    }

    /// Sets the best-effort request timeout of every registry.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.registry.request_timeout = timeout;
        self
    }

    /// Returns the best-effort request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.registry.request_timeout
    }
}

/// Result of routing one press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Calendar(Outcome<NaiveDate>),
    Checkbox(Outcome<CheckboxOptions>),
    /// Carries the payload of the picked item.
    Paginator(Outcome<String>),
    TimeSelector(Outcome<NaiveTime>),
    /// The instance was evicted, removed, or its token now belongs to a newer
    /// instance. The user was told the keyboard expired.
    Expired(WidgetKind),
    /// The payload looked like ours but did not decode. The user was told the
    /// request is invalid.
    Invalid(ParseError),
    /// The payload belongs to someone else. Nothing was sent.
    Unmatched,
}

impl Dispatched {
    /// Returns `true` if a widget finished its interaction.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Calendar(outcome) => outcome.is_terminal(),
            Self::Checkbox(outcome) => outcome.is_terminal(),
            Self::Paginator(outcome) => outcome.is_terminal(),
            Self::TimeSelector(outcome) => outcome.is_terminal(),
            Self::Expired(_) | Self::Invalid(_) | Self::Unmatched => false,
        }
    }
}

/// Routes button presses to live widget instances.
///
/// # Example
///
/// ```ignore
/// let router = Router::new(RouterConfig::default())?;
/// let calendar = Calendar::builder().build(router.calendars())?;
/// send_message("Pick a date", calendar.render()).await?;
///
/// // in the platform's callback handler
/// if router.matches(&query.data) {
///     match router.dispatch(&query, &query.data).await? {
///         Dispatched::Calendar(Outcome::Completed(Some(date))) => { /* ... */ }
///         _ => {}
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Router {
    config: RouterConfig,
    calendars: InstanceRegistry<Calendar>,
    checkboxes: InstanceRegistry<Checkbox>,
    paginators: InstanceRegistry<Paginator>,
    time_selectors: InstanceRegistry<TimeSelector>,
}

impl Router {
    /// Creates a router with empty registries.
    pub fn new(config: RouterConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            config,
            calendars: InstanceRegistry::new(config.registry)?,
            checkboxes: InstanceRegistry::new(config.registry)?,
            paginators: InstanceRegistry::new(config.registry)?,
            time_selectors: InstanceRegistry::new(config.registry)?,
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn calendars(&self) -> &InstanceRegistry<Calendar> {
        &self.calendars
    }

    pub fn checkboxes(&self) -> &InstanceRegistry<Checkbox> {
        &self.checkboxes
    }

    pub fn paginators(&self) -> &InstanceRegistry<Paginator> {
        &self.paginators
    }

    pub fn time_selectors(&self) -> &InstanceRegistry<TimeSelector> {
        &self.time_selectors
    }

    /// Returns `true` if `payload` was produced by one of the widgets.
    pub fn matches(&self, payload: &str) -> bool {
        codec::is_widget_payload(payload)
    }

    /// Routes one press.
    ///
    /// Expired and malformed payloads are answered here and reported through
    /// [`Dispatched`]. Only platform failures on required calls are errors.
    pub async fn dispatch(
        &self,
        ctx: &dyn CallbackContext,
        payload: &str,
    ) -> Result<Dispatched, HostError> {
        if !self.matches(payload) {
            return Ok(Dispatched::Unmatched);
        }

        let raw = match RawCallback::decode(payload) {
            Ok(raw) => raw,
            Err(e) => return self.reject(ctx, payload, e).await,
        };
        log::debug!(
            "[router] {} {} for {} (generation {})",
            raw.kind,
            raw.tag,
            raw.handle.token(),
            raw.handle.generation()
        );

        match raw.kind {
            WidgetKind::Calendar => {
                self.route(ctx, &self.calendars, &raw, payload, Dispatched::Calendar)
                    .await
            }
            WidgetKind::Checkbox => {
                self.route(ctx, &self.checkboxes, &raw, payload, Dispatched::Checkbox)
                    .await
            }
            WidgetKind::Paginator => {
                self.route(ctx, &self.paginators, &raw, payload, Dispatched::Paginator)
                    .await
            }
            WidgetKind::TimeSelector => {
                self.route(
                    ctx,
                    &self.time_selectors,
                    &raw,
                    payload,
                    Dispatched::TimeSelector,
                )
                .await
            }
        }
    }

    async fn route<W: Widget>(
        &self,
        ctx: &dyn CallbackContext,
        registry: &InstanceRegistry<W>,
        raw: &RawCallback,
        payload: &str,
        wrap: fn(Outcome<W::Output>) -> Dispatched,
    ) -> Result<Dispatched, HostError> {
        let action = match raw.action::<W::Action>() {
            Ok(action) => action,
            Err(e) => return self.reject(ctx, payload, e).await,
        };

        let widget = match registry.resolve(&raw.handle) {
            Resolution::Live(widget) => widget,
            Resolution::Stale => {
                log::debug!("[router] {} is stale, token was reused", raw.handle.token());
                return self.expire(ctx, raw.kind).await;
            }
            Resolution::Missing => return self.expire(ctx, raw.kind).await,
        };

        let outcome = widget.process(ctx, action).await?;
        if outcome.is_terminal() {
            log::debug!("[router] {} {} finished", raw.kind, raw.handle.token());
        }
        Ok(wrap(outcome))
    }

    async fn expire(
        &self,
        ctx: &dyn CallbackContext,
        kind: WidgetKind,
    ) -> Result<Dispatched, HostError> {
        let texts = self.config.lang.texts();
        ctx.answer(Answer::text(texts.expired(kind))).await?;
        best_effort(
            "remove expired keyboard",
            self.config.request_timeout(),
            ctx.remove_markup(),
        )
        .await;
        Ok(Dispatched::Expired(kind))
    }

    async fn reject(
        &self,
        ctx: &dyn CallbackContext,
        payload: &str,
        error: ParseError,
    ) -> Result<Dispatched, HostError> {
        log::warn!("[router] rejecting payload '{}': {}", payload, error);
        let texts = self.config.lang.texts();
        ctx.answer(Answer::alert(texts.invalid_request)).await?;
        Ok(Dispatched::Invalid(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostCall;
    use crate::host::RecordingContext;
    use crate::widgets::CalendarAction;

    #[test]
    fn test_new_validates_registry_config() {
        let config = RouterConfig::default().with_registry(RegistryConfig::default().with_capacity(0));
        assert!(matches!(
            Router::new(config),
            Err(ConfigError::OutOfRange {
                field: "capacity",
                ..
            })
        ));
    }

    #[test]
    fn test_matches_only_widget_prefixes() {
        let router = Router::new(RouterConfig::default()).unwrap();
        assert!(router.matches("cal:IGNORE:abcd:1"));
        assert!(router.matches("tms:garbage"));
        assert!(!router.matches("menu:open"));
        assert!(!router.matches("calendar"));
    }

    #[tokio::test]
    async fn test_unmatched_is_silent() {
        let router = Router::new(RouterConfig::default()).unwrap();
        let ctx = RecordingContext::new();
        let result = router.dispatch(&ctx, "menu:open").await.unwrap();
        assert_eq!(result, Dispatched::Unmatched);
        assert!(ctx.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_instance_expires() {
        let router = Router::new(RouterConfig::default().with_lang(Lang::Ru)).unwrap();
        let ctx = RecordingContext::new();
        let result = router.dispatch(&ctx, "chk:DONE:abcd:1").await.unwrap();
        assert_eq!(result, Dispatched::Expired(WidgetKind::Checkbox));
        assert_eq!(
            ctx.calls(),
            vec![
                HostCall::Answer(Answer::text(
                    Lang::Ru.texts().expired(WidgetKind::Checkbox)
                )),
                HostCall::RemoveMarkup,
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_payload_is_invalid() {
        let router = Router::new(RouterConfig::default()).unwrap();
        let ctx = RecordingContext::new();
        let result = router.dispatch(&ctx, "cal:DAY:2024:2:30:abcd:1").await.unwrap();
        assert_eq!(
            result,
            Dispatched::Invalid(ParseError::InvalidDate {
                year: 2024,
                month: 2,
                day: 30
            })
        );
        assert_eq!(ctx.last_answer(), Some(Answer::alert("Invalid request")));
    }

    #[tokio::test]
    async fn test_routes_to_live_instance() {
        let router = Router::new(RouterConfig::default()).unwrap();
        let calendar = Calendar::builder().build(router.calendars()).unwrap();
        let ctx = RecordingContext::new();
        let payload = calendar.callback(&CalendarAction::Back);
        let result = router.dispatch(&ctx, &payload).await.unwrap();
        assert_eq!(result, Dispatched::Calendar(Outcome::Completed(None)));
        assert!(result.is_terminal());
    }
}
