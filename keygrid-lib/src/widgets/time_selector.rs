//! Hour and minute picker
//!
//! Two layouts share one state machine: [`TimeSelectorStyle::Grid`] taps an
//! hour and a minute cell directly, [`TimeSelectorStyle::Modern`] steps the
//! value up and down.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveTime;
use chrono::Timelike;
use futures::future::BoxFuture;
use tokio::sync::Mutex;

use super::BackHandler;
use super::Outcome;
use super::SelectHandler;
use super::Widget;
use super::check_payload;
use super::deliver;
use super::go_back;
use crate::clock;
use crate::clock::SharedClock;
use crate::codec::Action;
use crate::codec::Args;
use crate::codec::WidgetKind;
use crate::error::BoxError;
use crate::error::ConfigError;
use crate::error::HostError;
use crate::error::ParseError;
use crate::host::Answer;
use crate::host::CallbackContext;
use crate::i18n::Lang;
use crate::keyboard::Keyboard;
use crate::keyboard::KeyboardBuilder;
use crate::registry::Handle;
use crate::registry::InstanceRegistry;

const MINUTES_PER_DAY: u32 = 24 * 60;
const GRID_WIDTH: usize = 6;

/// Keyboard layout of a [`TimeSelector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSelectorStyle {
    /// One cell per hour and per minute step.
    Grid,
    /// Up and down steppers around the current value.
    #[default]
    Modern,
}

/// Actions carried by time selector buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeAction {
    Ignore,
    /// Move the hour by a signed amount.
    Hour(i32),
    /// Move the minute by a signed amount.
    Minute(i32),
    SetHour(u32),
    SetMinute(u32),
    Done,
    Back,
}

impl Action for TimeAction {
    const KIND: WidgetKind = WidgetKind::TimeSelector;

    fn tag(&self) -> &'static str {
        match self {
            Self::Ignore => "IGNORE",
            Self::Hour(_) => "HOUR",
            Self::Minute(_) => "MINUTE",
            Self::SetHour(_) => "SET-HOUR",
            Self::SetMinute(_) => "SET-MINUTE",
            Self::Done => "DONE",
            Self::Back => "BACK",
        }
    }

    fn args(&self) -> Vec<String> {
        match self {
            Self::Hour(delta) | Self::Minute(delta) => vec![delta.to_string()],
            Self::SetHour(value) | Self::SetMinute(value) => vec![value.to_string()],
            Self::Ignore | Self::Done | Self::Back => Vec::new(),
        }
    }

    fn parse(tag: &str, args: Args<'_>) -> Result<Self, ParseError> {
        match tag {
            "IGNORE" => args.expect("IGNORE", 0).map(|_| Self::Ignore),
            "DONE" => args.expect("DONE", 0).map(|_| Self::Done),
            "BACK" => args.expect("BACK", 0).map(|_| Self::Back),
            "HOUR" => {
                args.expect("HOUR", 1)?;
                Ok(Self::Hour(args.int_in(0, "hour", -23, 23)? as i32))
            }
            "MINUTE" => {
                args.expect("MINUTE", 1)?;
                Ok(Self::Minute(args.int_in(0, "minute", -59, 59)? as i32))
            }
            "SET-HOUR" => {
                args.expect("SET-HOUR", 1)?;
                Ok(Self::SetHour(args.int_in(0, "hour", 0, 23)? as u32))
            }
            "SET-MINUTE" => {
                args.expect("SET-MINUTE", 1)?;
                Ok(Self::SetMinute(args.int_in(0, "minute", 0, 59)? as u32))
            }
            other => Err(ParseError::unknown_action(Self::KIND.name(), other)),
        }
    }
}

/// Shifts `time` by whole hours and minutes.
///
/// Hours wrap around the day. With `carry_over`, minutes that leave the hour
/// move the hour along with them; without it they wrap within the hour.
///
/// ```
/// use chrono::NaiveTime;
/// use keygrid_lib::widgets::time_selector::adjust;
///
/// let t = NaiveTime::from_hms_opt(0, 5, 0).unwrap();
/// assert_eq!(adjust(t, 0, -10, true), NaiveTime::from_hms_opt(23, 55, 0).unwrap());
/// assert_eq!(adjust(t, 0, -10, false), NaiveTime::from_hms_opt(0, 55, 0).unwrap());
/// ```
pub fn adjust(time: NaiveTime, hours: i32, minutes: i32, carry_over: bool) -> NaiveTime {
    let total = time.minute() as i32 + minutes;
    let carry = if carry_over { total.div_euclid(60) } else { 0 };
    let hour = (time.hour() as i32 + hours + carry).rem_euclid(24) as u32;
    let minute = total.rem_euclid(60) as u32;
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(time)
}

/// An inline time picker.
pub struct TimeSelector {
    handle: Handle,
    time: Mutex<NaiveTime>,
    style: TimeSelectorStyle,
    minute_step: u32,
    carry_over: bool,
    future_only: bool,
    lang: Lang,
    warn_text: String,
    on_select: Option<SelectHandler<NaiveTime>>,
    on_back: Option<BackHandler>,
    clock: SharedClock,
    timeout: Duration,
}

impl TimeSelector {
    /// Creates a new builder.
    pub fn builder() -> TimeSelectorBuilder {
        TimeSelectorBuilder::new()
    }

    pub fn style(&self) -> TimeSelectorStyle {
        self.style
    }

    /// Returns the currently shown time.
    pub async fn time(&self) -> NaiveTime {
        *self.time.lock().await
    }

    /// Renders the current time.
    pub async fn render(&self) -> Keyboard {
        let time = self.time().await;
        self.render_time(time)
    }

    /// Renders the keyboard for `time`.
    pub fn render_time(&self, time: NaiveTime) -> Keyboard {
        let mut kb = match self.style {
            TimeSelectorStyle::Grid => self.grid(time),
            TimeSelectorStyle::Modern => self.stepper(time),
        };
        let texts = self.lang.texts();
        kb.row([
            self.button(texts.back, TimeAction::Back),
            self.button(texts.done, TimeAction::Done),
        ]);
        kb.build()
    }

    fn grid(&self, time: NaiveTime) -> KeyboardBuilder {
        let mark = |value: u32, current: u32| {
            if value == current {
                format!("• {value:02} •")
            } else {
                format!("{value:02}")
            }
        };

        let mut kb = KeyboardBuilder::new();
        for hour in 0..24 {
            kb.add(self.button(mark(hour, time.hour()), TimeAction::SetHour(hour)));
        }
        kb.adjust(GRID_WIDTH);
        kb.row([self.button(time.format("%H:%M").to_string(), TimeAction::Ignore)]);
        for minute in (0..60).step_by(self.minute_step as usize) {
            kb.add(self.button(mark(minute, time.minute()), TimeAction::SetMinute(minute)));
        }
        kb.adjust(GRID_WIDTH);
        kb
    }

    fn stepper(&self, time: NaiveTime) -> KeyboardBuilder {
        let step = self.minute_step as i32;
        let mut kb = KeyboardBuilder::new();
        kb.row([
            self.button("▲", TimeAction::Hour(1)),
            self.button("▲", TimeAction::Minute(step)),
        ]);
        kb.row([
            self.button(format!("{:02}", time.hour()), TimeAction::Ignore),
            self.button(format!("{:02}", time.minute()), TimeAction::Ignore),
        ]);
        kb.row([
            self.button("▼", TimeAction::Hour(-1)),
            self.button("▼", TimeAction::Minute(-step)),
        ]);
        kb
    }

    fn is_allowed(&self, time: NaiveTime) -> bool {
        !self.future_only || time > self.clock.now().time()
    }

    async fn change(
        &self,
        ctx: &dyn CallbackContext,
        next: impl FnOnce(NaiveTime) -> NaiveTime,
    ) -> Result<(), HostError> {
        let mut current = self.time.lock().await;
        let candidate = next(*current);
        if candidate == *current {
            return ctx.answer(Answer::ack()).await;
        }
        if !self.is_allowed(candidate) {
            return ctx.answer(Answer::alert(self.warn_text.as_str())).await;
        }

        ctx.edit_markup(self.render_time(candidate)).await?;
        log::debug!(
            "[time selector] {} {} -> {}",
            self.handle.token(),
            current.format("%H:%M"),
            candidate.format("%H:%M")
        );
        *current = candidate;
        drop(current);

        ctx.answer(Answer::ack()).await
    }
}

#[async_trait]
impl Widget for TimeSelector {
    type Action = TimeAction;
    type Output = NaiveTime;

    fn handle(&self) -> &Handle {
        &self.handle
    }

    async fn process(
        &self,
        ctx: &dyn CallbackContext,
        action: TimeAction,
    ) -> Result<Outcome<NaiveTime>, HostError> {
        let carry_over = self.carry_over;
        match action {
            TimeAction::Ignore => ctx.answer(Answer::cached(60)).await?,
            TimeAction::Hour(delta) => {
                self.change(ctx, |t| adjust(t, delta, 0, carry_over)).await?
            }
            TimeAction::Minute(delta) => {
                self.change(ctx, |t| adjust(t, 0, delta, carry_over)).await?
            }
            TimeAction::SetHour(hour) => {
                self.change(ctx, |t| t.with_hour(hour).unwrap_or(t)).await?
            }
            TimeAction::SetMinute(minute) => {
                self.change(ctx, |t| t.with_minute(minute).unwrap_or(t)).await?
            }
            TimeAction::Done => {
                let time = self.time().await;
                if !self.is_allowed(time) {
                    ctx.answer(Answer::alert(self.warn_text.as_str())).await?;
                    return Ok(Outcome::Pending);
                }
                return deliver::<TimeAction, _>(ctx, self.on_select.as_ref(), time, self.timeout)
                    .await;
            }
            TimeAction::Back => {
                return go_back::<TimeAction, _>(ctx, self.on_back.as_ref(), self.timeout).await;
            }
        }
        Ok(Outcome::Pending)
    }
}

impl fmt::Debug for TimeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeSelector")
            .field("handle", &self.handle)
            .field("style", &self.style)
            .field("minute_step", &self.minute_step)
            .field("carry_over", &self.carry_over)
            .field("future_only", &self.future_only)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`TimeSelector`].
pub struct TimeSelectorBuilder {
    style: TimeSelectorStyle,
    minute_step: u32,
    carry_over: bool,
    future_only: bool,
    initial: Option<(u32, u32)>,
    offset_minutes: u32,
    lang: Lang,
    warn_text: Option<String>,
    on_select: Option<SelectHandler<NaiveTime>>,
    on_back: Option<BackHandler>,
    clock: Option<SharedClock>,
}

impl Default for TimeSelectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSelectorBuilder {
    /// Creates a builder for a modern selector with a five minute step.
    pub fn new() -> Self {
        Self {
            style: TimeSelectorStyle::default(),
            minute_step: 5,
            carry_over: false,
            future_only: false,
            initial: None,
            offset_minutes: 0,
            lang: Lang::default(),
            warn_text: None,
            on_select: None,
            on_back: None,
            clock: None,
        }
    }

    pub fn style(mut self, style: TimeSelectorStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets the minute increment. Must divide 60 and be at most 30.
    pub fn minute_step(mut self, step: u32) -> Self {
        self.minute_step = step;
        self
    }

    /// Lets minute changes roll over into the hour.
    pub fn carry_over(mut self, carry: bool) -> Self {
        self.carry_over = carry;
        self
    }

    /// Rejects times at or before the current time.
    pub fn future_only(mut self, future_only: bool) -> Self {
        self.future_only = future_only;
        self
    }

    /// Starts at an explicit time.
    pub fn initial(mut self, hour: u32, minute: u32) -> Self {
        self.initial = Some((hour, minute));
        self
    }

    /// Starts at the current time plus `minutes`, rounded up to the step.
    /// Ignored when an explicit initial time is set.
    pub fn offset_minutes(mut self, minutes: u32) -> Self {
        self.offset_minutes = minutes;
        self
    }

    pub fn lang(mut self, lang: Lang) -> Self {
        self.lang = lang;
        self
    }

    /// Overrides the past-time warning.
    pub fn warn_text(mut self, text: impl Into<String>) -> Self {
        self.warn_text = Some(text.into());
        self
    }

    /// Hands the confirmed time to `f` instead of returning it.
    pub fn on_select<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a dyn CallbackContext, NaiveTime) -> BoxFuture<'a, Result<(), BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.on_select = Some(Arc::new(f));
        self
    }

    /// Calls `f` when the user presses back.
    pub fn on_back<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a dyn CallbackContext) -> BoxFuture<'a, Result<(), BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.on_back = Some(Arc::new(f));
        self
    }

    /// Uses `clock` instead of the system clock.
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validates the step and initial time and registers the selector.
    pub fn build(
        self,
        registry: &InstanceRegistry<TimeSelector>,
    ) -> Result<Arc<TimeSelector>, ConfigError> {
        let step = self.minute_step;
        if step == 0 || step > 30 || 60 % step != 0 {
            return Err(ConfigError::InvalidStep(step));
        }
        check_payload(registry.config(), &TimeAction::Minute(-59))?;

        let clock = self.clock.unwrap_or_else(clock::system);
        let time = match self.initial {
            Some((hour, minute)) => NaiveTime::from_hms_opt(hour, minute, 0)
                .ok_or(ConfigError::InvalidTime { hour, minute })?,
            None => {
                let now = clock.now().time();
                let minutes = now.hour() * 60 + now.minute() + self.offset_minutes % MINUTES_PER_DAY;
                let rounded = minutes.div_ceil(step) * step % MINUTES_PER_DAY;
                NaiveTime::from_hms_opt(rounded / 60, rounded % 60, 0).unwrap_or(NaiveTime::MIN)
            }
        };

        let texts = self.lang.texts();
        let warn_text = self.warn_text.unwrap_or_else(|| texts.warn_past_time.to_string());

        Ok(registry.register(|handle| TimeSelector {
            handle,
            time: Mutex::new(time),
            style: self.style,
            minute_step: step,
            carry_over: self.carry_over,
            future_only: self.future_only,
            lang: self.lang,
            warn_text,
            on_select: self.on_select,
            on_back: self.on_back,
            clock,
            timeout: registry.config().request_timeout,
        }))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::clock::FixedClock;
    use crate::codec;
    use crate::codec::MAX_PAYLOAD_LEN;
    use crate::host::RecordingContext;
    use crate::registry::Token;

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn clock_at(hour: u32, minute: u32) -> FixedClock {
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        FixedClock::new(date.and_time(hm(hour, minute)))
    }

    fn selector(builder: TimeSelectorBuilder) -> Arc<TimeSelector> {
        builder.build(&InstanceRegistry::default()).unwrap()
    }

    #[test]
    fn test_action_roundtrip() {
        let handle = Handle::new(Token::parse("a!{~").unwrap(), u64::MAX);
        let actions = [
            TimeAction::Ignore,
            TimeAction::Hour(1),
            TimeAction::Hour(-23),
            TimeAction::Minute(5),
            TimeAction::Minute(-59),
            TimeAction::SetHour(0),
            TimeAction::SetHour(23),
            TimeAction::SetMinute(0),
            TimeAction::SetMinute(59),
            TimeAction::Done,
            TimeAction::Back,
        ];
        for action in actions {
            let payload = codec::encode(&action, &handle);
            assert!(payload.len() <= MAX_PAYLOAD_LEN, "{payload} is too long");
            assert_eq!(codec::decode::<TimeAction>(&payload), Ok((action, handle.clone())));
        }
    }

    #[test]
    fn test_adjust_carry_over() {
        assert_eq!(adjust(hm(0, 5), 0, -10, true), hm(23, 55));
        assert_eq!(adjust(hm(23, 55), 0, 10, true), hm(0, 5));
        assert_eq!(adjust(hm(10, 30), 0, 45, true), hm(11, 15));
        assert_eq!(adjust(hm(10, 30), 0, 45, false), hm(10, 15));
        assert_eq!(adjust(hm(0, 0), -1, 0, false), hm(23, 0));
        assert_eq!(adjust(hm(23, 0), 1, 0, true), hm(0, 0));
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(
            codec::decode::<TimeAction>("tms:MINUTE:-10:abcd:2").map(|(a, _)| a),
            Ok(TimeAction::Minute(-10))
        );
        assert!(matches!(
            codec::decode::<TimeAction>("tms:SET-HOUR:24:abcd:2"),
            Err(ParseError::OutOfRange { field: "hour", .. })
        ));
        assert!(matches!(
            codec::decode::<TimeAction>("tms:MINUTE:-0:abcd:2"),
            Err(ParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            codec::decode::<TimeAction>("tms:MINUTE:+5:abcd:2"),
            Err(ParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_build_validation() {
        let registry = InstanceRegistry::default();
        assert_eq!(
            TimeSelector::builder().minute_step(7).build(&registry).unwrap_err(),
            ConfigError::InvalidStep(7)
        );
        assert_eq!(
            TimeSelector::builder().minute_step(0).build(&registry).unwrap_err(),
            ConfigError::InvalidStep(0)
        );
        assert_eq!(
            TimeSelector::builder().minute_step(60).build(&registry).unwrap_err(),
            ConfigError::InvalidStep(60)
        );
        assert_eq!(
            TimeSelector::builder().initial(24, 0).build(&registry).unwrap_err(),
            ConfigError::InvalidTime { hour: 24, minute: 0 }
        );
    }

    #[tokio::test]
    async fn test_initial_time_from_offset() {
        let ts = selector(
            TimeSelector::builder()
                .clock(clock_at(9, 52).shared())
                .offset_minutes(5)
                .minute_step(5),
        );
        assert_eq!(ts.time().await, hm(10, 0));

        let ts = selector(
            TimeSelector::builder()
                .clock(clock_at(23, 58).shared())
                .minute_step(15),
        );
        assert_eq!(ts.time().await, hm(0, 0));
    }

    #[tokio::test]
    async fn test_modern_stepper() {
        let ts = selector(TimeSelector::builder().initial(0, 5).carry_over(true).minute_step(10));
        let kb = ts.render().await;
        assert_eq!(kb.rows().len(), 4);
        assert_eq!(kb.rows()[2][1].payload, ts.callback(&TimeAction::Minute(-10)));

        let ctx = RecordingContext::new();
        let outcome = ts.process(&ctx, TimeAction::Minute(-10)).await.unwrap();
        assert_eq!(outcome, Outcome::Pending);
        assert_eq!(ts.time().await, hm(23, 55));

        let kb = ctx.last_markup().unwrap();
        assert_eq!(kb.rows()[1][0].text, "23");
        assert_eq!(kb.rows()[1][1].text, "55");
        assert_eq!(ctx.last_answer(), Some(Answer::ack()));
    }

    #[tokio::test]
    async fn test_grid_taps() {
        let ts = selector(
            TimeSelector::builder()
                .style(TimeSelectorStyle::Grid)
                .minute_step(15)
                .initial(8, 0),
        );
        let kb = ts.render().await;
        assert!(kb.button("• 08 •").is_some());
        assert!(kb.button("08:00").is_some());
        assert_eq!(
            kb.buttons()
                .filter(|b| b.payload.starts_with("tms:SET-MINUTE:"))
                .count(),
            4
        );

        let ctx = RecordingContext::new();
        ts.process(&ctx, TimeAction::SetHour(17)).await.unwrap();
        ts.process(&ctx, TimeAction::SetMinute(45)).await.unwrap();
        assert_eq!(ts.time().await, hm(17, 45));
        assert!(ctx.last_markup().unwrap().button("17:45").is_some());
    }

    #[tokio::test]
    async fn test_unchanged_value_skips_edit() {
        let ts = selector(
            TimeSelector::builder()
                .style(TimeSelectorStyle::Grid)
                .initial(8, 0),
        );
        let ctx = RecordingContext::new();
        ts.process(&ctx, TimeAction::SetHour(8)).await.unwrap();
        assert!(ctx.last_markup().is_none());
        assert_eq!(ctx.answers(), vec![Answer::ack()]);
    }

    #[tokio::test]
    async fn test_future_only_rejects_past() {
        let clock = clock_at(12, 0);
        let ts = selector(
            TimeSelector::builder()
                .future_only(true)
                .initial(12, 10)
                .minute_step(10)
                .clock(clock.shared()),
        );
        let ctx = RecordingContext::new();

        ts.process(&ctx, TimeAction::Minute(-10)).await.unwrap();
        assert_eq!(ts.time().await, hm(12, 10));
        assert!(ctx.last_markup().is_none());
        assert_eq!(ctx.last_answer(), Some(Answer::alert("Can't select past time")));

        clock.set(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap().and_time(hm(12, 30)));
        let outcome = ts.process(&ctx, TimeAction::Done).await.unwrap();
        assert_eq!(outcome, Outcome::Pending);

        ts.process(&ctx, TimeAction::Hour(1)).await.unwrap();
        let outcome = ts.process(&ctx, TimeAction::Done).await.unwrap();
        assert_eq!(outcome, Outcome::Completed(Some(hm(13, 10))));
    }

    #[tokio::test]
    async fn test_failed_edit_keeps_time() {
        let ts = selector(TimeSelector::builder().initial(6, 0));
        let ctx = RecordingContext::new();
        ctx.fail_edits(HostError::NotModified);
        let result = ts.process(&ctx, TimeAction::Hour(1)).await;
        assert_eq!(result, Err(HostError::NotModified));
        assert_eq!(ts.time().await, hm(6, 0));
    }

    #[tokio::test]
    async fn test_done_with_collaborator() {
        let ts = selector(
            TimeSelector::builder()
                .initial(7, 30)
                .on_select(|ctx, time| {
                    Box::pin(async move {
                        ctx.edit_text(&format!("Time selected: {}", time.format("%H:%M")))
                            .await?;
                        Ok::<(), BoxError>(())
                    })
                }),
        );
        let ctx = RecordingContext::new();
        let outcome = ts.process(&ctx, TimeAction::Done).await.unwrap();
        assert_eq!(outcome, Outcome::Delegated);
        assert_eq!(ctx.last_text().as_deref(), Some("Time selected: 07:30"));
    }
}
