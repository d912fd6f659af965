//! Calendar date picker
//!
//! Shows one month at a time. The viewed month is not stored on the instance;
//! it travels inside the navigation payloads, so every press re-renders from
//! the month the pressed keyboard was showing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Datelike;
use chrono::Days;
use chrono::Months;
use chrono::NaiveDate;
use chrono::TimeDelta;
use futures::future::BoxFuture;

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
use crate::host::best_effort;
use crate::i18n::Lang;
use crate::keyboard::Button;
use crate::keyboard::Keyboard;
use crate::keyboard::KeyboardBuilder;
use crate::registry::Handle;
use crate::registry::InstanceRegistry;

const MIN_YEAR: i64 = 1;
const MAX_YEAR: i64 = 9999;

/// A calendar page: one month of one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthView(NaiveDate);

impl MonthView {
    /// Creates a view of `month` (1-based) in `year`, for years 1 to 9999.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&i64::from(year)) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Returns the view containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the first day of the month.
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// Returns the number of days in the month.
    pub fn days(&self) -> u32 {
        self.0
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .map_or(31, |last| last.day())
    }

    /// Moves by whole calendar months. `None` outside years 1 to 9999.
    pub fn shift(&self, months: i32) -> Option<Self> {
        let moved = if months >= 0 {
            self.0.checked_add_months(Months::new(months.unsigned_abs()))
        } else {
            self.0.checked_sub_months(Months::new(months.unsigned_abs()))
        }?;
        Self::new(moved.year(), moved.month())
    }
}

/// Actions carried by calendar buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarAction {
    /// Decorative or disabled cell.
    Ignore,
    /// A day before today while past dates are disallowed.
    WarnPast,
    /// A day beyond the allowed future range.
    WarnFuture,
    /// Pick a date.
    Day(NaiveDate),
    /// Go one month back from the given page.
    PrevMonth(MonthView),
    /// Go one month forward from the given page.
    NextMonth(MonthView),
    /// Go one year back from the given page.
    PrevYear(MonthView),
    /// Go one year forward from the given page.
    NextYear(MonthView),
    /// Leave without a date.
    Back,
}

impl CalendarAction {
    fn view(args: Args<'_>, tag: &'static str) -> Result<MonthView, ParseError> {
        args.expect(tag, 2)?;
        let year = args.int_in(0, "year", MIN_YEAR, MAX_YEAR)? as i32;
        let month = args.int_in(1, "month", 1, 12)? as u32;
        MonthView::new(year, month).ok_or(ParseError::InvalidDate {
            year,
            month,
            day: 1,
        })
    }
}

impl Action for CalendarAction {
    const KIND: WidgetKind = WidgetKind::Calendar;

    fn tag(&self) -> &'static str {
        match self {
            Self::Ignore => "IGNORE",
            Self::WarnPast => "WARN_PAST",
            Self::WarnFuture => "WARN_FUTURE",
            Self::Day(_) => "DAY",
            Self::PrevMonth(_) => "PREV-MONTH",
            Self::NextMonth(_) => "NEXT-MONTH",
            Self::PrevYear(_) => "PREV-YEAR",
            Self::NextYear(_) => "NEXT-YEAR",
            Self::Back => "BACK",
        }
    }

    fn args(&self) -> Vec<String> {
        match self {
            Self::Day(date) => vec![
                date.year().to_string(),
                date.month().to_string(),
                date.day().to_string(),
            ],
            Self::PrevMonth(view)
            | Self::NextMonth(view)
            | Self::PrevYear(view)
            | Self::NextYear(view) => vec![view.year().to_string(), view.month().to_string()],
            Self::Ignore | Self::WarnPast | Self::WarnFuture | Self::Back => Vec::new(),
        }
    }

    fn parse(tag: &str, args: Args<'_>) -> Result<Self, ParseError> {
        match tag {
            "IGNORE" => args.expect("IGNORE", 0).map(|_| Self::Ignore),
            "WARN_PAST" => args.expect("WARN_PAST", 0).map(|_| Self::WarnPast),
            "WARN_FUTURE" => args.expect("WARN_FUTURE", 0).map(|_| Self::WarnFuture),
            "BACK" => args.expect("BACK", 0).map(|_| Self::Back),
            // Accepted on input, never rendered.
            "CANCEL" => args.expect("CANCEL", 0).map(|_| Self::Back),
            "DAY" => {
                args.expect("DAY", 3)?;
                let year = args.int_in(0, "year", MIN_YEAR, MAX_YEAR)? as i32;
                let month = args.int_in(1, "month", 1, 12)? as u32;
                let day = args.int_in(2, "day", 1, 31)? as u32;
                NaiveDate::from_ymd_opt(year, month, day)
                    .map(Self::Day)
                    .ok_or(ParseError::InvalidDate { year, month, day })
            }
            "PREV-MONTH" => Self::view(args, "PREV-MONTH").map(Self::PrevMonth),
            "NEXT-MONTH" => Self::view(args, "NEXT-MONTH").map(Self::NextMonth),
            "PREV-YEAR" => Self::view(args, "PREV-YEAR").map(Self::PrevYear),
            "NEXT-YEAR" => Self::view(args, "NEXT-YEAR").map(Self::NextYear),
            other => Err(ParseError::unknown_action(Self::KIND.name(), other)),
        }
    }
}

/// An inline calendar.
///
/// # Example
///
/// ```ignore
/// let calendar = Calendar::builder()
///     .max_range(TimeDelta::weeks(12))
///     .show_quick_buttons(true)
///     .build(router.calendars())?;
/// send_message("Pick a date", calendar.render()).await?;
/// ```
pub struct Calendar {
    handle: Handle,
    max_range: Option<TimeDelta>,
    can_select_past: bool,
    show_quick_buttons: bool,
    remove_on_action: bool,
    lang: Lang,
    warn_past_text: String,
    warn_future_text: String,
    on_select: Option<SelectHandler<NaiveDate>>,
    on_back: Option<BackHandler>,
    clock: SharedClock,
    timeout: Duration,
}

impl Calendar {
    /// Creates a new builder.
    pub fn builder() -> CalendarBuilder {
        CalendarBuilder::new()
    }

    /// Returns the label language.
    pub fn lang(&self) -> Lang {
        self.lang
    }

    /// Renders the current month.
    pub fn render(&self) -> Keyboard {
        self.render_month(MonthView::of(self.clock.today()))
    }

    /// Renders the given month.
    pub fn render_month(&self, view: MonthView) -> Keyboard {
        let today = self.clock.today();
        let texts = self.lang.texts();
        let ignore = self.callback(&CalendarAction::Ignore);
        let blank = |text: &str| Button::new(text, ignore.clone());

        let mut kb = KeyboardBuilder::new();

        if self.show_quick_buttons {
            let quick = [(texts.today, 0), (texts.tomorrow, 1), (texts.overmorrow, 2)];
            kb.row(quick.into_iter().filter_map(|(label, offset)| {
                let date = today.checked_add_days(Days::new(offset))?;
                Some(self.button(label, self.classify(date, today)))
            }));
        }

        let nav = |months: i32, label: &str, action: CalendarAction| match view.shift(months) {
            Some(target) if self.reachable(target, today, months > 0) => self.button(label, action),
            _ => blank("  "),
        };

        kb.row([
            nav(-1, "<", CalendarAction::PrevMonth(view)),
            blank(&format!("{} {}", texts.month(view.month()), view.year())),
            nav(1, ">", CalendarAction::NextMonth(view)),
        ]);
        kb.row(texts.weekdays.into_iter().map(&blank));

        let mut days = KeyboardBuilder::new();
        let lead = view.first_day().weekday().num_days_from_monday();
        let count = view.days();
        for _ in 0..lead {
            days.add(blank(" "));
        }
        for date in view.first_day().iter_days().take(count as usize) {
            let label = if date == today {
                format!("• {} •", date.day())
            } else {
                date.day().to_string()
            };
            days.add(self.button(label, self.classify(date, today)));
        }
        for _ in 0..(7 - (lead + count) % 7) % 7 {
            days.add(blank(" "));
        }
        days.adjust(7);
        kb.attach(days);

        kb.row([
            nav(-12, "<<", CalendarAction::PrevYear(view)),
            blank("  "),
            nav(12, ">>", CalendarAction::NextYear(view)),
        ]);
        kb.row([self.button(texts.back, CalendarAction::Back)]);
        kb.build()
    }

    /// Returns the action a cell for `date` should carry when today is `today`.
    pub fn classify(&self, date: NaiveDate, today: NaiveDate) -> CalendarAction {
        if date < today && !self.can_select_past {
            CalendarAction::WarnPast
        } else if self
            .max_range
            .is_some_and(|range| date > today && date - today > range)
        {
            CalendarAction::WarnFuture
        } else {
            CalendarAction::Day(date)
        }
    }

    /// Whether navigating to `target` is allowed. Backwards moves are bounded
    /// by the past rule, forward moves by the future range.
    fn reachable(&self, target: MonthView, today: NaiveDate, forward: bool) -> bool {
        if forward {
            self.max_range
                .is_none_or(|range| target.first_day() - today < range)
        } else {
            self.can_select_past || target >= MonthView::of(today)
        }
    }

    async fn navigate(
        &self,
        ctx: &dyn CallbackContext,
        target: Option<MonthView>,
        forward: bool,
    ) -> Result<Outcome<NaiveDate>, HostError> {
        let today = self.clock.today();
        let Some(target) = target.filter(|t| self.reachable(*t, today, forward)) else {
            ctx.answer(Answer::cached(60)).await?;
            return Ok(Outcome::Pending);
        };
        log::debug!(
            "[calendar] {} -> {}-{:02}",
            self.handle.token(),
            target.year(),
            target.month()
        );
        ctx.edit_markup(self.render_month(target)).await?;
        ctx.answer(Answer::ack()).await?;
        Ok(Outcome::Pending)
    }

    async fn warn(&self, ctx: &dyn CallbackContext, text: &str) -> Result<Outcome<NaiveDate>, HostError> {
        ctx.answer(Answer::alert(text)).await?;
        Ok(Outcome::Pending)
    }

    async fn finish(&self, ctx: &dyn CallbackContext) {
        if self.remove_on_action {
            best_effort("remove keyboard", self.timeout, ctx.remove_markup()).await;
            best_effort("answer", self.timeout, ctx.answer(Answer::ack())).await;
        }
    }
}

#[async_trait]
impl Widget for Calendar {
    type Action = CalendarAction;
    type Output = NaiveDate;

    fn handle(&self) -> &Handle {
        &self.handle
    }

    async fn process(
        &self,
        ctx: &dyn CallbackContext,
        action: CalendarAction,
    ) -> Result<Outcome<NaiveDate>, HostError> {
        match action {
            CalendarAction::Ignore => {
                ctx.answer(Answer::cached(60)).await?;
                Ok(Outcome::Pending)
            }
            CalendarAction::WarnPast => self.warn(ctx, &self.warn_past_text).await,
            CalendarAction::WarnFuture => self.warn(ctx, &self.warn_future_text).await,
            // Keyboards rendered on an earlier day can offer dates that are
            // no longer allowed.
            CalendarAction::Day(date) => match self.classify(date, self.clock.today()) {
                CalendarAction::WarnPast => self.warn(ctx, &self.warn_past_text).await,
                CalendarAction::WarnFuture => self.warn(ctx, &self.warn_future_text).await,
                _ => {
                    self.finish(ctx).await;
                    deliver::<CalendarAction, _>(ctx, self.on_select.as_ref(), date, self.timeout).await
                }
            },
            CalendarAction::PrevMonth(view) => self.navigate(ctx, view.shift(-1), false).await,
            CalendarAction::NextMonth(view) => self.navigate(ctx, view.shift(1), true).await,
            CalendarAction::PrevYear(view) => self.navigate(ctx, view.shift(-12), false).await,
            CalendarAction::NextYear(view) => self.navigate(ctx, view.shift(12), true).await,
            CalendarAction::Back => {
                self.finish(ctx).await;
                go_back::<CalendarAction, _>(ctx, self.on_back.as_ref(), self.timeout).await
            }
        }
    }
}

impl fmt::Debug for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Calendar")
            .field("handle", &self.handle)
            .field("max_range", &self.max_range)
            .field("can_select_past", &self.can_select_past)
            .field("lang", &self.lang)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Calendar`].
pub struct CalendarBuilder {
    max_range: Option<TimeDelta>,
    can_select_past: bool,
    show_quick_buttons: bool,
    remove_on_action: bool,
    lang: Lang,
    warn_past_text: Option<String>,
    warn_future_text: Option<String>,
    on_select: Option<SelectHandler<NaiveDate>>,
    on_back: Option<BackHandler>,
    clock: Option<SharedClock>,
}

impl Default for CalendarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarBuilder {
    /// Creates a builder with past dates allowed and no future limit.
    pub fn new() -> Self {
        Self {
            max_range: None,
            can_select_past: true,
            show_quick_buttons: false,
            remove_on_action: false,
            lang: Lang::default(),
            warn_past_text: None,
            warn_future_text: None,
            on_select: None,
            on_back: None,
            clock: None,
        }
    }

    /// Limits selectable dates to at most `range` after today.
    pub fn max_range(mut self, range: TimeDelta) -> Self {
        self.max_range = Some(range);
        self
    }

    /// Allows or forbids dates before today.
    pub fn can_select_past(mut self, allow: bool) -> Self {
        self.can_select_past = allow;
        self
    }

    /// Shows a today / tomorrow / overmorrow row.
    pub fn show_quick_buttons(mut self, show: bool) -> Self {
        self.show_quick_buttons = show;
        self
    }

    /// Removes the keyboard when a date is picked or the user backs out.
    pub fn remove_on_action(mut self, remove: bool) -> Self {
        self.remove_on_action = remove;
        self
    }

    pub fn lang(mut self, lang: Lang) -> Self {
        self.lang = lang;
        self
    }

    /// Overrides the past-date warning.
    pub fn warn_past_text(mut self, text: impl Into<String>) -> Self {
        self.warn_past_text = Some(text.into());
        self
    }

    /// Overrides the far-future warning.
    pub fn warn_future_text(mut self, text: impl Into<String>) -> Self {
        self.warn_future_text = Some(text.into());
        self
    }

    /// Hands picked dates to `f` instead of returning them.
    pub fn on_select<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a dyn CallbackContext, NaiveDate) -> BoxFuture<'a, Result<(), BoxError>>
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

    /// Registers the calendar.
    pub fn build(self, registry: &InstanceRegistry<Calendar>) -> Result<Arc<Calendar>, ConfigError> {
        let widest_day = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX);
        check_payload(registry.config(), &CalendarAction::Day(widest_day))?;

        let texts = self.lang.texts();
        let warn_past_text = self.warn_past_text.unwrap_or_else(|| texts.warn_past.to_string());
        let warn_future_text = self
            .warn_future_text
            .unwrap_or_else(|| texts.warn_future.to_string());
        let clock = self.clock.unwrap_or_else(clock::system);

        Ok(registry.register(|handle| Calendar {
            handle,
            max_range: self.max_range,
            can_select_past: self.can_select_past,
            show_quick_buttons: self.show_quick_buttons,
            remove_on_action: self.remove_on_action,
            lang: self.lang,
            warn_past_text,
            warn_future_text,
            on_select: self.on_select,
            on_back: self.on_back,
            clock,
            timeout: registry.config().request_timeout,
        }))
    }
}
