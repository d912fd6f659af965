//! Wall-clock abstraction
//!
//! Calendar bounds and future-only time selection compare against "now" at
//! render and event time. Widgets read it through [`Clock`] so tests can pin
//! the date.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use chrono::Local;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::TimeDelta;

/// Source of the current local date and time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Returns the current local date and time.
    fn now(&self) -> NaiveDateTime;

    /// Returns the current local date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Shared clock handle held by widgets.
pub type SharedClock = Arc<dyn Clock>;

/// The system's local clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Returns a shared handle to the system clock.
pub fn system() -> SharedClock {
    Arc::new(SystemClock)
}

/// A manually controlled clock.
///
/// Cheap to clone; clones share the same instant.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use chrono::TimeDelta;
/// use keygrid_lib::clock::{Clock, FixedClock};
///
/// let start = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap().and_hms_opt(23, 0, 0).unwrap();
/// let clock = FixedClock::new(start);
/// clock.advance(TimeDelta::hours(2));
/// assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl FixedClock {
    /// Creates a clock frozen at `now`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Creates a clock frozen at midday of `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN) + TimeDelta::hours(12))
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }

    /// Returns this clock as a shared handle.
    pub fn shared(&self) -> SharedClock {
        Arc::new(self.clone())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
