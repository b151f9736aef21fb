//! Time provider abstraction
//!
//! This module provides a [`Clock`] trait that abstracts over time sources,
//! allowing production code to use real system time while tests can pin the
//! clock to a moment that matters (for example just before the working-day
//! boundary).
//!
//! # Example
//!
//! ```
//! use intentions::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! let millis = clock.now_millis();
//! let today = clock.working_day();
//! ```

use std::fmt::Debug;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};

/// Hour (UTC) at which a new working day starts.
///
/// Anything logged before this hour still belongs to the previous day.
pub const NEXT_DAY_STARTS_AT: u32 = 4;

/// A time provider for getting current timestamps.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now_millis(&self) -> u64;

    /// Returns the current time as a UTC datetime.
    fn now(&self) -> DateTime<Utc> {
        millis_to_datetime(self.now_millis())
    }

    /// Returns the current time as an RFC3339-formatted string.
    fn now_rfc3339(&self) -> String {
        self.now().to_rfc3339()
    }

    /// The date intentions created right now belong to.
    fn working_day(&self) -> NaiveDate {
        working_day_for(self.now())
    }

    /// Start of the current UTC calendar day, in milliseconds.
    fn today_start_millis(&self) -> u64 {
        let now = self.now();
        let midnight = now.date_naive().and_hms_opt(0, 0, 0).unwrap_or_default();
        Utc.from_utc_datetime(&midnight).timestamp_millis().max(0) as u64
    }
}

/// Compute the working day for a given moment.
pub fn working_day_for(at: DateTime<Utc>) -> NaiveDate {
    let date = at.date_naive();
    if at.hour() < NEXT_DAY_STARTS_AT {
        date - Duration::days(1)
    } else {
        date
    }
}

/// Convert epoch milliseconds into a UTC datetime, clamping out-of-range values to the epoch.
pub fn millis_to_datetime(millis: u64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis as i64).unwrap_or_default()
}

/// Production clock using real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Test clock with auto-advancing time.
///
/// This clock auto-advances by one millisecond on each `now_millis()` call, so
/// rows created back to back still get strictly increasing timestamps. Use
/// `hold()` to temporarily freeze it.
///
/// # Example
///
/// ```
/// use intentions::{Clock, FixedClock};
///
/// let clock = FixedClock::new(1000);
/// let t1 = clock.now_millis();
/// let t2 = clock.now_millis();
/// assert!(t2 > t1);
///
/// {
///     let _hold = clock.hold();
///     assert_eq!(clock.now_millis(), clock.now_millis());
/// }
/// ```
pub struct FixedClock {
    state: Mutex<FixedClockState>,
}

struct FixedClockState {
    millis: u64,
    held: bool,
}

/// RAII guard that freezes a [`FixedClock`] while held.
pub struct ClockHold<'a>(&'a FixedClock);

impl Drop for ClockHold<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.0.state.lock() {
            state.held = false;
        }
    }
}

impl FixedClock {
    /// Create a new fixed clock with the given initial time in milliseconds.
    pub fn new(millis: u64) -> Self {
        Self {
            state: Mutex::new(FixedClockState {
                millis,
                held: false,
            }),
        }
    }

    /// Create a clock starting at the given UTC date and time.
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        let millis = Utc
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .map(|dt| dt.timestamp_millis().max(0) as u64)
            .unwrap_or(0);
        Self::new(millis)
    }

    /// Hold the clock, preventing auto-advance until the guard is dropped.
    pub fn hold(&self) -> ClockHold<'_> {
        self.lock().held = true;
        ClockHold(self)
    }

    /// Advance the clock by the given number of milliseconds.
    pub fn advance(&self, ms: u64) {
        self.lock().millis += ms;
    }

    /// Set the clock to a specific time in milliseconds.
    pub fn set(&self, ms: u64) {
        self.lock().millis = ms;
    }

    /// Get the current time without advancing (even if not held).
    pub fn get(&self) -> u64 {
        self.lock().millis
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FixedClockState> {
        // A poisoned clock only means a test panicked mid-update; the value is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        let mut state = self.lock();
        if state.held {
            state.millis
        } else {
            let t = state.millis;
            state.millis += 1;
            t
        }
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 12:00:00 UTC, well clear of the working-day boundary
        Self::new(1704110400000)
    }
}

impl Debug for FixedClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("FixedClock")
            .field("millis", &state.millis)
            .field("held", &state.held)
            .finish()
    }
}
