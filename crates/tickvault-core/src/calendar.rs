//! Trading calendar: holiday table, session windows, prior-trading-day walks.
//!
//! The holiday table stores exceptions only. Any weekday absent from the
//! table is a trading day; weekends are never trading days regardless of the
//! table. The table is loaded once and immutable for the process lifetime.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;
use time::macros::{date, format_description, offset, time};
use time::{Date, Duration, OffsetDateTime, Time, UtcOffset, Weekday};

use crate::domain::{SessionState, TradingDay};

/// Hard cap on the backward walk in [`TradingCalendar::previous_trading_day`].
/// A table that marks more consecutive days non-trading is misconfigured.
const MAX_LOOKBACK_DAYS: u32 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("no trading day found within {lookback} days before {start}; holiday table is likely misconfigured")]
    Exhausted { start: Date, lookback: u32 },
}

/// Exchange session boundaries, as local time-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindows {
    pub morning_open: Time,
    pub morning_close: Time,
    pub afternoon_open: Time,
    pub afternoon_close: Time,
}

impl Default for SessionWindows {
    /// A-share regular session: 09:30-11:30 and 13:00-15:00.
    fn default() -> Self {
        Self {
            morning_open: time!(9:30),
            morning_close: time!(11:30),
            afternoon_open: time!(13:00),
            afternoon_close: time!(15:00),
        }
    }
}

/// Trading-day and session-state oracle.
///
/// Constructed once at startup and injected wherever session decisions are
/// needed; holds no mutable state.
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    holidays: BTreeMap<Date, String>,
    offset: UtcOffset,
    windows: SessionWindows,
}

impl Default for TradingCalendar {
    fn default() -> Self {
        Self::new(builtin_holiday_table(), offset!(+8), SessionWindows::default())
    }
}

impl TradingCalendar {
    pub fn new(
        holidays: BTreeMap<Date, String>,
        offset: UtcOffset,
        windows: SessionWindows,
    ) -> Self {
        Self {
            holidays,
            offset,
            windows,
        }
    }

    /// Load the holiday table from a JSON file of `"YYYY-MM-DD": "name"`
    /// entries. A missing or corrupt file falls back to the built-in table
    /// with a logged warning; a bad table never prevents startup.
    pub fn load(path: &Path) -> Self {
        let holidays = match std::fs::read_to_string(path) {
            Ok(raw) => match parse_holiday_table(&raw) {
                Ok(table) => table,
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        %error,
                        "holiday table is corrupt; using built-in table"
                    );
                    builtin_holiday_table()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => builtin_holiday_table(),
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    %error,
                    "holiday table is unreadable; using built-in table"
                );
                builtin_holiday_table()
            }
        };

        Self::new(holidays, offset!(+8), SessionWindows::default())
    }

    /// True iff `date` is a weekday not present in the holiday table.
    pub fn is_trading_day(&self, date: Date) -> bool {
        !is_weekend(date) && !self.holidays.contains_key(&date)
    }

    pub fn trading_day(&self, date: Date) -> TradingDay {
        let reason = if is_weekend(date) {
            Some(String::from("weekend"))
        } else {
            self.holidays.get(&date).cloned()
        };

        TradingDay {
            date,
            is_trading_day: reason.is_none(),
            reason,
        }
    }

    pub fn holiday_name(&self, date: Date) -> Option<&str> {
        self.holidays.get(&date).map(String::as_str)
    }

    /// Convert an instant to exchange-local wall-clock time.
    pub fn to_local(&self, at: OffsetDateTime) -> OffsetDateTime {
        at.to_offset(self.offset)
    }

    /// Session state at the given instant. Non-trading days are `Closed`;
    /// on trading days the local time-of-day is compared against the session
    /// windows. The midday break reports `Closed`.
    pub fn session_state(&self, at: OffsetDateTime) -> SessionState {
        let local = self.to_local(at);
        if !self.is_trading_day(local.date()) {
            return SessionState::Closed;
        }

        let w = self.windows;
        let t = local.time();
        if t < w.morning_open {
            SessionState::PreMarket
        } else if (t <= w.morning_close) || (t >= w.afternoon_open && t <= w.afternoon_close) {
            SessionState::Open
        } else if t > w.afternoon_close {
            SessionState::PostMarket
        } else {
            SessionState::Closed
        }
    }

    /// Most recent trading day strictly before `date`. The walk is bounded;
    /// exhausting it signals a misconfigured holiday table rather than
    /// looping forever.
    pub fn previous_trading_day(&self, date: Date) -> Result<Date, CalendarError> {
        let mut candidate = date;
        for _ in 0..MAX_LOOKBACK_DAYS {
            candidate = candidate - Duration::days(1);
            if self.is_trading_day(candidate) {
                return Ok(candidate);
            }
        }

        Err(CalendarError::Exhausted {
            start: date,
            lookback: MAX_LOOKBACK_DAYS,
        })
    }
}

fn is_weekend(date: Date) -> bool {
    matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday)
}

fn parse_holiday_table(raw: &str) -> Result<BTreeMap<Date, String>, Box<dyn std::error::Error>> {
    let format = format_description!("[year]-[month]-[day]");
    let entries: BTreeMap<String, String> = serde_json::from_str(raw)?;

    let mut table = BTreeMap::new();
    for (key, name) in entries {
        let date = Date::parse(&key, &format)?;
        table.insert(date, name);
    }
    Ok(table)
}

/// Statutory market holidays for 2026, used when no table file is supplied.
fn builtin_holiday_table() -> BTreeMap<Date, String> {
    let entries: [(Date, &str); 28] = [
        (date!(2026 - 01 - 01), "New Year's Day"),
        (date!(2026 - 01 - 02), "New Year's Day"),
        (date!(2026 - 01 - 03), "New Year's Day"),
        (date!(2026 - 02 - 17), "Spring Festival"),
        (date!(2026 - 02 - 18), "Spring Festival"),
        (date!(2026 - 02 - 19), "Spring Festival"),
        (date!(2026 - 02 - 20), "Spring Festival"),
        (date!(2026 - 02 - 21), "Spring Festival"),
        (date!(2026 - 02 - 22), "Spring Festival"),
        (date!(2026 - 02 - 23), "Spring Festival"),
        (date!(2026 - 04 - 05), "Qingming Festival"),
        (date!(2026 - 04 - 06), "Qingming Festival"),
        (date!(2026 - 04 - 07), "Qingming Festival"),
        (date!(2026 - 05 - 01), "Labour Day"),
        (date!(2026 - 05 - 02), "Labour Day"),
        (date!(2026 - 05 - 03), "Labour Day"),
        (date!(2026 - 05 - 04), "Labour Day"),
        (date!(2026 - 05 - 05), "Labour Day"),
        (date!(2026 - 06 - 25), "Dragon Boat Festival"),
        (date!(2026 - 06 - 26), "Dragon Boat Festival"),
        (date!(2026 - 06 - 27), "Dragon Boat Festival"),
        (date!(2026 - 10 - 01), "National Day"),
        (date!(2026 - 10 - 02), "National Day"),
        (date!(2026 - 10 - 03), "National Day"),
        (date!(2026 - 10 - 04), "National Day"),
        (date!(2026 - 10 - 05), "National Day"),
        (date!(2026 - 10 - 06), "National Day"),
        (date!(2026 - 10 - 07), "National Day"),
    ];

    entries
        .into_iter()
        .map(|(date, name)| (date, name.to_owned()))
        .collect()
}
