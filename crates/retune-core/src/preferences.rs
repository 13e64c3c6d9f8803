//! Day preferences and the mood signal supplied with each request.
//!
//! Times of day are written "HH:MM" on the wire (like the daily template
//! wake/sleep fields) and resolved against the planning day's bounds here.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RetuneError, ValidationError};
use crate::interval::{merge_intervals, Interval};

/// A wall-clock time of day, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    pub fn hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    /// First instant at or after `from` whose time of day is `self`.
    /// `None` past the end of the representable range.
    pub fn next_at_or_after(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let candidate = Utc.from_utc_datetime(&from.date_naive().and_time(self.0));
        if candidate < from {
            candidate.checked_add_signed(Duration::days(1))
        } else {
            Some(candidate)
        }
    }

    /// First instant strictly after `from` whose time of day is `self`.
    pub fn next_after(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let at = self.next_at_or_after(from)?;
        if at == from {
            at.checked_add_signed(Duration::days(1))
        } else {
            Some(at)
        }
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        NaiveTime::parse_from_str(value.trim(), "%H:%M")
            .map(Self)
            .map_err(|e| ValidationError::InvalidValue {
                field: "time_of_day".to_string(),
                message: format!("expected HH:MM, got '{value}': {e}"),
            })
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// A recurring time-of-day span; `end` before `start` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockWindow {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl ClockWindow {
    /// Resolve to the first concrete occurrence starting at or after `from`.
    pub fn resolve_from(&self, from: DateTime<Utc>) -> Option<Interval> {
        let start = self.start.next_at_or_after(from)?;
        Interval::new(start, self.end.next_after(start)?).ok()
    }

    /// Every occurrence overlapping `span`, clipped to it, sorted.
    ///
    /// Includes the occurrence starting the calendar day before `span`, so a
    /// window like 06:00-10:00 still covers a span that opens at 07:00.
    pub fn occurrences_within(&self, span: &Interval) -> Vec<Interval> {
        let first = span.start().date_naive();
        let first = first.pred_opt().unwrap_or(first);
        let last = span.end().date_naive();

        let occurrences = first
            .iter_days()
            .take_while(|date| *date <= last)
            .filter_map(|date| {
                let start = Utc.from_utc_datetime(&date.and_time(self.start.time()));
                let end = self.end.next_after(start)?;
                Interval::new(start, end).ok()?.intersection(span)
            })
            .collect();
        merge_intervals(occurrences)
    }
}

fn default_day_start() -> ClockTime {
    ClockTime(NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN))
}
fn default_day_length() -> u32 {
    24 * 60
}

/// Per-user day preferences. Read-only input to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPreferences {
    /// Time of day the planning day rolls over.
    #[serde(default = "default_day_start")]
    pub day_start: ClockTime,
    #[serde(default = "default_day_length")]
    pub day_length_minutes: u32,
    /// Target sleep window, e.g. 23:00 → 07:00.
    pub sleep_window: ClockWindow,
    pub ideal_sleep_minutes: u32,
    pub min_sleep_minutes: u32,
    /// Non-fixed tasks are only placed inside this window. Whole day when absent.
    #[serde(default)]
    pub work_window: Option<ClockWindow>,
}

impl DayPreferences {
    /// Bounds of the planning day containing `now`.
    pub fn day_bounds(&self, now: DateTime<Utc>) -> Result<Interval, RetuneError> {
        let mut start = Utc.from_utc_datetime(&now.date_naive().and_time(self.day_start.time()));
        if start > now {
            start = start
                .checked_sub_signed(Duration::days(1))
                .ok_or(RetuneError::InvalidDayWindow { start, end: now })?;
        }
        let end = start
            .checked_add_signed(Duration::minutes(i64::from(self.day_length_minutes)))
            .ok_or(RetuneError::InvalidDayWindow { start, end: start })?;
        Interval::new(start, end).map_err(|_| RetuneError::InvalidDayWindow { start, end })
    }

    /// Check the sleep settings are coherent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_sleep_minutes > self.ideal_sleep_minutes {
            return Err(ValidationError::InvalidValue {
                field: "min_sleep_minutes".to_string(),
                message: format!(
                    "minimum sleep ({}) exceeds ideal sleep ({})",
                    self.min_sleep_minutes, self.ideal_sleep_minutes
                ),
            });
        }
        Ok(())
    }

    /// Ideal sleep interval for the day: starts at the first sleep-window
    /// start inside the day and lasts the ideal duration, pulled earlier so
    /// it ends by the window end when the window is too short.
    pub fn ideal_sleep(&self, day: &Interval) -> Option<Interval> {
        let ideal = i64::from(self.ideal_sleep_minutes);
        let window = self.sleep_window.resolve_from(day.start())?;
        let natural = Interval::from_start(window.start(), ideal)?;
        if natural.end() <= window.end() {
            Some(natural)
        } else {
            let start = window.end().checked_sub_signed(Duration::minutes(ideal))?;
            Interval::new(start, window.end()).ok()
        }
    }

    /// The parts of the day non-fixed tasks may use. The whole day when no
    /// work window is set.
    pub fn work_spans(&self, day: &Interval) -> Vec<Interval> {
        match self.work_window {
            Some(window) => window.occurrences_within(day),
            None => vec![*day],
        }
    }
}

/// A recent self-reported emotional state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodSignal {
    pub label: String,
    pub observed_at: DateTime<Utc>,
}

impl MoodSignal {
    pub fn new(label: impl Into<String>, observed_at: DateTime<Utc>) -> Self {
        Self {
            label: label.into(),
            observed_at,
        }
    }

    /// A signal older than `validity` is ignored entirely.
    pub fn is_fresh(&self, now: DateTime<Utc>, validity: Duration) -> bool {
        now - self.observed_at <= validity
    }

    pub fn normalized_label(&self) -> String {
        self.label.trim().to_lowercase()
    }
}
