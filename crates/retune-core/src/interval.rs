//! Half-open time intervals and the set operations the pipeline needs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A half-open `[start, end)` span of time. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawInterval> for Interval {
    type Error = ValidationError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Interval::new(raw.start, raw.end)
    }
}

impl Interval {
    /// Create a new interval, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Interval starting at `start` lasting `minutes`. `None` when `minutes`
    /// is zero or the end falls outside the representable range.
    pub fn from_start(start: DateTime<Utc>, minutes: i64) -> Option<Self> {
        let end = start.checked_add_signed(Duration::try_minutes(minutes)?)?;
        Self::new(start, end).ok()
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Get duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// True when the two intervals share any instant. Touching ends do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Overlapping part of both intervals, if any.
    pub fn intersection(&self, other: &Interval) -> Option<Interval> {
        Interval::new(self.start.max(other.start), self.end.min(other.end)).ok()
    }

    /// Same length, moved by `by` (negative moves earlier).
    pub fn shifted(&self, by: Duration) -> Option<Interval> {
        Some(Interval {
            start: self.start.checked_add_signed(by)?,
            end: self.end.checked_add_signed(by)?,
        })
    }

    /// Remove `cut` from `self`, returning the zero, one or two pieces left over.
    pub fn subtract(&self, cut: &Interval) -> Vec<Interval> {
        if !self.overlaps(cut) {
            return vec![*self];
        }
        let mut pieces = Vec::with_capacity(2);
        if let Ok(before) = Interval::new(self.start, cut.start) {
            pieces.push(before);
        }
        if let Ok(after) = Interval::new(cut.end, self.end) {
            pieces.push(after);
        }
        pieces
    }
}

/// Sort and coalesce overlapping or touching intervals.
pub fn merge_intervals(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort();
    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Remove `cut` from every interval of a sorted list.
pub fn subtract_from_all(intervals: &[Interval], cut: &Interval) -> Vec<Interval> {
    intervals.iter().flat_map(|i| i.subtract(cut)).collect()
}
