//! Open-interval construction for the planning day.
//!
//! The open intervals are the complement of the merged blocked intervals
//! within the day bounds. Later stages carve sub-intervals out of them.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Result, RetuneError};
use crate::interval::{merge_intervals, subtract_from_all, Interval};

/// Builds the open intervals of a day.
pub struct WindowBuilder {
    day_start: DateTime<Utc>,
    day_end: DateTime<Utc>,
}

impl WindowBuilder {
    /// Fails when the day bounds are empty or inverted.
    pub fn new(day_start: DateTime<Utc>, day_end: DateTime<Utc>) -> Result<Self> {
        if day_start >= day_end {
            return Err(RetuneError::InvalidDayWindow {
                start: day_start,
                end: day_end,
            });
        }
        Ok(Self { day_start, day_end })
    }

    pub fn for_day(day: &Interval) -> Self {
        Self {
            day_start: day.start(),
            day_end: day.end(),
        }
    }

    /// Open intervals of the day around `blocked`, sorted by start.
    pub fn open_intervals(&self, blocked: &[Interval]) -> Vec<Interval> {
        let merged = merge_intervals(blocked.to_vec());
        let mut open = Vec::new();
        let mut last_end = self.day_start;

        for block in &merged {
            // Skip blocks that end before our current position
            if block.end() <= last_end {
                continue;
            }
            if block.start() >= self.day_end {
                break;
            }
            if block.start() > last_end {
                if let Ok(gap) = Interval::new(last_end, block.start().min(self.day_end)) {
                    open.push(gap);
                }
            }
            last_end = block.end().min(self.day_end);
        }

        if let Ok(tail) = Interval::new(last_end, self.day_end) {
            open.push(tail);
        }

        debug!(
            blocked = merged.len(),
            open = open.len(),
            "built open intervals"
        );
        open
    }
}

/// Remove `cut` from an open list, splitting intervals where needed.
pub fn carve(open: &[Interval], cut: &Interval) -> Vec<Interval> {
    subtract_from_all(open, cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn iv(sh: u32, sm: u32, eh: u32, em: u32) -> Interval {
        Interval::new(at(sh, sm), at(eh, em)).unwrap()
    }

    #[test]
    fn empty_blocked_yields_whole_day() {
        let builder = WindowBuilder::new(at(8, 0), at(20, 0)).unwrap();
        assert_eq!(builder.open_intervals(&[]), vec![iv(8, 0, 20, 0)]);
    }

    #[test]
    fn complement_of_unsorted_overlapping_blocks() {
        let builder = WindowBuilder::new(at(8, 0), at(20, 0)).unwrap();
        let open = builder.open_intervals(&[
            iv(14, 0, 15, 0),
            iv(9, 0, 10, 0),
            iv(9, 30, 11, 0),
        ]);
        assert_eq!(
            open,
            vec![iv(8, 0, 9, 0), iv(11, 0, 14, 0), iv(15, 0, 20, 0)]
        );
    }

    #[test]
    fn blocks_outside_the_day_are_clipped() {
        let builder = WindowBuilder::new(at(8, 0), at(20, 0)).unwrap();
        let open = builder.open_intervals(&[iv(6, 0, 9, 0), iv(19, 0, 22, 0)]);
        assert_eq!(open, vec![iv(9, 0, 19, 0)]);
    }

    #[test]
    fn fully_blocked_day_has_no_open_intervals() {
        let builder = WindowBuilder::new(at(8, 0), at(20, 0)).unwrap();
        assert!(builder.open_intervals(&[iv(7, 0, 21, 0)]).is_empty());
    }

    #[test]
    fn malformed_day_is_fatal() {
        assert!(matches!(
            WindowBuilder::new(at(20, 0), at(8, 0)),
            Err(RetuneError::InvalidDayWindow { .. })
        ));
        assert!(WindowBuilder::new(at(8, 0), at(8, 0)).is_err());
    }

    #[test]
    fn carve_splits_an_open_interval() {
        let open = vec![iv(8, 0, 12, 0), iv(13, 0, 20, 0)];
        let carved = carve(&open, &iv(15, 0, 16, 30));
        assert_eq!(
            carved,
            vec![iv(8, 0, 12, 0), iv(13, 0, 15, 0), iv(16, 30, 20, 0)]
        );
    }
}
