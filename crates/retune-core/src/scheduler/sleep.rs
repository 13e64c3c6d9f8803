//! Sleep placement.

use chrono::Duration;
use tracing::{debug, warn};

use crate::interval::Interval;
use crate::preferences::DayPreferences;

use super::draft::{Placement, ScheduleDraft};
use super::window::carve;

/// Places sleep into the open intervals of a draft.
pub struct SleepPlanner<'a> {
    prefs: &'a DayPreferences,
}

impl<'a> SleepPlanner<'a> {
    pub fn new(prefs: &'a DayPreferences) -> Self {
        Self { prefs }
    }

    /// Pick the sleep interval for the draft's open intervals without placing it.
    ///
    /// The host block is the largest open interval holding at least the
    /// minimum sleep (earliest on ties). The ideal interval is used verbatim
    /// when it fits inside the host; otherwise sleep ends at the host's end
    /// and lasts `max(min, min(ideal, host length))`.
    pub fn choose(&self, draft: &ScheduleDraft) -> Option<Interval> {
        let ideal_minutes = i64::from(self.prefs.ideal_sleep_minutes);
        let min_minutes = i64::from(self.prefs.min_sleep_minutes);
        if ideal_minutes == 0 {
            debug!("ideal sleep is zero, no sleep placed");
            return None;
        }

        let host = draft
            .open
            .iter()
            .filter(|block| block.duration_minutes() >= min_minutes)
            .fold(None::<&Interval>, |best, block| match best {
                Some(b) if b.duration() >= block.duration() => Some(b),
                _ => Some(block),
            })?;

        if let Some(ideal) = self.prefs.ideal_sleep(&draft.day) {
            if host.contains(&ideal) {
                return Some(ideal);
            }
        }

        let length = min_minutes.max(ideal_minutes.min(host.duration_minutes()));
        Interval::new(host.end() - Duration::minutes(length), host.end()).ok()
    }

    /// Place sleep and carve it out of the open intervals.
    pub fn place(&self, draft: &mut ScheduleDraft) -> Option<Interval> {
        let Some(sleep) = self.choose(draft) else {
            if self.prefs.ideal_sleep_minutes > 0 {
                warn!(
                    min_sleep_minutes = self.prefs.min_sleep_minutes,
                    "no open block fits the minimum sleep; sleep omitted"
                );
            }
            return None;
        };

        draft.open = carve(&draft.open, &sleep);
        draft.placements.push(Placement::sleep(sleep));
        debug!(start = %sleep.start(), end = %sleep.end(), "placed sleep");
        Some(sleep)
    }
}
