//! Mood-based difficulty cap.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::MoodConfig;
use crate::preferences::MoodSignal;
use crate::task::Task;

/// Tasks split by the mood filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoodSplit {
    pub kept: Vec<Task>,
    /// Held back for this invocation. Still `PENDING`.
    pub deferred: Vec<Task>,
    /// Difficulty cap in force, if the filter applied.
    pub cap: Option<u8>,
}

pub struct MoodFilter<'a> {
    config: &'a MoodConfig,
}

impl<'a> MoodFilter<'a> {
    pub fn new(config: &'a MoodConfig) -> Self {
        Self { config }
    }

    /// Cap implied by `mood`, or `None` when the signal is absent or stale.
    pub fn cap(&self, mood: Option<&MoodSignal>, now: DateTime<Utc>) -> Option<u8> {
        let mood = mood?;
        if !mood.is_fresh(now, self.config.validity()) {
            debug!(label = %mood.label, observed_at = %mood.observed_at, "ignoring stale mood signal");
            return None;
        }
        Some(self.config.cap_for(&mood.normalized_label()))
    }

    /// Keep tasks at or under the cap. If nothing would survive, keep everything.
    pub fn apply(&self, tasks: Vec<Task>, mood: Option<&MoodSignal>, now: DateTime<Utc>) -> MoodSplit {
        let Some(cap) = self.cap(mood, now) else {
            return MoodSplit {
                kept: tasks,
                ..MoodSplit::default()
            };
        };

        let (kept, deferred): (Vec<Task>, Vec<Task>) =
            tasks.into_iter().partition(|t| t.difficulty_level() <= cap);

        if kept.is_empty() && !deferred.is_empty() {
            info!(cap, "mood filter would remove every task; ignoring it");
            return MoodSplit {
                kept: deferred,
                ..MoodSplit::default()
            };
        }

        if !deferred.is_empty() {
            info!(cap, deferred = deferred.len(), "mood filter deferred tasks");
        }
        MoodSplit {
            kept,
            deferred,
            cap: Some(cap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    fn tasks() -> Vec<Task> {
        vec![
            Task::new("easy", "x").with_difficulty(1),
            Task::new("mid", "x").with_difficulty(3),
            Task::new("hard", "x").with_difficulty(5),
        ]
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn fresh_tired_signal_caps_at_three() {
        let config = MoodConfig::default();
        let mood = MoodSignal::new("Tired ", now() - Duration::minutes(5));
        let split = MoodFilter::new(&config).apply(tasks(), Some(&mood), now());

        assert_eq!(split.cap, Some(3));
        assert_eq!(ids(&split.kept), vec!["easy", "mid"]);
        assert_eq!(ids(&split.deferred), vec!["hard"]);
        assert_eq!(split.deferred[0].status, TaskStatus::Pending);
    }

    #[test]
    fn stale_signal_is_ignored() {
        let config = MoodConfig::default();
        let mood = MoodSignal::new("exhausted", now() - Duration::minutes(61));
        let split = MoodFilter::new(&config).apply(tasks(), Some(&mood), now());
        assert_eq!(split.kept.len(), 3);
        assert!(split.cap.is_none());
    }

    #[test]
    fn missing_signal_keeps_everything() {
        let config = MoodConfig::default();
        let split = MoodFilter::new(&config).apply(tasks(), None, now());
        assert_eq!(split.kept.len(), 3);
        assert!(split.deferred.is_empty());
    }

    #[test]
    fn fails_open_when_everything_would_be_filtered() {
        let config = MoodConfig::default();
        let mood = MoodSignal::new("sad", now());
        let hard_only = vec![
            Task::new("a", "x").with_difficulty(4),
            Task::new("b", "x").with_difficulty(5),
        ];
        let split = MoodFilter::new(&config).apply(hard_only, Some(&mood), now());
        assert_eq!(split.kept.len(), 2);
        assert!(split.deferred.is_empty());
        assert!(split.cap.is_none());
    }

    #[test]
    fn unknown_label_uses_default_cap() {
        let config = MoodConfig::default();
        let mood = MoodSignal::new("whimsical", now());
        assert_eq!(MoodFilter::new(&config).cap(Some(&mood), now()), Some(5));
    }
}
