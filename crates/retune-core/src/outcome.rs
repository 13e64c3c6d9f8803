//! Pipeline input snapshot and the partition handed back to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::interval::Interval;
use crate::preferences::{DayPreferences, MoodSignal};
use crate::task::Task;

/// Everything one retune invocation needs, already fetched by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetuneRequest {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub preferences: Option<DayPreferences>,
    #[serde(default)]
    pub mood: Option<MoodSignal>,
    pub now: DateTime<Utc>,
    /// Externally blocked time such as calendar commitments.
    #[serde(default)]
    pub blocked: Vec<Interval>,
}

impl RetuneRequest {
    pub fn new(now: DateTime<Utc>, preferences: DayPreferences) -> Self {
        Self {
            tasks: Vec::new(),
            preferences: Some(preferences),
            mood: None,
            now,
            blocked: Vec::new(),
        }
    }

    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn with_mood(mut self, mood: MoodSignal) -> Self {
        self.mood = Some(mood);
        self
    }

    pub fn with_blocked(mut self, blocked: Vec<Interval>) -> Self {
        self.blocked = blocked;
        self
    }
}

/// Why a task could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnschedulableReason {
    /// A slot exists, but only past the task's due instant.
    WouldExceedDeadline,
    /// No free interval is large enough.
    NoOpenBlock,
    /// Lost a conflict against a higher-priority placement.
    Overlap,
}

impl fmt::Display for UnschedulableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WouldExceedDeadline => "would_exceed_deadline",
            Self::NoOpenBlock => "no_open_block",
            Self::Overlap => "overlap",
        };
        f.write_str(s)
    }
}

/// A task with the interval proposed for it. Status is `SCHEDULED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub task: Task,
    pub interval: Interval,
}

/// A task that did not fit. Status is `NOT_SCHEDULABLE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnschedulableTask {
    pub task: Task,
    pub reason: UnschedulableReason,
}

/// A task rejected by input validation, with the validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidTask {
    pub task_id: String,
    pub error: String,
}

/// Result of one retune invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetuneOutcome {
    /// Placed tasks, ordered by start.
    pub scheduled: Vec<ScheduledTask>,
    pub unschedulable: Vec<UnschedulableTask>,
    /// Completed tasks, including rolled-up parent records.
    pub completed: Vec<Task>,
    pub breaks: Vec<Interval>,
    #[serde(default)]
    pub sleep: Option<Interval>,
    /// Tasks held back by the mood filter. Still `PENDING`.
    #[serde(default)]
    pub deferred: Vec<Task>,
    #[serde(default)]
    pub invalid: Vec<InvalidTask>,
    /// Chunk ids absorbed into a rolled-up record.
    #[serde(default)]
    pub retired: Vec<String>,
    /// Set when a fatal input problem emptied the day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl RetuneOutcome {
    pub fn interval_of(&self, task_id: &str) -> Option<Interval> {
        self.scheduled
            .iter()
            .find(|s| s.task.id == task_id)
            .map(|s| s.interval)
    }

    pub fn reason_for(&self, task_id: &str) -> Option<UnschedulableReason> {
        self.unschedulable
            .iter()
            .find(|u| u.task.id == task_id)
            .map(|u| u.reason)
    }

    pub fn is_deferred(&self, task_id: &str) -> bool {
        self.deferred.iter().any(|t| t.id == task_id)
    }

    /// Every task the caller should persist, in outcome order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.scheduled
            .iter()
            .map(|s| &s.task)
            .chain(self.unschedulable.iter().map(|u| &u.task))
            .chain(self.deferred.iter())
            .chain(self.completed.iter())
    }
}
