//! Task types and the per-task status state machine.
//!
//! Tasks are owned by the caller. The pipeline never mutates the caller's
//! copy; it clones tasks into the draft and proposes a new status (and, for
//! scheduled tasks, an interval) on the outcome.

pub mod priority;
pub mod validate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::interval::Interval;

/// Task status.
///
/// Valid transitions:
/// - PENDING → SCHEDULED | NOT_SCHEDULABLE
/// - SCHEDULED → OVEREXTENDED | COMPLETED
/// - OVEREXTENDED → COMPLETED
///
/// NOT_SCHEDULABLE, COMPLETED and SET_ASIDE are terminal for one invocation.
/// SET_ASIDE is only ever assigned by the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    Scheduled,
    NotSchedulable,
    Overextended,
    Completed,
    SetAside,
}

impl TaskStatus {
    /// Check if a transition is valid.
    pub fn can_transition_to(&self, to: &TaskStatus) -> bool {
        self.valid_transitions().contains(to)
    }

    /// Get valid next states for this state.
    pub fn valid_transitions(&self) -> &[TaskStatus] {
        match self {
            TaskStatus::Pending => &[TaskStatus::Scheduled, TaskStatus::NotSchedulable],
            TaskStatus::Scheduled => &[TaskStatus::Overextended, TaskStatus::Completed],
            TaskStatus::Overextended => &[TaskStatus::Completed],
            TaskStatus::NotSchedulable | TaskStatus::Completed | TaskStatus::SetAside => &[],
        }
    }

    /// Statuses a fresh retune invocation re-plans from scratch.
    pub fn is_replannable(&self) -> bool {
        matches!(
            self,
            TaskStatus::Pending | TaskStatus::Scheduled | TaskStatus::NotSchedulable
        )
    }
}

/// How strictly a task is anchored to its requested time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Rigidity {
    /// Must occupy exactly its requested interval.
    Fixed,
    /// Placed anywhere; first fit wins.
    #[default]
    Flexible,
    /// Movable, but kept as close to the requested start as possible.
    Preferred,
}

/// A unit of work to place into the day.
///
/// Duration, importance and difficulty are optional on the wire so that a
/// missing field is reported against the single task instead of failing the
/// whole snapshot; see [`validate::validate_task`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: String,
    /// Task title
    pub title: String,
    /// Planned duration in minutes
    pub duration_minutes: Option<u32>,
    /// 1 (trivial) to 5 (critical)
    pub importance: Option<u8>,
    /// 1 (easy) to 5 (draining)
    pub difficulty: Option<u8>,
    #[serde(default)]
    pub rigidity: Rigidity,
    /// Requested start; mandatory for Fixed tasks, the anchor for Preferred ones.
    #[serde(default)]
    pub requested_start: Option<DateTime<Utc>>,
    /// The task may not start before this instant.
    #[serde(default)]
    pub earliest_start: Option<DateTime<Utc>>,
    /// The task must end by this instant.
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: TaskStatus,
    /// Parent task ID when this record is one chunk of interrupted work.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Recorded execution intervals.
    #[serde(default)]
    pub worked_ranges: Vec<Interval>,
}

impl Task {
    /// Create a new pending Flexible task with neutral defaults.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            duration_minutes: Some(30),
            importance: Some(3),
            difficulty: Some(3),
            rigidity: Rigidity::Flexible,
            requested_start: None,
            earliest_start: None,
            due: None,
            status: TaskStatus::Pending,
            parent_id: None,
            worked_ranges: Vec::new(),
        }
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = Some(importance);
        self
    }

    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn fixed_at(mut self, start: DateTime<Utc>) -> Self {
        self.rigidity = Rigidity::Fixed;
        self.requested_start = Some(start);
        self
    }

    pub fn preferred_at(mut self, start: DateTime<Utc>) -> Self {
        self.rigidity = Rigidity::Preferred;
        self.requested_start = Some(start);
        self
    }

    pub fn with_earliest_start(mut self, earliest: DateTime<Utc>) -> Self {
        self.earliest_start = Some(earliest);
        self
    }

    pub fn with_due(mut self, due: DateTime<Utc>) -> Self {
        self.due = Some(due);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn as_chunk_of(mut self, parent_id: impl Into<String>, worked: Interval) -> Self {
        self.parent_id = Some(parent_id.into());
        self.worked_ranges = vec![worked];
        self
    }

    /// Duration in minutes, zero when missing. Only meaningful after validation.
    pub fn minutes(&self) -> i64 {
        i64::from(self.duration_minutes.unwrap_or(0))
    }

    /// Importance after validation (missing reads as the lowest).
    pub fn importance_level(&self) -> u8 {
        self.importance.unwrap_or(1)
    }

    /// Difficulty after validation (missing reads as the hardest).
    pub fn difficulty_level(&self) -> u8 {
        self.difficulty.unwrap_or(5)
    }

    /// The interval a Fixed or Preferred task asked for.
    pub fn requested_interval(&self) -> Option<Interval> {
        self.requested_start
            .and_then(|start| Interval::from_start(start, self.minutes()))
    }

    /// Transition to a new status.
    ///
    /// Returns an error if the transition is invalid.
    pub fn transition_to(&mut self, new_status: TaskStatus) -> Result<(), TaskTransitionError> {
        if !self.status.can_transition_to(&new_status) {
            return Err(TaskTransitionError {
                from: self.status,
                to: new_status,
            });
        }
        self.status = new_status;
        Ok(())
    }

    /// Undo a Scheduled status proposed earlier in the same invocation.
    pub fn withdraw_proposal(&mut self) {
        if self.status == TaskStatus::Scheduled {
            self.status = TaskStatus::Pending;
        }
    }

    /// Put a task arriving as Scheduled or NotSchedulable back to Pending so a
    /// new invocation can re-plan it.
    pub fn reset_for_retune(&mut self) {
        if self.status.is_replannable() {
            self.status = TaskStatus::Pending;
        }
    }
}

/// Error returned when an invalid status transition is attempted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskTransitionError {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

impl fmt::Display for TaskTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid status transition: {:?} → {:?}", self.from, self.to)
    }
}

impl std::error::Error for TaskTransitionError {}
