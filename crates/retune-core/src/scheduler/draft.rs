//! The working draft every pipeline stage mutates.

use crate::interval::{subtract_from_all, Interval};
use crate::outcome::{UnschedulableReason, UnschedulableTask};
use crate::task::{Rigidity, Task, TaskStatus, TaskTransitionError};

/// What occupies a placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementEntry {
    Task(Task),
    Sleep,
    Break,
}

/// One occupied interval of the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub interval: Interval,
    pub entry: PlacementEntry,
}

impl Placement {
    pub fn task(task: Task, interval: Interval) -> Self {
        Self {
            interval,
            entry: PlacementEntry::Task(task),
        }
    }

    pub fn sleep(interval: Interval) -> Self {
        Self {
            interval,
            entry: PlacementEntry::Sleep,
        }
    }

    pub fn rest(interval: Interval) -> Self {
        Self {
            interval,
            entry: PlacementEntry::Break,
        }
    }

    pub fn as_task(&self) -> Option<&Task> {
        match &self.entry {
            PlacementEntry::Task(task) => Some(task),
            _ => None,
        }
    }

    pub fn task_id(&self) -> Option<&str> {
        self.as_task().map(|t| t.id.as_str())
    }

    pub fn is_break(&self) -> bool {
        matches!(self.entry, PlacementEntry::Break)
    }

    pub fn is_sleep(&self) -> bool {
        matches!(self.entry, PlacementEntry::Sleep)
    }

    /// Sleep and Fixed tasks never move once placed.
    pub fn is_anchored(&self) -> bool {
        match &self.entry {
            PlacementEntry::Sleep => true,
            PlacementEntry::Task(task) => task.rigidity == Rigidity::Fixed,
            PlacementEntry::Break => false,
        }
    }
}

/// Mutable state threaded through the pipeline for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDraft {
    /// Bounds of the planning day.
    pub day: Interval,
    /// Open intervals: the day minus blocked time and sleep.
    pub open: Vec<Interval>,
    /// External commitments no task may overlap, Fixed ones included.
    pub blocked: Vec<Interval>,
    pub placements: Vec<Placement>,
    pub unschedulable: Vec<UnschedulableTask>,
}

impl ScheduleDraft {
    pub fn new(day: Interval, open: Vec<Interval>) -> Self {
        Self {
            day,
            open,
            blocked: Vec::new(),
            placements: Vec::new(),
            unschedulable: Vec::new(),
        }
    }

    pub fn with_blocked(mut self, blocked: Vec<Interval>) -> Self {
        self.blocked = blocked;
        self
    }

    /// Open intervals not yet taken by any placement.
    pub fn free_space(&self) -> Vec<Interval> {
        self.placements
            .iter()
            .fold(self.open.clone(), |free, p| subtract_from_all(&free, &p.interval))
    }

    /// Copy of the draft holding only the sleep placement, ready to re-run task placement.
    pub fn without_tasks(&self) -> Self {
        Self {
            day: self.day,
            open: self.open.clone(),
            blocked: self.blocked.clone(),
            placements: self
                .placements
                .iter()
                .filter(|p| p.is_sleep())
                .cloned()
                .collect(),
            unschedulable: Vec::new(),
        }
    }

    /// Place a Pending task, moving it to Scheduled.
    pub fn place(&mut self, mut task: Task, interval: Interval) -> Result<(), TaskTransitionError> {
        task.transition_to(TaskStatus::Scheduled)?;
        self.placements.push(Placement::task(task, interval));
        Ok(())
    }

    /// Record a Pending task as NotSchedulable.
    pub fn reject(
        &mut self,
        mut task: Task,
        reason: UnschedulableReason,
    ) -> Result<(), TaskTransitionError> {
        task.transition_to(TaskStatus::NotSchedulable)?;
        self.unschedulable.push(UnschedulableTask { task, reason });
        Ok(())
    }

    /// Take back a placement made earlier in this invocation and record the
    /// task as NotSchedulable instead.
    pub fn demote(
        &mut self,
        mut task: Task,
        reason: UnschedulableReason,
    ) -> Result<(), TaskTransitionError> {
        task.withdraw_proposal();
        self.reject(task, reason)
    }

    pub fn sleep(&self) -> Option<Interval> {
        self.placements
            .iter()
            .find(|p| p.is_sleep())
            .map(|p| p.interval)
    }

    pub fn breaks(&self) -> Vec<Interval> {
        let mut breaks: Vec<Interval> = self
            .placements
            .iter()
            .filter(|p| p.is_break())
            .map(|p| p.interval)
            .collect();
        breaks.sort();
        breaks
    }

    /// Ids of tasks that currently hold a placement.
    pub fn scheduled_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.placements.iter().filter_map(Placement::task_id).collect();
        ids.sort_unstable();
        ids
    }

    /// Sort placements by start, then end.
    pub fn sort_placements(&mut self) {
        self.placements
            .sort_by(|a, b| a.interval.cmp(&b.interval).then_with(|| a.task_id().cmp(&b.task_id())));
    }
}
