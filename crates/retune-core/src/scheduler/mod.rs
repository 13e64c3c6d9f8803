//! Retune pipeline.
//!
//! This module runs one retune invocation over a single mutable draft:
//! - Builds the day's open intervals around Fixed tasks and blocked time
//! - Carves sleep out of the open intervals
//! - Defers tasks the current mood rules out
//! - Places tasks by priority, then inserts breaks and snaps drifted tasks back
//! - Resolves leftover overlaps and rolls up completed chunks

pub mod breaks;
pub mod draft;
pub mod mood;
pub mod overlap;
pub mod placer;
pub mod rollup;
pub mod sleep;
pub mod snap_back;
pub mod window;

pub use draft::{Placement, PlacementEntry, ScheduleDraft};

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::config::RetuneConfig;
use crate::error::{Result, RetuneError};
use crate::interval::Interval;
use crate::outcome::{
    InvalidTask, RetuneOutcome, RetuneRequest, ScheduledTask, UnschedulableReason,
    UnschedulableTask,
};
use crate::task::validate::validate_task;
use crate::task::{Rigidity, Task, TaskStatus};

use breaks::BreakPolicy;
use mood::MoodFilter;
use placer::{PlacementBounds, TaskPlacer};
use sleep::SleepPlanner;
use snap_back::SnapBack;
use window::WindowBuilder;

/// Runs the retune pipeline.
pub struct Retuner {
    config: RetuneConfig,
}

impl Retuner {
    /// Create a retuner with default config
    pub fn new() -> Self {
        Self {
            config: RetuneConfig::default(),
        }
    }

    /// Create with custom config
    pub fn with_config(config: RetuneConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetuneConfig {
        &self.config
    }

    /// Plan the day described by `request`.
    ///
    /// Never fails: invalid tasks, unplaceable tasks and fatal input problems
    /// are all reported on the returned outcome.
    pub fn retune(&self, request: &RetuneRequest) -> RetuneOutcome {
        let mut outcome = RetuneOutcome::default();

        let mut valid = Vec::with_capacity(request.tasks.len());
        for task in &request.tasks {
            match validate_task(task) {
                Ok(()) => {
                    let mut task = task.clone();
                    task.reset_for_retune();
                    valid.push(task);
                }
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "rejecting invalid task");
                    outcome.invalid.push(InvalidTask {
                        task_id: task.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let eligible: Vec<Task> = valid
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .cloned()
            .collect();

        let (mut draft, mut deferred) = match self.plan(request, eligible.clone()) {
            Ok(planned) => planned,
            Err(e) => {
                warn!(error = %e, "retune aborted; every eligible task is unschedulable");
                outcome.diagnostic = Some(e.to_string());
                outcome.unschedulable = eligible
                    .into_iter()
                    .filter_map(|mut task| {
                        task.transition_to(TaskStatus::NotSchedulable).ok()?;
                        Some(UnschedulableTask {
                            task,
                            reason: UnschedulableReason::NoOpenBlock,
                        })
                    })
                    .collect();
                let rollup = rollup::roll_up(&valid);
                outcome.completed = rollup.completed;
                outcome.retired = rollup.retired;
                return outcome;
            }
        };

        // Stage 8: roll up completed chunks; a rolled-up parent needs no slot
        let rollup = rollup::roll_up(&valid);
        if !rollup.rolled_up.is_empty() {
            drop_rolled_up(&mut draft, &mut deferred, &rollup.rolled_up);
        }
        outcome.completed = rollup.completed;
        outcome.retired = rollup.retired;

        outcome.sleep = draft.sleep();
        outcome.breaks = draft.breaks();
        draft.sort_placements();
        outcome.scheduled = draft
            .placements
            .into_iter()
            .filter_map(|p| match p.entry {
                PlacementEntry::Task(task) => Some(ScheduledTask {
                    task,
                    interval: p.interval,
                }),
                _ => None,
            })
            .collect();
        outcome.unschedulable = draft.unschedulable;
        outcome.deferred = deferred;

        info!(
            scheduled = outcome.scheduled.len(),
            unschedulable = outcome.unschedulable.len(),
            deferred = outcome.deferred.len(),
            completed = outcome.completed.len(),
            invalid = outcome.invalid.len(),
            breaks = outcome.breaks.len(),
            "retune finished"
        );
        outcome
    }

    /// Stages 1 through 7. Errors are fatal input problems.
    fn plan(&self, request: &RetuneRequest, eligible: Vec<Task>) -> Result<(ScheduleDraft, Vec<Task>)> {
        let prefs = request
            .preferences
            .as_ref()
            .ok_or(RetuneError::MissingPreferences)?;
        prefs.validate()?;
        let day = prefs.day_bounds(request.now)?;

        // Stage 1: Fixed requests count as blocked whatever the mood says
        let mut blocked: Vec<Interval> = eligible
            .iter()
            .filter(|t| t.rigidity == Rigidity::Fixed)
            .filter_map(Task::requested_interval)
            .collect();
        blocked.extend(request.blocked.iter().copied());
        let open = WindowBuilder::new(day.start(), day.end())?.open_intervals(&blocked);
        let mut draft = ScheduleDraft::new(day, open).with_blocked(request.blocked.clone());

        // Stage 2
        SleepPlanner::new(prefs).place(&mut draft);

        // Stage 3
        let split = MoodFilter::new(&self.config.mood).apply(
            eligible,
            request.mood.as_ref(),
            request.now,
        );

        // Stage 4
        let bounds = PlacementBounds::new(day, prefs.work_spans(&day), request.now);
        let placer = TaskPlacer::new(bounds);
        placer.place_all(&mut draft, &split.kept);

        // Stage 5
        let mut draft = BreakPolicy::new(&self.config.breaks).apply(draft, &split.kept, &placer);

        // Stage 6
        SnapBack::new(&self.config.snap_back, &self.config.placement)
            .apply(&mut draft, placer.bounds());

        // Stage 7
        overlap::resolve_overlaps(&mut draft);

        Ok((draft, split.deferred))
    }
}

impl Default for Retuner {
    fn default() -> Self {
        Self::new()
    }
}

fn drop_rolled_up(draft: &mut ScheduleDraft, deferred: &mut Vec<Task>, rolled_up: &BTreeSet<String>) {
    let keep = |task: &Task| !rolled_up.contains(&task.id);
    draft
        .placements
        .retain(|p| p.as_task().map_or(true, |t| keep(t)));
    draft.unschedulable.retain(|u| keep(&u.task));
    deferred.retain(|t| keep(t));
}
