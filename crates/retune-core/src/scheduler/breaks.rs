//! Break insertion after long stretches of work.
//!
//! The policy walks placements in time order accumulating work minutes.
//! Task placements count as work, sleep does not, and a break resets the
//! count. Once a task pushes the count past its threshold, a break is
//! proposed right after it, provided the gap before the next placement holds
//! it; otherwise the count carries on. Placement is then re-run with the
//! breaks blocked; if any task that was scheduled before no longer fits,
//! every break is discarded.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::config::BreakConfig;
use crate::interval::Interval;
use crate::task::Task;

use super::draft::{Placement, PlacementEntry, ScheduleDraft};
use super::placer::TaskPlacer;
use super::window::carve;

pub struct BreakPolicy<'a> {
    config: &'a BreakConfig,
}

impl<'a> BreakPolicy<'a> {
    pub fn new(config: &'a BreakConfig) -> Self {
        Self { config }
    }

    fn threshold_for(&self, task: &Task) -> i64 {
        if task.difficulty_level() >= self.config.hard_difficulty {
            i64::from(self.config.hard_task_threshold_minutes)
        } else {
            i64::from(self.config.work_threshold_minutes)
        }
    }

    /// The next break the walk over `draft` asks for, if any. Only free
    /// space counts, so breaks already placed and the tasks that follow a
    /// candidate both rule it out.
    pub fn next_break(&self, draft: &ScheduleDraft) -> Option<Interval> {
        let free = draft.free_space();
        let mut ordered: Vec<&Placement> = draft.placements.iter().collect();
        ordered.sort_by_key(|p| p.interval);

        let mut worked = 0i64;
        for placement in ordered {
            let task = match &placement.entry {
                PlacementEntry::Break => {
                    worked = 0;
                    continue;
                }
                PlacementEntry::Sleep => continue,
                PlacementEntry::Task(task) => task,
            };

            worked += placement.interval.duration_minutes();
            if worked < self.threshold_for(task) {
                continue;
            }

            let candidate = Interval::from_start(
                placement.interval.end(),
                i64::from(self.config.break_minutes),
            )?;
            if free.iter().any(|f| f.contains(&candidate)) {
                debug!(
                    after = %task.id,
                    worked,
                    start = %candidate.start(),
                    "proposing break"
                );
                return Some(candidate);
            }
        }
        None
    }

    /// Insert breaks into `draft`, re-placing `tasks` around them.
    ///
    /// Returns the draft unchanged when breaks are disabled, when none are
    /// due, or when the breaks would cost a scheduled task its slot.
    pub fn apply(&self, draft: ScheduleDraft, tasks: &[Task], placer: &TaskPlacer) -> ScheduleDraft {
        if !self.config.enabled {
            return draft;
        }

        let scheduled: BTreeSet<String> = draft
            .scheduled_ids()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut breaks: Vec<Interval> = Vec::new();
        let mut open = draft.open.clone();
        let mut current = draft.clone();

        while let Some(candidate) = self.next_break(&current) {
            breaks.push(candidate);
            open = carve(&open, &candidate);

            let mut rerun = draft.without_tasks();
            rerun.open = open.clone();
            rerun
                .placements
                .extend(breaks.iter().copied().map(Placement::rest));
            placer.place_all(&mut rerun, tasks);

            let kept: BTreeSet<&str> = rerun.scheduled_ids().into_iter().collect();
            let lost: Vec<&str> = scheduled
                .iter()
                .map(String::as_str)
                .filter(|id| !kept.contains(id))
                .collect();
            if !lost.is_empty() {
                warn!(
                    ?lost,
                    breaks = breaks.len(),
                    "breaks would push scheduled tasks out; discarding all breaks"
                );
                return draft;
            }
            current = rerun;
        }

        if !breaks.is_empty() {
            info!(breaks = breaks.len(), "inserted breaks");
        }
        current.open = draft.open;
        current
    }
}
