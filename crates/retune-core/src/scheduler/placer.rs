//! Priority-ordered task placement.
//!
//! Tasks are placed one at a time in [`placement_order`]. Each rigidity
//! class has its own placement rule:
//! - Fixed: exactly the requested interval, or not at all
//! - Preferred: the free start closest to the requested start
//! - Flexible: first fit at or after the end of the previous flexible task
//!
//! [`placement_order`]: crate::task::priority::placement_order

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::interval::Interval;
use crate::outcome::UnschedulableReason;
use crate::task::priority::sort_for_placement;
use crate::task::{Rigidity, Task};

use super::draft::ScheduleDraft;

/// Where non-fixed tasks are allowed to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementBounds {
    pub day: Interval,
    /// Work spans inside the day, sorted. Empty leaves no room for non-fixed tasks.
    pub work: Vec<Interval>,
    /// Nothing non-fixed starts before this (the later of day start and now).
    pub floor: DateTime<Utc>,
}

impl PlacementBounds {
    pub fn new(day: Interval, work: Vec<Interval>, now: DateTime<Utc>) -> Self {
        Self {
            day,
            work,
            floor: day.start().max(now),
        }
    }

    /// Earliest instant `task` may start.
    pub fn earliest(&self, task: &Task) -> DateTime<Utc> {
        task.earliest_start
            .map_or(self.floor, |earliest| earliest.max(self.floor))
    }

    /// Parts of `free` a non-fixed task may occupy.
    pub fn region(&self, task: &Task, free: &[Interval], honour_due: bool) -> Vec<Interval> {
        let lo = self.earliest(task);
        let hi = if honour_due { task.due } else { None };

        let mut region: Vec<Interval> = free
            .iter()
            .flat_map(|iv| self.work.iter().filter_map(|w| iv.intersection(w)))
            .filter_map(|iv| {
                let end = hi.map_or(iv.end(), |due| iv.end().min(due));
                Interval::new(iv.start().max(lo), end).ok()
            })
            .collect();
        region.sort();
        region
    }

    /// True when `candidate` is a legal spot for a non-fixed `task`, ignoring other placements.
    pub fn admits(&self, task: &Task, candidate: &Interval, open: &[Interval]) -> bool {
        open.iter().any(|o| o.contains(candidate))
            && self.work.iter().any(|w| w.contains(candidate))
            && candidate.start() >= self.earliest(task)
            && task.due.map_or(true, |due| candidate.end() <= due)
    }
}

/// Start inside `region` closest to `requested` that holds `length`.
///
/// Ties prefer a start at or after `requested`, then the earlier start.
pub fn closest_start(
    region: &[Interval],
    requested: DateTime<Utc>,
    length: Duration,
) -> Option<DateTime<Utc>> {
    region
        .iter()
        .filter(|iv| iv.duration() >= length)
        .map(|iv| {
            let start = requested.clamp(iv.start(), iv.end() - length);
            let distance = if start >= requested {
                start - requested
            } else {
                requested - start
            };
            (distance, start < requested, start)
        })
        .min()
        .map(|(_, _, start)| start)
}

/// First start at or after `after` inside `region` that holds `length`.
pub fn first_fit(
    region: &[Interval],
    after: Option<DateTime<Utc>>,
    length: Duration,
) -> Option<DateTime<Utc>> {
    region.iter().find_map(|iv| {
        let start = after.map_or(iv.start(), |cursor| cursor.max(iv.start()));
        (iv.end() - start >= length).then_some(start)
    })
}

/// Places tasks into a draft.
pub struct TaskPlacer {
    bounds: PlacementBounds,
}

impl TaskPlacer {
    pub fn new(bounds: PlacementBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> &PlacementBounds {
        &self.bounds
    }

    /// Place every task in priority order, recording failures on the draft.
    pub fn place_all(&self, draft: &mut ScheduleDraft, tasks: &[Task]) {
        let mut ordered = tasks.to_vec();
        sort_for_placement(&mut ordered);

        let mut cursor: Option<DateTime<Utc>> = None;
        let mut placed = 0usize;

        for task in ordered {
            let result = match task.rigidity {
                Rigidity::Fixed => self.place_fixed(draft, &task),
                Rigidity::Preferred => match task.requested_start {
                    Some(requested) => self.place_preferred(draft, &task, requested),
                    None => self.place_flexible(draft, &task, &mut cursor),
                },
                Rigidity::Flexible => self.place_flexible(draft, &task, &mut cursor),
            };

            let task_id = task.id.clone();
            let recorded = match result {
                Ok(interval) => {
                    debug!(
                        %task_id,
                        rigidity = ?task.rigidity,
                        start = %interval.start(),
                        end = %interval.end(),
                        "placed task"
                    );
                    draft.place(task, interval).map(|()| placed += 1)
                }
                Err(reason) => {
                    debug!(%task_id, %reason, "task not schedulable");
                    draft.reject(task, reason)
                }
            };
            if let Err(e) = recorded {
                warn!(%task_id, error = %e, "task is not pending; left out of the draft");
            }
        }

        info!(
            placed,
            unschedulable = draft.unschedulable.len(),
            "task placement finished"
        );
    }

    fn place_fixed(
        &self,
        draft: &ScheduleDraft,
        task: &Task,
    ) -> Result<Interval, UnschedulableReason> {
        let interval = task
            .requested_interval()
            .ok_or(UnschedulableReason::NoOpenBlock)?;

        let conflict = draft
            .placements
            .iter()
            .any(|p| !p.is_break() && p.interval.overlaps(&interval))
            || draft.blocked.iter().any(|b| b.overlaps(&interval));
        if conflict {
            return Err(UnschedulableReason::Overlap);
        }
        if !draft.day.contains(&interval) {
            return Err(UnschedulableReason::NoOpenBlock);
        }
        if task.due.is_some_and(|due| interval.end() > due) {
            return Err(UnschedulableReason::WouldExceedDeadline);
        }
        Ok(interval)
    }

    fn place_preferred(
        &self,
        draft: &ScheduleDraft,
        task: &Task,
        requested: DateTime<Utc>,
    ) -> Result<Interval, UnschedulableReason> {
        let length = Duration::minutes(task.minutes());
        let free = draft.free_space();
        let region = self.bounds.region(task, &free, true);

        closest_start(&region, requested, length)
            .and_then(|start| Interval::from_start(start, task.minutes()))
            .ok_or_else(|| self.failure_reason(task, &free, None))
    }

    fn place_flexible(
        &self,
        draft: &ScheduleDraft,
        task: &Task,
        cursor: &mut Option<DateTime<Utc>>,
    ) -> Result<Interval, UnschedulableReason> {
        let length = Duration::minutes(task.minutes());
        let free = draft.free_space();
        let region = self.bounds.region(task, &free, true);

        let interval = first_fit(&region, *cursor, length)
            .and_then(|start| Interval::from_start(start, task.minutes()))
            .ok_or_else(|| self.failure_reason(task, &free, *cursor))?;
        *cursor = Some(interval.end());
        Ok(interval)
    }

    /// Deadline when a slot exists once the due bound is lifted, or when
    /// the earliest start already rules the deadline out.
    fn failure_reason(
        &self,
        task: &Task,
        free: &[Interval],
        after: Option<DateTime<Utc>>,
    ) -> UnschedulableReason {
        let Some(due) = task.due else {
            return UnschedulableReason::NoOpenBlock;
        };
        let length = Duration::minutes(task.minutes());
        let earliest_end = self.bounds.earliest(task).checked_add_signed(length);
        if earliest_end.map_or(true, |end| end > due) {
            return UnschedulableReason::WouldExceedDeadline;
        }

        let unbounded = self.bounds.region(task, free, false);
        if first_fit(&unbounded, after, length).is_some() {
            UnschedulableReason::WouldExceedDeadline
        } else {
            UnschedulableReason::NoOpenBlock
        }
    }
}
