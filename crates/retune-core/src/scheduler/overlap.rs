//! Final overlap sweep.

use std::cmp::Ordering;

use tracing::{info, warn};

use crate::outcome::UnschedulableReason;
use crate::task::priority::overlap_order;

use super::draft::{Placement, PlacementEntry, ScheduleDraft};

/// True when `a` should survive an overlap with `b`.
fn survives(a: &Placement, b: &Placement) -> bool {
    match (&a.entry, &b.entry) {
        (PlacementEntry::Sleep, _) => true,
        (_, PlacementEntry::Sleep) => false,
        (PlacementEntry::Task(x), PlacementEntry::Task(y)) => {
            overlap_order(x, y) != Ordering::Greater
        }
        // breaks never enter the sweep
        (PlacementEntry::Break, _) => false,
        (_, PlacementEntry::Break) => true,
    }
}

/// Remove residual overlaps, demoting the losing task.
///
/// Non-break placements are swept in start order; each one is compared with
/// the last survivor. Breaks still overlapping a survivor are dropped.
pub fn resolve_overlaps(draft: &mut ScheduleDraft) {
    let (mut breaks, mut rest): (Vec<Placement>, Vec<Placement>) =
        std::mem::take(&mut draft.placements)
            .into_iter()
            .partition(Placement::is_break);
    rest.sort_by(|a, b| {
        a.interval
            .cmp(&b.interval)
            .then_with(|| a.task_id().cmp(&b.task_id()))
    });

    let mut kept: Vec<Placement> = Vec::with_capacity(rest.len());
    let mut losers: Vec<Placement> = Vec::new();

    for next in rest {
        let mut next = Some(next);
        while let Some(candidate) = next.take() {
            match kept.last() {
                Some(last) if last.interval.overlaps(&candidate.interval) => {
                    if survives(last, &candidate) {
                        losers.push(candidate);
                    } else {
                        if let Some(beaten) = kept.pop() {
                            losers.push(beaten);
                        }
                        next = Some(candidate);
                    }
                }
                _ => kept.push(candidate),
            }
        }
    }

    for loser in losers {
        if let PlacementEntry::Task(task) = loser.entry {
            warn!(task_id = %task.id, start = %loser.interval.start(), "overlap resolved against task");
            if let Err(e) = draft.demote(task, UnschedulableReason::Overlap) {
                warn!(error = %e, "overlap loser kept out of the outcome");
            }
        }
    }

    let before = breaks.len();
    breaks.retain(|b| !kept.iter().any(|p| p.interval.overlaps(&b.interval)));
    if breaks.len() < before {
        info!(dropped = before - breaks.len(), "dropped breaks overlapping tasks");
    }

    kept.extend(breaks);
    draft.placements = kept;
    draft.sort_placements();
}
