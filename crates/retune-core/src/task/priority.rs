//! Deterministic task orderings.
//!
//! Placement order: importance descending, difficulty ascending, duration
//! ascending, due ascending (no due last), id ascending. Overlap resolution
//! reuses the same order but flips the duration and due tie-breaks.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use super::Task;

/// Due instant as a sort key; tasks without a due date compare as latest.
fn due_key(task: &Task) -> DateTime<Utc> {
    task.due.unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Total order used by the placer. `Less` means "placed first".
pub fn placement_order(a: &Task, b: &Task) -> Ordering {
    b.importance_level()
        .cmp(&a.importance_level())
        .then_with(|| a.difficulty_level().cmp(&b.difficulty_level()))
        .then_with(|| a.minutes().cmp(&b.minutes()))
        .then_with(|| due_key(a).cmp(&due_key(b)))
        .then_with(|| a.id.cmp(&b.id))
}

/// Total order used to pick the survivor of an overlap. `Less` means "wins".
pub fn overlap_order(a: &Task, b: &Task) -> Ordering {
    b.importance_level()
        .cmp(&a.importance_level())
        .then_with(|| a.difficulty_level().cmp(&b.difficulty_level()))
        .then_with(|| b.minutes().cmp(&a.minutes()))
        .then_with(|| due_key(b).cmp(&due_key(a)))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort tasks into placement order.
pub fn sort_for_placement(tasks: &mut [Task]) {
    tasks.sort_by(placement_order);
}
