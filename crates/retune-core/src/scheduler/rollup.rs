//! Roll-up of interrupted work.
//!
//! A task interrupted and resumed is recorded as several chunks sharing a
//! `parent_id`. Once every chunk is Completed the group collapses into one
//! Completed record carrying the summed duration and the union of worked
//! ranges, and the chunk records are retired.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::interval::merge_intervals;
use crate::task::{Task, TaskStatus};

/// Result of a roll-up pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollupResult {
    /// Standalone completions, chunks of unfinished groups and rolled-up records.
    pub completed: Vec<Task>,
    /// Chunk ids absorbed into a rolled-up record, sorted.
    pub retired: Vec<String>,
    /// Parent ids that received a rolled-up record.
    pub rolled_up: BTreeSet<String>,
}

/// Collapse fully completed chunk groups into one record per parent.
pub fn roll_up(tasks: &[Task]) -> RollupResult {
    let mut groups: BTreeMap<&str, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        if let Some(parent) = task.parent_id.as_deref() {
            groups.entry(parent).or_default().push(task);
        }
    }

    let mut result = RollupResult::default();
    let mut records = Vec::new();

    for (parent_id, chunks) in &groups {
        if !chunks.iter().all(|c| c.status == TaskStatus::Completed) {
            continue;
        }
        let parent = tasks
            .iter()
            .find(|t| t.id == *parent_id && t.parent_id.is_none());
        let record = merge_group(parent_id, parent, chunks);
        debug!(
            parent_id,
            chunks = chunks.len(),
            minutes = record.minutes(),
            "rolled up completed chunks"
        );

        result.retired.extend(chunks.iter().map(|c| c.id.clone()));
        result.rolled_up.insert(parent_id.to_string());
        records.push(record);
    }

    result.completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .filter(|t| {
            let absorbed = t
                .parent_id
                .as_deref()
                .is_some_and(|p| result.rolled_up.contains(p));
            let replaced = t.parent_id.is_none() && result.rolled_up.contains(&t.id);
            !absorbed && !replaced
        })
        .cloned()
        .chain(records)
        .collect();
    result.retired.sort();
    result
}

fn merge_group(parent_id: &str, parent: Option<&Task>, chunks: &[&Task]) -> Task {
    let mut record = match (parent, chunks.first()) {
        (Some(p), _) => p.clone(),
        (None, Some(first)) => (*first).clone(),
        (None, None) => Task::new(parent_id, parent_id),
    };

    let minutes = chunks
        .iter()
        .fold(0u32, |sum, c| sum.saturating_add(c.duration_minutes.unwrap_or(0)));
    let ranges = chunks
        .iter()
        .flat_map(|c| c.worked_ranges.iter().copied())
        .collect();

    record.id = parent_id.to_string();
    record.parent_id = None;
    record.duration_minutes = Some(minutes);
    record.worked_ranges = merge_intervals(ranges);
    record.status = TaskStatus::Completed;
    record
}
