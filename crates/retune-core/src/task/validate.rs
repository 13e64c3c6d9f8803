//! Per-task input validation.

use crate::error::ValidationError;

use super::{Rigidity, Task};

fn missing(task: &Task, field: &str) -> ValidationError {
    ValidationError::MissingField {
        task_id: task.id.clone(),
        field: field.to_string(),
    }
}

fn check_level(task: &Task, field: &str, value: Option<u8>) -> Result<(), ValidationError> {
    let value = value.ok_or_else(|| missing(task, field))?;
    if !(1..=5).contains(&value) {
        return Err(ValidationError::OutOfRange {
            task_id: task.id.clone(),
            field: field.to_string(),
            value: i64::from(value),
            min: 1,
            max: 5,
        });
    }
    Ok(())
}

/// Check the data-model invariants of a single task.
pub fn validate_task(task: &Task) -> Result<(), ValidationError> {
    if task.id.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "id".to_string(),
            message: "task id must be non-empty".to_string(),
        });
    }

    match task.duration_minutes {
        None => return Err(missing(task, "duration_minutes")),
        Some(0) => {
            return Err(ValidationError::OutOfRange {
                task_id: task.id.clone(),
                field: "duration_minutes".to_string(),
                value: 0,
                min: 1,
                max: i64::from(u32::MAX),
            })
        }
        Some(_) => {}
    }

    check_level(task, "importance", task.importance)?;
    check_level(task, "difficulty", task.difficulty)?;

    if task.rigidity == Rigidity::Fixed && task.requested_start.is_none() {
        return Err(missing(task, "requested_start"));
    }

    Ok(())
}
