//! # Retune Core Library
//!
//! Single-day task scheduling. A caller hands over a snapshot of tasks, day
//! preferences and an optional mood signal; the [`Retuner`] runs an ordered
//! pipeline over one mutable draft and returns a partition of the tasks into
//! scheduled, unschedulable and completed records.
//!
//! ## Pipeline
//!
//! 1. **WindowBuilder**: open intervals of the day around blocked time
//! 2. **SleepPlanner**: carve a sleep interval out of the open intervals
//! 3. **MoodFilter**: cap task difficulty from a fresh mood signal
//! 4. **TaskPlacer**: place tasks by priority and rigidity
//! 5. **BreakPolicy**: insert rest after long stretches of work
//! 6. **SnapBack**: pull drifted Preferred tasks back toward their request
//! 7. **OverlapResolver**: demote anything still overlapping
//! 8. **RollupMerger**: collapse completed chunks of interrupted work
//!
//! The pipeline performs no I/O. [`RetuneConfig`] carries every tunable and
//! can be persisted as TOML.

pub mod config;
pub mod error;
pub mod interval;
pub mod outcome;
pub mod preferences;
pub mod scheduler;
pub mod task;

pub use config::RetuneConfig;
pub use error::{ConfigError, Result, RetuneError, ValidationError};
pub use interval::Interval;
pub use outcome::{
    InvalidTask, RetuneOutcome, RetuneRequest, ScheduledTask, UnschedulableReason,
    UnschedulableTask,
};
pub use preferences::{ClockTime, ClockWindow, DayPreferences, MoodSignal};
pub use scheduler::{Placement, PlacementEntry, Retuner, ScheduleDraft};
pub use task::{Rigidity, Task, TaskStatus, TaskTransitionError};
