//! Core error types for retune-core.
//!
//! Scheduling failures for individual tasks are *not* errors; they are
//! reported as data on the outcome. The types here cover malformed input,
//! configuration persistence and the fatal conditions that abort the
//! window/sleep stages.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for retune-core.
#[derive(Error, Debug)]
pub enum RetuneError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The planning day has no positive length
    #[error("Malformed day window: start ({start}) must be before end ({end})")]
    InvalidDayWindow {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    /// No day preferences were supplied with the request
    #[error("Day preferences are missing")]
    MissingPreferences,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML decoding errors
    #[error("TOML decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    /// TOML encoding errors
    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Dot-path key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end_time ({end}) must be greater than start_time ({start})")]
    InvalidTimeRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    /// A required task field is absent
    #[error("Task '{task_id}' is missing required field '{field}'")]
    MissingField { task_id: String, field: String },

    /// A numeric field is outside its allowed range
    #[error("Task '{task_id}' field '{field}' = {value} is outside {min}..={max}")]
    OutOfRange {
        task_id: String,
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for RetuneError
pub type Result<T, E = RetuneError> = std::result::Result<T, E>;
