//! TOML-based pipeline configuration.
//!
//! Holds every tunable the pipeline stages read:
//! - placement search granularity
//! - break policy thresholds
//! - snap-back window and ripple tolerance
//! - mood validity and the label → difficulty cap table
//!
//! Configuration is stored at `~/.config/retune/config.toml`.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result, RetuneError};

/// Placement search configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Step between candidate starts when searching around a requested time.
    #[serde(default = "default_granularity")]
    pub granularity_minutes: u32,
}

/// Break insertion configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    /// Continuous work that always earns a break.
    #[serde(default = "default_work_threshold")]
    pub work_threshold_minutes: u32,
    /// Continuous work that earns a break when the last task was hard.
    #[serde(default = "default_hard_task_threshold")]
    pub hard_task_threshold_minutes: u32,
    /// Difficulty at or above which a task counts as hard.
    #[serde(default = "default_hard_difficulty")]
    pub hard_difficulty: u8,
}

/// Snap-back configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapBackConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Drift from the requested start that triggers a snap-back attempt.
    #[serde(default = "default_snap_minutes")]
    pub trigger_minutes: u32,
    /// How far from the requested start a snapped task may land.
    #[serde(default = "default_snap_minutes")]
    pub window_minutes: u32,
    /// Exclusive upper bound on neighbour disturbance.
    #[serde(default = "default_max_ripple")]
    pub max_ripple_minutes: u32,
}

/// Mood filter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodConfig {
    /// Signals older than this are ignored.
    #[serde(default = "default_mood_validity")]
    pub validity_minutes: u32,
    /// Cap applied to labels missing from `caps`.
    #[serde(default = "default_mood_cap")]
    pub default_cap: u8,
    /// Lower-case mood label → maximum allowed difficulty.
    #[serde(default = "default_mood_caps")]
    pub caps: BTreeMap<String, u8>,
}

/// Pipeline configuration.
///
/// Serialized to/from TOML at `~/.config/retune/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RetuneConfig {
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub breaks: BreakConfig,
    #[serde(default)]
    pub snap_back: SnapBackConfig,
    #[serde(default)]
    pub mood: MoodConfig,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_granularity() -> u32 {
    5
}
fn default_break_minutes() -> u32 {
    15
}
fn default_work_threshold() -> u32 {
    120
}
fn default_hard_task_threshold() -> u32 {
    60
}
fn default_hard_difficulty() -> u8 {
    3
}
fn default_snap_minutes() -> u32 {
    30
}
fn default_max_ripple() -> u32 {
    5
}
fn default_mood_validity() -> u32 {
    60
}
fn default_mood_cap() -> u8 {
    5
}
fn default_mood_caps() -> BTreeMap<String, u8> {
    [
        ("energized", 5),
        ("excited", 5),
        ("happy", 5),
        ("motivated", 5),
        ("focused", 5),
        ("calm", 4),
        ("okay", 4),
        ("neutral", 4),
        ("bored", 4),
        ("tired", 3),
        ("stressed", 3),
        ("anxious", 3),
        ("sad", 2),
        ("exhausted", 2),
        ("overwhelmed", 2),
        ("sick", 2),
    ]
    .into_iter()
    .map(|(label, cap)| (label.to_string(), cap))
    .collect()
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            granularity_minutes: default_granularity(),
        }
    }
}

impl Default for BreakConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            break_minutes: default_break_minutes(),
            work_threshold_minutes: default_work_threshold(),
            hard_task_threshold_minutes: default_hard_task_threshold(),
            hard_difficulty: default_hard_difficulty(),
        }
    }
}

impl Default for SnapBackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_minutes: default_snap_minutes(),
            window_minutes: default_snap_minutes(),
            max_ripple_minutes: default_max_ripple(),
        }
    }
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            validity_minutes: default_mood_validity(),
            default_cap: default_mood_cap(),
            caps: default_mood_caps(),
        }
    }
}

impl PlacementConfig {
    pub fn granularity(&self) -> Duration {
        Duration::minutes(i64::from(self.granularity_minutes.max(1)))
    }
}

impl MoodConfig {
    pub fn validity(&self) -> Duration {
        Duration::minutes(i64::from(self.validity_minutes))
    }

    /// Maximum difficulty allowed for a (normalized) mood label.
    pub fn cap_for(&self, label: &str) -> u8 {
        self.caps.get(label).copied().unwrap_or(self.default_cap)
    }
}

/// Returns `~/.config/retune[-dev]/` based on RETUNE_ENV.
///
/// Set RETUNE_ENV=dev to use the development config directory.
pub fn config_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("RETUNE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("retune-dev")
    } else {
        base_dir.join("retune")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

impl RetuneConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<()> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown().into());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown().into())
    }

    /// Default config file location.
    pub fn path() -> Result<PathBuf> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or
    /// validated.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: RetuneConfig = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting config is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: RetuneConfig = serde_json::from_value(json)?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, message: &str| -> RetuneError {
            ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            }
            .into()
        };

        if self.placement.granularity_minutes == 0 {
            return Err(invalid("placement.granularity_minutes", "must be at least 1"));
        }
        if self.breaks.break_minutes == 0 {
            return Err(invalid("breaks.break_minutes", "must be at least 1"));
        }
        if !(1..=5).contains(&self.mood.default_cap) {
            return Err(invalid("mood.default_cap", "must be within 1..=5"));
        }
        if let Some((label, _)) = self.mood.caps.iter().find(|(_, cap)| !(1..=5).contains(*cap)) {
            return Err(invalid(
                &format!("mood.caps.{label}"),
                "must be within 1..=5",
            ));
        }
        Ok(())
    }
}
