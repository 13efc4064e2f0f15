//! Scheduler configuration.
//!
//! A [`SchedulerConfig`] selects the duration unit applied to every offset of a
//! run and what the timeline builder does when the phase graph has a cycle.
//! It can be built in code or read from a TOML file:
//!
//! ```toml
//! cycle_fallback = "relaxation"
//! relaxation_cap = 500
//!
//! [duration_unit]
//! kind = "work_days"
//! hours_per_day = 8
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_HOURS_PER_DAY: u32 = 8;
pub const DEFAULT_RELAXATION_CAP: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Unit in which offsets, durations and slack are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DurationUnit {
    /// One hour of effort is one time unit.
    #[default]
    Hours,
    /// Hours are rounded up to whole days, at least one day per phase.
    WorkDays { hours_per_day: u32 },
}

impl DurationUnit {
    pub fn work_days() -> Self {
        DurationUnit::WorkDays {
            hours_per_day: DEFAULT_HOURS_PER_DAY,
        }
    }

    /// Convert an effort in hours to time units. Never returns less than 1.
    pub fn convert(&self, hours: i64) -> i64 {
        let hours = hours.max(1);
        match *self {
            DurationUnit::Hours => hours,
            DurationUnit::WorkDays { hours_per_day } => {
                let per_day = i64::from(hours_per_day.max(1));
                (hours - 1) / per_day + 1
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DurationUnit::Hours => "hours",
            DurationUnit::WorkDays { .. } => "days",
        }
    }
}

/// Layout used when the dependency graph cannot be ordered topologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleFallback {
    /// One pass in `number` order using only predecessors already laid out.
    #[default]
    DisplayOrder,
    /// Iterate earliest starts until stable or until the relaxation cap.
    Relaxation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub duration_unit: DurationUnit,
    pub cycle_fallback: CycleFallback,
    pub relaxation_cap: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            duration_unit: DurationUnit::default(),
            cycle_fallback: CycleFallback::default(),
            relaxation_cap: DEFAULT_RELAXATION_CAP,
        }
    }
}

impl SchedulerConfig {
    pub fn with_duration_unit(mut self, unit: DurationUnit) -> Self {
        self.duration_unit = unit;
        self
    }

    pub fn with_cycle_fallback(mut self, fallback: CycleFallback) -> Self {
        self.cycle_fallback = fallback;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let DurationUnit::WorkDays { hours_per_day: 0 } = self.duration_unit {
            return Err(ConfigError::Invalid(
                "hours_per_day must be greater than zero".into(),
            ));
        }
        if self.relaxation_cap == 0 {
            return Err(ConfigError::Invalid(
                "relaxation_cap must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

pub fn parse_config(contents: &str) -> Result<SchedulerConfig, ConfigError> {
    let config: SchedulerConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

/// Read and validate a TOML configuration file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<SchedulerConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}
