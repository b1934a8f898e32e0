//! Configuration system for the line simulator.
//!
//! This module provides YAML/JSON configuration file support for describing
//! a packaging line declaratively. All times are given in configured time
//! units (real numbers) and converted to fixed-point ticks on use.
//!
//! # Configuration File Structure
//!
//! ```yaml
//! simulation:
//!   horizon: 100000
//!   time_units_per_hour: 3600
//!   log_level: info
//!
//! line:
//!   buffer_capacity: 5
//!   arrival_interval: 10
//!   stages:
//!     fill: 6.5
//!     cap: 5
//!     label: 8
//!     seal: 5
//!     pack: 6
//!
//! interruptions:
//!   - stage: fill
//!     at: 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::types::{to_ticks, SimTime, StageKind, TICKS_PER_UNIT};

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Global simulation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Length of the observation window, in time units
    #[serde(default = "default_horizon")]
    pub horizon: f64,

    /// Time units per hour, used to express throughput per hour
    #[serde(default = "default_time_units_per_hour")]
    pub time_units_per_hour: f64,

    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_horizon() -> f64 {
    100_000.0
}

fn default_time_units_per_hour() -> f64 {
    3600.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            time_units_per_hour: default_time_units_per_hour(),
            log_level: default_log_level(),
        }
    }
}

/// Service time of each stage, in time units.
///
/// Stages left out of a configuration file keep their reference duration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageDurations {
    pub fill: f64,
    pub cap: f64,
    pub label: f64,
    pub seal: f64,
    pub pack: f64,
}

impl StageDurations {
    /// Returns the duration configured for `kind`.
    pub fn get(&self, kind: StageKind) -> f64 {
        match kind {
            StageKind::Fill => self.fill,
            StageKind::Cap => self.cap,
            StageKind::Label => self.label,
            StageKind::Seal => self.seal,
            StageKind::Pack => self.pack,
        }
    }

    /// Sets the duration for `kind`.
    pub fn set(&mut self, kind: StageKind, duration: f64) {
        match kind {
            StageKind::Fill => self.fill = duration,
            StageKind::Cap => self.cap = duration,
            StageKind::Label => self.label = duration,
            StageKind::Seal => self.seal = duration,
            StageKind::Pack => self.pack = duration,
        }
    }
}

impl Default for StageDurations {
    fn default() -> Self {
        Self {
            fill: 6.5,
            cap: 5.0,
            label: 8.0,
            seal: 5.0,
            pack: 6.0,
        }
    }
}

/// Line topology parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineParams {
    /// Capacity shared by all five buffers
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Time between generated items
    #[serde(default = "default_arrival_interval")]
    pub arrival_interval: f64,

    /// Per-stage service times
    #[serde(default)]
    pub stages: StageDurations,
}

fn default_buffer_capacity() -> usize {
    5
}

fn default_arrival_interval() -> f64 {
    10.0
}

impl Default for LineParams {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            arrival_interval: default_arrival_interval(),
            stages: StageDurations::default(),
        }
    }
}

/// A fault signal delivered to a stage at a given time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterruptionConfig {
    /// Stage receiving the signal
    pub stage: StageKind,
    /// Delivery time, in time units
    pub at: f64,
}

/// Complete line configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineConfig {
    /// Global simulation parameters
    #[serde(default)]
    pub simulation: SimulationParams,

    /// Line topology and timing
    #[serde(default)]
    pub line: LineParams,

    /// Scheduled interruptions
    #[serde(default)]
    pub interruptions: Vec<InterruptionConfig>,
}

fn check_positive(name: &str, value: f64) -> ConfigResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a positive number, got {}",
            name, value
        )));
    }
    if to_ticks(value) == 0 {
        return Err(ConfigError::Validation(format!(
            "{} = {} is below the time resolution",
            name, value
        )));
    }
    if value * TICKS_PER_UNIT as f64 >= SimTime::MAX as f64 {
        return Err(ConfigError::Validation(format!(
            "{} = {} exceeds the representable time range",
            name, value
        )));
    }
    Ok(())
}

impl LineConfig {
    /// Creates the reference configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: LineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Loads configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: LineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, auto-detecting format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(ConfigError::UnknownFormat(ext.to_string())),
        }
    }

    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        check_positive("horizon", self.simulation.horizon)?;
        check_positive("arrival_interval", self.line.arrival_interval)?;

        if !self.simulation.time_units_per_hour.is_finite()
            || self.simulation.time_units_per_hour <= 0.0
        {
            return Err(ConfigError::Validation(format!(
                "time_units_per_hour must be positive, got {}",
                self.simulation.time_units_per_hour
            )));
        }

        if self.line.buffer_capacity == 0 {
            return Err(ConfigError::Validation(
                "buffer_capacity must be at least 1".to_string(),
            ));
        }

        for kind in StageKind::ALL {
            check_positive(
                &format!("{} duration", kind),
                self.line.stages.get(kind),
            )?;
        }

        for interruption in &self.interruptions {
            let at = interruption.at;
            if !at.is_finite() || at < 0.0 || at > self.simulation.horizon {
                return Err(ConfigError::Validation(format!(
                    "Interruption for {} at {} lies outside [0, {}]",
                    interruption.stage, at, self.simulation.horizon
                )));
            }
        }

        // blocked_count / horizon must stay below 1
        for kind in StageKind::ALL {
            let count = self
                .interruptions
                .iter()
                .filter(|i| i.stage == kind)
                .count();
            if count as f64 >= self.simulation.horizon {
                return Err(ConfigError::Validation(format!(
                    "{} interruptions for {} do not fit a horizon of {}",
                    count, kind, self.simulation.horizon
                )));
            }
        }

        Ok(())
    }

    /// Saves configuration to a YAML file.
    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Saves configuration to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Converts to YAML string.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Converts to JSON string.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Horizon in ticks.
    pub fn horizon_ticks(&self) -> SimTime {
        to_ticks(self.simulation.horizon)
    }

    /// Arrival interval in ticks.
    pub fn arrival_ticks(&self) -> SimTime {
        to_ticks(self.line.arrival_interval)
    }

    /// Service duration of `kind` in ticks.
    pub fn service_ticks(&self, kind: StageKind) -> SimTime {
        to_ticks(self.line.stages.get(kind))
    }
}

/// Builder for creating a `LineConfig` programmatically.
#[derive(Default)]
pub struct LineConfigBuilder {
    config: LineConfig,
}

impl LineConfigBuilder {
    /// Creates a builder seeded with the reference configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the observation horizon.
    pub fn horizon(mut self, horizon: f64) -> Self {
        self.config.simulation.horizon = horizon;
        self
    }

    /// Sets the number of time units per hour.
    pub fn time_units_per_hour(mut self, units: f64) -> Self {
        self.config.simulation.time_units_per_hour = units;
        self
    }

    /// Sets the log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.simulation.log_level = level.into();
        self
    }

    /// Sets the capacity of every buffer.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.line.buffer_capacity = capacity;
        self
    }

    /// Sets the time between generated items.
    pub fn arrival_interval(mut self, interval: f64) -> Self {
        self.config.line.arrival_interval = interval;
        self
    }

    /// Sets the service duration of one stage.
    pub fn stage_duration(mut self, kind: StageKind, duration: f64) -> Self {
        self.config.line.stages.set(kind, duration);
        self
    }

    /// Sets all five service durations, in flow order.
    pub fn stage_durations(mut self, durations: [f64; 5]) -> Self {
        for (kind, duration) in StageKind::ALL.into_iter().zip(durations) {
            self.config.line.stages.set(kind, duration);
        }
        self
    }

    /// Schedules an interruption of `stage` at time `at`.
    pub fn interrupt(mut self, stage: StageKind, at: f64) -> Self {
        self.config.interruptions.push(InterruptionConfig { stage, at });
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ConfigResult<LineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
