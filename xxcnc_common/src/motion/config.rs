//! Machine configuration schema.
//!
//! Deserialized from TOML at startup and immutable afterwards. Optional fields
//! use `#[serde(default)]`; cross-field validation (unique names, axis count)
//! is done by the motion crate's loader.

use serde::{Deserialize, Serialize};

use super::params::AxisParameters;
use crate::config::SharedConfig;
use crate::consts::{
    DEFAULT_INTERPOLATION_PERIOD_MS, DEFAULT_PROFILE_SAMPLE_PERIOD_S,
    DEFAULT_SIMPLIFY_TOLERANCE_FACTOR,
};

/// Orchestrator-level settings (`[motion]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Interpolation period [ms] (default: 1).
    #[serde(default = "default_interpolation_period_ms")]
    pub interpolation_period_ms: u32,

    /// Machine-wide velocity ceiling [mm/s].
    #[serde(default = "default_max_velocity")]
    pub max_velocity: f64,

    /// Machine-wide acceleration ceiling [mm/s²].
    #[serde(default = "default_max_acceleration")]
    pub max_acceleration: f64,

    /// Velocity profile sample period [ms] (default: 10).
    #[serde(default = "default_profile_sample_period_ms")]
    pub profile_sample_period_ms: u32,

    /// Douglas–Peucker tolerance per unit of feed rate [mm per mm/min].
    #[serde(default = "default_simplify_tolerance_factor")]
    pub simplify_tolerance_factor: f64,

    /// Status publish interval [cycles] (default: 10).
    #[serde(default = "default_status_interval")]
    pub status_interval_cycles: u32,
}

fn default_interpolation_period_ms() -> u32 {
    DEFAULT_INTERPOLATION_PERIOD_MS
}
fn default_max_velocity() -> f64 {
    500.0
}
fn default_max_acceleration() -> f64 {
    2000.0
}
fn default_profile_sample_period_ms() -> u32 {
    (DEFAULT_PROFILE_SAMPLE_PERIOD_S * 1000.0) as u32
}
fn default_simplify_tolerance_factor() -> f64 {
    DEFAULT_SIMPLIFY_TOLERANCE_FACTOR
}
fn default_status_interval() -> u32 {
    10
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            interpolation_period_ms: default_interpolation_period_ms(),
            max_velocity: default_max_velocity(),
            max_acceleration: default_max_acceleration(),
            profile_sample_period_ms: default_profile_sample_period_ms(),
            simplify_tolerance_factor: default_simplify_tolerance_factor(),
            status_interval_cycles: default_status_interval(),
        }
    }
}

impl MotionConfig {
    /// Profile sample period in seconds.
    #[inline]
    pub fn profile_sample_period_s(&self) -> f64 {
        f64::from(self.profile_sample_period_ms) / 1000.0
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.interpolation_period_ms == 0 {
            return Err("interpolation_period_ms must be > 0".to_string());
        }
        if self.profile_sample_period_ms == 0 {
            return Err("profile_sample_period_ms must be > 0".to_string());
        }
        if !(self.max_velocity.is_finite() && self.max_velocity > 0.0) {
            return Err(format!("max_velocity {} must be > 0", self.max_velocity));
        }
        if !(self.max_acceleration.is_finite() && self.max_acceleration > 0.0) {
            return Err(format!(
                "max_acceleration {} must be > 0",
                self.max_acceleration
            ));
        }
        if !(self.simplify_tolerance_factor.is_finite() && self.simplify_tolerance_factor >= 0.0) {
            return Err(format!(
                "simplify_tolerance_factor {} must be >= 0",
                self.simplify_tolerance_factor
            ));
        }
        if self.status_interval_cycles == 0 {
            return Err("status_interval_cycles must be > 0".to_string());
        }
        Ok(())
    }
}

/// One `[[axes]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub name: String,
    #[serde(flatten)]
    pub params: AxisParameters,
}

/// Complete machine file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MachineConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub axes: Vec<AxisConfig>,
}
