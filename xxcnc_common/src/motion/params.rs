//! Kinematic parameter sets for planning and per-axis limits.

use serde::{Deserialize, Serialize};

use super::error::PlanError;
use crate::consts::DEFAULT_LIMIT_MARGIN_FACTOR;

/// Motion parameters for a single planned move.
///
/// Units: `feed_rate` in mm/min, `max_velocity` in mm/s, `acceleration` and
/// `deceleration` in mm/s².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterpolationParams {
    pub feed_rate: f64,
    pub max_velocity: f64,
    pub acceleration: f64,
    pub deceleration: f64,
    /// Reserved jerk bound [mm/s³]. Carried but not enforced.
    #[serde(default)]
    pub jerk: Option<f64>,
}

impl InterpolationParams {
    /// Symmetric accel/decel parameter set.
    pub const fn new(feed_rate: f64, max_velocity: f64, acceleration: f64) -> Self {
        Self {
            feed_rate,
            max_velocity,
            acceleration,
            deceleration: acceleration,
            jerk: None,
        }
    }

    /// Reject non-finite or non-positive rates.
    pub fn validate(&self) -> Result<(), PlanError> {
        check_positive("feed_rate", self.feed_rate)?;
        check_positive("max_velocity", self.max_velocity)?;
        check_positive("acceleration", self.acceleration)?;
        check_positive("deceleration", self.deceleration)?;
        if let Some(j) = self.jerk {
            check_positive("jerk", j)?;
        }
        Ok(())
    }

    /// Cruise target in mm/min: the feed rate capped by the velocity ceiling.
    #[inline]
    pub fn target_feed(&self) -> f64 {
        self.feed_rate
            .min(self.max_velocity * crate::consts::SECONDS_PER_MINUTE)
    }
}

/// Per-axis limits. Immutable once the axis exists.
///
/// Velocities in mm/s, acceleration in mm/s², positions in mm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisParameters {
    pub max_velocity: f64,
    pub max_acceleration: f64,
    /// Reserved.
    #[serde(default)]
    pub max_jerk: f64,
    /// Signed homing speed; the sign selects the search direction.
    #[serde(default)]
    pub home_velocity: f64,
    pub soft_limit_min: f64,
    pub soft_limit_max: f64,
    #[serde(default)]
    pub home_position: f64,
    /// Multiplier on `|v|·dt` used as the stopping margin for velocity motion.
    #[serde(default = "default_limit_margin_factor")]
    pub limit_margin_factor: f64,
}

fn default_limit_margin_factor() -> f64 {
    DEFAULT_LIMIT_MARGIN_FACTOR
}

impl Default for AxisParameters {
    fn default() -> Self {
        Self {
            max_velocity: 100.0,
            max_acceleration: 1000.0,
            max_jerk: 0.0,
            home_velocity: 10.0,
            soft_limit_min: -1000.0,
            soft_limit_max: 1000.0,
            home_position: 0.0,
            limit_margin_factor: DEFAULT_LIMIT_MARGIN_FACTOR,
        }
    }
}

impl AxisParameters {
    pub fn validate(&self) -> Result<(), PlanError> {
        check_positive("max_velocity", self.max_velocity)?;
        check_positive("max_acceleration", self.max_acceleration)?;
        if !self.soft_limit_min.is_finite() || !self.soft_limit_max.is_finite() {
            return Err(PlanError::invalid("soft limits must be finite"));
        }
        if self.soft_limit_min >= self.soft_limit_max {
            return Err(PlanError::invalid(format!(
                "soft_limit_min ({}) must be below soft_limit_max ({})",
                self.soft_limit_min, self.soft_limit_max
            )));
        }
        if !self.home_velocity.is_finite() || !self.home_position.is_finite() {
            return Err(PlanError::invalid("homing parameters must be finite"));
        }
        if !self.within_limits(self.home_position) {
            return Err(PlanError::invalid(format!(
                "home_position ({}) outside soft limits [{}, {}]",
                self.home_position, self.soft_limit_min, self.soft_limit_max
            )));
        }
        if !self.limit_margin_factor.is_finite() || self.limit_margin_factor < 0.0 {
            return Err(PlanError::invalid(
                "limit_margin_factor must be finite and non-negative",
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn within_limits(&self, position: f64) -> bool {
        position >= self.soft_limit_min && position <= self.soft_limit_max
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), PlanError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PlanError::invalid(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}
