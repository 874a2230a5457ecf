//! Trapezoidal velocity profile.
//!
//! Speed ramps up at `acceleration`, optionally cruises, then ramps down at
//! `deceleration`. When the move is too short to reach the cruise speed the
//! peak is reduced to `sqrt(2·a·d·D / (a + d))`, which makes the two ramps
//! meet exactly at distance `D`.
//!
//! Internally everything is in mm and seconds; [`TrapezoidProfile::sample`]
//! converts to mm/min to match the programmed feed rate.

use xxcnc_common::consts::SECONDS_PER_MINUTE;
use xxcnc_common::motion::error::PlanError;
use xxcnc_common::motion::params::InterpolationParams;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrapezoidProfile {
    /// Path length [mm].
    pub distance: f64,
    /// Peak speed actually reached [mm/s].
    pub peak_velocity: f64,
    /// [mm/s²]
    pub acceleration: f64,
    /// [mm/s²]
    pub deceleration: f64,
    pub t_accel: f64,
    pub t_cruise: f64,
    pub t_decel: f64,
}

impl TrapezoidProfile {
    /// Plan a rest-to-rest profile over `distance`.
    ///
    /// Parameters are validated first. A non-positive distance yields an
    /// empty profile (zero duration).
    pub fn plan(distance: f64, params: &InterpolationParams) -> Result<Self, PlanError> {
        params.validate()?;
        if !distance.is_finite() {
            return Err(PlanError::invalid(format!(
                "distance must be finite, got {distance}"
            )));
        }

        let a = params.acceleration;
        let d = params.deceleration;

        if distance <= 0.0 {
            return Ok(Self {
                distance: 0.0,
                peak_velocity: 0.0,
                acceleration: a,
                deceleration: d,
                t_accel: 0.0,
                t_cruise: 0.0,
                t_decel: 0.0,
            });
        }

        let target = params.target_feed() / SECONDS_PER_MINUTE;
        let accel_dist = target * target / (2.0 * a);
        let decel_dist = target * target / (2.0 * d);

        let (peak, cruise_dist) = if accel_dist + decel_dist > distance {
            ((2.0 * a * d * distance / (a + d)).sqrt(), 0.0)
        } else {
            (target, distance - accel_dist - decel_dist)
        };

        Ok(Self {
            distance,
            peak_velocity: peak,
            acceleration: a,
            deceleration: d,
            t_accel: peak / a,
            t_cruise: cruise_dist / peak,
            t_decel: peak / d,
        })
    }

    /// Total move time [s].
    #[inline]
    pub fn duration(&self) -> f64 {
        self.t_accel + self.t_cruise + self.t_decel
    }

    /// Peak speed in feed units [mm/min].
    #[inline]
    pub fn peak_feed(&self) -> f64 {
        self.peak_velocity * SECONDS_PER_MINUTE
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distance <= 0.0
    }

    /// Speed at time `t` [mm/s]. Zero outside `[0, duration]`.
    pub fn velocity_at(&self, t: f64) -> f64 {
        if t <= 0.0 || self.is_empty() {
            return 0.0;
        }
        let cruise_end = self.t_accel + self.t_cruise;
        if t < self.t_accel {
            self.acceleration * t
        } else if t < cruise_end {
            self.peak_velocity
        } else {
            (self.peak_velocity - self.deceleration * (t - cruise_end)).max(0.0)
        }
    }

    /// Distance covered at time `t` [mm], clamped to `[0, distance]`.
    pub fn distance_at(&self, t: f64) -> f64 {
        if t <= 0.0 || self.is_empty() {
            return 0.0;
        }
        if t >= self.duration() {
            return self.distance;
        }

        let cruise_end = self.t_accel + self.t_cruise;
        let s = if t < self.t_accel {
            0.5 * self.acceleration * t * t
        } else if t < cruise_end {
            let ramp = 0.5 * self.acceleration * self.t_accel * self.t_accel;
            ramp + self.peak_velocity * (t - self.t_accel)
        } else {
            let ramp = 0.5 * self.acceleration * self.t_accel * self.t_accel;
            let cruise = self.peak_velocity * self.t_cruise;
            let tau = t - cruise_end;
            ramp + cruise + self.peak_velocity * tau - 0.5 * self.deceleration * tau * tau
        };
        s.clamp(0.0, self.distance)
    }

    /// Sample instants at a fixed period, starting at `t = 0` and stopping
    /// before the end of the move.
    pub fn sample_times(&self, period_s: f64) -> impl Iterator<Item = f64> + '_ {
        (0..self.sample_count(period_s)).map(move |k| k as f64 * period_s)
    }

    /// Number of instants yielded by [`Self::sample_times`]. Saturates at
    /// `usize::MAX`.
    pub fn sample_count(&self, period_s: f64) -> usize {
        if self.is_empty() || !(period_s > 0.0) {
            0
        } else {
            (self.duration() / period_s).ceil() as usize
        }
    }

    /// Speed samples in mm/min, one per `period_s`, terminated by a final 0.
    ///
    /// Empty for an empty profile.
    pub fn sample(&self, period_s: f64) -> Vec<f64> {
        let mut out: Vec<f64> = self
            .sample_times(period_s)
            .map(|t| self.velocity_at(t) * SECONDS_PER_MINUTE)
            .collect();
        if !out.is_empty() {
            out.push(0.0);
        }
        out
    }
}
