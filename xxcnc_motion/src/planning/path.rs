//! Linear and circular path generation.
//!
//! Each generator emits one point per profile sample along the geometry,
//! starting at the start point, and always appends the exact endpoint last
//! so downstream consumers never accumulate drift.

use std::f64::consts::TAU;

use xxcnc_common::consts::{
    DEFAULT_PROFILE_SAMPLE_PERIOD_S, DEFAULT_SIMPLIFY_TOLERANCE_FACTOR, GEOMETRY_EPSILON,
    MAX_PROFILE_SAMPLES,
};
use xxcnc_common::motion::config::MotionConfig;
use xxcnc_common::motion::error::PlanError;
use xxcnc_common::motion::geometry::Point3D;
use xxcnc_common::motion::params::InterpolationParams;

use super::profile::TrapezoidProfile;
use super::simplify;

/// Stateless path generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathGenerator {
    /// Profile sample period [s].
    sample_period: f64,
    /// Douglas–Peucker tolerance per unit of feed [mm per mm/min].
    tolerance_factor: f64,
}

impl Default for PathGenerator {
    fn default() -> Self {
        Self {
            sample_period: DEFAULT_PROFILE_SAMPLE_PERIOD_S,
            tolerance_factor: DEFAULT_SIMPLIFY_TOLERANCE_FACTOR,
        }
    }
}

impl PathGenerator {
    pub fn new(sample_period: f64, tolerance_factor: f64) -> Result<Self, PlanError> {
        if !(sample_period.is_finite() && sample_period > 0.0) {
            return Err(PlanError::invalid(format!(
                "sample period must be positive, got {sample_period}"
            )));
        }
        if !(tolerance_factor.is_finite() && tolerance_factor >= 0.0) {
            return Err(PlanError::invalid(format!(
                "tolerance factor must be non-negative, got {tolerance_factor}"
            )));
        }
        Ok(Self {
            sample_period,
            tolerance_factor,
        })
    }

    pub fn from_config(config: &MotionConfig) -> Result<Self, PlanError> {
        Self::new(
            config.profile_sample_period_s(),
            config.simplify_tolerance_factor,
        )
    }

    #[inline]
    pub fn sample_period(&self) -> f64 {
        self.sample_period
    }

    /// Analytical profile for a move of `distance` mm.
    pub fn profile(
        &self,
        distance: f64,
        params: &InterpolationParams,
    ) -> Result<TrapezoidProfile, PlanError> {
        TrapezoidProfile::plan(distance, params)
    }

    /// Sampled speeds in mm/min. See [`TrapezoidProfile::sample`].
    pub fn plan_velocity_profile(
        &self,
        distance: f64,
        params: &InterpolationParams,
    ) -> Result<Vec<f64>, PlanError> {
        Ok(self.sampled_profile(distance, params)?.sample(self.sample_period))
    }

    /// Profile whose sample count fits `MAX_PROFILE_SAMPLES`.
    fn sampled_profile(
        &self,
        distance: f64,
        params: &InterpolationParams,
    ) -> Result<TrapezoidProfile, PlanError> {
        let profile = self.profile(distance, params)?;
        let samples = profile.sample_count(self.sample_period);
        if samples > MAX_PROFILE_SAMPLES {
            return Err(PlanError::invalid(format!(
                "{distance:.3} mm at {:.3} mm/min needs {samples} samples, limit is {MAX_PROFILE_SAMPLES}",
                params.target_feed()
            )));
        }
        Ok(profile)
    }

    /// Straight segment from `start` to `end`.
    ///
    /// A move shorter than `GEOMETRY_EPSILON` returns `[end]`.
    pub fn linear_interpolation(
        &self,
        start: Point3D,
        end: Point3D,
        params: &InterpolationParams,
    ) -> Result<Vec<Point3D>, PlanError> {
        params.validate()?;
        check_point("start", start)?;
        check_point("end", end)?;

        let distance = start.distance_to(end);
        if distance < GEOMETRY_EPSILON {
            return Ok(vec![end]);
        }

        let direction = (end - start) * (1.0 / distance);
        let profile = self.sampled_profile(distance, params)?;

        let mut points: Vec<Point3D> = profile
            .sample_times(self.sample_period)
            .map(|t| start + direction * profile.distance_at(t))
            .collect();
        points.push(end);
        Ok(points)
    }

    /// Arc in the XY plane around `center`, with Z interpolated linearly.
    ///
    /// The sweep always follows `clockwise`; equal start and end angles
    /// produce a full turn.
    pub fn circular_interpolation(
        &self,
        start: Point3D,
        end: Point3D,
        center: Point3D,
        clockwise: bool,
        params: &InterpolationParams,
    ) -> Result<Vec<Point3D>, PlanError> {
        params.validate()?;
        check_point("start", start)?;
        check_point("end", end)?;
        check_point("center", center)?;

        let radius = start.planar_distance_to(center);
        if radius < GEOMETRY_EPSILON {
            return Err(PlanError::invalid("arc center coincides with start point"));
        }
        if end.planar_distance_to(center) < GEOMETRY_EPSILON {
            return Err(PlanError::invalid("arc center coincides with end point"));
        }

        let start_angle = (start.y - center.y).atan2(start.x - center.x);
        let sweep = arc_sweep(start, end, center, clockwise);
        let arc_length = sweep.abs() * radius;
        let profile = self.sampled_profile(arc_length, params)?;

        let mut points: Vec<Point3D> = profile
            .sample_times(self.sample_period)
            .map(|t| {
                let fraction = profile.distance_at(t) / arc_length;
                let angle = start_angle + fraction * sweep;
                Point3D::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                    start.z + (end.z - start.z) * fraction,
                )
            })
            .collect();
        points.push(end);
        Ok(points)
    }

    /// Smooth once, then drop points within `factor · feed_rate` of the
    /// simplified polyline. Endpoints are preserved.
    pub fn optimize_path(
        &self,
        path: &mut Vec<Point3D>,
        params: &InterpolationParams,
    ) -> Result<(), PlanError> {
        params.validate()?;
        if path.len() < 3 {
            return Ok(());
        }
        let smoothed = simplify::smooth(path);
        *path = simplify::douglas_peucker(&smoothed, self.tolerance_factor * params.feed_rate);
        Ok(())
    }
}

/// Signed sweep angle [rad]: negative for clockwise, positive otherwise.
pub fn arc_sweep(start: Point3D, end: Point3D, center: Point3D, clockwise: bool) -> f64 {
    let start_angle = (start.y - center.y).atan2(start.x - center.x);
    let end_angle = (end.y - center.y).atan2(end.x - center.x);
    let delta = end_angle - start_angle;

    if clockwise && delta >= 0.0 {
        delta - TAU
    } else if !clockwise && delta <= 0.0 {
        delta + TAU
    } else {
        delta
    }
}

/// Length of the arc traced by [`PathGenerator::circular_interpolation`].
pub fn arc_length(start: Point3D, end: Point3D, center: Point3D, clockwise: bool) -> f64 {
    arc_sweep(start, end, center, clockwise).abs() * start.planar_distance_to(center)
}

fn check_point(name: &str, p: Point3D) -> Result<(), PlanError> {
    if p.is_finite() {
        Ok(())
    } else {
        Err(PlanError::invalid(format!("{name} point is not finite")))
    }
}
