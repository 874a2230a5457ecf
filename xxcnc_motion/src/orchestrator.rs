//! Multi-axis motion orchestration.
//!
//! Owns the named axes and the interpolation queue. A move request is planned
//! into the queue, then executed one setpoint at a time: each time every axis
//! has come to rest the next setpoint is issued as a position move to the
//! X/Y/Z axes.
//!
//! Single-threaded: all mutation happens through `&mut self` on the control
//! loop thread. Only the queue ([`TimeQuantizer`]) may be shared with a
//! planning thread through [`MotionOrchestrator::quantizer`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use xxcnc_common::consts::{AXIS_NAME_LEN, MAX_AXES, SECONDS_PER_MINUTE};
use xxcnc_common::motion::config::MotionConfig;
use xxcnc_common::motion::error::PlanError;
use xxcnc_common::motion::geometry::Point3D;
use xxcnc_common::motion::params::{AxisParameters, InterpolationParams};
use xxcnc_common::motion::state::{AxisState, MotionState};
use xxcnc_common::motion::status::{AxisStatus, MotionStatus, axis_name};

use crate::planning::PathGenerator;
use crate::quantizer::TimeQuantizer;
use crate::servo::AxisServo;

/// Axes driven by the interpolation queue, in coordinate order.
pub const CARTESIAN_AXES: [&str; 3] = ["X", "Y", "Z"];

/// A validated move request.
#[derive(Debug, Clone)]
struct MoveRequest {
    start: Point3D,
    end: Point3D,
    params: InterpolationParams,
    direct: Vec<(String, f64)>,
}

/// A planned move waiting for `start_motion`.
#[derive(Debug, Clone, Default)]
struct PendingMove {
    /// Setpoint speed [mm/s].
    velocity: f64,
    /// Non-Cartesian axes sent straight to their targets.
    direct: Vec<(String, f64)>,
}

#[derive(Debug)]
pub struct MotionOrchestrator {
    config: MotionConfig,
    axes: BTreeMap<String, AxisServo>,
    quantizer: Arc<TimeQuantizer>,
    state: MotionState,
    moving: bool,
    /// Setpoint speed of the active plan [mm/s].
    active_velocity: f64,
    pending: Option<PendingMove>,
}

impl MotionOrchestrator {
    pub fn new(config: MotionConfig) -> Result<Self, PlanError> {
        config.validate().map_err(PlanError::InvalidArgument)?;
        let generator = PathGenerator::from_config(&config)?;
        let quantizer = TimeQuantizer::with_generator(config.interpolation_period_ms, generator)?;
        Ok(Self {
            config,
            axes: BTreeMap::new(),
            quantizer: Arc::new(quantizer),
            state: MotionState::Idle,
            moving: false,
            active_velocity: 0.0,
            pending: None,
        })
    }

    // ─── Axis management ────────────────────────────────────────────

    /// Register an axis. False if the name is taken, invalid, the axis
    /// table is full, or the parameters are rejected.
    pub fn add_axis(&mut self, name: &str, params: AxisParameters) -> bool {
        if name.is_empty() || name.len() > AXIS_NAME_LEN {
            warn!("axis name {name:?} must be 1..={AXIS_NAME_LEN} bytes");
            return false;
        }
        if self.axes.contains_key(name) {
            warn!("axis {name} already exists");
            return false;
        }
        if self.axes.len() >= MAX_AXES {
            warn!("axis table full ({MAX_AXES}), rejecting {name}");
            return false;
        }
        match AxisServo::new(params) {
            Ok(axis) => {
                self.axes.insert(name.to_string(), axis);
                info!("axis {name} added");
                true
            }
            Err(e) => {
                warn!("axis {name} rejected: {e}");
                false
            }
        }
    }

    pub fn axis(&self, name: &str) -> Option<&AxisServo> {
        self.axes.get(name)
    }

    pub fn axis_names(&self) -> impl Iterator<Item = &str> {
        self.axes.keys().map(String::as_str)
    }

    /// Enable every axis. Leaves the error state once all succeed.
    pub fn enable_all_axes(&mut self) -> bool {
        let mut ok = true;
        for (name, axis) in &mut self.axes {
            if !axis.enable().is_ok() {
                warn!("axis {name} refused enable ({:?})", axis.state());
                ok = false;
            }
        }
        if ok && self.state == MotionState::Error {
            info!("all axes enabled, leaving error state");
            self.state = MotionState::Idle;
        }
        ok
    }

    pub fn disable_all_axes(&mut self) -> bool {
        let mut ok = true;
        for (name, axis) in &mut self.axes {
            if !axis.disable().is_ok() {
                warn!("axis {name} refused disable ({:?})", axis.state());
                ok = false;
            }
        }
        self.moving = false;
        self.pending = None;
        if self.state.is_active() {
            self.state = MotionState::Idle;
        }
        ok
    }

    pub fn home_axis(&mut self, name: &str) -> bool {
        self.axes
            .get_mut(name)
            .is_some_and(|axis| axis.home().is_ok())
    }

    /// Home switch event for `name`.
    pub fn home_reached(&mut self, name: &str) -> bool {
        self.axes
            .get_mut(name)
            .is_some_and(|axis| axis.home_reached().is_ok())
    }

    // ─── Moves ──────────────────────────────────────────────────────

    /// Plan a straight move and start executing it.
    ///
    /// Axes absent from `targets` keep their position.
    pub fn move_linear(&mut self, targets: &BTreeMap<String, f64>, feed_rate: f64) -> bool {
        self.plan_linear(targets, feed_rate) && self.start_motion()
    }

    /// Plan an XY-plane arc around `center` and start executing it.
    pub fn move_circular(
        &mut self,
        targets: &BTreeMap<String, f64>,
        center: Point3D,
        clockwise: bool,
        feed_rate: f64,
    ) -> bool {
        let Some(req) = self.prepare(targets, feed_rate) else {
            return false;
        };
        if !self
            .quantizer
            .plan_circular_path(req.start, req.end, center, clockwise, &req.params)
        {
            return false;
        }
        self.stage(req);
        self.start_motion()
    }

    /// Plan a straight move without starting it. See [`Self::start_motion`].
    pub fn plan_linear(&mut self, targets: &BTreeMap<String, f64>, feed_rate: f64) -> bool {
        let Some(req) = self.prepare(targets, feed_rate) else {
            return false;
        };
        if !self.quantizer.plan_linear_path(req.start, req.end, &req.params) {
            return false;
        }
        self.stage(req);
        true
    }

    /// Issue the first setpoint of the planned move.
    pub fn start_motion(&mut self) -> bool {
        if self.moving {
            debug!("start_motion ignored, already moving");
            return false;
        }
        let Some(pending) = self.pending.take() else {
            debug!("start_motion without a planned move");
            return false;
        };
        let Some(point) = self.quantizer.next_point() else {
            return false;
        };

        self.active_velocity = pending.velocity;
        for (name, target) in &pending.direct {
            let accepted = self
                .axes
                .get_mut(name)
                .is_some_and(|axis| axis.move_to(*target, pending.velocity).is_ok());
            if !accepted {
                warn!("axis {name} refused move to {target}, stopping");
                self.emergency_stop();
                return false;
            }
        }
        if !self.issue_setpoint(point) {
            self.emergency_stop();
            return false;
        }

        self.moving = true;
        self.state = MotionState::Moving;
        true
    }

    /// Validate a request and derive start, end and plan parameters.
    fn prepare(&self, targets: &BTreeMap<String, f64>, feed_rate: f64) -> Option<MoveRequest> {
        if self.moving {
            debug!("move rejected, already moving");
            return None;
        }
        if self.state == MotionState::Error {
            warn!("move rejected, orchestrator in error");
            return None;
        }
        if targets.is_empty() {
            return None;
        }
        for (name, &target) in targets {
            let Some(axis) = self.axes.get(name) else {
                warn!("move rejected, unknown axis {name}");
                return None;
            };
            if axis.state() != AxisState::Idle {
                warn!("move rejected, axis {name} is {:?}", axis.state());
                return None;
            }
            if !target.is_finite() || !axis.params().within_limits(target) {
                warn!("move rejected, {name}={target} outside soft limits");
                return None;
            }
        }

        let start = self.cartesian_position();
        let mut end = start;
        let mut direct = Vec::new();
        for (name, &target) in targets {
            match name.as_str() {
                "X" => end.x = target,
                "Y" => end.y = target,
                "Z" => end.z = target,
                _ => direct.push((name.clone(), target)),
            }
        }

        let (max_velocity, acceleration) = self.cartesian_limits();
        let params = InterpolationParams {
            feed_rate,
            max_velocity,
            acceleration,
            deceleration: acceleration,
            jerk: None,
        };
        Some(MoveRequest {
            start,
            end,
            params,
            direct,
        })
    }

    fn stage(&mut self, req: MoveRequest) {
        self.pending = Some(PendingMove {
            velocity: req.params.target_feed() / SECONDS_PER_MINUTE,
            direct: req.direct,
        });
    }

    fn cartesian_position(&self) -> Point3D {
        let pos = |name: &str| self.axes.get(name).map_or(0.0, AxisServo::position);
        Point3D::new(pos("X"), pos("Y"), pos("Z"))
    }

    /// Velocity and acceleration ceilings over the present X/Y/Z axes.
    fn cartesian_limits(&self) -> (f64, f64) {
        CARTESIAN_AXES
            .iter()
            .filter_map(|name| self.axes.get(*name))
            .fold(
                (self.config.max_velocity, self.config.max_acceleration),
                |(v, a), axis| {
                    let p = axis.params();
                    (v.min(p.max_velocity), a.min(p.max_acceleration))
                },
            )
    }

    fn issue_setpoint(&mut self, point: Point3D) -> bool {
        let coords = [point.x, point.y, point.z];
        for (name, coord) in CARTESIAN_AXES.iter().zip(coords) {
            if let Some(axis) = self.axes.get_mut(*name) {
                if !axis.move_to(coord, self.active_velocity).is_ok() {
                    warn!("axis {name} refused setpoint {coord:.4} ({:?})", axis.state());
                    return false;
                }
            }
        }
        true
    }

    // ─── Cycle ──────────────────────────────────────────────────────

    /// Advance all axes by `dt` seconds and feed the next setpoint.
    pub fn update(&mut self, dt: f64) {
        for axis in self.axes.values_mut() {
            axis.update(dt);
        }

        if self.state != MotionState::Error
            && self.axes.values().any(|a| a.state() == AxisState::Error)
        {
            self.safety_stop();
            return;
        }

        if !self.moving || self.axes.values().any(|a| a.state().is_in_motion()) {
            return;
        }

        if let Some(point) = self.quantizer.next_point() {
            if self.issue_setpoint(point) {
                self.state = MotionState::Interpolating;
            } else {
                self.safety_stop();
            }
        } else if self.quantizer.is_finished() {
            self.moving = false;
            self.state = MotionState::Idle;
            debug!("motion complete");
        }
    }

    fn safety_stop(&mut self) {
        let faulted: Vec<&str> = self
            .axes
            .iter()
            .filter(|(_, a)| a.state() == AxisState::Error)
            .map(|(n, _)| n.as_str())
            .collect();
        warn!("safety stop, faulted axes: {faulted:?}");
        self.emergency_stop();
        self.state = MotionState::Error;
    }

    /// Stop every axis at once and drop the queue.
    ///
    /// Every axis is attempted even if some refuse.
    pub fn emergency_stop(&mut self) -> bool {
        let mut ok = true;
        for (name, axis) in &mut self.axes {
            if !axis.stop(true).is_ok() {
                warn!("axis {name} refused emergency stop");
                ok = false;
            }
        }
        self.quantizer.clear_queue();
        self.moving = false;
        self.pending = None;
        if self.state.is_active() {
            self.state = MotionState::Idle;
        }
        info!("emergency stop");
        ok
    }

    /// Drop the queue and every axis command.
    pub fn clear_trajectory(&mut self) {
        self.quantizer.clear_queue();
        self.moving = false;
        self.pending = None;
        if self.state.is_active() {
            self.state = MotionState::Idle;
        }
        for axis in self.axes.values_mut() {
            axis.clear_trajectory();
        }
    }

    // ─── Status ─────────────────────────────────────────────────────

    #[inline]
    pub fn state(&self) -> MotionState {
        self.state
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn set_interpolation_period(&mut self, period_ms: u32) -> Result<(), PlanError> {
        self.quantizer.set_period(period_ms)?;
        self.config.interpolation_period_ms = period_ms;
        Ok(())
    }

    pub fn interpolation_period(&self) -> u32 {
        self.quantizer.period()
    }

    pub fn progress(&self) -> f64 {
        self.quantizer.progress()
    }

    pub fn is_interpolation_finished(&self) -> bool {
        self.quantizer.is_finished()
    }

    pub fn queue_size(&self) -> usize {
        self.quantizer.queue_size()
    }

    /// Shared handle for planning from another thread.
    pub fn quantizer(&self) -> Arc<TimeQuantizer> {
        Arc::clone(&self.quantizer)
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Snapshot for status consumers. `cycle` is left at 0.
    pub fn status(&self) -> MotionStatus {
        let mut status = MotionStatus {
            state: self.state,
            moving: self.moving,
            progress: self.progress(),
            queue_depth: self.queue_size(),
            interpolation_period_ms: self.interpolation_period(),
            cycle: 0,
            axes: heapless::Vec::new(),
        };
        for (name, axis) in &self.axes {
            let Some(name) = axis_name(name) else {
                continue;
            };
            let entry = AxisStatus {
                name,
                state: axis.state(),
                position: axis.position(),
                velocity: axis.velocity(),
                target_position: axis.target_position(),
                faults: axis.faults(),
                referenced: axis.is_referenced(),
            };
            if status.axes.push(entry).is_err() {
                break;
            }
        }
        status
    }
}
