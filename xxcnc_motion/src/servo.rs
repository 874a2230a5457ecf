//! Per-axis servo: kinematic state machine under velocity, acceleration
//! and soft-limit constraints.
//!
//! ## Commands
//! - **Position** (`move_to`): braking-curve approach, desired speed is
//!   `min(commanded, sqrt(2·a·remaining))`; an overshoot snaps to the target.
//! - **Velocity** (`move_velocity`, `home`, controlled `stop`): ramps toward
//!   the target velocity with no end point.
//! - **Hold** (Idle): ramps any residual velocity to zero.
//!
//! ## Soft limits
//! Checked against the *predicted* position before it is committed. Open-ended
//! velocity motion additionally trips when it comes within
//! `limit_margin_factor · |v| · dt` of the limit it is heading for. A trip
//! forces `Error`, zero velocity and a position just inside the limits.

use tracing::warn;
use xxcnc_common::consts::{MOTION_EPSILON, SOFT_LIMIT_BACKOFF};
use xxcnc_common::motion::error::{AxisFault, PlanError};
use xxcnc_common::motion::params::AxisParameters;
use xxcnc_common::motion::state::AxisState;

/// Result of an axis operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisTransition {
    /// Accepted; the state after the operation.
    Ok(AxisState),
    /// Refused without side effects.
    Rejected(&'static str),
}

impl AxisTransition {
    #[inline]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Hold,
    Position { speed: f64 },
    Velocity,
}

#[derive(Debug, Clone)]
pub struct AxisServo {
    params: AxisParameters,
    state: AxisState,
    command: Command,
    position: f64,
    velocity: f64,
    target_position: f64,
    target_velocity: f64,
    faults: AxisFault,
    referenced: bool,
}

impl AxisServo {
    /// Create a disabled axis at `0.0` clamped into the soft limits.
    pub fn new(params: AxisParameters) -> Result<Self, PlanError> {
        params.validate()?;
        let position = 0.0_f64.clamp(params.soft_limit_min, params.soft_limit_max);
        Ok(Self {
            params,
            state: AxisState::Disabled,
            command: Command::Hold,
            position,
            velocity: 0.0,
            target_position: position,
            target_velocity: 0.0,
            faults: AxisFault::empty(),
            referenced: false,
        })
    }

    // ─── Accessors ──────────────────────────────────────────────────

    #[inline]
    pub fn state(&self) -> AxisState {
        self.state
    }

    #[inline]
    pub fn params(&self) -> &AxisParameters {
        &self.params
    }

    #[inline]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[inline]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    #[inline]
    pub fn target_position(&self) -> f64 {
        self.target_position
    }

    #[inline]
    pub fn target_velocity(&self) -> f64 {
        self.target_velocity
    }

    #[inline]
    pub fn faults(&self) -> AxisFault {
        self.faults
    }

    /// True once a homing cycle has completed.
    #[inline]
    pub fn is_referenced(&self) -> bool {
        self.referenced
    }

    // ─── Operations ─────────────────────────────────────────────────

    pub fn enable(&mut self) -> AxisTransition {
        if self.state == AxisState::Error {
            return AxisTransition::Rejected("axis in error, disable to reset");
        }
        if self.state.is_in_motion() {
            self.halt();
        }
        self.state = AxisState::Idle;
        AxisTransition::Ok(self.state)
    }

    /// Stop immediately and power down. Clears fault flags.
    pub fn disable(&mut self) -> AxisTransition {
        if self.state.is_in_motion() {
            return AxisTransition::Rejected("axis in motion");
        }
        self.halt();
        self.faults = AxisFault::empty();
        self.state = AxisState::Disabled;
        AxisTransition::Ok(self.state)
    }

    /// Position move. The speed magnitude is clamped to `max_velocity`.
    pub fn move_to(&mut self, position: f64, velocity: f64) -> AxisTransition {
        if self.state != AxisState::Idle {
            return AxisTransition::Rejected("axis not idle");
        }
        if !position.is_finite() || !self.params.within_limits(position) {
            return AxisTransition::Rejected("target outside soft limits");
        }
        let speed = self.clamp_velocity(velocity).abs();
        if !(speed > 0.0) {
            return AxisTransition::Rejected("velocity must be non-zero");
        }

        self.target_position = position;
        self.target_velocity = (position - self.position).signum() * speed;
        self.command = Command::Position { speed };
        self.state = AxisState::Moving;
        AxisTransition::Ok(self.state)
    }

    /// Open-ended velocity move, clamped to `±max_velocity`.
    pub fn move_velocity(&mut self, velocity: f64) -> AxisTransition {
        if self.state != AxisState::Idle {
            return AxisTransition::Rejected("axis not idle");
        }
        if !velocity.is_finite() {
            return AxisTransition::Rejected("velocity not finite");
        }
        self.target_velocity = self.clamp_velocity(velocity);
        self.command = Command::Velocity;
        self.state = AxisState::Moving;
        AxisTransition::Ok(self.state)
    }

    /// `emergency` stops at once and returns to Idle; otherwise the target
    /// velocity drops to zero and `update` decelerates.
    ///
    /// Accepted as a no-op when the axis is not in motion.
    pub fn stop(&mut self, emergency: bool) -> AxisTransition {
        if !self.state.is_in_motion() {
            return AxisTransition::Ok(self.state);
        }
        if emergency {
            self.halt();
            self.state = AxisState::Idle;
        } else {
            self.target_velocity = 0.0;
            self.command = Command::Velocity;
        }
        AxisTransition::Ok(self.state)
    }

    /// Start a homing run at `home_velocity`.
    pub fn home(&mut self) -> AxisTransition {
        if self.state != AxisState::Idle {
            return AxisTransition::Rejected("axis not idle");
        }
        self.target_velocity = self.clamp_velocity(self.params.home_velocity);
        self.command = Command::Velocity;
        self.referenced = false;
        self.state = AxisState::Homing;
        AxisTransition::Ok(self.state)
    }

    /// Home switch reached: set `home_position` and return to Idle.
    pub fn home_reached(&mut self) -> AxisTransition {
        if self.state != AxisState::Homing {
            return AxisTransition::Rejected("axis not homing");
        }
        self.position = self.params.home_position;
        self.halt();
        self.referenced = true;
        self.state = AxisState::Idle;
        AxisTransition::Ok(self.state)
    }

    /// Drop the current command. Always succeeds.
    pub fn clear_trajectory(&mut self) -> AxisTransition {
        self.target_position = self.position;
        self.target_velocity = self.velocity;
        if self.state == AxisState::Moving {
            self.command = Command::Hold;
            self.state = AxisState::Idle;
        }
        AxisTransition::Ok(self.state)
    }

    /// Advance by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        if matches!(self.state, AxisState::Disabled | AxisState::Error) {
            return;
        }
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }

        let max_dv = self.params.max_acceleration * dt;
        let desired = match self.command {
            Command::Hold => 0.0,
            Command::Velocity => self.target_velocity,
            Command::Position { speed } => {
                let remaining = self.target_position - self.position;
                let braking = (2.0 * self.params.max_acceleration * remaining.abs()).sqrt();
                remaining.signum() * speed.min(braking)
            }
        };

        let mut next_velocity = self.velocity + (desired - self.velocity).clamp(-max_dv, max_dv);
        let mut predicted = self.position + 0.5 * (self.velocity + next_velocity) * dt;

        if let Command::Position { .. } = self.command {
            self.target_velocity = desired;
            let before = self.target_position - self.position;
            let after = self.target_position - predicted;
            if before == 0.0 || after == 0.0 || before.signum() != after.signum() {
                predicted = self.target_position;
                next_velocity = 0.0;
                self.target_velocity = 0.0;
            }
        }

        if let Some(fault) = self.limit_violation(predicted, next_velocity, dt) {
            self.trip(fault);
            return;
        }

        self.position = predicted;
        self.velocity = next_velocity;
        if let Command::Hold = self.command {
            self.target_position = self.position;
            self.target_velocity = 0.0;
        }

        if self.state == AxisState::Moving && self.settled() {
            self.command = Command::Hold;
            self.velocity = 0.0;
            self.state = AxisState::Idle;
        }
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn clamp_velocity(&self, velocity: f64) -> f64 {
        velocity.clamp(-self.params.max_velocity, self.params.max_velocity)
    }

    fn halt(&mut self) {
        self.velocity = 0.0;
        self.target_velocity = 0.0;
        self.target_position = self.position;
        self.command = Command::Hold;
    }

    fn settled(&self) -> bool {
        let at_rest = self.velocity.abs() < MOTION_EPSILON
            && self.target_velocity.abs() < MOTION_EPSILON;
        match self.command {
            Command::Position { .. } => {
                at_rest && (self.target_position - self.position).abs() < MOTION_EPSILON
            }
            _ => at_rest,
        }
    }

    fn limit_violation(&self, predicted: f64, velocity: f64, dt: f64) -> Option<AxisFault> {
        let p = &self.params;
        let open_ended = matches!(self.command, Command::Velocity);
        let margin = if open_ended {
            p.limit_margin_factor * velocity.abs() * dt
        } else {
            0.0
        };

        if predicted > p.soft_limit_max {
            Some(AxisFault::SOFT_LIMIT_MAX)
        } else if predicted < p.soft_limit_min {
            Some(AxisFault::SOFT_LIMIT_MIN)
        } else if velocity > 0.0 && predicted > p.soft_limit_max - margin {
            Some(AxisFault::SOFT_LIMIT_MAX | AxisFault::SAFETY_MARGIN)
        } else if velocity < 0.0 && predicted < p.soft_limit_min + margin {
            Some(AxisFault::SOFT_LIMIT_MIN | AxisFault::SAFETY_MARGIN)
        } else {
            None
        }
    }

    fn trip(&mut self, fault: AxisFault) {
        let p = &self.params;
        let backoff = SOFT_LIMIT_BACKOFF.min(0.5 * (p.soft_limit_max - p.soft_limit_min));
        self.position = self
            .position
            .clamp(p.soft_limit_min + backoff, p.soft_limit_max - backoff);
        self.halt();
        self.faults |= fault;
        self.state = AxisState::Error;
        warn!(
            "soft limit tripped at {:.4} ({:?}), axis in error",
            self.position, fault
        );
    }
}
