//! Integration test: soft-limit safety stop and recovery.
//!
//! 1. Open-ended motion trips a soft limit → axis Error
//! 2. Orchestrator detects the fault → all axes stopped, MotionState::Error
//! 3. Moves rejected until disable → enable clears the fault

use std::collections::BTreeMap;

use xxcnc_common::motion::error::AxisFault;
use xxcnc_common::motion::params::AxisParameters;
use xxcnc_common::motion::state::{AxisState, MotionState};
use xxcnc_motion::servo::AxisServo;

use super::{DT, xyz_orchestrator};

fn narrow_axis() -> AxisParameters {
    AxisParameters {
        max_velocity: 50.0,
        max_acceleration: 500.0,
        soft_limit_min: -5.0,
        soft_limit_max: 5.0,
        ..AxisParameters::default()
    }
}

#[test]
fn velocity_move_never_crosses_limit() {
    let mut axis = AxisServo::new(narrow_axis()).unwrap();
    assert!(axis.enable().is_ok());
    assert!(axis.move_velocity(-40.0).is_ok());

    let mut cycles = 0;
    while axis.state() == AxisState::Moving {
        axis.update(DT);
        assert!(axis.position() >= -5.0);
        cycles += 1;
        assert!(cycles < 10_000);
    }

    assert_eq!(axis.state(), AxisState::Error);
    assert!(axis.faults().contains(AxisFault::SOFT_LIMIT_MIN));
    assert!(axis.faults().is_limit());
    assert_eq!(axis.velocity(), 0.0);
    assert!(axis.position() >= -4.9 - 1e-9);

    // Error is sticky until the axis is power-cycled.
    assert!(!axis.enable().is_ok());
    assert!(!axis.move_to(0.0, 10.0).is_ok());
    assert!(axis.disable().is_ok());
    assert!(axis.faults().is_empty());
    assert!(axis.enable().is_ok());
    assert!(axis.move_to(0.0, 10.0).is_ok());
}

#[test]
fn homing_overrun_triggers_safety_stop() {
    let mut mo = xyz_orchestrator();
    assert!(mo.add_axis("U", narrow_axis()));
    assert!(mo.enable_all_axes());
    assert!(mo.home_axis("U"));
    assert_eq!(mo.axis("U").unwrap().state(), AxisState::Homing);

    let mut cycles = 0;
    while mo.state() != MotionState::Error {
        mo.update(DT);
        cycles += 1;
        assert!(cycles < 10_000, "soft limit never tripped");
    }

    let u = mo.axis("U").unwrap();
    assert_eq!(u.state(), AxisState::Error);
    assert!(u.faults().contains(AxisFault::SOFT_LIMIT_MAX));
    assert!(u.position() <= 4.9 + 1e-9);
    assert!(!u.is_referenced());
    for name in ["X", "Y", "Z"] {
        assert_eq!(mo.axis(name).unwrap().state(), AxisState::Idle);
    }

    let status = mo.status();
    assert_eq!(status.state, MotionState::Error);
    assert!(status.has_faults());

    let x: BTreeMap<String, f64> = [("X".to_string(), 1.0)].into();
    assert!(!mo.move_linear(&x, 1000.0));

    // A failed enable keeps the orchestrator in error.
    assert!(!mo.enable_all_axes());
    assert_eq!(mo.state(), MotionState::Error);

    assert!(mo.disable_all_axes());
    assert!(mo.enable_all_axes());
    assert_eq!(mo.state(), MotionState::Idle);
    assert!(!mo.status().has_faults());
    assert!(mo.move_linear(&x, 1000.0));
}

#[test]
fn homing_completes_on_switch_event() {
    let mut mo = xyz_orchestrator();
    assert!(!mo.home_reached("X"));
    assert!(mo.home_axis("X"));
    for _ in 0..100 {
        mo.update(DT);
    }
    assert!(mo.axis("X").unwrap().position() > 0.0);

    assert!(mo.home_reached("X"));
    let x = mo.axis("X").unwrap();
    assert_eq!(x.state(), AxisState::Idle);
    assert!(x.is_referenced());
    assert_eq!(x.position(), 0.0);
    assert_eq!(mo.state(), MotionState::Idle);
}

#[test]
fn emergency_stop_halts_mid_move() {
    let mut mo = xyz_orchestrator();
    let x: BTreeMap<String, f64> = [("X".to_string(), 20.0)].into();
    assert!(mo.move_linear(&x, 3000.0));
    for _ in 0..200 {
        mo.update(DT);
    }
    let stopped_at = mo.axis("X").unwrap().position();
    assert!(stopped_at > 0.0 && stopped_at < 20.0);

    assert!(mo.emergency_stop());
    assert!(!mo.is_moving());
    assert_eq!(mo.state(), MotionState::Idle);
    assert_eq!(mo.queue_size(), 0);

    for _ in 0..50 {
        mo.update(DT);
    }
    let x_axis = mo.axis("X").unwrap();
    assert_eq!(x_axis.state(), AxisState::Idle);
    assert_eq!(x_axis.position(), stopped_at);
}
