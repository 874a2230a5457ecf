//! Integration test: coordinated moves.
//!
//! Linear and circular moves through the orchestrator, direct non-Cartesian
//! axes, and a full run from a machine file through the cycle runner.

use std::collections::BTreeMap;
use std::io::Write;

use tempfile::NamedTempFile;
use xxcnc_common::motion::geometry::Point3D;
use xxcnc_common::motion::state::{AxisState, MotionState};
use xxcnc_motion::config::{build_orchestrator, load_config};
use xxcnc_motion::cycle::{CycleRunner, RunOutcome};
use xxcnc_motion::status::StatusBoard;

use super::{DT, axis_params, run_to_completion, xyz_orchestrator};

fn targets(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(n, v)| (n.to_string(), *v)).collect()
}

fn position(mo: &xxcnc_motion::orchestrator::MotionOrchestrator, name: &str) -> f64 {
    mo.axis(name).unwrap().position()
}

#[test]
fn second_move_while_moving_is_rejected() {
    let mut mo = xyz_orchestrator();
    assert!(mo.move_linear(&targets(&[("X", 5.0)]), 1000.0));
    assert!(!mo.move_linear(&targets(&[("X", 10.0)]), 1000.0));

    run_to_completion(&mut mo, 100_000);
    assert!((position(&mo, "X") - 5.0).abs() < 1e-3);
}

#[test]
fn linear_move_reaches_all_targets() {
    let mut mo = xyz_orchestrator();
    assert!(mo.move_linear(&targets(&[("X", 2.0), ("Y", -1.5), ("Z", 0.5)]), 1200.0));
    assert_eq!(mo.state(), MotionState::Moving);

    run_to_completion(&mut mo, 200_000);
    assert_eq!(mo.state(), MotionState::Idle);
    assert_eq!(mo.progress(), 1.0);
    assert!((position(&mo, "X") - 2.0).abs() < 1e-3);
    assert!((position(&mo, "Y") + 1.5).abs() < 1e-3);
    assert!((position(&mo, "Z") - 0.5).abs() < 1e-3);
    for name in ["X", "Y", "Z"] {
        assert_eq!(mo.axis(name).unwrap().state(), AxisState::Idle);
    }
}

#[test]
fn progress_rises_monotonically_during_a_move() {
    let mut mo = xyz_orchestrator();
    assert!(mo.move_linear(&targets(&[("X", 1.0)]), 600.0));

    let mut last = mo.progress();
    let mut entered_interpolation = false;
    while mo.is_moving() {
        mo.update(DT);
        let progress = mo.progress();
        assert!(progress >= last);
        last = progress;
        entered_interpolation |= mo.state() == MotionState::Interpolating;
    }
    assert!(entered_interpolation);
    assert_eq!(last, 1.0);
}

#[test]
fn circular_move_follows_arc() {
    let mut mo = xyz_orchestrator();
    let center = Point3D::new(2.0, 0.0, 0.0);
    assert!(mo.move_circular(&targets(&[("X", 4.0), ("Y", 0.0)]), center, true, 1800.0));

    let mut max_y: f64 = 0.0;
    while mo.is_moving() {
        mo.update(DT);
        max_y = max_y.max(position(&mo, "Y"));
        let radius = Point3D::new(position(&mo, "X"), position(&mo, "Y"), 0.0)
            .planar_distance_to(center);
        assert!((radius - 2.0).abs() < 0.05);
    }
    // Clockwise from (0,0) around (2,0) goes through +Y.
    assert!(max_y > 1.9);
    assert!((position(&mo, "X") - 4.0).abs() < 1e-3);
    assert!(position(&mo, "Y").abs() < 1e-3);
}

#[test]
fn non_cartesian_axis_moves_directly() {
    let mut mo = xyz_orchestrator();
    assert!(mo.add_axis("A", axis_params(-360.0, 360.0)));
    assert!(mo.enable_all_axes());

    assert!(mo.move_linear(&targets(&[("X", 1.0), ("A", 3.0)]), 1000.0));
    assert_eq!(mo.axis("A").unwrap().target_position(), 3.0);

    run_to_completion(&mut mo, 100_000);
    assert!((position(&mo, "A") - 3.0).abs() < 1e-3);
    assert!((position(&mo, "X") - 1.0).abs() < 1e-3);
}

#[test]
fn rejected_requests_leave_state_untouched() {
    let mut mo = xyz_orchestrator();
    assert!(!mo.move_linear(&targets(&[("X", 150.0)]), 1000.0));
    assert!(!mo.move_linear(&targets(&[("Q", 1.0)]), 1000.0));
    assert!(!mo.move_linear(&BTreeMap::new(), 1000.0));
    assert!(!mo.move_linear(&targets(&[("X", 1.0)]), 0.0));
    assert_eq!(mo.state(), MotionState::Idle);
    assert!(!mo.is_moving());
    assert_eq!(mo.queue_size(), 0);
}

#[test]
fn crawling_feed_is_refused() {
    let mut mo = xyz_orchestrator();
    assert!(!mo.move_linear(&targets(&[("X", 90.0)]), 0.5));
    assert!(!mo.is_moving());
    assert_eq!(mo.state(), MotionState::Idle);
    assert_eq!(mo.queue_size(), 0);

    assert!(mo.move_linear(&targets(&[("X", 0.5)]), 600.0));
}

#[test]
fn plan_then_start_separately() {
    let mut mo = xyz_orchestrator();
    assert!(!mo.start_motion());
    assert!(mo.plan_linear(&targets(&[("Y", 0.5)]), 900.0));
    assert!(!mo.is_moving());
    assert!(mo.queue_size() > 0);

    assert!(mo.start_motion());
    run_to_completion(&mut mo, 100_000);
    assert!((position(&mo, "Y") - 0.5).abs() < 1e-3);
}

#[test]
fn machine_file_runs_through_cycle_runner() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[shared]
service_name = "bench-mill"

[motion]
interpolation_period_ms = 1
status_interval_cycles = 50

[[axes]]
name = "X"
max_velocity = 100.0
max_acceleration = 2000.0
soft_limit_min = -50.0
soft_limit_max = 50.0

[[axes]]
name = "Y"
max_velocity = 100.0
max_acceleration = 2000.0
soft_limit_min = -50.0
soft_limit_max = 50.0
"#
    )
    .unwrap();
    file.flush().unwrap();

    let config = load_config(file.path()).unwrap();
    let mut mo = build_orchestrator(&config).unwrap();
    assert!(mo.enable_all_axes());
    assert!(mo.move_linear(&targets(&[("X", 0.4), ("Y", 0.3)]), 1500.0));

    let board = StatusBoard::new();
    let mut runner = CycleRunner::new(mo, board.clone());
    let outcome = runner.run(100_000).unwrap();
    assert!(matches!(outcome, RunOutcome::Completed { .. }));

    let status = board.latest();
    assert!(!status.moving);
    assert_eq!(status.state, MotionState::Idle);
    assert_eq!(status.axes.len(), 2);
    assert!((status.axis("X").unwrap().position - 0.4).abs() < 1e-3);
    assert!((status.axis("Y").unwrap().position - 0.3).abs() < 1e-3);
    assert!(board.sequence() >= 1);
    assert!(!status.has_faults());
}

#[test]
fn shipped_machine_file_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/machine.toml");
    let config = load_config(&path).unwrap();
    let mo = build_orchestrator(&config).unwrap();
    assert_eq!(mo.axis_names().collect::<Vec<_>>(), ["A", "X", "Y", "Z"]);
    assert_eq!(mo.state(), MotionState::Idle);
}
