mod orchestrator;
mod path_generation;
mod quantizer;
mod safety_stop;

use xxcnc_common::motion::config::MotionConfig;
use xxcnc_common::motion::params::AxisParameters;
use xxcnc_motion::orchestrator::MotionOrchestrator;

/// Control period used by every integration test [s].
pub const DT: f64 = 0.001;

pub fn axis_params(min: f64, max: f64) -> AxisParameters {
    AxisParameters {
        max_velocity: 200.0,
        max_acceleration: 2000.0,
        soft_limit_min: min,
        soft_limit_max: max,
        ..AxisParameters::default()
    }
}

/// Enabled X/Y/Z orchestrator with ±100 mm travel.
pub fn xyz_orchestrator() -> MotionOrchestrator {
    let mut mo = MotionOrchestrator::new(MotionConfig::default()).unwrap();
    for name in ["X", "Y", "Z"] {
        assert!(mo.add_axis(name, axis_params(-100.0, 100.0)));
    }
    assert!(mo.enable_all_axes());
    mo
}

/// Cycle until the orchestrator stops moving. Returns the cycle count.
pub fn run_to_completion(mo: &mut MotionOrchestrator, max_cycles: usize) -> usize {
    for cycle in 0..max_cycles {
        if !mo.is_moving() {
            return cycle;
        }
        mo.update(DT);
    }
    panic!("motion still active after {max_cycles} cycles");
}
