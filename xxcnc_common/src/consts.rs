//! System-wide constants for the XXCNC workspace.
//!
//! Single source of truth for numeric limits, tolerances and defaults.
//! Imported by all crates.

use static_assertions::const_assert;

/// Maximum number of axes managed by one orchestrator.
pub const MAX_AXES: usize = 16;

/// Maximum axis name length in bytes (status snapshots store names inline).
pub const AXIS_NAME_LEN: usize = 15;

/// Default interpolation (control) period in milliseconds.
pub const DEFAULT_INTERPOLATION_PERIOD_MS: u32 = 1;

/// Default sample period of the geometric velocity profile [s] (10 ms).
pub const DEFAULT_PROFILE_SAMPLE_PERIOD_S: f64 = 0.010;

/// Default Douglas–Peucker tolerance per unit of feed rate [mm per mm/min].
pub const DEFAULT_SIMPLIFY_TOLERANCE_FACTOR: f64 = 1e-5;

/// Default soft-limit safety margin multiplier applied to `|v|·dt`.
pub const DEFAULT_LIMIT_MARGIN_FACTOR: f64 = 2.0;

/// Geometric coincidence tolerance [mm].
pub const GEOMETRY_EPSILON: f64 = 1e-6;

/// Axis settle tolerance for position, velocity and progress checks.
pub const MOTION_EPSILON: f64 = 1e-3;

/// Distance kept between the clamped position and a violated soft limit [mm].
pub const SOFT_LIMIT_BACKOFF: f64 = 0.1;

/// Seconds per minute, for feed rate (mm/min) ↔ velocity (mm/s) conversion.
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Upper bound on geometric samples per planned path.
pub const MAX_PROFILE_SAMPLES: usize = 100_000;

/// Upper bound on setpoints queued by one plan.
pub const MAX_QUEUE_POINTS: usize = 1_000_000;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/machine.toml";

const_assert!(MAX_AXES > 0 && MAX_AXES <= 64);
const_assert!(AXIS_NAME_LEN >= 1);
const_assert!(MAX_PROFILE_SAMPLES <= MAX_QUEUE_POINTS);
