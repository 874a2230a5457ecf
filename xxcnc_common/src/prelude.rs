//! Common re-exports.
//!
//! ```rust
//! use xxcnc_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::motion::config::{AxisConfig, MachineConfig, MotionConfig};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{MAX_AXES, MOTION_EPSILON};

// ─── Motion Types ───────────────────────────────────────────────────
pub use crate::motion::error::{AxisFault, PlanError};
pub use crate::motion::geometry::Point3D;
pub use crate::motion::params::{AxisParameters, InterpolationParams};
pub use crate::motion::state::{AxisState, MotionState};
pub use crate::motion::status::{AxisStatus, MotionStatus};
