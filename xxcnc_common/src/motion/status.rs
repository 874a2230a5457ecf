//! Point-in-time status snapshots.
//!
//! Fixed capacity, no heap: the control loop fills one per publish without
//! allocating, readers get a `Clone` they can serialize at leisure.

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use super::error::AxisFault;
use super::state::{AxisState, MotionState};
use crate::consts::{AXIS_NAME_LEN, MAX_AXES};

/// Inline axis name.
pub type AxisName = String<AXIS_NAME_LEN>;

/// Build an inline axis name. `None` if it exceeds `AXIS_NAME_LEN` bytes.
pub fn axis_name(name: &str) -> Option<AxisName> {
    let mut s = AxisName::new();
    s.push_str(name).ok()?;
    Some(s)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisStatus {
    pub name: AxisName,
    pub state: AxisState,
    pub position: f64,
    pub velocity: f64,
    pub target_position: f64,
    pub faults: AxisFault,
    pub referenced: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionStatus {
    pub state: MotionState,
    pub moving: bool,
    /// Fraction of the current plan executed, in `[0, 1]`.
    pub progress: f64,
    pub queue_depth: usize,
    pub interpolation_period_ms: u32,
    /// Control cycle counter at capture time.
    pub cycle: u64,
    pub axes: Vec<AxisStatus, MAX_AXES>,
}

impl MotionStatus {
    pub fn axis(&self, name: &str) -> Option<&AxisStatus> {
        self.axes.iter().find(|a| a.name.as_str() == name)
    }

    /// True if any axis carries a fault flag.
    pub fn has_faults(&self) -> bool {
        self.axes.iter().any(|a| !a.faults.is_empty())
    }
}
