//! Axis and orchestrator state enums.
//!
//! `#[repr(u8)]` so snapshots stay compact and can be passed around as raw
//! bytes by an external status layer.

use serde::{Deserialize, Serialize};

/// Per-axis lifecycle state. Exactly one is active per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AxisState {
    /// Power off, no motion accepted. Initial state.
    Disabled = 0,
    /// Enabled and holding position.
    Idle = 1,
    /// Executing a position or velocity command.
    Moving = 2,
    /// Running toward the home switch at `home_velocity`.
    Homing = 3,
    /// Soft-limit violation. Cleared only through disable.
    Error = 4,
}

impl AxisState {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disabled),
            1 => Some(Self::Idle),
            2 => Some(Self::Moving),
            3 => Some(Self::Homing),
            4 => Some(Self::Error),
            _ => None,
        }
    }

    /// True while the axis is commanding motion.
    #[inline]
    pub const fn is_in_motion(&self) -> bool {
        matches!(self, Self::Moving | Self::Homing)
    }
}

impl Default for AxisState {
    fn default() -> Self {
        Self::Disabled
    }
}

/// Coarse orchestrator state, for external status only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MotionState {
    Idle = 0,
    /// A move was accepted and its first setpoint issued.
    Moving = 1,
    /// Draining the interpolation queue.
    Interpolating = 2,
    /// A safety stop fired.
    Error = 3,
}

impl MotionState {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Moving),
            2 => Some(Self::Interpolating),
            3 => Some(Self::Error),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Moving | Self::Interpolating)
    }
}

impl Default for MotionState {
    fn default() -> Self {
        Self::Idle
    }
}
