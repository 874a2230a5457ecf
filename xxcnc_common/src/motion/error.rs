//! Planning errors and axis fault flags.

use bitflags::bitflags;
use thiserror::Error;

/// Numeric input rejected before any geometry is computed.
///
/// Raised by the path generator, the interpolation period setter and axis
/// construction. Values are never clamped into range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl PlanError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

bitflags! {
    /// Reasons an axis entered `AxisState::Error`.
    ///
    /// Sticky until the axis is disabled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AxisFault: u8 {
        /// Predicted position below `soft_limit_min`.
        const SOFT_LIMIT_MIN = 0x01;
        /// Predicted position above `soft_limit_max`.
        const SOFT_LIMIT_MAX = 0x02;
        /// Velocity motion came within the braking margin of a limit.
        const SAFETY_MARGIN  = 0x04;
    }
}

impl AxisFault {
    /// Mask of the soft-limit flags.
    pub const LIMIT_MASK: Self = Self::from_bits_truncate(
        Self::SOFT_LIMIT_MIN.bits() | Self::SOFT_LIMIT_MAX.bits(),
    );

    #[inline]
    pub const fn is_limit(&self) -> bool {
        self.intersects(Self::LIMIT_MASK)
    }
}

impl Default for AxisFault {
    fn default() -> Self {
        Self::empty()
    }
}

impl serde::Serialize for AxisFault {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> serde::Deserialize<'de> for AxisFault {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}
