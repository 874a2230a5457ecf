//! Motion core shared types.
//!
//! Everything the planner, the interpolation queue, the axis servo and any
//! external status consumer need to agree on lives here: geometry, kinematic
//! parameters, state enums, fault flags, status snapshots and the machine
//! configuration schema.

pub mod config;
pub mod error;
pub mod geometry;
pub mod params;
pub mod state;
pub mod status;
