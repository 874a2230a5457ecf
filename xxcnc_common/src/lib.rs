//! XXCNC Common Library
//!
//! Shared value types, constants and configuration loading for the XXCNC
//! workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Limits, tolerances and defaults
//! - [`motion`] - Geometry, kinematic parameters, states, faults, status snapshots
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use xxcnc_common::prelude::*;
//!
//! let a = Point3D::new(0.0, 0.0, 0.0);
//! let b = Point3D::new(3.0, 4.0, 0.0);
//! assert_eq!(a.distance_to(b), 5.0);
//! ```

pub mod config;
pub mod consts;
pub mod motion;
pub mod prelude;
