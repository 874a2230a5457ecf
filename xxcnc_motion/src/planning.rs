//! Geometric path generation and velocity profiling.
//!
//! Pure functions over value types: no state survives a call. The
//! interpolation queue ([`crate::quantizer`]) is the only consumer on the
//! control path.
//!
//! - [`profile`] - Analytical trapezoidal velocity profile
//! - [`path`] - Linear and circular path generation
//! - [`simplify`] - Smoothing and Douglas–Peucker simplification

pub mod path;
pub mod profile;
pub mod simplify;

pub use path::PathGenerator;
pub use profile::TrapezoidProfile;
