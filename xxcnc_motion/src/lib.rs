//! # XXCNC Motion Core
//!
//! Converts motion commands into time-quantized setpoints and drives
//! simulated axes toward them at a fixed interpolation period.
//!
//! ## Layers
//!
//! 1. **planning**: trapezoidal velocity profiles, linear and circular
//!    path sampling, Douglas–Peucker simplification
//! 2. **quantizer**: thread-safe setpoint queue resampled to the control period
//! 3. **servo**: per-axis state machine with soft-limit enforcement
//! 4. **orchestrator**: multi-axis coordination and safety stop
//! 5. **cycle**: fixed-period runner publishing to the status board
//!
//! Feed rates are mm/min at the API boundary; velocities and accelerations
//! are mm/s and mm/s² everywhere else.

pub mod config;
pub mod cycle;
pub mod orchestrator;
pub mod planning;
pub mod quantizer;
pub mod servo;
pub mod status;
