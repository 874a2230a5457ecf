//! Machine file loading and validation.
//!
//! Parses `MachineConfig` via the common `ConfigLoader`, then validates:
//! shared fields, `[motion]` bounds, axis count, axis name uniqueness and
//! length, and every axis' kinematic parameters.

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;
use tracing::info;
use xxcnc_common::config::{ConfigError, ConfigLoader};
use xxcnc_common::consts::{AXIS_NAME_LEN, MAX_AXES};
use xxcnc_common::motion::config::MachineConfig;

use crate::orchestrator::MotionOrchestrator;

#[derive(Debug, Error)]
pub enum MachineConfigError {
    #[error(transparent)]
    Load(#[from] ConfigError),

    #[error("config validation: {0}")]
    Validation(String),

    #[error("axis {axis}: {reason}")]
    Axis { axis: String, reason: String },
}

/// Load and validate the machine file at `path`.
pub fn load_config(path: &Path) -> Result<MachineConfig, MachineConfigError> {
    let config = MachineConfig::load(path)?;
    validate_machine_config(&config)?;
    info!(
        "loaded {} ({} axes, {} ms period)",
        path.display(),
        config.axes.len(),
        config.motion.interpolation_period_ms
    );
    Ok(config)
}

/// Load and validate from a TOML string (for testing).
pub fn load_config_from_str(content: &str) -> Result<MachineConfig, MachineConfigError> {
    let config = MachineConfig::load_str(content)?;
    validate_machine_config(&config)?;
    Ok(config)
}

pub fn validate_machine_config(config: &MachineConfig) -> Result<(), MachineConfigError> {
    config.shared.validate()?;
    config
        .motion
        .validate()
        .map_err(MachineConfigError::Validation)?;

    if config.axes.len() > MAX_AXES {
        return Err(MachineConfigError::Validation(format!(
            "{} axes configured, at most {MAX_AXES} supported",
            config.axes.len()
        )));
    }

    let mut seen = HashSet::new();
    for axis in &config.axes {
        if axis.name.is_empty() || axis.name.len() > AXIS_NAME_LEN {
            return Err(MachineConfigError::Axis {
                axis: axis.name.clone(),
                reason: format!("name must be 1..={AXIS_NAME_LEN} bytes"),
            });
        }
        if !seen.insert(axis.name.as_str()) {
            return Err(MachineConfigError::Axis {
                axis: axis.name.clone(),
                reason: "duplicate name".to_string(),
            });
        }
        axis.params
            .validate()
            .map_err(|e| MachineConfigError::Axis {
                axis: axis.name.clone(),
                reason: e.to_string(),
            })?;
    }
    Ok(())
}

/// Build an orchestrator with every configured axis registered.
pub fn build_orchestrator(config: &MachineConfig) -> Result<MotionOrchestrator, MachineConfigError> {
    let mut orchestrator = MotionOrchestrator::new(config.motion.clone())
        .map_err(|e| MachineConfigError::Validation(e.to_string()))?;
    for axis in &config.axes {
        if !orchestrator.add_axis(&axis.name, axis.params) {
            return Err(MachineConfigError::Axis {
                axis: axis.name.clone(),
                reason: "rejected by orchestrator".to_string(),
            });
        }
    }
    Ok(orchestrator)
}
