//! Experiment validation logic.

use std::collections::HashSet;

use vb_flux::{BoundTarget, FluxError};

use crate::schema::{Experiment, LATEST_VERSION, ProcessKind};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_experiment(experiment: &Experiment) -> Result<(), ValidationError> {
    if experiment.version == 0 || experiment.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: experiment.version,
        });
    }
    if !experiment.time_step.is_finite() || experiment.time_step <= 0.0 {
        return Err(invalid("time_step", experiment.time_step, "must be finite and > 0"));
    }
    if !experiment.total_time.is_finite() || experiment.total_time < 0.0 {
        return Err(invalid("total_time", experiment.total_time, "must be finite and >= 0"));
    }

    let mut process_ids = HashSet::new();
    for process in &experiment.processes {
        if process.id.is_empty() {
            return Err(invalid("process id", "", "must not be empty"));
        }
        if !process_ids.insert(process.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: process.id.clone(),
                context: "processes".to_string(),
            });
        }
        for config in process.kind.simulator_configs() {
            config
                .validate()
                .map_err(|e| invalid(format!("{}.config", process.id), &config.simulator, e.to_string()))?;
        }
        if let ProcessKind::FluxBounds { bounds, .. } = &process.kind {
            validate_bounds(&process.id, bounds)?;
        }
    }

    let mut wired = HashSet::new();
    for wiring in &experiment.topology {
        if !process_ids.contains(wiring.process.as_str()) {
            return Err(ValidationError::MissingReference {
                id: wiring.process.clone(),
                context: "topology process".to_string(),
            });
        }
        if wiring.port.is_empty() || wiring.store.is_empty() {
            return Err(invalid(
                format!("{}.topology", wiring.process),
                format!("{} -> {}", wiring.port, wiring.store),
                "port and store must not be empty",
            ));
        }
        if !wired.insert((wiring.process.as_str(), wiring.port.as_str())) {
            return Err(ValidationError::DuplicateId {
                id: format!("{}.{}", wiring.process, wiring.port),
                context: "topology".to_string(),
            });
        }
    }

    for (store, values) in &experiment.initial_state {
        for (id, value) in values {
            if !value.is_finite() {
                return Err(invalid(format!("initial_state.{store}.{id}"), value, "must be finite"));
            }
        }
    }

    Ok(())
}

fn validate_bounds(process: &str, bounds: &vb_flux::FluxBoundsConfig) -> Result<(), ValidationError> {
    for (flux, target) in &bounds.flux_to_bound_map {
        if let BoundTarget::Range {
            proportional_range: [lo, hi],
            ..
        } = target
        {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(invalid(
                    format!("{process}.flux_to_bound_map.{flux}.proportional_range"),
                    format!("[{lo}, {hi}]"),
                    "must be finite",
                ));
            }
        }
    }
    bounds.validate().map_err(|e| match e {
        FluxError::Mapping { what } => invalid(format!("{process}.flux_to_bound_map"), "", what),
        other => invalid(format!("{process}.bounds"), "", other.to_string()),
    })
}
