//! vb-project: experiment file format and validation.

use std::path::Path;

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_experiment};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn finish_load(mut experiment: Experiment, path: &Path) -> ProjectResult<Experiment> {
    if let Some(base) = path.parent() {
        experiment.resolve_paths(base);
    }
    validate_experiment(&experiment)?;
    Ok(experiment)
}

/// Load, resolve model paths against the file's directory, and validate.
pub fn load_yaml(path: &Path) -> ProjectResult<Experiment> {
    let content = std::fs::read_to_string(path)?;
    let experiment: Experiment = serde_yaml::from_str(&content)?;
    finish_load(experiment, path)
}

pub fn save_yaml(path: &Path, experiment: &Experiment) -> ProjectResult<()> {
    validate_experiment(experiment)?;
    let content = serde_yaml::to_string(experiment)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<Experiment> {
    let content = std::fs::read_to_string(path)?;
    let experiment: Experiment = serde_json::from_str(&content)?;
    finish_load(experiment, path)
}

pub fn save_json(path: &Path, experiment: &Experiment) -> ProjectResult<()> {
    validate_experiment(experiment)?;
    let content = serde_json::to_string_pretty(experiment)?;
    std::fs::write(path, content)?;
    Ok(())
}
