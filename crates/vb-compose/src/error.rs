//! Error types for the composition engine.

use vb_core::Real;

/// Engine error type wrapping every lower crate's error.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("Unknown process: {0}")]
    UnknownProcess(String),

    #[error("Duplicate process name: {0}")]
    DuplicateProcess(String),

    #[error("Unknown store '{store}' (available: {available:?})")]
    UnknownStore {
        store: String,
        available: Vec<String>,
    },

    #[error("Unknown variable '{variable}' in store '{store}'")]
    UnknownVariable { store: String, variable: String },

    #[error("Wiring error for {process}.{port}: {what}")]
    Wiring {
        process: String,
        port: String,
        what: String,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Process '{process}' failed at t={time}: {source}")]
    Process {
        process: String,
        time: Real,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Sim(#[from] vb_sim::SimError),

    #[error(transparent)]
    Flux(#[from] vb_flux::FluxError),

    #[error(transparent)]
    Project(#[from] vb_project::ProjectError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ComposeResult<T> = Result<T, ComposeError>;
