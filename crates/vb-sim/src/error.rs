//! Error types for simulator wrapping.

use thiserror::Error;
use vb_ports::PortError;

use crate::backend::BackendError;
use crate::task::{ModelLanguage, TimeWindow};

/// Errors raised while building or stepping a simulator.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Unknown simulator '{name}' (available: {})", .available.join(", "))]
    UnknownSimulator { name: String, available: Vec<String> },

    #[error("No variable extractor registered for model language '{language}'")]
    NoExtractor { language: ModelLanguage },

    #[error("Variable extraction failed")]
    Extraction {
        #[source]
        source: BackendError,
    },

    #[error("Preprocessing failed")]
    Preprocess {
        #[source]
        source: BackendError,
    },

    #[error("Simulation execution failed over {window}")]
    Execution {
        window: TimeWindow,
        #[source]
        source: BackendError,
    },

    #[error("Simulator returned no result for output '{id}'")]
    MissingResult { id: String },

    #[error("Result index {index} out of range for time course of length {len}")]
    ResultIndex { index: isize, len: usize },

    #[error("Unknown input variable '{id}'")]
    UnknownInput { id: String },

    #[error("Current state has no value for '{id}' in port '{port}'")]
    MissingState { port: String, id: String },

    #[error("Invalid config: {what}")]
    InvalidConfig { what: String },

    #[error(transparent)]
    Ports(#[from] PortError),
}

pub type SimResult<T> = Result<T, SimError>;
