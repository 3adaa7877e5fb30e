//! Error types for flux-to-bounds conversion.

use thiserror::Error;
use vb_core::{CoreError, Real, UnitError};
use vb_sim::SimError;

/// Errors raised while building or stepping a flux-bounds converter.
#[derive(Error, Debug)]
pub enum FluxError {
    #[error("Flux-to-bound mapping error: {what}")]
    Mapping { what: String },

    #[error("Cannot convert flux '{flux}' to bounds unit: {primary}{}", fallback_note(.fallback))]
    UnitConversion {
        flux: String,
        primary: UnitError,
        fallback: Option<UnitError>,
    },

    #[error("Interval must be finite and > 0 to derive bounds, got {interval}")]
    InvalidInterval { interval: Real },

    #[error("Invalid proportional range for flux '{flux}': [{lo}, {hi}]")]
    InvalidRange { flux: String, lo: Real, hi: Real },

    #[error("Bounds port '{port}' collides with a port of the wrapped process")]
    ReservedPort { port: String },

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<UnitError> for FluxError {
    fn from(e: UnitError) -> Self {
        FluxError::Core(CoreError::Unit(e))
    }
}

fn fallback_note(fallback: &Option<UnitError>) -> String {
    match fallback {
        Some(e) => format!("; mass/volume fallback: {e}"),
        None => String::new(),
    }
}

pub type FluxResult<T> = Result<T, FluxError>;
