//! vb-flux: couple a continuous producer's fluxes to flux-balance bounds.
//!
//! A `FluxBoundsConverter` wraps a `SimulatorProcess`, divides each flux
//! delta by the step interval, converts it to the bounds unit (falling back
//! to a mass/volume rescaling when needed) and writes either the value itself
//! or a sign-dependent upper/lower pair to a `set`-tagged bounds port.

pub mod config;
pub mod convert;
pub mod converter;
pub mod error;

pub use config::{BoundTarget, FluxBoundsConfig, QuantitySpec};
pub use convert::{BoundPair, UnitConverter, derive_bounds};
pub use converter::FluxBoundsConverter;
pub use error::{FluxError, FluxResult};
