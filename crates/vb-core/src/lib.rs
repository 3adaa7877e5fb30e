//! vb-core: shared vocabulary for vivbridge.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - units (uom-backed unit expressions and quantities)
//! - variable (model variables as reported by a variable extractor)
//! - process (the contract exposed to a hosting composition engine)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod process;
pub mod units;
pub mod variable;

pub use error::{CoreError, CoreResult, UnitError};
pub use numeric::*;
pub use process::{
    PortSchema, PortUpdate, PortValues, Process, Schema, State, Update, UpdatePolicy,
    VariableSchema,
};
pub use units::{Dimension, Quantity, Unit};
pub use variable::{ExtractedVariables, Namespace, Variable};
