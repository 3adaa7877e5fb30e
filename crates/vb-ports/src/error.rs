//! Port assignment errors.

use thiserror::Error;

use crate::assign::Direction;

pub type PortResult<T> = Result<T, PortError>;

/// Construction-time errors raised while assigning variables to ports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    /// A declared port lists a variable the model does not expose.
    #[error("Port '{port}' lists unknown {direction} variable '{id}'; available {direction}s: {available:?}")]
    UnknownVariable {
        id: String,
        port: String,
        direction: Direction,
        available: Vec<String>,
    },

    /// A variable is listed more than once across declared ports.
    #[error("{direction} variable '{id}' listed in port '{port}' is already assigned to port '{first_port}'")]
    DuplicateAssignment {
        id: String,
        port: String,
        first_port: String,
        direction: Direction,
    },

    /// Two ports share a name.
    #[error("Duplicate port name '{port}'")]
    DuplicatePortName { port: String },

    #[error("Port names must not be empty")]
    EmptyPortName,
}
