//! vb-ports: partition a simulator's native variables into named ports.
//!
//! Provides:
//! - Port declarations (`PortDecl`) as written in configuration
//! - The assignment routine that turns declarations plus the native variable
//!   list into an immutable `PortAssignment`
//!
//! # Example
//!
//! ```
//! use vb_ports::{Direction, PortDecl, assign_ports};
//!
//! let native = ["S1", "S2", "k1"];
//! let declared = vec![PortDecl::new("species", ["S1", "S2"])];
//! let ports = assign_ports(native, &declared, "inputs", Direction::Input).unwrap();
//!
//! assert_eq!(ports.port_names(), ["species", "inputs"]);
//! assert_eq!(ports.variables("inputs").unwrap(), ["k1"]);
//! ```

pub mod assign;
pub mod error;

pub use assign::{
    Direction, PortAssignment, PortDecl, PortVariables, assign_ports, assign_variables,
};
pub use error::{PortError, PortResult};
