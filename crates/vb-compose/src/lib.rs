//! vb-compose: a minimal composition engine for simulator processes.
//!
//! Contains:
//! - store / topology (named stores and per-port wiring with renames)
//! - engine (fixed-tick scheduler applying accumulate/set updates)
//! - timeseries (recorded emitted variables, CSV/JSON export)
//! - mappings (initial-value to dynamics id mapping)
//! - composer (ODE -> FBA pipeline, experiment-file builder)

pub mod composer;
pub mod engine;
pub mod error;
pub mod hosted;
pub mod mappings;
pub mod store;
pub mod timeseries;
pub mod topology;

pub use composer::{
    FBA_PROCESS, FBA_STORE, ODE_PROCESS, SPECIES_STORE, build_engine, load_experiment, ode_fba,
    run_experiment,
};
pub use engine::Engine;
pub use error::{ComposeError, ComposeResult};
pub use hosted::Hosted;
pub use mappings::init_to_dynamics_map;
pub use store::{StoreValues, Stores};
pub use timeseries::Timeseries;
pub use topology::{PortWiring, Topology};
