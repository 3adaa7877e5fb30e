//! Reference in-process simulators over YAML reaction networks.
//!
//! Provides:
//! - `mass_action`: fixed-step ODE integration of mass-action kinetics
//! - `box_fba`: flux balance analysis with per-reaction box constraints
//! - A variable extractor for the `reaction_network` model language

pub mod box_fba;
pub mod extractor;
pub mod integrator;
pub mod mass_action;
pub mod model;

pub use box_fba::{BoxFbaBackend, FbaSolution, solve_box};
pub use extractor::ReactionNetworkExtractor;
pub use integrator::{ForwardEuler, Integrator, RK4, TransientModel};
pub use mass_action::{KISAO_EULER, KISAO_RK4, MassActionBackend, MassActionSystem};
pub use model::{Locator, Reaction, ReactionNetwork, Species};

use vb_sim::{BackendRegistry, ModelLanguage};

/// Register both reference backends and the reaction-network extractor.
pub fn register_reference_backends(registry: &mut BackendRegistry) {
    registry
        .register(MassActionBackend::default())
        .register(BoxFbaBackend)
        .register_extractor(ModelLanguage::ReactionNetwork, ReactionNetworkExtractor);
}

/// A registry holding only the reference backends.
pub fn reference_registry() -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    register_reference_backends(&mut registry);
    registry
}
