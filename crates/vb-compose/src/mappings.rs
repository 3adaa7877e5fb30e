//! Id mappings between simulator inputs and their dynamic counterparts.

use std::collections::BTreeMap;

use vb_core::Variable;

const INITIAL_TARGETS: [&str; 2] = ["@initialConcentration", "@initialAmount"];
const INITIAL_PREFIXES: [&str; 2] = ["init_conc_", "init_amount_"];
const DYNAMICS_PREFIX: &str = "dynamics_";

/// Map initial-value input ids to the output ids tracking the same quantity.
///
/// Only inputs whose target ends in `@initialConcentration` or
/// `@initialAmount` are mapped; `init_conc_species_A` becomes
/// `dynamics_species_A`. Wiring an ODE's inputs through this rename makes
/// its inputs and outputs share store variables.
pub fn init_to_dynamics_map(inputs: &[Variable]) -> BTreeMap<String, String> {
    inputs
        .iter()
        .filter(|v| INITIAL_TARGETS.iter().any(|t| v.target.ends_with(t)))
        .filter_map(|v| {
            INITIAL_PREFIXES.iter().find_map(|prefix| {
                v.id
                    .strip_prefix(prefix)
                    .map(|rest| (v.id.clone(), format!("{DYNAMICS_PREFIX}{rest}")))
            })
        })
        .collect()
}
