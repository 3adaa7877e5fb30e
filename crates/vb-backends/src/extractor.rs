//! Variable extraction for reaction-network models.

use vb_core::{ExtractedVariables, Variable};
use vb_sim::{Algorithm, BackendError, ModelSource, SimulationKind, VariableExtractor};

use crate::model::{Locator, ReactionNetwork};

/// Reports the inputs and outputs a reaction network exposes for a
/// simulation kind.
///
/// Time courses take initial concentrations and rate constants and report
/// time plus species dynamics. Steady states take flux bounds and report
/// fluxes plus the objective value.
#[derive(Debug, Clone, Default)]
pub struct ReactionNetworkExtractor;

impl ReactionNetworkExtractor {
    pub fn variables(model: &ReactionNetwork, kind: SimulationKind) -> ExtractedVariables {
        let variable = |id: String, locator: Locator| Variable::new(id, locator.target(model));
        let mut vars = ExtractedVariables::default();

        match kind {
            SimulationKind::UniformTimeCourse | SimulationKind::OneStep => {
                for (i, s) in model.species.iter().enumerate() {
                    vars.inputs.push(
                        variable(format!("init_conc_species_{}", s.id), Locator::InitialConcentration(i))
                            .with_initial_value(s.initial_concentration),
                    );
                }
                for (j, r) in model.reactions.iter().enumerate() {
                    vars.inputs.push(
                        variable(format!("value_parameter_{}_k", r.id), Locator::RateConstant(j))
                            .with_initial_value(r.rate_constant),
                    );
                }
                vars.outputs.push(variable("time".to_string(), Locator::Time));
                for (i, s) in model.species.iter().enumerate() {
                    vars.outputs.push(
                        variable(format!("dynamics_species_{}", s.id), Locator::Concentration(i))
                            .with_name(s.id.clone()),
                    );
                }
            }
            SimulationKind::SteadyState => {
                for (j, r) in model.reactions.iter().enumerate() {
                    vars.inputs.push(
                        variable(format!("lower_bound_reaction_{}", r.id), Locator::LowerBound(j))
                            .with_initial_value(r.lower_bound),
                    );
                    vars.inputs.push(
                        variable(format!("upper_bound_reaction_{}", r.id), Locator::UpperBound(j))
                            .with_initial_value(r.upper_bound),
                    );
                }
                for (j, r) in model.reactions.iter().enumerate() {
                    vars.outputs.push(
                        variable(format!("flux_reaction_{}", r.id), Locator::Flux(j))
                            .with_name(r.id.clone()),
                    );
                }
                vars.outputs.push(variable("objective".to_string(), Locator::Objective));
            }
        }
        vars
    }
}

impl VariableExtractor for ReactionNetworkExtractor {
    fn extract(
        &self,
        model: &ModelSource,
        kind: SimulationKind,
        _algorithm: &Algorithm,
    ) -> Result<ExtractedVariables, BackendError> {
        let network = ReactionNetwork::load(&model.source)?;
        Ok(Self::variables(&network, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> ReactionNetwork {
        ReactionNetwork::from_yaml_str(
            r#"
species:
  - {id: A, initial_concentration: 2.0}
  - {id: B}
reactions:
  - {id: r1, reactants: {A: 1}, products: {B: 1}, rate_constant: 0.5, lower_bound: -1, upper_bound: 3}
"#,
        )
        .unwrap()
    }

    #[test]
    fn time_course_variables() {
        let vars = ReactionNetworkExtractor::variables(&network(), SimulationKind::UniformTimeCourse);
        let inputs: Vec<&str> = vars.input_ids().collect();
        let outputs: Vec<&str> = vars.output_ids().collect();
        assert_eq!(inputs, ["init_conc_species_A", "init_conc_species_B", "value_parameter_r1_k"]);
        assert_eq!(outputs, ["time", "dynamics_species_A", "dynamics_species_B"]);
        assert_eq!(vars.input("init_conc_species_A").unwrap().initial_value, Some(2.0));
        assert!(vars.inputs[0].target.ends_with("@initialConcentration"));
    }

    #[test]
    fn steady_state_variables() {
        let vars = ReactionNetworkExtractor::variables(&network(), SimulationKind::SteadyState);
        let inputs: Vec<&str> = vars.input_ids().collect();
        assert_eq!(inputs, ["lower_bound_reaction_r1", "upper_bound_reaction_r1"]);
        assert_eq!(vars.input("upper_bound_reaction_r1").unwrap().initial_value, Some(3.0));
        let outputs: Vec<&str> = vars.output_ids().collect();
        assert_eq!(outputs, ["flux_reaction_r1", "objective"]);
    }
}
