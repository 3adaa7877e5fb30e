//! Flux balance analysis over box constraints.

use std::collections::BTreeMap;

use tracing::debug;
use vb_core::{Real, Variable};
use vb_sim::{
    BackendConfig, BackendError, KISAO_FBA, PreprocessedTask, RawResult, RawResults,
    SimulationKind, SimulatorBackend, Task, TaskLog,
};

use crate::model::{Locator, ReactionNetwork};

struct Prepared {
    model: ReactionNetwork,
    locators: BTreeMap<String, Locator>,
}

/// Optimal solution of `max c·v` subject to `lb <= v <= ub`.
#[derive(Debug, Clone, PartialEq)]
pub struct FbaSolution {
    pub fluxes: Vec<Real>,
    pub objective: Real,
}

/// Solve the box-constrained problem reaction by reaction.
///
/// Each flux sits at the bound favoured by its objective coefficient; fluxes
/// with a zero coefficient take the feasible value closest to zero.
pub fn solve_box(
    objective: &[Real],
    lower: &[Real],
    upper: &[Real],
) -> Result<FbaSolution, BackendError> {
    let mut fluxes = Vec::with_capacity(objective.len());
    for (j, ((c, lb), ub)) in objective.iter().zip(lower).zip(upper).enumerate() {
        if !(lb <= ub) {
            return Err(BackendError::Numerical {
                what: format!("infeasible: reaction {j} has lower bound {lb} above upper bound {ub}"),
            });
        }
        let v = if *c > 0.0 {
            *ub
        } else if *c < 0.0 {
            *lb
        } else {
            0.0_f64.clamp(*lb, *ub)
        };
        fluxes.push(v);
    }
    let objective = objective.iter().zip(&fluxes).map(|(c, v)| c * v).sum();
    Ok(FbaSolution { fluxes, objective })
}

/// Steady-state backend reporting optimal fluxes and the objective value.
#[derive(Debug, Clone, Default)]
pub struct BoxFbaBackend;

impl BoxFbaBackend {
    pub const NAME: &'static str = "box_fba";
}

impl SimulatorBackend for BoxFbaBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn preprocess(
        &self,
        task: &Task,
        outputs: &[Variable],
        _config: &BackendConfig,
    ) -> Result<PreprocessedTask, BackendError> {
        if task.simulation.kind != SimulationKind::SteadyState {
            return Err(BackendError::Unsupported {
                what: format!("{} simulations", task.simulation.kind),
            });
        }
        if task.simulation.algorithm.kisao_id != KISAO_FBA {
            return Err(BackendError::Unsupported {
                what: format!("algorithm {}", task.simulation.algorithm.kisao_id),
            });
        }

        let model = ReactionNetwork::load(&task.model.source)?;
        let locators = model.locators();
        for output in outputs {
            match locators.get(&output.target) {
                Some(Locator::Flux(_) | Locator::Objective) => {}
                _ => {
                    return Err(BackendError::UnknownTarget {
                        target: output.target.clone(),
                    });
                }
            }
        }

        debug!(model = %model.name, reactions = model.reactions.len(), "flux balance model loaded");
        Ok(PreprocessedTask::new(Prepared { model, locators }))
    }

    fn execute(
        &self,
        task: &Task,
        outputs: &[Variable],
        preprocessed: &PreprocessedTask,
        config: &BackendConfig,
    ) -> Result<(RawResults, TaskLog), BackendError> {
        let prepared = preprocessed
            .downcast_ref::<Prepared>()
            .ok_or_else(|| BackendError::ForeignHandle {
                backend: Self::NAME.to_string(),
            })?;
        let reactions = &prepared.model.reactions;

        let objective: Vec<Real> = reactions.iter().map(|r| r.objective).collect();
        let mut lower: Vec<Real> = reactions.iter().map(|r| r.lower_bound).collect();
        let mut upper: Vec<Real> = reactions.iter().map(|r| r.upper_bound).collect();
        for change in &task.changes {
            match prepared.locators.get(&change.target) {
                Some(Locator::LowerBound(j)) => lower[*j] = change.new_value,
                Some(Locator::UpperBound(j)) => upper[*j] = change.new_value,
                _ => {
                    return Err(BackendError::UnknownTarget {
                        target: change.target.clone(),
                    });
                }
            }
        }

        let solution = solve_box(&objective, &lower, &upper)?;

        let mut results = RawResults::new();
        for output in outputs {
            let value = match prepared.locators.get(&output.target) {
                Some(Locator::Flux(j)) => solution.fluxes[*j],
                Some(Locator::Objective) => solution.objective,
                _ => {
                    return Err(BackendError::UnknownTarget {
                        target: output.target.clone(),
                    });
                }
            };
            results.insert(output.id.clone(), RawResult::Scalar(value));
        }

        let mut log = TaskLog::default();
        if config.collect_log {
            log.messages
                .push(format!("objective value {}", solution.objective));
        }
        Ok((results, log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fluxes_sit_on_favoured_bounds() {
        let solution = solve_box(&[1.0, -2.0, 0.0, 0.0], &[-10.0, -3.0, 2.0, -5.0], &[10.0, 4.0, 6.0, 5.0])
            .unwrap();
        assert_eq!(solution.fluxes, vec![10.0, -3.0, 2.0, 0.0]);
        assert_eq!(solution.objective, 10.0 + 6.0);
    }

    #[test]
    fn crossed_bounds_are_infeasible() {
        assert!(solve_box(&[1.0], &[1.0], &[0.0]).is_err());
    }
}
