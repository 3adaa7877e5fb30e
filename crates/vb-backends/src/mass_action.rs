//! Mass-action ODE backend.

use std::collections::BTreeMap;

use tracing::debug;
use vb_core::{Real, Variable};
use vb_sim::{
    BackendConfig, BackendError, KISAO_CVODE, PreprocessedTask, RawResult, RawResults,
    SimulatorBackend, Task, TaskLog,
};

use crate::integrator::{ForwardEuler, RK4, TransientModel, advance};
use crate::model::{Locator, ReactionNetwork};

/// KiSAO id of the explicit fourth-order Runge-Kutta method.
pub const KISAO_RK4: &str = "KISAO_0000032";
/// KiSAO id of the forward Euler method.
pub const KISAO_EULER: &str = "KISAO_0000030";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Rk4,
    Euler,
}

impl Method {
    fn from_kisao(id: &str) -> Option<Self> {
        match id {
            KISAO_CVODE | KISAO_RK4 => Some(Method::Rk4),
            KISAO_EULER => Some(Method::Euler),
            _ => None,
        }
    }
}

struct Prepared {
    model: ReactionNetwork,
    locators: BTreeMap<String, Locator>,
    method: Method,
}

/// `dc/dt = S * v(c)` with `v_j = k_j * prod(c_s ^ nu_sj)` over reactants.
pub struct MassActionSystem {
    /// Per reaction: reactant (species, coefficient) pairs.
    reactants: Vec<Vec<(usize, Real)>>,
    /// Per reaction: net stoichiometry (species, products - reactants).
    net: Vec<Vec<(usize, Real)>>,
    rate_constants: Vec<Real>,
    n_species: usize,
}

impl MassActionSystem {
    /// Fails when a reaction names a species the network does not declare
    /// or when `rate_constants` does not hold one constant per reaction.
    pub fn new(model: &ReactionNetwork, rate_constants: Vec<Real>) -> Result<Self, BackendError> {
        if rate_constants.len() != model.reactions.len() {
            return Err(BackendError::InvalidModel {
                what: format!(
                    "{} rate constants for {} reactions",
                    rate_constants.len(),
                    model.reactions.len()
                ),
            });
        }

        let mut reactants = Vec::with_capacity(model.reactions.len());
        let mut net = Vec::with_capacity(model.reactions.len());
        for r in &model.reactions {
            let index = |id: &String| {
                model
                    .species_index(id)
                    .ok_or_else(|| BackendError::InvalidModel {
                        what: format!("reaction '{}' references unknown species '{id}'", r.id),
                    })
            };

            let mut terms = Vec::with_capacity(r.reactants.len());
            let mut change: BTreeMap<usize, Real> = BTreeMap::new();
            for (id, nu) in &r.reactants {
                let s = index(id)?;
                terms.push((s, *nu));
                *change.entry(s).or_default() -= nu;
            }
            for (id, nu) in &r.products {
                *change.entry(index(id)?).or_default() += nu;
            }
            reactants.push(terms);
            net.push(change.into_iter().filter(|(_, c)| *c != 0.0).collect());
        }
        Ok(Self {
            reactants,
            net,
            rate_constants,
            n_species: model.species.len(),
        })
    }

    /// Reaction rates at concentrations `c`.
    pub fn rates(&self, c: &[Real]) -> Vec<Real> {
        self.reactants
            .iter()
            .zip(&self.rate_constants)
            .map(|(reactants, k)| {
                reactants
                    .iter()
                    .fold(*k, |acc, (s, nu)| acc * c[*s].powf(*nu))
            })
            .collect()
    }
}

impl TransientModel for MassActionSystem {
    type State = Vec<Real>;

    fn rhs(&self, t: f64, x: &Vec<Real>) -> Result<Vec<Real>, BackendError> {
        let mut dx = vec![0.0; self.n_species];
        for (rate, net) in self.rates(x).into_iter().zip(&self.net) {
            for (s, coefficient) in net {
                dx[*s] += coefficient * rate;
            }
        }
        if dx.iter().any(|v| !v.is_finite()) {
            return Err(BackendError::Numerical {
                what: format!("non-finite derivative at t = {t}"),
            });
        }
        Ok(dx)
    }

    fn add(&self, a: &Vec<Real>, b: &Vec<Real>) -> Vec<Real> {
        a.iter().zip(b).map(|(x, y)| x + y).collect()
    }

    fn scale(&self, a: &Vec<Real>, scale: f64) -> Vec<Real> {
        a.iter().map(|x| x * scale).collect()
    }
}

/// Integrates a reaction network over each task window.
///
/// Time courses hold `number_of_points + 1` samples, the first at the window
/// start.
#[derive(Debug, Clone)]
pub struct MassActionBackend {
    /// Longest internal integration step.
    pub max_step: Real,
}

impl Default for MassActionBackend {
    fn default() -> Self {
        Self { max_step: 0.01 }
    }
}

impl MassActionBackend {
    pub const NAME: &'static str = "mass_action";

    fn prepared<'a>(&self, handle: &'a PreprocessedTask) -> Result<&'a Prepared, BackendError> {
        handle
            .downcast_ref::<Prepared>()
            .ok_or_else(|| BackendError::ForeignHandle {
                backend: Self::NAME.to_string(),
            })
    }
}

impl SimulatorBackend for MassActionBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn preprocess(
        &self,
        task: &Task,
        outputs: &[Variable],
        _config: &BackendConfig,
    ) -> Result<PreprocessedTask, BackendError> {
        let kind = task.simulation.kind;
        if !(kind.is_time_course() || kind.is_deriver()) {
            return Err(BackendError::Unsupported {
                what: format!("{kind} simulations"),
            });
        }
        let method = Method::from_kisao(&task.simulation.algorithm.kisao_id).ok_or_else(|| {
            BackendError::Unsupported {
                what: format!("algorithm {}", task.simulation.algorithm.kisao_id),
            }
        })?;
        if !self.max_step.is_finite() || self.max_step <= 0.0 {
            return Err(BackendError::Unsupported {
                what: format!("max_step {}", self.max_step),
            });
        }

        let model = ReactionNetwork::load(&task.model.source)?;
        let locators = model.locators();
        for output in outputs {
            match locators.get(&output.target) {
                Some(Locator::Time | Locator::Concentration(_)) => {}
                _ => {
                    return Err(BackendError::UnknownTarget {
                        target: output.target.clone(),
                    });
                }
            }
        }

        debug!(model = %model.name, species = model.species.len(), reactions = model.reactions.len(), ?method, "mass-action model loaded");
        Ok(PreprocessedTask::new(Prepared {
            model,
            locators,
            method,
        }))
    }

    fn execute(
        &self,
        task: &Task,
        outputs: &[Variable],
        preprocessed: &PreprocessedTask,
        config: &BackendConfig,
    ) -> Result<(RawResults, TaskLog), BackendError> {
        let prepared = self.prepared(preprocessed)?;
        let model = &prepared.model;

        let mut concentrations: Vec<Real> =
            model.species.iter().map(|s| s.initial_concentration).collect();
        let mut rate_constants: Vec<Real> = model.reactions.iter().map(|r| r.rate_constant).collect();
        for change in &task.changes {
            match prepared.locators.get(&change.target) {
                Some(Locator::InitialConcentration(i)) => concentrations[*i] = change.new_value,
                Some(Locator::RateConstant(j)) => rate_constants[*j] = change.new_value,
                _ => {
                    return Err(BackendError::UnknownTarget {
                        target: change.target.clone(),
                    });
                }
            }
        }

        let system = MassActionSystem::new(model, rate_constants)?;
        let window = task.simulation.window;
        let n = task.simulation.number_of_points.max(1);
        let times: Vec<Real> = (0..=n)
            .map(|i| window.start + window.duration() * i as Real / n as Real)
            .collect();

        let mut samples = Vec::with_capacity(times.len());
        samples.push(concentrations);
        for pair in times.windows(2) {
            let last = &samples[samples.len() - 1];
            let next = match prepared.method {
                Method::Rk4 => advance(&RK4, &system, pair[0], pair[1], last, self.max_step)?,
                Method::Euler => advance(&ForwardEuler, &system, pair[0], pair[1], last, self.max_step)?,
            };
            samples.push(next);
        }

        let mut results = RawResults::new();
        for output in outputs {
            let series = match prepared.locators.get(&output.target) {
                Some(Locator::Time) => times.clone(),
                Some(Locator::Concentration(i)) => samples.iter().map(|x| x[*i]).collect(),
                _ => {
                    return Err(BackendError::UnknownTarget {
                        target: output.target.clone(),
                    });
                }
            };
            results.insert(output.id.clone(), RawResult::TimeCourse(series));
        }

        let mut log = TaskLog::default();
        if config.collect_log {
            log.messages.push(format!(
                "integrated {} species over {window} with {} output points",
                model.species.len(),
                n
            ));
        }
        Ok((results, log))
    }
}
