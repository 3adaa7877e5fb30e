//! Simulation task descriptor.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use vb_core::{Namespace, Real};

/// KiSAO id of CVODE, the default time-course integrator.
pub const KISAO_CVODE: &str = "KISAO_0000019";
/// KiSAO id of flux balance analysis.
pub const KISAO_FBA: &str = "KISAO_0000437";

/// What kind of result a simulation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationKind {
    /// Continuous time course; results are sequences over output points.
    UniformTimeCourse,
    /// Steady state; results are scalars.
    SteadyState,
    /// A single step recomputed from the current inputs.
    OneStep,
}

impl SimulationKind {
    pub fn is_time_course(self) -> bool {
        matches!(self, SimulationKind::UniformTimeCourse)
    }

    pub fn is_deriver(self) -> bool {
        matches!(self, SimulationKind::OneStep)
    }

    pub fn default_algorithm(self) -> &'static str {
        match self {
            SimulationKind::UniformTimeCourse | SimulationKind::OneStep => KISAO_CVODE,
            SimulationKind::SteadyState => KISAO_FBA,
        }
    }
}

impl fmt::Display for SimulationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationKind::UniformTimeCourse => write!(f, "uniform_time_course"),
            SimulationKind::SteadyState => write!(f, "steady_state"),
            SimulationKind::OneStep => write!(f, "one_step"),
        }
    }
}

/// Model description language, used to pick a variable extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelLanguage {
    Sbml,
    CellMl,
    Bngl,
    Rba,
    Xpp,
    /// YAML reaction network understood by the reference backends.
    ReactionNetwork,
}

impl fmt::Display for ModelLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ModelLanguage::Sbml => "sbml",
            ModelLanguage::CellMl => "cell_ml",
            ModelLanguage::Bngl => "bngl",
            ModelLanguage::Rba => "rba",
            ModelLanguage::Xpp => "xpp",
            ModelLanguage::ReactionNetwork => "reaction_network",
        };
        write!(f, "{tag}")
    }
}

/// Where a model lives and how it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSource {
    pub source: PathBuf,
    pub language: ModelLanguage,
}

/// Numerical method selector (a KiSAO term).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Algorithm {
    pub kisao_id: String,
}

impl Algorithm {
    pub fn new(kisao_id: impl Into<String>) -> Self {
        Self {
            kisao_id: kisao_id.into(),
        }
    }
}

/// Simulated time interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Real,
    pub end: Real,
}

impl TimeWindow {
    pub fn new(start: Real, interval: Real) -> Self {
        Self {
            start,
            end: start + interval,
        }
    }

    pub fn duration(&self) -> Real {
        self.end - self.start
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Simulation settings carried by a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub kind: SimulationKind,
    pub algorithm: Algorithm,
    pub window: TimeWindow,
    /// Output points after the window start (time courses only).
    pub number_of_points: usize,
}

/// One pending change to a model quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelChange {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Namespace>,
    pub new_value: Real,
}

/// Everything a backend needs to run one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub model: ModelSource,
    pub simulation: Simulation,
    #[serde(default)]
    pub changes: Vec<ModelChange>,
}

impl Task {
    pub fn new(model: ModelSource, simulation: Simulation) -> Self {
        Self {
            id: "task".to_string(),
            model,
            simulation,
            changes: Vec::new(),
        }
    }

    /// A fresh copy of this task over `window` carrying exactly `changes`.
    ///
    /// The template itself is never mutated.
    pub fn prepared(&self, window: TimeWindow, changes: Vec<ModelChange>) -> Task {
        let mut task = self.clone();
        task.simulation.window = window;
        task.changes = changes;
        task
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Task {
        Task::new(
            ModelSource {
                source: PathBuf::from("model.yaml"),
                language: ModelLanguage::ReactionNetwork,
            },
            Simulation {
                kind: SimulationKind::UniformTimeCourse,
                algorithm: Algorithm::new(KISAO_CVODE),
                window: TimeWindow::new(0.0, 1.0),
                number_of_points: 1,
            },
        )
    }

    #[test]
    fn prepared_replaces_changes_without_touching_template() {
        let task = template();
        let first = task.prepared(
            TimeWindow::new(2.0, 0.5),
            vec![ModelChange {
                target: "a".into(),
                namespace: None,
                new_value: 1.0,
            }],
        );
        let second = first.prepared(TimeWindow::new(2.5, 0.5), vec![]);

        assert_eq!(first.simulation.window, TimeWindow { start: 2.0, end: 2.5 });
        assert_eq!(first.changes.len(), 1);
        assert!(second.changes.is_empty());
        assert!(task.changes.is_empty());
        assert_eq!(task.simulation.window, TimeWindow { start: 0.0, end: 1.0 });
    }

    #[test]
    fn default_algorithms_follow_kind() {
        assert_eq!(SimulationKind::UniformTimeCourse.default_algorithm(), KISAO_CVODE);
        assert_eq!(SimulationKind::SteadyState.default_algorithm(), KISAO_FBA);
        assert!(SimulationKind::OneStep.is_deriver());
        assert!(!SimulationKind::SteadyState.is_time_course());
    }
}
