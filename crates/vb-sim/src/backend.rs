//! Traits implemented by simulator backends and variable extractors.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use vb_core::{ExtractedVariables, Real, Variable, resolve_index};

use crate::task::{Algorithm, ModelSource, SimulationKind, Task};

/// Errors reported by a backend or extractor.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to read model file {path}")]
    ModelFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid model: {what}")]
    InvalidModel { what: String },

    #[error("Unsupported simulation: {what}")]
    Unsupported { what: String },

    #[error("Unknown change target: {target}")]
    UnknownTarget { target: String },

    #[error("Numerical failure: {what}")]
    Numerical { what: String },

    #[error("Preprocessed task does not belong to backend '{backend}'")]
    ForeignHandle { backend: String },
}

/// Raw value reported for one output variable.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    Scalar(Real),
    /// One value per output time point.
    TimeCourse(Vec<Real>),
}

impl RawResult {
    /// Value at `index` for time courses (negative counts from the end);
    /// scalars are returned as-is whatever the index.
    pub fn value_at(&self, index: isize) -> Option<Real> {
        match self {
            RawResult::Scalar(v) => Some(*v),
            RawResult::TimeCourse(values) => {
                resolve_index(index, values.len()).map(|i| values[i])
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RawResult::Scalar(_) => 1,
            RawResult::TimeCourse(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type RawResults = BTreeMap<String, RawResult>;

/// Execution log returned alongside results. Informational only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskLog {
    pub messages: Vec<String>,
}

/// Backend-wide settings passed to every call.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// Whether backends should fill in the task log.
    pub collect_log: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { collect_log: false }
    }
}

/// Opaque value produced once by `SimulatorBackend::preprocess`.
pub struct PreprocessedTask {
    inner: Box<dyn Any + Send + Sync>,
}

impl PreprocessedTask {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Box::new(value),
        }
    }

    pub fn empty() -> Self {
        Self::new(())
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for PreprocessedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreprocessedTask").finish_non_exhaustive()
    }
}

/// A statically registered simulator.
///
/// Backends are deterministic functions of the task they are given: the
/// pending changes and time window travel inside `task`.
pub trait SimulatorBackend: Send + Sync {
    /// Registry name (e.g. "mass_action").
    fn name(&self) -> &str;

    /// One-time preparation; the returned handle is reused for every execution.
    fn preprocess(
        &self,
        task: &Task,
        outputs: &[Variable],
        config: &BackendConfig,
    ) -> Result<PreprocessedTask, BackendError>;

    /// Run `task` and report a raw result for every variable in `outputs`.
    fn execute(
        &self,
        task: &Task,
        outputs: &[Variable],
        preprocessed: &PreprocessedTask,
        config: &BackendConfig,
    ) -> Result<(RawResults, TaskLog), BackendError>;
}

/// Discovers a model's input and output variables.
pub trait VariableExtractor: Send + Sync {
    fn extract(
        &self,
        model: &ModelSource,
        kind: SimulationKind,
        algorithm: &Algorithm,
    ) -> Result<ExtractedVariables, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_course_indexing() {
        let raw = RawResult::TimeCourse(vec![1.0, 2.0, 3.0]);
        assert_eq!(raw.value_at(0), Some(1.0));
        assert_eq!(raw.value_at(-1), Some(3.0));
        assert_eq!(raw.value_at(5), None);
        assert_eq!(RawResult::TimeCourse(vec![]).value_at(-1), None);
    }

    #[test]
    fn scalars_ignore_index() {
        let raw = RawResult::Scalar(4.2);
        assert_eq!(raw.value_at(0), Some(4.2));
        assert_eq!(raw.value_at(-1), Some(4.2));
        assert_eq!(raw.value_at(17), Some(4.2));
    }

    #[test]
    fn handle_downcasts_to_its_own_type() {
        let handle = PreprocessedTask::new(42_u32);
        assert_eq!(handle.downcast_ref::<u32>(), Some(&42));
        assert!(handle.downcast_ref::<String>().is_none());
    }
}
