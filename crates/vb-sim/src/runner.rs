//! Task runner: builds per-call tasks, invokes the backend, normalizes results.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};
use vb_core::{PortValues, Real, Variable};

use crate::backend::{BackendConfig, PreprocessedTask, RawResult, RawResults, SimulatorBackend};
use crate::error::{SimError, SimResult};
use crate::task::{ModelChange, Task, TimeWindow};

/// Index of the last output point of a time course.
pub const LAST_POINT: isize = -1;
/// Index of the first output point, used for initial snapshots.
pub const FIRST_POINT: isize = 0;

/// Owns the execution contract with one backend.
///
/// The task template is never mutated after construction: every call builds
/// a fresh task carrying its own window and changes.
pub struct TaskRunner {
    backend: Arc<dyn SimulatorBackend>,
    template: Task,
    /// Input variables by id, for locator lookup.
    inputs: BTreeMap<String, Variable>,
    outputs: Vec<Variable>,
    preprocessed: PreprocessedTask,
    config: BackendConfig,
}

impl TaskRunner {
    /// Preprocess `template` once and keep the handle for every later run.
    pub fn new(
        backend: Arc<dyn SimulatorBackend>,
        template: Task,
        inputs: &[Variable],
        outputs: Vec<Variable>,
        config: BackendConfig,
    ) -> SimResult<Self> {
        debug!(backend = backend.name(), task = %template.id, "preprocessing task");
        let preprocessed = backend
            .preprocess(&template, &outputs, &config)
            .map_err(|source| SimError::Preprocess { source })?;

        Ok(Self {
            backend,
            template,
            inputs: inputs.iter().map(|v| (v.id.clone(), v.clone())).collect(),
            outputs,
            preprocessed,
            config,
        })
    }

    pub fn template(&self) -> &Task {
        &self.template
    }

    pub fn outputs(&self) -> &[Variable] {
        &self.outputs
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Build the change list for `input_values`, one change per entry.
    pub fn changes(&self, input_values: &PortValues) -> SimResult<Vec<ModelChange>> {
        input_values
            .iter()
            .map(|(id, value)| {
                let variable = self
                    .inputs
                    .get(id)
                    .ok_or_else(|| SimError::UnknownInput { id: id.clone() })?;
                Ok(ModelChange {
                    target: variable.target.clone(),
                    namespace: variable.namespace.clone(),
                    new_value: *value,
                })
            })
            .collect()
    }

    /// Run over `[initial_time, initial_time + interval]` with `input_values`
    /// applied, returning the backend's raw results unprocessed.
    pub fn run(
        &self,
        input_values: &PortValues,
        interval: Real,
        initial_time: Real,
    ) -> SimResult<RawResults> {
        if !interval.is_finite() || interval < 0.0 {
            return Err(SimError::InvalidConfig {
                what: format!("interval must be finite and >= 0, got {interval}"),
            });
        }

        let window = TimeWindow::new(initial_time, interval);
        let task = self.template.prepared(window, self.changes(input_values)?);

        debug!(backend = self.backend.name(), %window, changes = task.changes.len(), "executing task");
        match self
            .backend
            .execute(&task, &self.outputs, &self.preprocessed, &self.config)
        {
            Ok((results, log)) => {
                for message in &log.messages {
                    debug!(backend = self.backend.name(), "{message}");
                }
                Ok(results)
            }
            Err(source) => {
                warn!(backend = self.backend.name(), %window, error = %source, "simulation failed");
                Err(SimError::Execution { window, source })
            }
        }
    }
}

/// Reduce one raw result to a scalar.
///
/// Time courses are indexed (negative counts from the end); scalars are
/// returned unchanged whatever the index.
pub fn process_result(raw: &RawResult, time_course_index: isize) -> SimResult<Real> {
    raw.value_at(time_course_index).ok_or(SimError::ResultIndex {
        index: time_course_index,
        len: raw.len(),
    })
}

/// Reduce the raw results of every id in `ids`.
pub fn process_results<'a, I>(
    raw: &RawResults,
    ids: I,
    time_course_index: isize,
) -> SimResult<PortValues>
where
    I: IntoIterator<Item = &'a str>,
{
    ids.into_iter()
        .map(|id| {
            let result = raw
                .get(id)
                .ok_or_else(|| SimError::MissingResult { id: id.to_string() })?;
            Ok((id.to_string(), process_result(result, time_course_index)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_course_defaults_to_last_point() {
        let raw = RawResult::TimeCourse(vec![1.0, 2.0, 3.0]);
        assert_eq!(process_result(&raw, FIRST_POINT).unwrap(), 1.0);
        assert_eq!(process_result(&raw, LAST_POINT).unwrap(), 3.0);
    }

    #[test]
    fn scalar_is_returned_unchanged() {
        let raw = RawResult::Scalar(4.2);
        assert_eq!(process_result(&raw, FIRST_POINT).unwrap(), 4.2);
        assert_eq!(process_result(&raw, LAST_POINT).unwrap(), 4.2);
        assert_eq!(process_result(&raw, 9).unwrap(), 4.2);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let raw = RawResult::TimeCourse(vec![]);
        assert!(matches!(
            process_result(&raw, LAST_POINT),
            Err(SimError::ResultIndex { index: -1, len: 0 })
        ));
        let raw = RawResult::TimeCourse(vec![1.0, 2.0]);
        assert!(matches!(
            process_result(&raw, 2),
            Err(SimError::ResultIndex { index: 2, len: 2 })
        ));
        assert_eq!(process_result(&raw, -2).unwrap(), 1.0);
    }

    #[test]
    fn missing_result_names_the_output() {
        let raw: RawResults = [("a".to_string(), RawResult::Scalar(1.0))].into();
        let err = process_results(&raw, ["a", "b"], LAST_POINT).unwrap_err();
        assert!(matches!(err, SimError::MissingResult { id } if id == "b"));
    }
}
