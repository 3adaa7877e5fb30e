//! Simulator wrapping for process composition.
//!
//! Provides:
//! - Backend and extractor traits plus a static registry
//! - Task descriptor and a runner that executes fresh tasks per call
//! - `SimulatorProcess`, which turns any backend into a stepping process
//!   reporting output deltas

pub mod backend;
pub mod config;
pub mod error;
pub mod process;
pub mod registry;
pub mod runner;
pub mod task;

pub use backend::{
    BackendConfig, BackendError, PreprocessedTask, RawResult, RawResults, SimulatorBackend,
    TaskLog, VariableExtractor,
};
pub use config::SimulatorConfig;
pub use error::{SimError, SimResult};
pub use process::{Phase, SimulatorProcess};
pub use registry::BackendRegistry;
pub use runner::{FIRST_POINT, LAST_POINT, TaskRunner, process_result, process_results};
pub use task::{
    Algorithm, KISAO_CVODE, KISAO_FBA, ModelChange, ModelLanguage, ModelSource, Simulation,
    SimulationKind, Task, TimeWindow,
};
