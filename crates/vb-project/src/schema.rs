//! Experiment schema definitions.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use vb_core::Real;
use vb_flux::FluxBoundsConfig;
use vb_sim::SimulatorConfig;

pub const LATEST_VERSION: u32 = 1;

fn default_time_step() -> Real {
    1.0
}

/// Store name -> variable id -> value.
pub type StoreValues = BTreeMap<String, BTreeMap<String, Real>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experiment {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub total_time: Real,
    /// Engine tick.
    #[serde(default = "default_time_step")]
    pub time_step: Real,
    #[serde(default)]
    pub processes: Vec<ProcessDef>,
    #[serde(default)]
    pub topology: Vec<WiringDef>,
    /// Values overlaid on the stores after every process seeded them.
    #[serde(default)]
    pub initial_state: StoreValues,
}

impl Experiment {
    pub fn process(&self, id: &str) -> Option<&ProcessDef> {
        self.processes.iter().find(|p| p.id == id)
    }

    /// Wiring entries of one process, in file order.
    pub fn wiring_of<'a>(&'a self, process: &'a str) -> impl Iterator<Item = &'a WiringDef> + 'a {
        self.topology.iter().filter(move |w| w.process == process)
    }

    /// Join relative model paths onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for process in &mut self.processes {
            for config in process.kind.simulator_configs_mut() {
                if config.model.source.is_relative() {
                    config.model.source = base.join(&config.model.source);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessDef {
    pub id: String,
    pub kind: ProcessKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessKind {
    /// A bare simulator wrapper.
    Simulator { config: SimulatorConfig },
    /// A producer whose fluxes are converted to bounds.
    FluxBounds {
        producer: SimulatorConfig,
        bounds: FluxBoundsConfig,
    },
}

impl ProcessKind {
    pub fn simulator_configs(&self) -> Vec<&SimulatorConfig> {
        match self {
            ProcessKind::Simulator { config } => vec![config],
            ProcessKind::FluxBounds { producer, .. } => vec![producer],
        }
    }

    fn simulator_configs_mut(&mut self) -> Vec<&mut SimulatorConfig> {
        match self {
            ProcessKind::Simulator { config } => vec![config],
            ProcessKind::FluxBounds { producer, .. } => vec![producer],
        }
    }
}

/// Connects one port of a process to a store.
///
/// `rename` maps port variable ids to store variable ids; unlisted
/// variables keep their id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WiringDef {
    pub process: String,
    pub port: String,
    pub store: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rename: BTreeMap<String, String>,
}

impl WiringDef {
    pub fn new(process: impl Into<String>, port: impl Into<String>, store: impl Into<String>) -> Self {
        Self {
            process: process.into(),
            port: port.into(),
            store: store.into(),
            rename: BTreeMap::new(),
        }
    }

    pub fn with_rename(mut self, rename: BTreeMap<String, String>) -> Self {
        self.rename = rename;
        self
    }
}
