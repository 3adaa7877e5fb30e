//! Builders that assemble engines from configurations.

use std::path::Path;

use tracing::info;
use vb_core::Real;
use vb_flux::{FluxBoundsConfig, FluxBoundsConverter};
use vb_project::{Experiment, ProcessKind};
use vb_sim::{BackendRegistry, SimulatorConfig, SimulatorProcess};

use crate::engine::Engine;
use crate::error::ComposeResult;
use crate::hosted::Hosted;
use crate::mappings::init_to_dynamics_map;
use crate::store::StoreValues;
use crate::timeseries::Timeseries;
use crate::topology::{PortWiring, Topology};

pub const ODE_PROCESS: &str = "ode";
pub const FBA_PROCESS: &str = "fba";
pub const SPECIES_STORE: &str = "species";
pub const FBA_STORE: &str = "fba";

/// An ODE producer wrapped by a flux-bounds converter, feeding an FBA wrapper.
///
/// Wiring:
/// - ODE inputs and outputs share `species`, inputs renamed to dynamics ids
/// - converter bounds and FBA inputs share the converter's bounds store
/// - FBA outputs go to `fba`
pub fn ode_fba(
    ode: SimulatorConfig,
    bounds: FluxBoundsConfig,
    fba: SimulatorConfig,
    registry: &BackendRegistry,
) -> ComposeResult<Engine> {
    let producer = SimulatorProcess::new(ODE_PROCESS, ode, registry)?;
    let fba = SimulatorProcess::new(FBA_PROCESS, fba, registry)?;

    let mut topology = Topology::new();
    let rename = init_to_dynamics_map(&producer.variables().inputs);
    for port in producer.input_ports().port_names() {
        topology.wire(
            ODE_PROCESS,
            port,
            PortWiring::new(SPECIES_STORE).with_rename(rename.clone()),
        );
    }
    for port in producer.output_ports().port_names() {
        topology.wire(ODE_PROCESS, port, PortWiring::new(SPECIES_STORE));
    }
    let bounds_store = bounds.bounds_port.clone();
    topology.wire(ODE_PROCESS, &bounds.bounds_port, PortWiring::new(&bounds_store));
    for port in fba.input_ports().port_names() {
        topology.wire(FBA_PROCESS, port, PortWiring::new(&bounds_store));
    }
    for port in fba.output_ports().port_names() {
        topology.wire(FBA_PROCESS, port, PortWiring::new(FBA_STORE));
    }

    let converter = FluxBoundsConverter::new(producer, bounds)?;
    let processes: Vec<Box<dyn Hosted>> = vec![Box::new(converter), Box::new(fba)];
    Engine::new(processes, topology, &StoreValues::new())
}

/// Construct every process of `experiment` and wire them per its topology.
pub fn build_engine(experiment: &Experiment, registry: &BackendRegistry) -> ComposeResult<Engine> {
    let mut processes: Vec<Box<dyn Hosted>> = Vec::with_capacity(experiment.processes.len());
    for def in &experiment.processes {
        match &def.kind {
            ProcessKind::Simulator { config } => {
                processes.push(Box::new(SimulatorProcess::new(&def.id, config.clone(), registry)?));
            }
            ProcessKind::FluxBounds { producer, bounds } => {
                let producer = SimulatorProcess::new(&def.id, producer.clone(), registry)?;
                processes.push(Box::new(FluxBoundsConverter::new(producer, bounds.clone())?));
            }
        }
    }
    let topology = Topology::from_defs(&experiment.topology);
    Engine::new(processes, topology, &experiment.initial_state)?.with_time_step(experiment.time_step)
}

/// Load an experiment file, build its engine and run it.
///
/// `total_time` overrides the file's value when given.
pub fn run_experiment(
    path: &Path,
    total_time: Option<Real>,
    registry: &BackendRegistry,
) -> ComposeResult<Timeseries> {
    let experiment = load_experiment(path)?;
    let total_time = total_time.unwrap_or(experiment.total_time);
    info!(experiment = %experiment.name, total_time, "Running experiment");
    let mut engine = build_engine(&experiment, registry)?;
    Ok(engine.run(total_time)?.clone())
}

/// Load a YAML or JSON experiment by extension.
pub fn load_experiment(path: &Path) -> ComposeResult<Experiment> {
    let experiment = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => vb_project::load_json(path)?,
        _ => vb_project::load_yaml(path)?,
    };
    Ok(experiment)
}
