//! Deterministic fixed-tick engine over shared stores.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info, warn};
use vb_core::{PortValues, Real, Schema, State, Update};

use crate::error::{ComposeError, ComposeResult};
use crate::hosted::Hosted;
use crate::store::{StoreValues, Stores};
use crate::timeseries::Timeseries;
use crate::topology::Topology;

/// Drives processes in declaration order, one tick at a time.
///
/// Each process sees the stores as left by the processes before it in the
/// same tick. Updates are applied immediately with their port's policy.
pub struct Engine {
    processes: Vec<Box<dyn Hosted>>,
    schemas: Vec<Schema>,
    topology: Topology,
    stores: Stores,
    global_time: Real,
    time_step: Real,
    timeseries: Timeseries,
}

impl Engine {
    /// Seed stores from schema defaults (first declaration wins), then each
    /// process's initial state, then `initial_overrides`.
    pub fn new(
        processes: Vec<Box<dyn Hosted>>,
        topology: Topology,
        initial_overrides: &StoreValues,
    ) -> ComposeResult<Self> {
        let mut names = HashSet::new();
        for process in &processes {
            if !names.insert(process.name().to_string()) {
                return Err(ComposeError::DuplicateProcess(process.name().to_string()));
            }
        }

        let schemas: Vec<Schema> = processes.iter().map(|p| p.ports_schema()).collect();

        for (process, port, _) in topology.entries() {
            let index = processes
                .iter()
                .position(|p| p.name() == process)
                .ok_or_else(|| ComposeError::UnknownProcess(process.to_string()))?;
            if !schemas[index].contains_key(port) {
                return Err(ComposeError::Wiring {
                    process: process.to_string(),
                    port: port.to_string(),
                    what: format!(
                        "no such port (available: {:?})",
                        schemas[index].keys().collect::<Vec<_>>()
                    ),
                });
            }
        }

        let mut stores = Stores::new();
        for (process, schema) in processes.iter().zip(&schemas) {
            for (port, variables) in schema {
                let wiring = topology.resolve(process.name(), port);
                for (variable, entry) in variables {
                    stores.seed(&wiring.store, wiring.store_variable(variable), entry.default);
                }
            }
        }
        for process in &processes {
            let initial = process.initial_state();
            for (port, values) in &initial.ports {
                let wiring = topology.resolve(process.name(), port);
                for (variable, value) in values {
                    stores.set(&wiring.store, wiring.store_variable(variable), *value);
                }
            }
        }
        for (store, values) in initial_overrides {
            if stores.get(store).is_none() {
                return Err(ComposeError::UnknownStore {
                    store: store.clone(),
                    available: stores.names(),
                });
            }
            for (variable, value) in values {
                if !stores.contains(store, variable) {
                    return Err(ComposeError::UnknownVariable {
                        store: store.clone(),
                        variable: variable.clone(),
                    });
                }
                stores.set(store, variable, *value);
            }
        }

        let time_step = processes
            .iter()
            .filter(|p| !p.is_deriver())
            .map(|p| p.time_step())
            .fold(Real::INFINITY, Real::min);
        let time_step = if time_step.is_finite() { time_step } else { 1.0 };

        let mut emitted = BTreeSet::new();
        for (process, schema) in processes.iter().zip(&schemas) {
            for (port, variables) in schema {
                let wiring = topology.resolve(process.name(), port);
                for (variable, entry) in variables {
                    if entry.emit {
                        emitted.insert((
                            wiring.store.clone(),
                            wiring.store_variable(variable).to_string(),
                        ));
                    }
                }
            }
        }
        let mut timeseries = Timeseries::new(emitted);
        timeseries.record(0.0, &stores);

        debug!(
            processes = processes.len(),
            stores = stores.names().len(),
            time_step,
            "Engine assembled"
        );

        Ok(Self {
            processes,
            schemas,
            topology,
            stores,
            global_time: 0.0,
            time_step,
            timeseries,
        })
    }

    pub fn with_time_step(mut self, time_step: Real) -> ComposeResult<Self> {
        if !time_step.is_finite() || time_step <= 0.0 {
            return Err(ComposeError::InvalidArg {
                what: format!("time_step must be finite and > 0, got {time_step}"),
            });
        }
        self.time_step = time_step;
        Ok(self)
    }

    pub fn time_step(&self) -> Real {
        self.time_step
    }

    pub fn global_time(&self) -> Real {
        self.global_time
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn store(&self, name: &str) -> ComposeResult<&PortValues> {
        self.stores.get(name).ok_or_else(|| ComposeError::UnknownStore {
            store: name.to_string(),
            available: self.stores.names(),
        })
    }

    pub fn value(&self, store: &str, variable: &str) -> Option<Real> {
        self.stores.value(store, variable)
    }

    pub fn timeseries(&self) -> &Timeseries {
        &self.timeseries
    }

    pub fn process_names(&self) -> Vec<&str> {
        self.processes.iter().map(|p| p.name()).collect()
    }

    /// The state a process would see right now.
    pub fn view(&self, process: &str) -> ComposeResult<State> {
        let index = self
            .processes
            .iter()
            .position(|p| p.name() == process)
            .ok_or_else(|| ComposeError::UnknownProcess(process.to_string()))?;
        Ok(self.view_at(index))
    }

    fn view_at(&self, index: usize) -> State {
        let name = self.processes[index].name();
        let mut state = State::new(self.global_time);
        for (port, variables) in &self.schemas[index] {
            let wiring = self.topology.resolve(name, port);
            let values: PortValues = variables
                .iter()
                .map(|(variable, entry)| {
                    let value = self
                        .stores
                        .value(&wiring.store, wiring.store_variable(variable))
                        .unwrap_or(entry.default);
                    (variable.clone(), value)
                })
                .collect();
            state = state.with_port(port.clone(), values);
        }
        state
    }

    fn apply(&mut self, process: &str, update: &Update) {
        for (port, port_update) in update.ports() {
            let wiring = self.topology.resolve(process, port);
            for (variable, value) in &port_update.values {
                self.stores.apply(
                    &wiring.store,
                    wiring.store_variable(variable),
                    port_update.policy,
                    *value,
                );
            }
        }
    }

    /// Run every process once, then advance `global_time` by one tick.
    pub fn tick(&mut self) -> ComposeResult<()> {
        for index in 0..self.processes.len() {
            let interval = if self.processes[index].is_deriver() {
                0.0
            } else {
                self.time_step
            };
            let state = self.view_at(index);
            let update = match self.processes[index].advance(interval, &state) {
                Ok(update) => update,
                Err(e) => {
                    warn!(process = self.processes[index].name(), time = self.global_time, "Step failed");
                    return Err(e);
                }
            };
            let name = self.processes[index].name().to_string();
            self.apply(&name, &update);
        }
        self.global_time += self.time_step;
        self.timeseries.record(self.global_time, &self.stores);
        debug!(time = self.global_time, "Tick complete");
        Ok(())
    }

    /// Advance by `total_time`, rounded up to whole ticks.
    pub fn run(&mut self, total_time: Real) -> ComposeResult<&Timeseries> {
        if !total_time.is_finite() || total_time < 0.0 {
            return Err(ComposeError::InvalidArg {
                what: format!("total_time must be finite and >= 0, got {total_time}"),
            });
        }
        let ticks = (total_time / self.time_step - 1e-9).ceil().max(0.0) as usize;
        info!(
            start = self.global_time,
            total_time,
            time_step = self.time_step,
            ticks,
            "Engine run started"
        );
        for _ in 0..ticks {
            self.tick()?;
        }
        info!(end = self.global_time, records = self.timeseries.len(), "Engine run finished");
        Ok(&self.timeseries)
    }
}
