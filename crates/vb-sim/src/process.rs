//! Simulator process wrapper.

use std::sync::Arc;

use tracing::{debug, info};
use vb_core::{
    ExtractedVariables, PortSchema, PortUpdate, PortValues, Process, Real, Schema, State, Update,
    UpdatePolicy, VariableSchema,
};
use vb_ports::{Direction, PortAssignment, PortError, assign_variables};

use crate::backend::{BackendConfig, SimulatorBackend};
use crate::config::SimulatorConfig;
use crate::error::{SimError, SimResult};
use crate::registry::BackendRegistry;
use crate::runner::{FIRST_POINT, LAST_POINT, TaskRunner, process_results};

/// Whether a step is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Stepping,
}

/// Wraps one simulator as a [`Process`].
///
/// Each step reads the input ports, runs the simulator over the step
/// interval, and returns the change of every output since the current state.
/// Outputs are reported as deltas because output ports accumulate.
pub struct SimulatorProcess {
    name: String,
    config: SimulatorConfig,
    variables: ExtractedVariables,
    input_ports: PortAssignment,
    output_ports: PortAssignment,
    /// Native input values by variable id.
    input_defaults: PortValues,
    /// Outputs of the initial run at t = 0, by variable id.
    initial_outputs: PortValues,
    runner: TaskRunner,
    phase: Phase,
}

impl SimulatorProcess {
    /// Resolve the backend and extractor from `registry` and build the wrapper.
    pub fn new(
        name: impl Into<String>,
        config: SimulatorConfig,
        registry: &BackendRegistry,
    ) -> SimResult<Self> {
        config.validate()?;
        let backend = registry.get(&config.simulator)?;
        let extractor = registry.extractor(config.model.language)?;
        let variables = extractor
            .extract(&config.model, config.simulation, &config.algorithm())
            .map_err(|source| SimError::Extraction { source })?;
        Self::from_parts(name, config, backend, variables)
    }

    /// Build from an already resolved backend and extracted variables.
    ///
    /// Runs the backend once at t = 0 with native inputs to capture the
    /// initial output snapshot.
    pub fn from_parts(
        name: impl Into<String>,
        config: SimulatorConfig,
        backend: Arc<dyn SimulatorBackend>,
        variables: ExtractedVariables,
    ) -> SimResult<Self> {
        let name = name.into();
        config.validate()?;

        let input_ports = assign_variables(
            &variables.inputs,
            &config.input_ports,
            &config.default_input_port_name,
            Direction::Input,
        )?;
        let output_ports = assign_variables(
            &variables.outputs,
            &config.output_ports,
            &config.default_output_port_name,
            Direction::Output,
        )?;
        if let Some(port) = input_ports
            .port_names()
            .iter()
            .find(|port| output_ports.contains_port(port))
        {
            return Err(PortError::DuplicatePortName { port: port.clone() }.into());
        }

        let runner = TaskRunner::new(
            backend,
            config.task_template(),
            &variables.inputs,
            variables.outputs.clone(),
            BackendConfig::default(),
        )?;

        let input_defaults: PortValues = variables
            .inputs
            .iter()
            .map(|v| {
                (
                    v.id.clone(),
                    v.initial_value.unwrap_or(config.default_input_value),
                )
            })
            .collect();

        debug!(process = %name, "computing initial outputs");
        let initial_interval = if config.simulation.is_deriver() {
            0.0
        } else {
            config.time_step
        };
        let raw = runner.run(&input_defaults, initial_interval, 0.0)?;
        let initial_outputs = process_results(
            &raw,
            variables.outputs.iter().map(|v| v.id.as_str()),
            FIRST_POINT,
        )?;

        info!(
            process = %name,
            simulator = %config.simulator,
            input_ports = ?input_ports.port_names(),
            output_ports = ?output_ports.port_names(),
            inputs = variables.inputs.len(),
            outputs = variables.outputs.len(),
            "simulator process ready"
        );

        Ok(Self {
            name,
            config,
            variables,
            input_ports,
            output_ports,
            input_defaults,
            initial_outputs,
            runner,
            phase: Phase::Idle,
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn variables(&self) -> &ExtractedVariables {
        &self.variables
    }

    pub fn input_ports(&self) -> &PortAssignment {
        &self.input_ports
    }

    pub fn output_ports(&self) -> &PortAssignment {
        &self.output_ports
    }

    /// Variables carried by `port`, on either side.
    pub fn port_assignment(&self, port: &str) -> Option<&[String]> {
        self.input_ports
            .variables(port)
            .or_else(|| self.output_ports.variables(port))
    }

    /// Cached initial-run outputs by variable id.
    pub fn initial_outputs(&self) -> &PortValues {
        &self.initial_outputs
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn runner(&self) -> &TaskRunner {
        &self.runner
    }

    /// Advance by `interval` from `states.global_time`.
    ///
    /// The returned update holds only output ports, each value being
    /// `new - states[port][id]`.
    pub fn step(&mut self, interval: Real, states: &State) -> SimResult<Update> {
        self.phase = Phase::Stepping;
        let result = self.compute_update(interval, states);
        self.phase = Phase::Idle;
        result
    }

    fn compute_update(&self, interval: Real, states: &State) -> SimResult<Update> {
        let mut inputs = PortValues::new();
        for (port, ids) in self.input_ports.iter() {
            for id in ids {
                inputs.insert(id.clone(), current_value(states, port, id)?);
            }
        }

        debug!(process = %self.name, time = states.global_time, interval, "stepping");
        let raw = self.runner.run(&inputs, interval, states.global_time)?;

        let mut update = Update::new();
        for (port, ids) in self.output_ports.iter() {
            if ids.is_empty() {
                continue;
            }
            let new_values = process_results(&raw, ids.iter().map(String::as_str), LAST_POINT)?;
            let mut deltas = PortValues::new();
            for (id, new_value) in new_values {
                let before = current_value(states, port, &id)?;
                deltas.insert(id, new_value - before);
            }
            update.insert(port, PortUpdate::accumulate(deltas));
        }
        Ok(update)
    }

    fn port_schema(&self, port: &str, ids: &[String], defaults: &PortValues) -> PortSchema {
        let emit = self.config.emit_ports.iter().any(|p| p == port);
        ids.iter()
            .map(|id| {
                let entry = VariableSchema {
                    default: defaults.get(id).copied().unwrap_or(0.0),
                    emit,
                    updater: UpdatePolicy::Accumulate,
                };
                (id.clone(), entry)
            })
            .collect()
    }

    fn port_values(ids: &[String], values: &PortValues) -> PortValues {
        ids.iter()
            .map(|id| (id.clone(), values.get(id).copied().unwrap_or(0.0)))
            .collect()
    }
}

fn current_value(states: &State, port: &str, id: &str) -> SimResult<Real> {
    states.value(port, id).ok_or_else(|| SimError::MissingState {
        port: port.to_string(),
        id: id.to_string(),
    })
}

impl Process for SimulatorProcess {
    type Error = SimError;

    fn name(&self) -> &str {
        &self.name
    }

    fn time_step(&self) -> Real {
        self.config.time_step
    }

    fn is_deriver(&self) -> bool {
        self.config.simulation.is_deriver()
    }

    fn ports_schema(&self) -> Schema {
        let mut schema = Schema::new();
        for (port, ids) in self.input_ports.iter() {
            schema.insert(port.to_string(), self.port_schema(port, ids, &self.input_defaults));
        }
        for (port, ids) in self.output_ports.iter() {
            schema.insert(port.to_string(), self.port_schema(port, ids, &self.initial_outputs));
        }
        schema
    }

    fn initial_state(&self) -> State {
        let mut state = State::new(0.0);
        for (port, ids) in self.input_ports.iter() {
            state
                .ports
                .insert(port.to_string(), Self::port_values(ids, &self.input_defaults));
        }
        for (port, ids) in self.output_ports.iter() {
            state
                .ports
                .insert(port.to_string(), Self::port_values(ids, &self.initial_outputs));
        }
        state
    }

    fn next_update(&mut self, interval: Real, states: &State) -> SimResult<Update> {
        self.step(interval, states)
    }
}
