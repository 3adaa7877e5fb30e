//! Flux-bounds converter process.

use tracing::{info, trace};
use vb_core::{PortUpdate, PortValues, Process, Real, Schema, State, Update, UpdatePolicy, VariableSchema};
use vb_sim::SimulatorProcess;

use crate::config::{BoundTarget, FluxBoundsConfig};
use crate::convert::{UnitConverter, derive_bounds};
use crate::error::{FluxError, FluxResult};

/// Wraps a continuous producer and turns its flux deltas into bounds.
///
/// The producer's update passes through unchanged; when it carries a
/// non-empty flux port, a bounds port is added whose values replace the
/// previous bounds instead of accumulating.
pub struct FluxBoundsConverter {
    producer: SimulatorProcess,
    config: FluxBoundsConfig,
    converter: UnitConverter,
}

impl FluxBoundsConverter {
    /// Every flux the producer emits must be mapped; checked here, before
    /// any step runs.
    pub fn new(producer: SimulatorProcess, config: FluxBoundsConfig) -> FluxResult<Self> {
        config.validate()?;

        let Some(fluxes) = producer.output_ports().variables(&config.flux_port) else {
            return Err(FluxError::Mapping {
                what: format!(
                    "producer '{}' has no output port '{}' (ports: {})",
                    producer.name(),
                    config.flux_port,
                    producer.output_ports().port_names().join(", ")
                ),
            });
        };

        let unmapped: Vec<&str> = fluxes
            .iter()
            .map(String::as_str)
            .filter(|id| !config.flux_to_bound_map.contains_key(*id))
            .collect();
        if !unmapped.is_empty() {
            let mapped: Vec<&str> = config.flux_to_bound_map.keys().map(String::as_str).collect();
            return Err(FluxError::Mapping {
                what: format!(
                    "fluxes [{}] of port '{}' have no bound target (mapped: [{}])",
                    unmapped.join(", "),
                    config.flux_port,
                    mapped.join(", ")
                ),
            });
        }

        if producer.input_ports().contains_port(&config.bounds_port)
            || producer.output_ports().contains_port(&config.bounds_port)
        {
            return Err(FluxError::ReservedPort {
                port: config.bounds_port.clone(),
            });
        }

        let converter = UnitConverter::from_config(&config)?;

        info!(
            process = producer.name(),
            fluxes = fluxes.len(),
            bounds_port = %config.bounds_port,
            bounds_unit = %converter.bounds_unit(),
            "flux bounds converter ready"
        );

        Ok(Self {
            producer,
            config,
            converter,
        })
    }

    pub fn producer(&self) -> &SimulatorProcess {
        &self.producer
    }

    pub fn config(&self) -> &FluxBoundsConfig {
        &self.config
    }

    /// Bounds for every flux in `fluxes`, each flux having elapsed over `dt`.
    pub fn convert_fluxes(&self, fluxes: &PortValues, dt: Real) -> FluxResult<PortValues> {
        let mut bounds = PortValues::new();
        for (flux_id, flux) in fluxes {
            let target = self
                .config
                .flux_to_bound_map
                .get(flux_id)
                .ok_or_else(|| FluxError::Mapping {
                    what: format!("flux '{flux_id}' has no bound target"),
                })?;
            let converted = self.converter.convert(flux_id, *flux, dt)?;

            match target {
                BoundTarget::Direct(bound_id) => {
                    trace!(flux = %flux_id, bound = %bound_id, value = converted, "direct bound");
                    bounds.insert(bound_id.clone(), converted);
                }
                BoundTarget::Range {
                    upper_bound_id,
                    lower_bound_id,
                    proportional_range,
                } => {
                    let pair = derive_bounds(converted, *proportional_range);
                    trace!(
                        flux = %flux_id,
                        converted,
                        upper = pair.upper,
                        lower = pair.lower,
                        "ranged bounds"
                    );
                    bounds.insert(upper_bound_id.clone(), pair.upper);
                    bounds.insert(lower_bound_id.clone(), pair.lower);
                }
            }
        }
        Ok(bounds)
    }

    pub fn step(&mut self, interval: Real, states: &State) -> FluxResult<Update> {
        let mut update = self.producer.step(interval, states)?;

        let fluxes = match update.get(&self.config.flux_port) {
            Some(fluxes) if !fluxes.values.is_empty() => fluxes.values.clone(),
            _ => return Ok(update),
        };

        let bounds = self.convert_fluxes(&fluxes, interval)?;
        update.insert(self.config.bounds_port.clone(), PortUpdate::set(bounds));
        Ok(update)
    }
}

impl Process for FluxBoundsConverter {
    type Error = FluxError;

    fn name(&self) -> &str {
        self.producer.name()
    }

    fn time_step(&self) -> Real {
        self.producer.time_step()
    }

    fn is_deriver(&self) -> bool {
        self.producer.is_deriver()
    }

    fn ports_schema(&self) -> Schema {
        let mut schema = self.producer.ports_schema();
        let emit = self
            .producer
            .config()
            .emit_ports
            .iter()
            .any(|p| *p == self.config.bounds_port);
        let bounds = self
            .config
            .bound_ids()
            .into_iter()
            .map(|id| {
                let entry = VariableSchema {
                    default: 0.0,
                    emit,
                    updater: UpdatePolicy::Set,
                };
                (id.to_string(), entry)
            })
            .collect();
        schema.insert(self.config.bounds_port.clone(), bounds);
        schema
    }

    /// The producer's initial state; bounds are left to their consumer.
    fn initial_state(&self) -> State {
        self.producer.initial_state()
    }

    fn next_update(&mut self, interval: Real, states: &State) -> FluxResult<Update> {
        self.step(interval, states)
    }
}
