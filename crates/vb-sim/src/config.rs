//! Simulator wrapper configuration.

use serde::{Deserialize, Serialize};
use vb_core::Real;
use vb_ports::PortDecl;

use crate::error::{SimError, SimResult};
use crate::task::{Algorithm, ModelSource, Simulation, SimulationKind, Task, TimeWindow};

fn default_input_port_name() -> String {
    "inputs".to_string()
}

fn default_output_port_name() -> String {
    "outputs".to_string()
}

fn default_emit_ports() -> Vec<String> {
    vec!["outputs".to_string()]
}

fn default_time_step() -> Real {
    1.0
}

fn default_number_of_points() -> usize {
    1
}

fn default_simulation() -> SimulationKind {
    SimulationKind::UniformTimeCourse
}

/// Settings for one simulator wrapper.
///
/// Defaults are filled in by serde; call [`SimulatorConfig::validate`] before use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulatorConfig {
    /// Registered backend name.
    pub simulator: String,
    pub model: ModelSource,
    #[serde(default = "default_simulation")]
    pub simulation: SimulationKind,
    /// KiSAO id; the simulation kind's default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default = "default_number_of_points")]
    pub number_of_points: usize,
    #[serde(default)]
    pub input_ports: Vec<PortDecl>,
    #[serde(default)]
    pub output_ports: Vec<PortDecl>,
    #[serde(default = "default_input_port_name")]
    pub default_input_port_name: String,
    #[serde(default = "default_output_port_name")]
    pub default_output_port_name: String,
    /// Used for inputs the extractor reports without a value.
    #[serde(default)]
    pub default_input_value: Real,
    #[serde(default = "default_emit_ports")]
    pub emit_ports: Vec<String>,
    #[serde(default = "default_time_step")]
    pub time_step: Real,
}

impl SimulatorConfig {
    pub fn new(simulator: impl Into<String>, model: ModelSource, simulation: SimulationKind) -> Self {
        Self {
            simulator: simulator.into(),
            model,
            simulation,
            algorithm: None,
            number_of_points: default_number_of_points(),
            input_ports: Vec::new(),
            output_ports: Vec::new(),
            default_input_port_name: default_input_port_name(),
            default_output_port_name: default_output_port_name(),
            default_input_value: 0.0,
            emit_ports: default_emit_ports(),
            time_step: default_time_step(),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        Algorithm::new(
            self.algorithm
                .clone()
                .unwrap_or_else(|| self.simulation.default_algorithm().to_string()),
        )
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.simulator.trim().is_empty() {
            return Err(invalid("simulator name is empty"));
        }
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(invalid(format!(
                "time_step must be finite and > 0, got {}",
                self.time_step
            )));
        }
        if self.simulation.is_time_course() && self.number_of_points == 0 {
            return Err(invalid("number_of_points must be >= 1 for time courses"));
        }
        if !self.default_input_value.is_finite() {
            return Err(invalid("default_input_value must be finite"));
        }
        if self.default_input_port_name.is_empty() || self.default_output_port_name.is_empty() {
            return Err(invalid("default port names must not be empty"));
        }
        if self.default_input_port_name == self.default_output_port_name {
            return Err(invalid(format!(
                "default input and output ports share the name '{}'",
                self.default_input_port_name
            )));
        }
        Ok(())
    }

    /// Task template over the first synchronization interval.
    pub fn task_template(&self) -> Task {
        Task::new(
            self.model.clone(),
            Simulation {
                kind: self.simulation,
                algorithm: self.algorithm(),
                window: TimeWindow::new(0.0, self.time_step),
                number_of_points: self.number_of_points,
            },
        )
    }
}

fn invalid(what: impl Into<String>) -> SimError {
    SimError::InvalidConfig { what: what.into() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{KISAO_CVODE, KISAO_FBA, ModelLanguage};

    #[test]
    fn yaml_defaults_are_filled_in() {
        let yaml = r#"
simulator: mass_action
model:
  source: model.yaml
  language: reaction_network
output_ports:
  - name: fluxes
    variables: [dynamics_species_GLCp]
"#;
        let config: SimulatorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.simulation, SimulationKind::UniformTimeCourse);
        assert_eq!(config.default_input_port_name, "inputs");
        assert_eq!(config.default_output_port_name, "outputs");
        assert_eq!(config.emit_ports, vec!["outputs".to_string()]);
        assert_eq!(config.time_step, 1.0);
        assert_eq!(config.algorithm().kisao_id, KISAO_CVODE);
        assert_eq!(config.output_ports[0].name, "fluxes");
        config.validate().unwrap();
    }

    #[test]
    fn steady_state_defaults_to_fba() {
        let config = SimulatorConfig::new(
            "box_fba",
            ModelSource {
                source: "m.yaml".into(),
                language: ModelLanguage::ReactionNetwork,
            },
            SimulationKind::SteadyState,
        );
        assert_eq!(config.algorithm().kisao_id, KISAO_FBA);
        assert_eq!(config.task_template().simulation.window.end, 1.0);
    }

    #[test]
    fn validate_rejects_bad_time_step() {
        let mut config = SimulatorConfig::new(
            "x",
            ModelSource {
                source: "m".into(),
                language: ModelLanguage::Sbml,
            },
            SimulationKind::UniformTimeCourse,
        );
        config.time_step = 0.0;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig { .. })));
    }
}
