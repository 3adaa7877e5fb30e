use vb_flux::{BoundTarget, FluxBoundsConfig};
use vb_project::*;
use vb_sim::{ModelLanguage, ModelSource, SimulationKind, SimulatorConfig};

fn process(id: &str) -> ProcessDef {
    ProcessDef {
        id: id.to_string(),
        kind: ProcessKind::Simulator {
            config: SimulatorConfig::new(
                "mass_action",
                ModelSource {
                    source: "/models/ode.yaml".into(),
                    language: ModelLanguage::ReactionNetwork,
                },
                SimulationKind::UniformTimeCourse,
            ),
        },
    }
}

fn base() -> Experiment {
    Experiment {
        version: LATEST_VERSION,
        name: "validate".to_string(),
        total_time: 1.0,
        time_step: 1.0,
        processes: vec![process("a"), process("b")],
        topology: vec![WiringDef::new("a", "outputs", "shared")],
        initial_state: Default::default(),
    }
}

#[test]
fn base_validates() {
    validate_experiment(&base()).unwrap();
}

#[test]
fn duplicate_process_ids_rejected() {
    let mut experiment = base();
    experiment.processes.push(process("a"));
    assert!(matches!(
        validate_experiment(&experiment),
        Err(ValidationError::DuplicateId { id, .. }) if id == "a"
    ));
}

#[test]
fn topology_must_reference_existing_process() {
    let mut experiment = base();
    experiment.topology.push(WiringDef::new("c", "inputs", "x"));
    assert!(matches!(
        validate_experiment(&experiment),
        Err(ValidationError::MissingReference { id, .. }) if id == "c"
    ));
}

#[test]
fn port_wired_twice_rejected() {
    let mut experiment = base();
    experiment.topology.push(WiringDef::new("a", "outputs", "other"));
    assert!(matches!(
        validate_experiment(&experiment),
        Err(ValidationError::DuplicateId { .. })
    ));
}

#[test]
fn non_positive_time_step_rejected() {
    let mut experiment = base();
    experiment.time_step = 0.0;
    assert!(matches!(
        validate_experiment(&experiment),
        Err(ValidationError::InvalidValue { field, .. }) if field == "time_step"
    ));
}

#[test]
fn future_version_rejected() {
    let mut experiment = base();
    experiment.version = LATEST_VERSION + 1;
    assert!(matches!(
        validate_experiment(&experiment),
        Err(ValidationError::UnsupportedVersion { .. })
    ));
}

#[test]
fn non_finite_range_rejected() {
    let mut experiment = base();
    let ProcessKind::Simulator { config } = experiment.processes[0].kind.clone() else {
        unreachable!()
    };
    experiment.processes[0].kind = ProcessKind::FluxBounds {
        producer: config,
        bounds: FluxBoundsConfig::default()
            .with_target("x", BoundTarget::range("ub", "lb", [f64::INFINITY, 1.0])),
    };
    let err = validate_experiment(&experiment).unwrap_err();
    assert!(err.to_string().contains("proportional_range"));
}
