//! Reference backends driven through the simulator wrapper.

use std::fs;
use std::path::PathBuf;

use proptest::prelude::*;
use vb_backends::{MassActionBackend, MassActionSystem, ReactionNetwork, TransientModel, reference_registry};
use vb_core::{Process, State};
use vb_sim::{
    Algorithm, BackendConfig, BackendError, ModelLanguage, ModelSource, Simulation,
    SimulationKind, SimulatorBackend, SimulatorConfig, SimulatorProcess, Task, TimeWindow,
};

const GLUCOSE: &str = r#"
name: glucose
species:
  - id: GLCx
    initial_concentration: 10.0
  - id: GLCp
reactions:
  - id: R_EX_glc
    reactants: {GLCx: 1}
    products: {GLCp: 1}
    rate_constant: 0.1
    lower_bound: -10
    upper_bound: 10
    objective: 1.0
"#;

fn write_model(name: &str, text: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("vb-backends-tests");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{name}-{}.yaml", std::process::id()));
    fs::write(&path, text).unwrap();
    path
}

fn config(simulator: &str, path: PathBuf, kind: SimulationKind) -> SimulatorConfig {
    SimulatorConfig::new(
        simulator,
        ModelSource {
            source: path,
            language: ModelLanguage::ReactionNetwork,
        },
        kind,
    )
}

#[test]
fn mass_action_step_matches_analytic_decay() {
    let path = write_model("decay", GLUCOSE);
    let registry = reference_registry();
    let mut ode = SimulatorProcess::new(
        "ode",
        config("mass_action", path, SimulationKind::UniformTimeCourse),
        &registry,
    )
    .unwrap();

    let mut state = ode.initial_state();
    assert_eq!(state.value("outputs", "dynamics_species_GLCx"), Some(10.0));
    assert_eq!(state.value("outputs", "dynamics_species_GLCp"), Some(0.0));

    let update = ode.next_update(1.0, &state).unwrap();
    update.apply_to(&mut state);

    let expected = 10.0 * (1.0 - (-0.1f64).exp());
    let glcp = state.value("outputs", "dynamics_species_GLCp").unwrap();
    let glcx = state.value("outputs", "dynamics_species_GLCx").unwrap();
    assert!((glcp - expected).abs() < 1e-8);
    assert!((glcx + glcp - 10.0).abs() < 1e-9);
    assert_eq!(state.value("outputs", "time"), Some(1.0));
}

#[test]
fn box_fba_reports_bound_limited_flux() {
    let path = write_model("fba", GLUCOSE);
    let registry = reference_registry();
    let mut fba = SimulatorProcess::new(
        "fba",
        config("box_fba", path, SimulationKind::SteadyState),
        &registry,
    )
    .unwrap();

    let state = fba.initial_state();
    assert_eq!(state.value("outputs", "flux_reaction_R_EX_glc"), Some(10.0));
    assert_eq!(state.value("outputs", "objective"), Some(10.0));

    let mut next = state.clone();
    next.set("inputs", "upper_bound_reaction_R_EX_glc", 4.0);
    let update = fba.next_update(1.0, &next).unwrap();
    assert_eq!(update.get("outputs").unwrap().values["flux_reaction_R_EX_glc"], -6.0);
}

#[test]
fn unsupported_algorithm_is_rejected() {
    let path = write_model("algorithm", GLUCOSE);
    let task = Task::new(
        ModelSource {
            source: path,
            language: ModelLanguage::ReactionNetwork,
        },
        Simulation {
            kind: SimulationKind::UniformTimeCourse,
            algorithm: Algorithm::new("KISAO_0000088"),
            window: TimeWindow::new(0.0, 1.0),
            number_of_points: 1,
        },
    );
    let err = MassActionBackend::default()
        .preprocess(&task, &[], &BackendConfig::default())
        .unwrap_err();
    assert!(matches!(err, BackendError::Unsupported { .. }));
}

#[test]
fn missing_model_file_names_the_path() {
    let registry = reference_registry();
    let missing = PathBuf::from("/nonexistent/vb/model.yaml");
    let err = SimulatorProcess::new(
        "ode",
        config("mass_action", missing, SimulationKind::UniformTimeCourse),
        &registry,
    )
    .err()
    .unwrap();
    assert!(matches!(
        err,
        vb_sim::SimError::Extraction {
            source: BackendError::ModelFile { .. }
        }
    ));
}

#[test]
fn mass_action_system_rejects_unvalidated_networks() {
    let mut model = ReactionNetwork::from_yaml_str(GLUCOSE).unwrap();
    model.reactions[0].products.insert("ATP".into(), 1.0);
    let err = MassActionSystem::new(&model, vec![0.1]).err().unwrap();
    assert!(matches!(&err, BackendError::InvalidModel { what } if what.contains("ATP")));

    let model = ReactionNetwork::from_yaml_str(GLUCOSE).unwrap();
    assert!(matches!(
        MassActionSystem::new(&model, vec![]),
        Err(BackendError::InvalidModel { .. })
    ));
    assert!(MassActionSystem::new(&model, vec![0.1]).is_ok());
}

proptest! {
    #[test]
    fn mass_action_conserves_total_amount(
        k in 0.0f64..2.0,
        a0 in 0.0f64..100.0,
        b0 in 0.0f64..100.0,
    ) {
        let model = ReactionNetwork::from_yaml_str(
            "species: [{id: A}, {id: B}]\nreactions: [{id: r, reactants: {A: 1}, products: {B: 1}}]\n",
        ).unwrap();
        let system = MassActionSystem::new(&model, vec![k]).unwrap();
        let x = vec![a0, b0];
        let dx = system.rhs(0.0, &x).unwrap();
        prop_assert!((dx[0] + dx[1]).abs() < 1e-9);
        prop_assert!(dx[0] <= 0.0);
    }
}

#[test]
fn deriver_state_is_empty_window() {
    let path = write_model("deriver", GLUCOSE);
    let registry = reference_registry();
    let mut one_step = SimulatorProcess::new(
        "derive",
        config("mass_action", path, SimulationKind::OneStep),
        &registry,
    )
    .unwrap();
    assert!(one_step.is_deriver());

    let state: State = one_step.initial_state();
    let update = one_step.next_update(0.0, &state).unwrap();
    assert!(update
        .get("outputs")
        .unwrap()
        .values
        .values()
        .all(|delta| *delta == 0.0));
}
