use std::path::Path;

use vb_project::ProcessKind;

#[test]
fn demos_load_and_validate() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");
    let demos = ["ode_fba.yaml", "ode_only.yaml"];

    for name in demos {
        let path = root.join(name);
        let experiment = vb_project::load_yaml(&path)
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        vb_project::validate_experiment(&experiment)
            .unwrap_or_else(|e| panic!("Failed to validate {}: {}", name, e));

        for process in &experiment.processes {
            for config in process.kind.simulator_configs() {
                assert!(config.model.source.is_absolute() || config.model.source.starts_with(&root));
                assert!(config.model.source.exists(), "missing model for {}", process.id);
            }
        }
    }
}

#[test]
fn ode_fba_demo_shape() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/ode_fba.yaml");
    let experiment = vb_project::load_yaml(&path).unwrap();

    assert_eq!(experiment.processes.len(), 2);
    match &experiment.process("ode").unwrap().kind {
        ProcessKind::FluxBounds { producer, bounds } => {
            assert_eq!(producer.simulator, "mass_action");
            assert_eq!(producer.output_ports[0].name, "fluxes");
            assert_eq!(bounds.bounds_port, "bounds");
            assert_eq!(bounds.flux_to_bound_map.len(), 1);
        }
        other => panic!("unexpected kind: {other:?}"),
    }
    assert_eq!(experiment.wiring_of("ode").count(), 3);
}
