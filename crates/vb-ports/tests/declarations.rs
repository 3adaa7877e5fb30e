//! Integration tests for port declarations read from configuration.

use vb_core::Variable;
use vb_ports::{Direction, PortDecl, PortError, PortVariables, assign_variables};

fn tellurium_like_inputs() -> Vec<Variable> {
    vec![
        Variable::new(
            "init_conc_species_S1",
            "/model/species[@id='S1']/@initialConcentration",
        )
        .with_initial_value(10.0),
        Variable::new(
            "init_conc_species_S2",
            "/model/species[@id='S2']/@initialConcentration",
        )
        .with_initial_value(0.0),
        Variable::new(
            "init_size_compartment_cell",
            "/model/compartment[@id='cell']/@size",
        )
        .with_initial_value(1.0),
        Variable::new("value_parameter_k1", "/model/parameter[@id='k1']/@value")
            .with_initial_value(0.1),
    ]
}

#[test]
fn yaml_declarations_accept_single_ids_and_lists() {
    let yaml = r#"
- name: concentrations
  variables: [init_conc_species_S1, init_conc_species_S2]
- name: size
  variables: init_size_compartment_cell
"#;
    let declared: Vec<PortDecl> = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(
        declared[1].variables,
        PortVariables::One("init_size_compartment_cell".into())
    );

    let ports = assign_variables(
        &tellurium_like_inputs(),
        &declared,
        "inputs",
        Direction::Input,
    )
    .unwrap();

    assert_eq!(ports.port_names(), ["concentrations", "size", "inputs"]);
    assert_eq!(
        ports.variables("concentrations").unwrap(),
        ["init_conc_species_S1", "init_conc_species_S2"]
    );
    assert_eq!(ports.variables("size").unwrap(), ["init_size_compartment_cell"]);
    assert_eq!(ports.variables("inputs").unwrap(), ["value_parameter_k1"]);
    assert_eq!(ports.variable_count(), 4);
}

#[test]
fn declaration_order_is_port_order() {
    let declared = vec![
        PortDecl::single("zeta", "value_parameter_k1"),
        PortDecl::single("alpha", "init_conc_species_S2"),
    ];
    let ports = assign_variables(
        &tellurium_like_inputs(),
        &declared,
        "rest",
        Direction::Input,
    )
    .unwrap();
    let names: Vec<&str> = ports.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["zeta", "alpha", "rest"]);
}

#[test]
fn typo_in_declaration_names_the_legal_set() {
    let declared = vec![PortDecl::single("concentrations", "init_conc_species_S9")];
    let err = assign_variables(
        &tellurium_like_inputs(),
        &declared,
        "inputs",
        Direction::Input,
    )
    .unwrap_err();
    assert!(matches!(err, PortError::UnknownVariable { .. }));
    let msg = err.to_string();
    assert!(msg.contains("init_conc_species_S9"));
    assert!(msg.contains("value_parameter_k1"));
    assert!(msg.contains("input"));
}
