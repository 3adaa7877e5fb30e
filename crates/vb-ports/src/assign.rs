//! Variable-to-port assignment.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use vb_core::Variable;

use crate::error::{PortError, PortResult};

/// Which side of a simulator a port belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// Variables listed for one port: a single id or a list of ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortVariables {
    One(String),
    Many(Vec<String>),
}

impl PortVariables {
    pub fn as_slice(&self) -> &[String] {
        match self {
            PortVariables::One(id) => std::slice::from_ref(id),
            PortVariables::Many(ids) => ids,
        }
    }
}

/// A user-declared port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDecl {
    pub name: String,
    pub variables: PortVariables,
}

impl PortDecl {
    pub fn new<I, S>(name: impl Into<String>, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            variables: PortVariables::Many(variables.into_iter().map(Into::into).collect()),
        }
    }

    pub fn single(name: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: PortVariables::One(variable.into()),
        }
    }
}

/// Immutable mapping from port name to the ordered variable ids it carries.
///
/// Every native variable of the direction appears in exactly one port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortAssignment {
    order: Vec<String>,
    ports: BTreeMap<String, Vec<String>>,
}

impl PortAssignment {
    /// Port names in declaration order, the default port last.
    pub fn port_names(&self) -> &[String] {
        &self.order
    }

    pub fn variables(&self, port: &str) -> Option<&[String]> {
        self.ports.get(port).map(Vec::as_slice)
    }

    pub fn contains_port(&self, port: &str) -> bool {
        self.ports.contains_key(port)
    }

    /// Name of the port carrying `variable`, if any.
    pub fn port_of(&self, variable: &str) -> Option<&str> {
        self.iter()
            .find(|(_, vars)| vars.iter().any(|v| v == variable))
            .map(|(port, _)| port)
    }

    /// Iterate `(port, variables)` in port order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.order
            .iter()
            .filter_map(|name| self.ports.get(name).map(|vars| (name.as_str(), vars.as_slice())))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total number of variables across all ports.
    pub fn variable_count(&self) -> usize {
        self.ports.values().map(Vec::len).sum()
    }
}

/// Partition `native` variable ids into ports.
///
/// Declared ports are taken in order; whatever is left goes to a port named
/// `default_port_name`, appended last. No default port is created when the
/// declarations cover every native variable.
pub fn assign_ports<I, S>(
    native: I,
    declared: &[PortDecl],
    default_port_name: &str,
    direction: Direction,
) -> PortResult<PortAssignment>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let native: Vec<String> = native.into_iter().map(|s| s.as_ref().to_string()).collect();
    let native_set: BTreeSet<&str> = native.iter().map(String::as_str).collect();
    let mut remaining: BTreeSet<&str> = native_set.clone();
    // Variable id -> port that took it
    let mut owner: BTreeMap<&str, &str> = BTreeMap::new();

    let mut assignment = PortAssignment::default();

    for decl in declared {
        if decl.name.is_empty() {
            return Err(PortError::EmptyPortName);
        }
        if assignment.contains_port(&decl.name) {
            return Err(PortError::DuplicatePortName {
                port: decl.name.clone(),
            });
        }

        let ids = decl.variables.as_slice();
        for id in ids {
            if !native_set.contains(id.as_str()) {
                return Err(PortError::UnknownVariable {
                    id: id.clone(),
                    port: decl.name.clone(),
                    direction,
                    available: native.clone(),
                });
            }
            if !remaining.remove(id.as_str()) {
                let first_port = owner.get(id.as_str()).copied().unwrap_or(decl.name.as_str());
                return Err(PortError::DuplicateAssignment {
                    id: id.clone(),
                    port: decl.name.clone(),
                    first_port: first_port.to_string(),
                    direction,
                });
            }
            owner.insert(id.as_str(), decl.name.as_str());
        }

        assignment.order.push(decl.name.clone());
        assignment.ports.insert(decl.name.clone(), ids.to_vec());
    }

    if !remaining.is_empty() {
        if default_port_name.is_empty() {
            return Err(PortError::EmptyPortName);
        }
        if assignment.contains_port(default_port_name) {
            return Err(PortError::DuplicatePortName {
                port: default_port_name.to_string(),
            });
        }
        let leftover: Vec<String> = native
            .iter()
            .filter(|id| remaining.contains(id.as_str()))
            .cloned()
            .collect();
        assignment.order.push(default_port_name.to_string());
        assignment.ports.insert(default_port_name.to_string(), leftover);
    }

    Ok(assignment)
}

/// Partition extracted variables into ports by their ids.
pub fn assign_variables(
    variables: &[Variable],
    declared: &[PortDecl],
    default_port_name: &str,
    direction: Direction,
) -> PortResult<PortAssignment> {
    assign_ports(
        variables.iter().map(|v| v.id.as_str()),
        declared,
        default_port_name,
        direction,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undeclared_variables_fall_to_default_port() {
        let declared = vec![PortDecl::single("time", "time")];
        let ports = assign_ports(["time", "S1", "S2"], &declared, "outputs", Direction::Output)
            .unwrap();
        assert_eq!(ports.port_names(), ["time", "outputs"]);
        assert_eq!(ports.variables("outputs").unwrap(), ["S1", "S2"]);
        assert_eq!(ports.port_of("S2"), Some("outputs"));
    }

    #[test]
    fn no_default_port_when_fully_covered() {
        let declared = vec![PortDecl::new("all", ["a", "b"])];
        let ports = assign_ports(["a", "b"], &declared, "inputs", Direction::Input).unwrap();
        assert_eq!(ports.port_names(), ["all"]);
        assert!(!ports.contains_port("inputs"));
    }

    #[test]
    fn no_declarations_yields_single_default_port() {
        let ports = assign_ports(["x", "y"], &[], "inputs", Direction::Input).unwrap();
        assert_eq!(ports.port_names(), ["inputs"]);
        assert_eq!(ports.variables("inputs").unwrap(), ["x", "y"]);
    }

    #[test]
    fn empty_native_set_yields_no_ports() {
        let ports = assign_ports(Vec::<String>::new(), &[], "inputs", Direction::Input).unwrap();
        assert!(ports.is_empty());
    }

    #[test]
    fn unknown_variable_reports_full_native_set() {
        let declared = vec![PortDecl::single("p", "S3")];
        let err = assign_ports(["S1", "S2"], &declared, "inputs", Direction::Input).unwrap_err();
        match &err {
            PortError::UnknownVariable { id, available, .. } => {
                assert_eq!(id, "S3");
                assert_eq!(available, &vec!["S1".to_string(), "S2".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("S3") && msg.contains("S1") && msg.contains("S2"));
    }

    #[test]
    fn variable_in_two_ports_is_rejected() {
        let declared = vec![PortDecl::single("a", "S1"), PortDecl::new("b", ["S2", "S1"])];
        let err = assign_ports(["S1", "S2"], &declared, "inputs", Direction::Input).unwrap_err();
        assert_eq!(
            err,
            PortError::DuplicateAssignment {
                id: "S1".into(),
                port: "b".into(),
                first_port: "a".into(),
                direction: Direction::Input,
            }
        );
    }

    #[test]
    fn variable_repeated_within_one_port_is_rejected() {
        let declared = vec![PortDecl::new("a", ["S1", "S1"])];
        let err = assign_ports(["S1"], &declared, "inputs", Direction::Input).unwrap_err();
        assert!(matches!(err, PortError::DuplicateAssignment { .. }));
    }

    #[test]
    fn default_name_clash_is_rejected() {
        let declared = vec![PortDecl::single("inputs", "a")];
        let err = assign_ports(["a", "b"], &declared, "inputs", Direction::Input).unwrap_err();
        assert_eq!(
            err,
            PortError::DuplicatePortName {
                port: "inputs".into()
            }
        );
    }

    #[test]
    fn empty_port_list_is_kept() {
        let declared = vec![PortDecl::new("empty", Vec::<String>::new())];
        let ports = assign_ports(["a"], &declared, "inputs", Direction::Input).unwrap();
        assert_eq!(ports.port_names(), ["empty", "inputs"]);
        assert_eq!(ports.variables("empty").unwrap().len(), 0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn partition_is_complete_and_disjoint(
            n in 0usize..24,
            picks in prop::collection::vec(0usize..4, 24),
        ) {
            let native: Vec<String> = (0..n).map(|i| format!("v{i}")).collect();

            // picks[i] in 0..3 puts v{i} into declared port p{pick}; 3 leaves it undeclared
            let mut declared: Vec<PortDecl> = (0..3).map(|p| PortDecl::new(format!("p{p}"), Vec::<String>::new())).collect();
            for (i, id) in native.iter().enumerate() {
                let pick = picks[i];
                if pick < 3 {
                    if let PortVariables::Many(ids) = &mut declared[pick].variables {
                        ids.push(id.clone());
                    }
                }
            }

            let ports = assign_ports(&native, &declared, "default", Direction::Output).unwrap();

            let mut seen: Vec<String> = ports.iter().flat_map(|(_, vars)| vars.iter().cloned()).collect();
            prop_assert_eq!(seen.len(), native.len());
            seen.sort();
            let mut expected = native.clone();
            expected.sort();
            prop_assert_eq!(seen, expected);

            let undeclared = picks.iter().take(n).filter(|&&p| p == 3).count();
            prop_assert_eq!(ports.contains_port("default"), undeclared > 0);
            if undeclared > 0 {
                prop_assert_eq!(ports.port_names().last().map(String::as_str), Some("default"));
            }
        }
    }
}
