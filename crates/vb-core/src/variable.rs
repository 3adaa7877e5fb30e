//! Model variables as reported by a variable extractor.

use serde::{Deserialize, Serialize};

use crate::numeric::Real;

/// XML-style namespace needed to resolve a target locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    pub prefix: String,
    pub uri: String,
}

/// One quantity a simulator can read or report.
///
/// `target` is an opaque locator understood by the simulator backend; the
/// core never interprets it. Inputs carry their current value in the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Namespace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<Real>,
}

impl Variable {
    pub fn new(id: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            target: target.into(),
            namespace: None,
            initial_value: None,
        }
    }

    pub fn with_initial_value(mut self, value: Real) -> Self {
        self.initial_value = Some(value);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = Some(namespace);
        self
    }
}

/// The four collections returned by a variable extractor.
///
/// Only `inputs` and `outputs` drive port assignment; the secondary lists are
/// carried along for inspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedVariables {
    pub inputs: Vec<Variable>,
    #[serde(default)]
    pub parameters: Vec<Variable>,
    pub outputs: Vec<Variable>,
    #[serde(default)]
    pub secondary_outputs: Vec<Variable>,
}

impl ExtractedVariables {
    pub fn input_ids(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|v| v.id.as_str())
    }

    pub fn output_ids(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|v| v.id.as_str())
    }

    pub fn input(&self, id: &str) -> Option<&Variable> {
        self.inputs.iter().find(|v| v.id == id)
    }

    pub fn output(&self, id: &str) -> Option<&Variable> {
        self.outputs.iter().find(|v| v.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_id() {
        let vars = ExtractedVariables {
            inputs: vec![Variable::new("k1", "/model/k1").with_initial_value(0.5)],
            outputs: vec![Variable::new("time", "urn:sedml:symbol:time")],
            ..Default::default()
        };
        assert_eq!(vars.input("k1").and_then(|v| v.initial_value), Some(0.5));
        assert!(vars.input("time").is_none());
        assert_eq!(vars.output_ids().collect::<Vec<_>>(), vec!["time"]);
    }
}
