//! Process trait and the state/update shapes exchanged with a hosting engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::numeric::Real;

/// Values of one port, keyed by variable id.
pub type PortValues = BTreeMap<String, Real>;

/// How an update value combines with the value already in a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePolicy {
    /// Add the update to the existing value.
    #[default]
    Accumulate,
    /// Replace the existing value.
    Set,
}

impl UpdatePolicy {
    pub fn apply(self, current: Real, update: Real) -> Real {
        match self {
            UpdatePolicy::Accumulate => current + update,
            UpdatePolicy::Set => update,
        }
    }
}

/// Schema entry for one variable of a port.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariableSchema {
    pub default: Real,
    pub emit: bool,
    pub updater: UpdatePolicy,
}

pub type PortSchema = BTreeMap<String, VariableSchema>;

/// Port name -> variable id -> schema entry.
pub type Schema = BTreeMap<String, PortSchema>;

/// Snapshot of the values a process sees at one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub global_time: Real,
    pub ports: BTreeMap<String, PortValues>,
}

impl State {
    pub fn new(global_time: Real) -> Self {
        Self {
            global_time,
            ports: BTreeMap::new(),
        }
    }

    pub fn with_port(mut self, port: impl Into<String>, values: PortValues) -> Self {
        self.ports.insert(port.into(), values);
        self
    }

    pub fn port(&self, port: &str) -> Option<&PortValues> {
        self.ports.get(port)
    }

    pub fn value(&self, port: &str, id: &str) -> Option<Real> {
        self.ports.get(port).and_then(|values| values.get(id)).copied()
    }

    pub fn set(&mut self, port: &str, id: &str, value: Real) {
        self.ports
            .entry(port.to_string())
            .or_default()
            .insert(id.to_string(), value);
    }
}

/// Update for one port, tagged with its policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortUpdate {
    pub policy: UpdatePolicy,
    pub values: PortValues,
}

impl PortUpdate {
    pub fn accumulate(values: PortValues) -> Self {
        Self {
            policy: UpdatePolicy::Accumulate,
            values,
        }
    }

    pub fn set(values: PortValues) -> Self {
        Self {
            policy: UpdatePolicy::Set,
            values,
        }
    }
}

/// The result of one process step, keyed by port name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    ports: BTreeMap<String, PortUpdate>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, port: impl Into<String>, update: PortUpdate) {
        self.ports.insert(port.into(), update);
    }

    pub fn get(&self, port: &str) -> Option<&PortUpdate> {
        self.ports.get(port)
    }

    pub fn contains_port(&self, port: &str) -> bool {
        self.ports.contains_key(port)
    }

    pub fn ports(&self) -> impl Iterator<Item = (&str, &PortUpdate)> {
        self.ports.iter().map(|(name, update)| (name.as_str(), update))
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Apply this update to `state` in place, honouring each port's policy.
    ///
    /// Variables missing from `state` start from zero.
    pub fn apply_to(&self, state: &mut State) {
        for (port, update) in &self.ports {
            let values = state.ports.entry(port.clone()).or_default();
            for (id, value) in &update.values {
                let current = values.get(id).copied().unwrap_or(0.0);
                values.insert(id.clone(), update.policy.apply(current, *value));
            }
        }
    }
}

/// A unit of computation driven step by step by a hosting engine.
///
/// A Process must provide:
/// - A schema describing every port and variable it touches
/// - An initial state consistent with that schema
/// - `next_update`: read the current state, return an update for its ports
///
/// Steps run strictly one after another; `next_update` takes `&mut self`.
pub trait Process {
    type Error: std::error::Error + Send + Sync + 'static;

    fn name(&self) -> &str;

    /// Preferred synchronization interval.
    fn time_step(&self) -> Real;

    /// Derivers recompute state from the current values instead of
    /// advancing time.
    fn is_deriver(&self) -> bool {
        false
    }

    fn ports_schema(&self) -> Schema;

    fn initial_state(&self) -> State;

    fn next_update(&mut self, interval: Real, states: &State) -> Result<Update, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, Real)]) -> PortValues {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn accumulate_adds_and_set_replaces() {
        let mut state = State::new(0.0)
            .with_port("outputs", values(&[("a", 1.0)]))
            .with_port("bounds", values(&[("ub", 4.0)]));

        let mut update = Update::new();
        update.insert("outputs", PortUpdate::accumulate(values(&[("a", 2.0)])));
        update.insert("bounds", PortUpdate::set(values(&[("ub", 7.0)])));

        update.apply_to(&mut state);
        assert_eq!(state.value("outputs", "a"), Some(3.0));
        assert_eq!(state.value("bounds", "ub"), Some(7.0));

        update.apply_to(&mut state);
        assert_eq!(state.value("outputs", "a"), Some(5.0));
        assert_eq!(state.value("bounds", "ub"), Some(7.0));
    }

    #[test]
    fn apply_creates_missing_entries() {
        let mut state = State::new(0.0);
        let mut update = Update::new();
        update.insert("outputs", PortUpdate::accumulate(values(&[("x", 1.5)])));
        update.apply_to(&mut state);
        assert_eq!(state.value("outputs", "x"), Some(1.5));
    }
}
