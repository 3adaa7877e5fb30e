//! Named stores of variable values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vb_core::{PortValues, Real, UpdatePolicy};

/// Store name -> variable id -> value.
pub type StoreValues = BTreeMap<String, PortValues>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stores {
    stores: StoreValues,
}

impl Stores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, store: &str) -> Option<&PortValues> {
        self.stores.get(store)
    }

    pub fn value(&self, store: &str, variable: &str) -> Option<Real> {
        self.stores.get(store).and_then(|values| values.get(variable)).copied()
    }

    pub fn contains(&self, store: &str, variable: &str) -> bool {
        self.value(store, variable).is_some()
    }

    pub fn set(&mut self, store: &str, variable: &str, value: Real) {
        self.stores
            .entry(store.to_string())
            .or_default()
            .insert(variable.to_string(), value);
    }

    /// Insert only if the variable has no value yet. Returns whether it was inserted.
    pub fn seed(&mut self, store: &str, variable: &str, value: Real) -> bool {
        let values = self.stores.entry(store.to_string()).or_default();
        if values.contains_key(variable) {
            return false;
        }
        values.insert(variable.to_string(), value);
        true
    }

    /// Combine `value` with the stored one; a missing variable starts from zero.
    pub fn apply(&mut self, store: &str, variable: &str, policy: UpdatePolicy, value: Real) {
        let values = self.stores.entry(store.to_string()).or_default();
        let current = values.get(variable).copied().unwrap_or(0.0);
        values.insert(variable.to_string(), policy.apply(current, value));
    }

    pub fn names(&self) -> Vec<String> {
        self.stores.keys().cloned().collect()
    }

    pub fn as_map(&self) -> &StoreValues {
        &self.stores
    }
}
