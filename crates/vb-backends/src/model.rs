//! YAML reaction-network models and their target locators.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use vb_core::Real;
use vb_sim::BackendError;

fn default_lower_bound() -> Real {
    -1000.0
}

fn default_upper_bound() -> Real {
    1000.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Species {
    pub id: String,
    #[serde(default)]
    pub initial_concentration: Real,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reaction {
    pub id: String,
    /// Species id -> stoichiometric coefficient.
    #[serde(default)]
    pub reactants: BTreeMap<String, Real>,
    #[serde(default)]
    pub products: BTreeMap<String, Real>,
    /// Mass-action rate constant.
    #[serde(default)]
    pub rate_constant: Real,
    #[serde(default = "default_lower_bound")]
    pub lower_bound: Real,
    #[serde(default = "default_upper_bound")]
    pub upper_bound: Real,
    /// Objective coefficient for flux balance analysis.
    #[serde(default)]
    pub objective: Real,
}

/// A reaction network usable both as a mass-action ODE and as a
/// flux-balance problem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReactionNetwork {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub species: Vec<Species>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl ReactionNetwork {
    pub fn load(path: &Path) -> Result<Self, BackendError> {
        let text = fs::read_to_string(path).map_err(|source| BackendError::ModelFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, BackendError> {
        let network: ReactionNetwork =
            serde_yaml::from_str(text).map_err(|e| BackendError::InvalidModel {
                what: e.to_string(),
            })?;
        network.validate()?;
        Ok(network)
    }

    pub fn validate(&self) -> Result<(), BackendError> {
        let mut species = BTreeSet::new();
        for s in &self.species {
            if !species.insert(s.id.as_str()) {
                return Err(invalid(format!("duplicate species id '{}'", s.id)));
            }
            if !s.initial_concentration.is_finite() {
                return Err(invalid(format!("species '{}' has a non-finite concentration", s.id)));
            }
        }

        let mut reactions = BTreeSet::new();
        for r in &self.reactions {
            if !reactions.insert(r.id.as_str()) {
                return Err(invalid(format!("duplicate reaction id '{}'", r.id)));
            }
            for id in r.reactants.keys().chain(r.products.keys()) {
                if !species.contains(id.as_str()) {
                    return Err(invalid(format!(
                        "reaction '{}' references unknown species '{id}'",
                        r.id
                    )));
                }
            }
            if r.reactants.values().chain(r.products.values()).any(|c| !c.is_finite() || *c < 0.0) {
                return Err(invalid(format!(
                    "reaction '{}' has a negative or non-finite stoichiometry",
                    r.id
                )));
            }
            if !(r.lower_bound <= r.upper_bound) {
                return Err(invalid(format!(
                    "reaction '{}' has lower bound {} above upper bound {}",
                    r.id, r.lower_bound, r.upper_bound
                )));
            }
        }
        Ok(())
    }

    pub fn species_index(&self, id: &str) -> Option<usize> {
        self.species.iter().position(|s| s.id == id)
    }

    /// Every locator of the model, keyed by its target string.
    pub fn locators(&self) -> BTreeMap<String, Locator> {
        let mut map = BTreeMap::new();
        let mut add = |locator: Locator| {
            map.insert(locator.target(self), locator);
        };
        add(Locator::Time);
        add(Locator::Objective);
        for i in 0..self.species.len() {
            add(Locator::InitialConcentration(i));
            add(Locator::Concentration(i));
        }
        for j in 0..self.reactions.len() {
            add(Locator::RateConstant(j));
            add(Locator::LowerBound(j));
            add(Locator::UpperBound(j));
            add(Locator::Flux(j));
        }
        map
    }
}

fn invalid(what: String) -> BackendError {
    BackendError::InvalidModel { what }
}

/// A quantity inside a reaction network, by species/reaction index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    Time,
    InitialConcentration(usize),
    Concentration(usize),
    RateConstant(usize),
    LowerBound(usize),
    UpperBound(usize),
    Flux(usize),
    Objective,
}

impl Locator {
    /// Target string handed out by the extractor.
    pub fn target(&self, model: &ReactionNetwork) -> String {
        let species = |i: usize| model.species[i].id.as_str();
        let reaction = |j: usize| model.reactions[j].id.as_str();
        match *self {
            Locator::Time => "time".to_string(),
            Locator::Objective => "/model/objective".to_string(),
            Locator::InitialConcentration(i) => {
                format!("/model/species[@id='{}']/@initialConcentration", species(i))
            }
            Locator::Concentration(i) => format!("/model/species[@id='{}']", species(i)),
            Locator::RateConstant(j) => {
                format!("/model/reaction[@id='{}']/@rateConstant", reaction(j))
            }
            Locator::LowerBound(j) => format!("/model/reaction[@id='{}']/@lowerBound", reaction(j)),
            Locator::UpperBound(j) => format!("/model/reaction[@id='{}']/@upperBound", reaction(j)),
            Locator::Flux(j) => format!("/model/reaction[@id='{}']/@flux", reaction(j)),
        }
    }
}
