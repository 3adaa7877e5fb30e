//! Flux-bounds converter configuration.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use vb_core::{Quantity, Real, UnitError};

use crate::error::{FluxError, FluxResult};

fn default_flux_port() -> String {
    "fluxes".to_string()
}

fn default_bounds_port() -> String {
    "bounds".to_string()
}

fn default_flux_unit() -> String {
    "mol/L".to_string()
}

fn default_bounds_unit() -> String {
    "mmol/L/s".to_string()
}

/// A magnitude with a unit expression, as written in configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuantitySpec {
    pub magnitude: Real,
    pub unit: String,
}

impl QuantitySpec {
    pub fn new(magnitude: Real, unit: impl Into<String>) -> Self {
        Self {
            magnitude,
            unit: unit.into(),
        }
    }

    pub fn to_quantity(&self) -> Result<Quantity, UnitError> {
        Quantity::parse(self.magnitude, &self.unit)
    }
}

/// Where a converted flux goes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BoundTarget {
    /// The converted flux is written to this bound as-is.
    Direct(String),
    /// An upper/lower pair derived from a range around the converted flux.
    Range {
        upper_bound_id: String,
        lower_bound_id: String,
        proportional_range: [Real; 2],
    },
}

impl BoundTarget {
    pub fn range(
        upper_bound_id: impl Into<String>,
        lower_bound_id: impl Into<String>,
        proportional_range: [Real; 2],
    ) -> Self {
        BoundTarget::Range {
            upper_bound_id: upper_bound_id.into(),
            lower_bound_id: lower_bound_id.into(),
            proportional_range,
        }
    }

    /// Bound ids written by this target.
    pub fn bound_ids(&self) -> Vec<&str> {
        match self {
            BoundTarget::Direct(id) => vec![id.as_str()],
            BoundTarget::Range {
                upper_bound_id,
                lower_bound_id,
                ..
            } => vec![upper_bound_id.as_str(), lower_bound_id.as_str()],
        }
    }
}

/// Settings for a flux-bounds converter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FluxBoundsConfig {
    #[serde(default = "default_flux_port")]
    pub flux_port: String,
    #[serde(default = "default_bounds_port")]
    pub bounds_port: String,
    /// Unit of the producer's flux values (an amount per volume).
    #[serde(default = "default_flux_unit")]
    pub flux_unit: String,
    #[serde(default = "default_bounds_unit")]
    pub bounds_unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<QuantitySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<QuantitySpec>,
    /// Flux id -> bound target.
    #[serde(default)]
    pub flux_to_bound_map: BTreeMap<String, BoundTarget>,
}

impl Default for FluxBoundsConfig {
    fn default() -> Self {
        Self {
            flux_port: default_flux_port(),
            bounds_port: default_bounds_port(),
            flux_unit: default_flux_unit(),
            bounds_unit: default_bounds_unit(),
            mass: None,
            volume: None,
            flux_to_bound_map: BTreeMap::new(),
        }
    }
}

impl FluxBoundsConfig {
    pub fn with_target(mut self, flux_id: impl Into<String>, target: BoundTarget) -> Self {
        self.flux_to_bound_map.insert(flux_id.into(), target);
        self
    }

    /// Check ranges and that no bound id is written by two targets.
    pub fn validate(&self) -> FluxResult<()> {
        if self.flux_port.is_empty() || self.bounds_port.is_empty() {
            return Err(FluxError::Mapping {
                what: "flux and bounds port names must not be empty".into(),
            });
        }
        if self.flux_port == self.bounds_port {
            return Err(FluxError::ReservedPort {
                port: self.bounds_port.clone(),
            });
        }

        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for (flux, target) in &self.flux_to_bound_map {
            if let BoundTarget::Range {
                proportional_range: [lo, hi],
                ..
            } = target
            {
                if !lo.is_finite() || !hi.is_finite() {
                    return Err(FluxError::InvalidRange {
                        flux: flux.clone(),
                        lo: *lo,
                        hi: *hi,
                    });
                }
            }
            for id in target.bound_ids() {
                if !seen.insert(id) {
                    return Err(FluxError::Mapping {
                        what: format!("bound '{id}' is targeted more than once (last by flux '{flux}')"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Every bound id, in map order.
    pub fn bound_ids(&self) -> Vec<&str> {
        self.flux_to_bound_map
            .values()
            .flat_map(BoundTarget::bound_ids)
            .collect()
    }
}
