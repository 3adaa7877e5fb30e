//! Flux unit conversion and bound derivation.

use vb_core::{Quantity, Real, Unit};

use crate::config::FluxBoundsConfig;
use crate::error::{FluxError, FluxResult};

/// Converts a flux accumulated over an interval into a rate in the bounds unit.
#[derive(Debug, Clone)]
pub struct UnitConverter {
    /// Flux unit divided by seconds.
    rate_unit: Unit,
    bounds_unit: Unit,
    mass: Option<Quantity>,
    volume: Option<Quantity>,
}

impl UnitConverter {
    pub fn new(
        flux_unit: &str,
        bounds_unit: &str,
        mass: Option<Quantity>,
        volume: Option<Quantity>,
    ) -> FluxResult<Self> {
        let flux_unit = Unit::parse(flux_unit)?;
        let seconds = Unit::parse("s")?;
        Ok(Self {
            rate_unit: flux_unit.try_div(&seconds)?,
            bounds_unit: Unit::parse(bounds_unit)?,
            mass,
            volume,
        })
    }

    pub fn from_config(config: &FluxBoundsConfig) -> FluxResult<Self> {
        let mass = config.mass.as_ref().map(|q| q.to_quantity()).transpose()?;
        let volume = config.volume.as_ref().map(|q| q.to_quantity()).transpose()?;
        Self::new(&config.flux_unit, &config.bounds_unit, mass, volume)
    }

    pub fn bounds_unit(&self) -> &Unit {
        &self.bounds_unit
    }

    /// `flux / dt` expressed in the bounds unit.
    ///
    /// When the direct conversion is dimensionally invalid, the rate is
    /// rescaled by volume/mass (concentration to mass basis) or mass/volume
    /// (the reverse) using the configured quantities.
    pub fn convert(&self, flux_id: &str, flux: Real, dt: Real) -> FluxResult<Real> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(FluxError::InvalidInterval { interval: dt });
        }
        let rate = Quantity::new(flux / dt, self.rate_unit.clone());

        let primary = match rate.to(&self.bounds_unit) {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };

        let (Some(mass), Some(volume)) = (&self.mass, &self.volume) else {
            return Err(FluxError::UnitConversion {
                flux: flux_id.to_string(),
                primary,
                fallback: None,
            });
        };

        let per_mass = rate.try_mul(volume).and_then(|q| q.try_div(mass));
        let fallback = match per_mass.and_then(|q| q.to(&self.bounds_unit)) {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };
        rate
            .try_mul(mass)
            .and_then(|q| q.try_div(volume))
            .and_then(|q| q.to(&self.bounds_unit))
            .map_err(|_| FluxError::UnitConversion {
                flux: flux_id.to_string(),
                primary,
                fallback: Some(fallback),
            })
    }
}

/// Upper and lower bound derived from a converted flux.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundPair {
    pub upper: Real,
    pub lower: Real,
}

/// Bound pair around `converted_flux`.
///
/// Both endpoints `flux * range[i]` are computed. A non-positive flux pins
/// the upper bound to zero and takes the smaller endpoint as lower bound; a
/// positive flux pins the lower bound to zero and takes the larger endpoint
/// as upper bound.
pub fn derive_bounds(converted_flux: Real, range: [Real; 2]) -> BoundPair {
    let a = converted_flux * range[0];
    let b = converted_flux * range[1];
    let max_v = a.max(b);
    let min_v = a.min(b);
    if converted_flux <= 0.0 {
        BoundPair {
            upper: 0.0,
            lower: min_v,
        }
    } else {
        BoundPair {
            upper: max_v,
            lower: 0.0,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn one_side_is_always_zero(
            flux in -1e6f64..1e6,
            lo in 0.0f64..2.0,
            hi in 0.0f64..2.0,
        ) {
            let pair = derive_bounds(flux, [lo, hi]);
            if flux <= 0.0 {
                prop_assert_eq!(pair.upper, 0.0);
                prop_assert_eq!(pair.lower, (flux * lo).min(flux * hi));
                prop_assert!(pair.lower <= 0.0);
            } else {
                prop_assert_eq!(pair.lower, 0.0);
                prop_assert_eq!(pair.upper, (flux * lo).max(flux * hi));
                prop_assert!(pair.upper >= 0.0);
            }
        }
    }
}
