// vb-core/src/units.rs

use std::fmt;

use uom::si::f64::{
    AmountOfSubstance as UomAmount, Length as UomLength, Mass as UomMass, Time as UomTime,
    Volume as UomVolume,
};

use crate::error::UnitError;
use crate::numeric::Real;

// Public canonical unit types (SI, f64)
pub type Amount = UomAmount;
pub type Length = UomLength;
pub type Mass = UomMass;
pub type Time = UomTime;
pub type Volume = UomVolume;

#[inline]
pub fn mol(v: f64) -> Amount {
    use uom::si::amount_of_substance::mole;
    Amount::new::<mole>(v)
}

#[inline]
pub fn liters(v: f64) -> Volume {
    use uom::si::volume::liter;
    Volume::new::<liter>(v)
}

#[inline]
pub fn grams(v: f64) -> Mass {
    use uom::si::mass::gram;
    Mass::new::<gram>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

/// Exponents of the base dimensions spanned by a unit expression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dimension {
    pub amount: i8,
    pub length: i8,
    pub mass: i8,
    pub time: i8,
}

impl Dimension {
    pub const NONE: Self = Self::new(0, 0, 0, 0);
    pub const AMOUNT: Self = Self::new(1, 0, 0, 0);
    pub const LENGTH: Self = Self::new(0, 1, 0, 0);
    pub const VOLUME: Self = Self::new(0, 3, 0, 0);
    pub const MASS: Self = Self::new(0, 0, 1, 0);
    pub const TIME: Self = Self::new(0, 0, 0, 1);
    pub const CONCENTRATION: Self = Self::new(1, -3, 0, 0);

    pub const fn new(amount: i8, length: i8, mass: i8, time: i8) -> Self {
        Self {
            amount,
            length,
            mass,
            time,
        }
    }

    pub fn is_dimensionless(self) -> bool {
        self == Self::NONE
    }

    /// Every exponent scaled by `exp`; `None` when one leaves the `i8` range.
    pub fn checked_powi(self, exp: i8) -> Option<Self> {
        Some(Self::new(
            self.amount.checked_mul(exp)?,
            self.length.checked_mul(exp)?,
            self.mass.checked_mul(exp)?,
            self.time.checked_mul(exp)?,
        ))
    }

    /// Dimension of a product.
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        Some(Self::new(
            self.amount.checked_add(rhs.amount)?,
            self.length.checked_add(rhs.length)?,
            self.mass.checked_add(rhs.mass)?,
            self.time.checked_add(rhs.time)?,
        ))
    }

    /// Dimension of a quotient.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        self.checked_mul(rhs.checked_powi(-1)?)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "dimensionless");
        }
        let mut parts = Vec::new();
        for (symbol, exp) in [
            ("N", self.amount),
            ("L", self.length),
            ("M", self.mass),
            ("T", self.time),
        ] {
            match exp {
                0 => {}
                1 => parts.push(symbol.to_string()),
                e => parts.push(format!("{symbol}^{e}")),
            }
        }
        write!(f, "{}", parts.join("·"))
    }
}

/// A parsed unit expression such as `mmol/L/s` or `mmol/g/h`.
///
/// Stores the factor that converts one of this unit into SI base units
/// (mol, m, kg, s) together with its dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    expr: String,
    factor: Real,
    dim: Dimension,
}

const PREFIXES: &[(&str, f64)] = &[
    ("f", 1e-15),
    ("p", 1e-12),
    ("n", 1e-9),
    ("u", 1e-6),
    ("µ", 1e-6),
    ("m", 1e-3),
    ("c", 1e-2),
    ("d", 1e-1),
    ("k", 1e3),
];

const PREFIXABLE: &[&str] = &["mol", "M", "L", "l", "g", "m", "s"];

fn base_symbol(symbol: &str) -> Option<(Real, Dimension)> {
    use uom::si::amount_of_substance::mole;
    use uom::si::length::meter;
    use uom::si::mass::kilogram;
    use uom::si::time::{day, hour, minute, second};
    use uom::si::volume::cubic_meter;

    let per_liter = 1.0 / liters(1.0).get::<cubic_meter>();
    let entry = match symbol {
        "mol" => (mol(1.0).get::<mole>(), Dimension::AMOUNT),
        "M" => (mol(1.0).get::<mole>() * per_liter, Dimension::CONCENTRATION),
        "L" | "l" => (liters(1.0).get::<cubic_meter>(), Dimension::VOLUME),
        "g" => (grams(1.0).get::<kilogram>(), Dimension::MASS),
        "m" => (m(1.0).get::<meter>(), Dimension::LENGTH),
        "s" => (s(1.0).get::<second>(), Dimension::TIME),
        "min" => (Time::new::<minute>(1.0).get::<second>(), Dimension::TIME),
        "h" | "hr" => (Time::new::<hour>(1.0).get::<second>(), Dimension::TIME),
        "day" => (Time::new::<day>(1.0).get::<second>(), Dimension::TIME),
        _ => return None,
    };
    Some(entry)
}

fn lookup_symbol(symbol: &str) -> Option<(Real, Dimension)> {
    if let Some(found) = base_symbol(symbol) {
        return Some(found);
    }
    PREFIXES.iter().find_map(|(prefix, scale)| {
        let rest = symbol.strip_prefix(prefix)?;
        if !PREFIXABLE.contains(&rest) {
            return None;
        }
        base_symbol(rest).map(|(factor, dim)| (factor * scale, dim))
    })
}

impl Unit {
    pub fn dimensionless() -> Self {
        Self {
            expr: "1".to_string(),
            factor: 1.0,
            dim: Dimension::NONE,
        }
    }

    /// Parse a unit expression made of symbols joined by `*` and `/`.
    ///
    /// Operators associate left to right, so `mmol/L/s` is `(mmol / L) / s`.
    /// Symbols accept an integer exponent (`m^3`) and SI prefixes on the
    /// base symbols (`mmol`, `fL`, `mg`, `ms`).
    pub fn parse(expr: &str) -> Result<Self, UnitError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() || trimmed == "1" || trimmed == "dimensionless" {
            return Ok(Self::dimensionless());
        }

        let mut terms: Vec<(i8, &str)> = Vec::new();
        let mut sign: i8 = 1;
        let mut start = 0;
        for (i, ch) in trimmed.char_indices() {
            if ch == '*' || ch == '/' {
                terms.push((sign, &trimmed[start..i]));
                sign = if ch == '/' { -1 } else { 1 };
                start = i + ch.len_utf8();
            }
        }
        terms.push((sign, &trimmed[start..]));

        let mut factor = 1.0;
        let mut dim = Dimension::NONE;
        for (position, (sign, term)) in terms.into_iter().enumerate() {
            let term = term.trim();
            if term.is_empty() {
                return Err(UnitError::Parse {
                    expr: trimmed.to_string(),
                    reason: "empty term".to_string(),
                });
            }
            if term == "1" && position == 0 {
                continue;
            }

            let (symbol, exp) = match term.split_once('^') {
                Some((symbol, exp)) => {
                    let exp: i8 = exp.trim().parse().map_err(|_| UnitError::Parse {
                        expr: trimmed.to_string(),
                        reason: format!("invalid exponent in '{term}'"),
                    })?;
                    (symbol.trim(), exp)
                }
                None => (term, 1),
            };

            let (base_factor, base_dim) =
                lookup_symbol(symbol).ok_or_else(|| UnitError::UnknownUnit {
                    symbol: symbol.to_string(),
                    expr: trimmed.to_string(),
                })?;

            let out_of_range = || UnitError::Parse {
                expr: trimmed.to_string(),
                reason: format!("exponent out of range in '{term}'"),
            };
            let exp = exp.checked_mul(sign).ok_or_else(out_of_range)?;
            factor *= base_factor.powi(exp as i32);
            dim = base_dim
                .checked_powi(exp)
                .and_then(|d| dim.checked_mul(d))
                .ok_or_else(out_of_range)?;
        }

        Ok(Self {
            expr: trimmed.to_string(),
            factor,
            dim,
        })
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// Multiplier converting a magnitude in this unit to SI base units.
    pub fn factor(&self) -> Real {
        self.factor
    }

    pub fn dimension(&self) -> Dimension {
        self.dim
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dim == other.dim
    }

    /// Multiplier converting a magnitude in `self` to a magnitude in `target`.
    pub fn conversion_factor(&self, target: &Unit) -> Result<Real, UnitError> {
        if !self.is_compatible(target) {
            return Err(UnitError::Incompatible {
                from: self.expr.clone(),
                from_dim: self.dim.to_string(),
                to: target.expr.clone(),
                to_dim: target.dim.to_string(),
            });
        }
        Ok(self.factor / target.factor)
    }

    /// `self * rhs`; fails when a combined exponent leaves the `i8` range.
    pub fn try_mul(&self, rhs: &Unit) -> Result<Unit, UnitError> {
        let expr = format!("{}*{}", self.expr, rhs.expr);
        match self.dim.checked_mul(rhs.dim) {
            Some(dim) => Ok(Unit {
                expr,
                factor: self.factor * rhs.factor,
                dim,
            }),
            None => Err(exponent_overflow(expr)),
        }
    }

    /// `self / rhs`; fails when a combined exponent leaves the `i8` range.
    pub fn try_div(&self, rhs: &Unit) -> Result<Unit, UnitError> {
        let expr = format!("{}/({})", self.expr, rhs.expr);
        match self.dim.checked_div(rhs.dim) {
            Some(dim) => Ok(Unit {
                expr,
                factor: self.factor / rhs.factor,
                dim,
            }),
            None => Err(exponent_overflow(expr)),
        }
    }
}

fn exponent_overflow(expr: String) -> UnitError {
    UnitError::Parse {
        expr,
        reason: "dimension exponent out of range".to_string(),
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}

/// A magnitude paired with a unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Quantity {
    magnitude: Real,
    unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: Real, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    pub fn parse(magnitude: Real, unit: &str) -> Result<Self, UnitError> {
        Ok(Self::new(magnitude, Unit::parse(unit)?))
    }

    pub fn magnitude(&self) -> Real {
        self.magnitude
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// Convert to `target` and return the magnitude expressed in it.
    pub fn to(&self, target: &Unit) -> Result<Real, UnitError> {
        Ok(self.magnitude * self.unit.conversion_factor(target)?)
    }

    pub fn try_mul(&self, rhs: &Quantity) -> Result<Quantity, UnitError> {
        Ok(Quantity::new(
            self.magnitude * rhs.magnitude,
            self.unit.try_mul(&rhs.unit)?,
        ))
    }

    pub fn try_div(&self, rhs: &Quantity) -> Result<Quantity, UnitError> {
        Ok(Quantity::new(
            self.magnitude / rhs.magnitude,
            self.unit.try_div(&rhs.unit)?,
        ))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{Tolerances, nearly_equal};

    fn close(a: f64, b: f64) -> bool {
        nearly_equal(a, b, Tolerances::default())
    }

    #[test]
    fn constructors_smoke() {
        let _n = mol(1.0);
        let _v = liters(2.0);
        let _m = grams(3.0);
        let _l = m(1.0);
        let _t = s(0.1);
    }

    #[test]
    fn parse_left_associative_division() {
        let unit = Unit::parse("mmol/L/s").unwrap();
        assert_eq!(unit.dimension(), Dimension::new(1, -3, 0, -1));
        // 1 mmol/L/s == 1 mol/m^3/s
        assert!(close(unit.factor(), 1.0));
    }

    #[test]
    fn parse_prefixes_and_exponents() {
        assert!(close(Unit::parse("fL").unwrap().factor(), 1e-18));
        assert!(close(Unit::parse("mg").unwrap().factor(), 1e-6));
        assert!(close(Unit::parse("min").unwrap().factor(), 60.0));
        assert!(close(Unit::parse("ms").unwrap().factor(), 1e-3));
        let m3 = Unit::parse("m^3").unwrap();
        assert_eq!(m3.dimension(), Dimension::VOLUME);
        assert!(close(m3.factor(), 1.0));
        let per_s = Unit::parse("1/s").unwrap();
        assert_eq!(per_s.dimension(), Dimension::new(0, 0, 0, -1));
    }

    #[test]
    fn molar_matches_mol_per_liter() {
        let molar = Unit::parse("mM").unwrap();
        let explicit = Unit::parse("mmol/L").unwrap();
        assert!(close(molar.conversion_factor(&explicit).unwrap(), 1.0));
    }

    #[test]
    fn parse_rejects_unknown_and_malformed() {
        assert!(matches!(
            Unit::parse("mol/furlong"),
            Err(UnitError::UnknownUnit { .. })
        ));
        assert!(matches!(Unit::parse("mol//s"), Err(UnitError::Parse { .. })));
        assert!(matches!(Unit::parse("m^x"), Err(UnitError::Parse { .. })));
    }

    #[test]
    fn quantity_conversion() {
        let rate = Quantity::parse(5.0, "mol/L/s").unwrap();
        let target = Unit::parse("mmol/L/s").unwrap();
        assert!(close(rate.to(&target).unwrap(), 5000.0));

        let per_hour = Unit::parse("mmol/L/h").unwrap();
        assert!(close(rate.to(&per_hour).unwrap(), 5000.0 * 3600.0));
    }

    #[test]
    fn quantity_division_builds_rate() {
        let amount = Quantity::parse(2.0, "mol/L").unwrap();
        let dt = Quantity::parse(4.0, "s").unwrap();
        let rate = amount.try_div(&dt).unwrap();
        assert!(close(rate.magnitude(), 0.5));
        assert_eq!(rate.unit().dimension(), Dimension::new(1, -3, 0, -1));
    }

    #[test]
    fn incompatible_conversion_fails() {
        let rate = Quantity::parse(1.0, "mmol/L/s").unwrap();
        let mass_normalized = Unit::parse("mmol/g/h").unwrap();
        let err = rate.to(&mass_normalized).unwrap_err();
        assert!(matches!(err, UnitError::Incompatible { .. }));
        assert!(err.to_string().contains("mmol/g/h"));
    }

    #[test]
    fn volume_over_mass_bridges_concentration_to_mass_basis() {
        let rate = Quantity::parse(1.0, "mmol/L/s").unwrap();
        let volume = Quantity::parse(2.0, "L").unwrap();
        let mass = Quantity::parse(4.0, "g").unwrap();
        let normalized = rate.try_mul(&volume).unwrap().try_div(&mass).unwrap();
        let target = Unit::parse("mmol/g/h").unwrap();
        assert!(close(normalized.to(&target).unwrap(), 0.5 * 3600.0));
    }

    #[test]
    fn exponent_overflow_is_a_parse_error() {
        // -128 * -1 does not fit in i8
        assert!(matches!(Unit::parse("1/m^-128"), Err(UnitError::Parse { .. })));
        // molar is N·L^-3, so L^-150
        assert!(matches!(Unit::parse("M^50"), Err(UnitError::Parse { .. })));
        assert!(Unit::parse("m^42").is_ok());
    }

    #[test]
    fn combining_units_checks_exponent_range() {
        let big = Unit::parse("m^100").unwrap();
        let err = big.try_mul(&big).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        let tiny = Unit::parse("1/m^100").unwrap();
        assert!(big.try_div(&tiny).is_err());
        assert_eq!(big.try_div(&big).unwrap().dimension(), Dimension::NONE);
    }
}
