//! Unit representation with conversion factors

use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use crate::Dimension;

/// How values in a unit relate to the base unit of its dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Pure scaling: `base = value * factor`
    Multiplicative,
    /// Absolute scale with a shifted zero (degC, degF): `base = value * factor + offset`
    Offset,
    /// Difference on an offset scale (delta_degC); scales like a multiplicative unit
    /// but cannot be rebased onto an absolute offset scale
    Delta,
}

/// A physical unit with its dimension and conversion factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Canonical symbol (e.g., "m", "kWh", "degC")
    pub symbol: String,
    pub name: String,
    pub dimension: Dimension,
    /// `value_base = value * to_base_factor + to_base_offset`
    pub to_base_factor: f64,
    pub to_base_offset: f64,
    pub kind: UnitKind,
    pub category: String,
}

impl Unit {
    /// Create a proportional unit (no offset)
    pub fn new(symbol: &str, name: &str, dimension: Dimension, to_base_factor: f64, category: &str) -> Self {
        Unit {
            symbol: symbol.to_string(),
            name: name.to_string(),
            dimension,
            to_base_factor,
            to_base_offset: 0.0,
            kind: UnitKind::Multiplicative,
            category: category.to_string(),
        }
    }

    /// Create an absolute unit with a shifted zero point
    pub fn with_offset(
        symbol: &str,
        name: &str,
        dimension: Dimension,
        to_base_factor: f64,
        to_base_offset: f64,
        category: &str,
    ) -> Self {
        Unit {
            to_base_offset,
            kind: UnitKind::Offset,
            ..Unit::new(symbol, name, dimension, to_base_factor, category)
        }
    }

    /// Create the difference unit belonging to an offset unit
    pub fn delta_of(base: &Unit, prefix: &str) -> Self {
        Unit {
            symbol: format!("{}{}", prefix, base.symbol),
            name: format!("{} difference", base.name),
            dimension: base.dimension,
            to_base_factor: base.to_base_factor,
            to_base_offset: 0.0,
            kind: UnitKind::Delta,
            category: base.category.clone(),
        }
    }

    /// The empty, dimensionless unit
    pub fn dimensionless() -> Self {
        Unit::new("", "dimensionless", Dimension::DIMENSIONLESS, 1.0, "dimensionless")
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_dimensionless()
    }

    pub fn is_delta(&self) -> bool {
        self.kind == UnitKind::Delta
    }

    /// Same dimension; says nothing about offset/delta compatibility
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }

    pub fn to_base(&self, value: f64) -> f64 {
        value * self.to_base_factor + self.to_base_offset
    }

    pub fn from_base(&self, value_base: f64) -> f64 {
        (value_base - self.to_base_offset) / self.to_base_factor
    }

    /// Convert a magnitude from this unit into `target`
    pub fn convert_value(&self, value: f64, target: &Unit) -> Result<f64, ConversionError> {
        if !self.is_compatible(target) {
            return Err(ConversionError::IncompatibleDimensions {
                from: self.symbol.clone(),
                to: target.symbol.clone(),
                from_dim: self.dimension,
                to_dim: target.dimension,
            });
        }

        match (self.kind, target.kind) {
            (UnitKind::Delta, UnitKind::Offset) | (UnitKind::Offset, UnitKind::Delta) => {
                Err(ConversionError::OffsetMismatch {
                    from: self.symbol.clone(),
                    to: target.symbol.clone(),
                })
            }
            _ if self.symbol == target.symbol => Ok(value),
            _ => Ok(target.from_base(self.to_base(value))),
        }
    }

    /// Product of two units; offsets do not survive composition
    pub fn multiply(&self, other: &Unit) -> Result<Unit, ConversionError> {
        let symbol = format!("{}*{}", self.symbol, other.symbol);
        let dimension = self.dimension.checked_mul(other.dimension);
        Unit::composed(
            symbol,
            &format!("{} {}", self.name, other.name),
            dimension,
            self.to_base_factor * other.to_base_factor,
            "derived",
        )
    }

    pub fn divide(&self, other: &Unit) -> Result<Unit, ConversionError> {
        let symbol = format!("{}/{}", self.symbol, other.symbol);
        let dimension = self.dimension.checked_div(other.dimension);
        Unit::composed(
            symbol,
            &format!("{} per {}", self.name, other.name),
            dimension,
            self.to_base_factor / other.to_base_factor,
            "derived",
        )
    }

    pub fn powi(&self, exp: i32) -> Result<Unit, ConversionError> {
        if exp == 1 {
            return Ok(self.clone());
        }
        Unit::composed(
            format!("{}^{}", self.symbol, exp),
            &format!("{} to the {}", self.name, exp),
            self.dimension.checked_powi(exp),
            self.to_base_factor.powi(exp),
            &self.category,
        )
    }

    /// Exponents must fit in i32 and the scale factor must stay finite and non-zero
    fn composed(
        symbol: String,
        name: &str,
        dimension: Option<Dimension>,
        factor: f64,
        category: &str,
    ) -> Result<Unit, ConversionError> {
        match dimension {
            Some(dimension) if factor.is_finite() && factor != 0.0 => {
                Ok(Unit::new(&symbol, name, dimension, factor, category))
            }
            _ => Err(ConversionError::InvalidExponent(symbol)),
        }
    }

    /// Replace the symbol, keeping every conversion property
    pub(crate) fn renamed(mut self, symbol: &str) -> Unit {
        self.symbol = symbol.to_string();
        self
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// Errors that can occur while parsing units or converting quantities
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("cannot convert {from} ({from_dim}) to {to} ({to_dim}): incompatible dimensions")]
    IncompatibleDimensions {
        from: String,
        to: String,
        from_dim: Dimension,
        to_dim: Dimension,
    },

    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    #[error("invalid exponent: {0}")]
    InvalidExponent(String),

    #[error("not a quantity: {0:?}")]
    InvalidQuantity(String),

    #[error("cannot convert between offset unit and delta unit: {from} -> {to}")]
    OffsetMismatch { from: String, to: String },

    #[error("ambiguous operation on offset units: {left} and {right}")]
    OffsetArithmetic { left: String, right: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meter() -> Unit {
        Unit::new("m", "meter", Dimension::LENGTH, 1.0, "length")
    }

    fn kilometer() -> Unit {
        Unit::new("km", "kilometer", Dimension::LENGTH, 1000.0, "length")
    }

    fn celsius() -> Unit {
        Unit::with_offset("degC", "degree Celsius", Dimension::TEMPERATURE, 1.0, 273.15, "temperature")
    }

    fn fahrenheit() -> Unit {
        Unit::with_offset("degF", "degree Fahrenheit", Dimension::TEMPERATURE, 5.0 / 9.0, 459.67 * 5.0 / 9.0, "temperature")
    }

    fn kelvin() -> Unit {
        Unit::new("K", "kelvin", Dimension::TEMPERATURE, 1.0, "temperature")
    }

    #[test]
    fn test_proportional_conversion() {
        let converted = meter().convert_value(5000.0, &kilometer()).unwrap();
        assert!((converted - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_offset_conversion() {
        let f = celsius().convert_value(100.0, &fahrenheit()).unwrap();
        assert!((f - 212.0).abs() < 1e-9);

        let k = celsius().convert_value(0.0, &kelvin()).unwrap();
        assert!((k - 273.15).abs() < 1e-9);
    }

    #[test]
    fn test_incompatible_dimensions() {
        let err = meter().convert_value(1.0, &kelvin()).unwrap_err();
        assert!(matches!(err, ConversionError::IncompatibleDimensions { .. }));
    }

    #[test]
    fn test_delta_unit() {
        let delta_c = Unit::delta_of(&celsius(), "delta_");
        assert_eq!(delta_c.symbol, "delta_degC");
        assert!(delta_c.is_delta());
        assert_eq!(delta_c.to_base_offset, 0.0);

        let delta_f = Unit::delta_of(&fahrenheit(), "delta_");
        let converted = delta_c.convert_value(10.0, &delta_f).unwrap();
        assert!((converted - 18.0).abs() < 1e-9);

        // Differences may be expressed in kelvin
        let k = delta_c.convert_value(10.0, &kelvin()).unwrap();
        assert!((k - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_delta_to_offset_rejected() {
        let delta_c = Unit::delta_of(&celsius(), "delta_");
        let err = delta_c.convert_value(0.0, &fahrenheit()).unwrap_err();
        assert!(matches!(err, ConversionError::OffsetMismatch { .. }));

        let err = celsius().convert_value(0.0, &delta_c).unwrap_err();
        assert!(matches!(err, ConversionError::OffsetMismatch { .. }));
    }

    #[test]
    fn test_composition_drops_offset() {
        let per_c = kilometer().divide(&celsius()).unwrap();
        assert_eq!(per_c.kind, UnitKind::Multiplicative);
        assert_eq!(per_c.dimension, Dimension::new([1, 0, 0, 0, -1, 0, 0]));
        assert_eq!(meter().powi(2).unwrap().dimension, Dimension::AREA);
        assert_eq!(meter().multiply(&meter()).unwrap().to_base_factor, 1.0);
    }

    #[test]
    fn test_composition_rejects_overflow() {
        let err = meter().powi(i32::MAX).unwrap().powi(2).unwrap_err();
        assert_eq!(err, ConversionError::InvalidExponent("m^2147483647^2".to_string()));

        let huge = meter().powi(2_000_000_000).unwrap();
        assert!(matches!(huge.multiply(&huge), Err(ConversionError::InvalidExponent(_))));
        let tiny = meter().powi(-2_000_000_000).unwrap();
        assert!(matches!(huge.divide(&tiny), Err(ConversionError::InvalidExponent(_))));

        // 1000^400 is not a finite f64
        assert!(matches!(kilometer().powi(400), Err(ConversionError::InvalidExponent(_))));
    }
}
