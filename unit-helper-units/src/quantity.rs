//! Quantity type - a magnitude with an associated unit

use std::fmt;
use serde::{Serialize, Deserialize};
use crate::{Unit, UnitKind, Dimension};
use crate::unit::ConversionError;

/// A physical quantity: a magnitude with its unit of measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quantity {
    pub magnitude: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: f64, unit: Unit) -> Self {
        Quantity { magnitude, unit }
    }

    /// A pure number
    pub fn dimensionless(magnitude: f64) -> Self {
        Quantity::new(magnitude, Unit::dimensionless())
    }

    pub fn dimension(&self) -> Dimension {
        self.unit.dimension
    }

    pub fn is_compatible(&self, other: &Quantity) -> bool {
        self.unit.is_compatible(&other.unit)
    }

    /// Express this quantity in another unit
    pub fn convert_to(&self, target: &Unit) -> Result<Quantity, ConversionError> {
        let magnitude = self.unit.convert_value(self.magnitude, target)?;
        Ok(Quantity::new(magnitude, target.clone()))
    }

    /// Magnitude in the base unit of the dimension
    pub fn base_value(&self) -> f64 {
        self.unit.to_base(self.magnitude)
    }

    /// Add two quantities of the same dimension.
    ///
    /// An absolute offset quantity plus a difference yields an absolute quantity
    /// in the offset unit, whichever side it is on: `20 degC + 9 delta_degF`
    /// is `25 degC`. Two absolute offset quantities cannot be added. Otherwise
    /// the result is expressed in the unit of `self`.
    pub fn add(&self, other: &Quantity) -> Result<Quantity, ConversionError> {
        if !self.is_compatible(other) {
            return Err(ConversionError::IncompatibleDimensions {
                from: other.unit.symbol.clone(),
                to: self.unit.symbol.clone(),
                from_dim: other.unit.dimension,
                to_dim: self.unit.dimension,
            });
        }

        match (self.unit.kind, other.unit.kind) {
            (UnitKind::Offset, UnitKind::Offset) => Err(ConversionError::OffsetArithmetic {
                left: self.unit.symbol.clone(),
                right: other.unit.symbol.clone(),
            }),
            (UnitKind::Offset, _) => Ok(shift(self, other)),
            (_, UnitKind::Offset) => Ok(shift(other, self)),
            _ => {
                let converted = other.convert_to(&self.unit)?;
                Ok(Quantity::new(self.magnitude + converted.magnitude, self.unit.clone()))
            }
        }
    }
}

/// Move an absolute offset quantity by a difference, staying in its unit
fn shift(absolute: &Quantity, difference: &Quantity) -> Quantity {
    let step = difference.magnitude * difference.unit.to_base_factor / absolute.unit.to_base_factor;
    Quantity::new(absolute.magnitude + step, absolute.unit.clone())
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.symbol.is_empty() {
            write!(f, "{}", self.magnitude)
        } else {
            write!(f, "{} {}", self.magnitude, self.unit.symbol)
        }
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.is_compatible(other)
            && self.unit.kind == other.unit.kind
            && self.base_value() == other.base_value()
    }
}
