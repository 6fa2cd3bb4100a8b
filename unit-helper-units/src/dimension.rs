//! Dimensional analysis types
//!
//! Each physical quantity has dimensions represented as a 7-element vector:
//! [length, mass, time, current, temperature, amount, luminosity]

use std::fmt;
use serde::{Serialize, Deserialize};

const SYMBOLS: [&str; 7] = ["L", "M", "T", "I", "Θ", "N", "J"];

/// Exponents of the 7 SI base dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    pub exponents: [i32; 7],
}

impl Dimension {
    pub const DIMENSIONLESS: Dimension = Dimension::new([0, 0, 0, 0, 0, 0, 0]);
    pub const LENGTH: Dimension = Dimension::new([1, 0, 0, 0, 0, 0, 0]);
    pub const MASS: Dimension = Dimension::new([0, 1, 0, 0, 0, 0, 0]);
    pub const TIME: Dimension = Dimension::new([0, 0, 1, 0, 0, 0, 0]);
    pub const CURRENT: Dimension = Dimension::new([0, 0, 0, 1, 0, 0, 0]);
    pub const TEMPERATURE: Dimension = Dimension::new([0, 0, 0, 0, 1, 0, 0]);
    pub const AMOUNT: Dimension = Dimension::new([0, 0, 0, 0, 0, 1, 0]);
    pub const LUMINOSITY: Dimension = Dimension::new([0, 0, 0, 0, 0, 0, 1]);

    pub const AREA: Dimension = Dimension::new([2, 0, 0, 0, 0, 0, 0]);
    pub const VOLUME: Dimension = Dimension::new([3, 0, 0, 0, 0, 0, 0]);
    pub const VELOCITY: Dimension = Dimension::new([1, 0, -1, 0, 0, 0, 0]);
    pub const FREQUENCY: Dimension = Dimension::new([0, 0, -1, 0, 0, 0, 0]);
    pub const ENERGY: Dimension = Dimension::new([2, 1, -2, 0, 0, 0, 0]);
    pub const POWER: Dimension = Dimension::new([2, 1, -3, 0, 0, 0, 0]);
    pub const PRESSURE: Dimension = Dimension::new([-1, 1, -2, 0, 0, 0, 0]);
    pub const CHARGE: Dimension = Dimension::new([0, 0, 1, 1, 0, 0, 0]);
    pub const VOLTAGE: Dimension = Dimension::new([2, 1, -3, -1, 0, 0, 0]);
    pub const RESISTANCE: Dimension = Dimension::new([2, 1, -3, -2, 0, 0, 0]);
    /// Luminous flux per area; steradians are dimensionless so lm/m² reduces to J L^-2
    pub const ILLUMINANCE: Dimension = Dimension::new([-2, 0, 0, 0, 0, 0, 1]);

    pub const fn new(exponents: [i32; 7]) -> Self {
        Dimension { exponents }
    }

    pub fn is_dimensionless(&self) -> bool {
        self.exponents.iter().all(|&e| e == 0)
    }

    /// Raise to an integer power (multiply exponents); `None` on exponent overflow
    pub fn checked_powi(&self, exp: i32) -> Option<Dimension> {
        let mut exponents = self.exponents;
        for e in exponents.iter_mut() {
            *e = e.checked_mul(exp)?;
        }
        Some(Dimension::new(exponents))
    }

    /// Dimension of a product (add exponents); `None` on exponent overflow
    pub fn checked_mul(&self, rhs: Dimension) -> Option<Dimension> {
        let mut exponents = self.exponents;
        for (e, r) in exponents.iter_mut().zip(rhs.exponents) {
            *e = e.checked_add(r)?;
        }
        Some(Dimension::new(exponents))
    }

    /// Dimension of a quotient (subtract exponents); `None` on exponent overflow
    pub fn checked_div(&self, rhs: Dimension) -> Option<Dimension> {
        let mut exponents = self.exponents;
        for (e, r) in exponents.iter_mut().zip(rhs.exponents) {
            *e = e.checked_sub(r)?;
        }
        Some(Dimension::new(exponents))
    }

    /// Common name of this dimension, if it has one
    pub fn name(&self) -> Option<&'static str> {
        let known = [
            (Self::DIMENSIONLESS, "dimensionless"),
            (Self::LENGTH, "length"),
            (Self::MASS, "mass"),
            (Self::TIME, "time"),
            (Self::CURRENT, "current"),
            (Self::TEMPERATURE, "temperature"),
            (Self::AMOUNT, "amount"),
            (Self::LUMINOSITY, "luminosity"),
            (Self::AREA, "area"),
            (Self::VOLUME, "volume"),
            (Self::VELOCITY, "velocity"),
            (Self::FREQUENCY, "frequency"),
            (Self::ENERGY, "energy"),
            (Self::POWER, "power"),
            (Self::PRESSURE, "pressure"),
            (Self::CHARGE, "charge"),
            (Self::VOLTAGE, "voltage"),
            (Self::RESISTANCE, "resistance"),
            (Self::ILLUMINANCE, "illuminance"),
        ];
        known.iter().find(|(d, _)| d == self).map(|(_, n)| *n)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.exponents.iter()
            .zip(SYMBOLS)
            .filter(|(e, _)| **e != 0)
            .map(|(e, s)| if *e == 1 { s.to_string() } else { format!("{}^{}", s, e) })
            .collect();

        if parts.is_empty() {
            write!(f, "1")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::DIMENSIONLESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensionless() {
        assert!(Dimension::DIMENSIONLESS.is_dimensionless());
        assert!(!Dimension::TEMPERATURE.is_dimensionless());
    }

    #[test]
    fn test_power_is_energy_per_time() {
        assert_eq!(Dimension::ENERGY.checked_div(Dimension::TIME), Some(Dimension::POWER));
        assert_eq!(Dimension::POWER.checked_mul(Dimension::TIME), Some(Dimension::ENERGY));
    }

    #[test]
    fn test_powi() {
        assert_eq!(Dimension::LENGTH.checked_powi(3), Some(Dimension::VOLUME));
        assert_eq!(Dimension::TIME.checked_powi(-1), Some(Dimension::FREQUENCY));
    }

    #[test]
    fn test_exponent_overflow_is_none() {
        assert_eq!(Dimension::VOLUME.checked_powi(1_000_000_000), None);
        assert_eq!(Dimension::LENGTH.checked_powi(i32::MIN), Some(Dimension::new([i32::MIN, 0, 0, 0, 0, 0, 0])));
        assert_eq!(Dimension::new([i32::MIN, 0, 0, 0, 0, 0, 0]).checked_powi(-1), None);

        let big = Dimension::new([2_000_000_000, 0, 0, 0, 0, 0, 0]);
        assert_eq!(big.checked_mul(big), None);
        assert_eq!(big.checked_div(Dimension::new([-2_000_000_000, 0, 0, 0, 0, 0, 0])), None);
    }

    #[test]
    fn test_name() {
        assert_eq!(Dimension::POWER.name(), Some("power"));
        assert_eq!(Dimension::new([1, 1, 0, 0, 0, 0, 0]).name(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Dimension::DIMENSIONLESS), "1");
        assert_eq!(format!("{}", Dimension::TEMPERATURE), "Θ");
        assert_eq!(format!("{}", Dimension::VELOCITY), "L T^-1");
    }
}
