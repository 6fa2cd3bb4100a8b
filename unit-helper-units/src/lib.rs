//! Unit Helper Units - Physical Quantity and Unit Conversion
//!
//! Provides unit-aware quantities with dimensional analysis for the units
//! home-automation sensors report. Temperatures come in three flavours:
//! multiplicative (K, degR), absolute with an offset (degC, degF) and
//! differences (delta_degC, delta_degF).
//!
//! Categories:
//! - Length, mass, time, area, volume, velocity
//! - Temperature (K, degC, degF, degR, delta_degC, delta_degF)
//! - Energy (J, Wh, kWh, ...) and power (W, kW, ...)
//! - Pressure (Pa, hPa, bar, psi, inHg, ...)
//! - Electrical (A, V, ohm, Ah, ...)
//! - Frequency, light, data, angle, ratios (%, ppm)

mod dimension;
mod unit;
mod quantity;
mod parse;
mod registry;

pub use dimension::Dimension;
pub use unit::{Unit, UnitKind, ConversionError};
pub use quantity::Quantity;
pub use registry::{UnitRegistry, DELTA_PREFIX};
pub use parse::{parse_unit, parse_quantity_string};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ENERGY: [&str; 6] = ["J", "kJ", "Wh", "kWh", "cal", "BTU"];
    const TEMPERATURE: [&str; 4] = ["K", "degC", "degF", "degR"];

    proptest! {
        #[test]
        fn conversion_round_trips_through_any_energy_unit(
            value in -1.0e6f64..1.0e6,
            from in 0usize..ENERGY.len(),
            via in 0usize..ENERGY.len(),
        ) {
            let registry = UnitRegistry::new();
            let from = registry.get(ENERGY[from]).unwrap();
            let via = registry.get(ENERGY[via]).unwrap();

            let there = from.convert_value(value, via).unwrap();
            let back = via.convert_value(there, from).unwrap();
            prop_assert!((back - value).abs() <= 1e-9 * value.abs().max(1.0));
        }

        #[test]
        fn temperature_conversion_is_transitive(
            value in -500.0f64..500.0,
            a in 0usize..TEMPERATURE.len(),
            b in 0usize..TEMPERATURE.len(),
            c in 0usize..TEMPERATURE.len(),
        ) {
            let registry = UnitRegistry::new();
            let (a, b, c) = (
                registry.get(TEMPERATURE[a]).unwrap(),
                registry.get(TEMPERATURE[b]).unwrap(),
                registry.get(TEMPERATURE[c]).unwrap(),
            );

            let direct = a.convert_value(value, c).unwrap();
            let stepped = b.convert_value(a.convert_value(value, b).unwrap(), c).unwrap();
            prop_assert!((direct - stepped).abs() <= 1e-9 * direct.abs().max(1.0));
        }
    }
}
