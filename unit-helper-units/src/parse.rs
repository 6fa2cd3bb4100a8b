//! Unit string parsing - parse expressions like "km/h", "m^2" or "µg/m³"

use crate::{Unit, UnitRegistry};
use crate::unit::ConversionError;

/// Parse a unit string into a Unit
///
/// Supported formats:
/// - Simple: "m", "kWh", "°C"
/// - Powers: "m^2", "s^-1", "m³", "s⁻¹"
/// - Products: "kW*h", "N·m"
/// - Quotients: "m/s", "µg/m³", "kg*m/s^2"
///
/// Composite units keep the expression as written for their symbol.
pub fn parse_unit(registry: &UnitRegistry, s: &str) -> Result<Unit, ConversionError> {
    let s = s.trim();

    if s.is_empty() {
        return Ok(Unit::dimensionless());
    }

    if let Some(unit) = registry.get(s) {
        return Ok(unit.clone());
    }

    let unit = match s.split_once('/') {
        Some((numerator, denominator)) => {
            let numerator = parse_product(registry, numerator)?;
            let denominator = parse_product(registry, denominator)?;
            numerator.divide(&denominator)?
        }
        None => parse_product(registry, s)?,
    };

    Ok(unit.renamed(s))
}

/// Parse a product of units like "kW*h" or "m^2·s"
fn parse_product(registry: &UnitRegistry, s: &str) -> Result<Unit, ConversionError> {
    let mut factors = s.split(|c: char| matches!(c, '*' | '·' | '⋅'))
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let mut result = match factors.next() {
        Some(f) => parse_power(registry, f)?,
        None => return Ok(Unit::dimensionless()),
    };

    for factor in factors {
        result = result.multiply(&parse_power(registry, factor)?)?;
    }

    Ok(result)
}

/// Parse a unit with optional power like "m^2", "s^-1" or "m³"
fn parse_power(registry: &UnitRegistry, s: &str) -> Result<Unit, ConversionError> {
    if let Some(unit) = registry.get(s) {
        return Ok(unit.clone());
    }

    if let Some((base, exp)) = s.split_once('^') {
        let exponent: i32 = exp.trim().parse()
            .map_err(|_| ConversionError::InvalidExponent(exp.to_string()))?;
        return lookup(registry, base)?.powi(exponent);
    }

    if let Some((base, exponent)) = split_superscript(s) {
        return lookup(registry, base)?.powi(exponent);
    }

    lookup(registry, s)
}

/// Split a trailing superscript exponent: "m³" -> ("m", 3), "s⁻¹" -> ("s", -1)
fn split_superscript(s: &str) -> Option<(&str, i32)> {
    let mut digits = String::new();
    let mut split = s.len();

    for (i, c) in s.char_indices().rev() {
        let mapped = match c {
            '⁰' => '0', '¹' => '1', '²' => '2', '³' => '3', '⁴' => '4',
            '⁵' => '5', '⁶' => '6', '⁷' => '7', '⁸' => '8', '⁹' => '9',
            '⁻' => '-',
            _ => break,
        };
        digits.insert(0, mapped);
        split = i;
    }

    if digits.is_empty() || split == 0 {
        return None;
    }
    digits.parse().ok().map(|exp| (&s[..split], exp))
}

fn lookup(registry: &UnitRegistry, s: &str) -> Result<Unit, ConversionError> {
    let s = s.trim();
    registry.get(s)
        .cloned()
        .ok_or_else(|| ConversionError::UnknownUnit(s.to_string()))
}

/// Parse a quantity string like "5 km", "100kg" or "21.5 °C"
///
/// Returns the magnitude and, when the string carries one, its unit.
pub fn parse_quantity_string(registry: &UnitRegistry, s: &str) -> Result<(f64, Option<Unit>), ConversionError> {
    let s = s.trim();

    // Longest leading run that could belong to a number
    let run_end = s.char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E')))
        .map(|(i, _)| i)
        .unwrap_or(s.len());

    // "5 em" must not swallow the 'e', so back off until the prefix parses
    let (magnitude, split) = (1..=run_end).rev()
        .find_map(|i| s[..i].parse::<f64>().ok().map(|m| (m, i)))
        .ok_or_else(|| ConversionError::InvalidQuantity(s.to_string()))?;

    let unit_str = s[split..].trim();
    if unit_str.is_empty() {
        return Ok((magnitude, None));
    }

    Ok((magnitude, Some(parse_unit(registry, unit_str)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dimension;

    fn registry() -> UnitRegistry {
        UnitRegistry::new()
    }

    #[test]
    fn test_parse_simple_unit() {
        let unit = parse_unit(&registry(), "kWh").unwrap();
        assert_eq!(unit.symbol, "kWh");
        assert_eq!(unit.dimension, Dimension::ENERGY);
    }

    #[test]
    fn test_parse_empty_is_dimensionless() {
        let unit = parse_unit(&registry(), "  ").unwrap();
        assert!(unit.is_dimensionless());
        assert_eq!(unit.symbol, "");
    }

    #[test]
    fn test_parse_unit_with_power() {
        let unit = parse_unit(&registry(), "m^2").unwrap();
        assert_eq!(unit.dimension, Dimension::AREA);

        let unit = parse_unit(&registry(), "s^-1").unwrap();
        assert_eq!(unit.dimension, Dimension::FREQUENCY);
        assert_eq!(unit.symbol, "s^-1");
    }

    #[test]
    fn test_parse_superscript() {
        let unit = parse_unit(&registry(), "km³").unwrap();
        assert_eq!(unit.dimension, Dimension::VOLUME);

        let unit = parse_unit(&registry(), "s⁻¹").unwrap();
        assert_eq!(unit.dimension, Dimension::FREQUENCY);
    }

    #[test]
    fn test_parse_quotient() {
        let unit = parse_unit(&registry(), "µg/m³").unwrap();
        assert_eq!(unit.symbol, "µg/m³");
        assert_eq!(unit.dimension, Dimension::new([-3, 1, 0, 0, 0, 0, 0]));
        assert!((unit.to_base_factor - 1e-9).abs() < 1e-20);
    }

    #[test]
    fn test_parse_product() {
        let unit = parse_unit(&registry(), "kW*h").unwrap();
        assert_eq!(unit.dimension, Dimension::ENERGY);
        assert!((unit.to_base_factor - 3.6e6).abs() < 1e-6);
    }

    #[test]
    fn test_parse_complex() {
        let unit = parse_unit(&registry(), "kg*m/s^2").unwrap();
        assert_eq!(unit.dimension, Dimension::new([1, 1, -2, 0, 0, 0, 0]));
    }

    #[test]
    fn test_invalid_exponent() {
        let err = parse_unit(&registry(), "m^x").unwrap_err();
        assert!(matches!(err, ConversionError::InvalidExponent(_)));
    }

    #[test]
    fn test_exponent_overflow_is_an_error() {
        for expr in ["m³^1000000000", "m^2000000000*m^2000000000", "m^2000000000/m^-2000000000"] {
            let err = parse_unit(&registry(), expr).unwrap_err();
            assert!(matches!(err, ConversionError::InvalidExponent(_)), "{expr}: {err:?}");
        }
        assert!(parse_quantity_string(&registry(), "1 m³^1000000000").is_err());
    }

    #[test]
    fn test_unknown_unit() {
        let err = parse_unit(&registry(), "unknown_xyz").unwrap_err();
        assert_eq!(err, ConversionError::UnknownUnit("unknown_xyz".to_string()));
    }

    #[test]
    fn test_parse_quantity_string() {
        let reg = registry();

        let (value, unit) = parse_quantity_string(&reg, "5 km").unwrap();
        assert_eq!(value, 5.0);
        assert_eq!(unit.unwrap().symbol, "km");

        let (value, unit) = parse_quantity_string(&reg, "100kg").unwrap();
        assert_eq!(value, 100.0);
        assert_eq!(unit.unwrap().symbol, "kg");

        let (value, unit) = parse_quantity_string(&reg, "-21.5 °C").unwrap();
        assert_eq!(value, -21.5);
        assert_eq!(unit.unwrap().symbol, "degC");

        let (value, unit) = parse_quantity_string(&reg, "1.5e3 W").unwrap();
        assert_eq!(value, 1500.0);
        assert_eq!(unit.unwrap().symbol, "W");
    }

    #[test]
    fn test_parse_quantity_without_unit() {
        let (value, unit) = parse_quantity_string(&registry(), " 42 ").unwrap();
        assert_eq!(value, 42.0);
        assert!(unit.is_none());
    }

    #[test]
    fn test_parse_quantity_rejects_text() {
        let err = parse_quantity_string(&registry(), "unavailable").unwrap_err();
        assert!(matches!(err, ConversionError::InvalidQuantity(_)));
    }
}
