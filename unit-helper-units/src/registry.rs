//! Unit vocabulary - the units home-automation sensors report, by category

use std::collections::HashMap;
use crate::{Unit, Dimension};
use crate::unit::ConversionError;
use crate::parse;

/// Default prefix of the symbols of difference units (delta_degC, delta_degF)
pub const DELTA_PREFIX: &str = "delta_";

/// Registry of known units and their aliases.
///
/// Built once and shared read-only (wrap it in an `Arc`); nothing in this
/// crate keeps a global instance.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    units: HashMap<String, Unit>,
    aliases: HashMap<String, String>,
    delta_prefix: String,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::with_delta_prefix(DELTA_PREFIX)
    }

    /// Registry whose difference units are named `<prefix>degC` and `<prefix>degF`.
    /// An empty prefix would shadow the absolute units, so it keeps the default.
    pub fn with_delta_prefix(prefix: &str) -> Self {
        let prefix = if prefix.is_empty() { DELTA_PREFIX } else { prefix };
        let mut registry = UnitRegistry {
            units: HashMap::new(),
            aliases: HashMap::new(),
            delta_prefix: prefix.to_string(),
        };
        registry.register_all_units();
        registry
    }

    pub fn delta_prefix(&self) -> &str {
        &self.delta_prefix
    }

    /// Get a unit by symbol or alias
    pub fn get(&self, symbol: &str) -> Option<&Unit> {
        if let Some(unit) = self.units.get(symbol) {
            return Some(unit);
        }
        self.aliases.get(symbol).and_then(|canonical| self.units.get(canonical))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    /// Parse a unit expression such as "kWh", "°C", "km/h" or "µg/m³"
    pub fn parse_unit(&self, s: &str) -> Result<Unit, ConversionError> {
        parse::parse_unit(self, s)
    }

    /// Parse a quantity string such as "5 km" or "21.5°C"
    pub fn parse_quantity(&self, s: &str) -> Result<(f64, Option<Unit>), ConversionError> {
        parse::parse_quantity_string(self, s)
    }

    /// Absolute unit a delta unit measures differences of (delta_degC -> degC)
    pub fn delta_base(&self, unit: &Unit) -> Option<&Unit> {
        if !unit.is_delta() {
            return None;
        }
        unit.symbol.strip_prefix(self.delta_prefix.as_str()).and_then(|base| self.get(base))
    }

    pub fn by_category(&self, category: &str) -> Vec<&Unit> {
        self.units.values()
            .filter(|u| u.category == category)
            .collect()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.units.keys().map(|s| s.as_str()).collect()
    }

    fn register(&mut self, unit: Unit) {
        self.units.insert(unit.symbol.clone(), unit);
    }

    fn alias(&mut self, alias: &str, symbol: &str) {
        self.aliases.insert(alias.to_string(), symbol.to_string());
    }

    fn aliases(&mut self, symbol: &str, aliases: &[&str]) {
        for alias in aliases {
            self.alias(alias, symbol);
        }
    }

    fn register_all_units(&mut self) {
        self.register_dimensionless_units();
        self.register_length_units();
        self.register_mass_units();
        self.register_time_units();
        self.register_temperature_units();
        self.register_area_units();
        self.register_volume_units();
        self.register_velocity_units();
        self.register_energy_units();
        self.register_power_units();
        self.register_pressure_units();
        self.register_frequency_units();
        self.register_electrical_units();
        self.register_light_units();
        self.register_data_units();
        self.register_angle_units();
    }

    fn register_dimensionless_units(&mut self) {
        let d = Dimension::DIMENSIONLESS;
        self.register(Unit::dimensionless());
        self.register(Unit::new("%", "percent", d, 0.01, "dimensionless"));
        self.register(Unit::new("ppm", "parts per million", d, 1e-6, "dimensionless"));
        self.register(Unit::new("ppb", "parts per billion", d, 1e-9, "dimensionless"));

        self.aliases("%", &["percent"]);
        self.aliases("", &["1", "dimensionless"]);
    }

    fn register_length_units(&mut self) {
        let d = Dimension::LENGTH;
        self.register(Unit::new("m", "meter", d, 1.0, "length"));
        self.register(Unit::new("km", "kilometer", d, 1000.0, "length"));
        self.register(Unit::new("cm", "centimeter", d, 0.01, "length"));
        self.register(Unit::new("mm", "millimeter", d, 0.001, "length"));
        self.register(Unit::new("um", "micrometer", d, 1e-6, "length"));
        self.register(Unit::new("in", "inch", d, 0.0254, "length"));
        self.register(Unit::new("ft", "foot", d, 0.3048, "length"));
        self.register(Unit::new("yd", "yard", d, 0.9144, "length"));
        self.register(Unit::new("mi", "mile", d, 1609.344, "length"));
        self.register(Unit::new("nmi", "nautical mile", d, 1852.0, "length"));

        self.aliases("m", &["meter", "meters", "metre", "metres"]);
        self.aliases("km", &["kilometer", "kilometers", "kilometre", "kilometres"]);
        self.aliases("cm", &["centimeter", "centimeters"]);
        self.aliases("mm", &["millimeter", "millimeters"]);
        self.aliases("um", &["µm", "μm", "micrometer", "micron"]);
        self.aliases("in", &["inch", "inches"]);
        self.aliases("ft", &["foot", "feet"]);
        self.aliases("yd", &["yard", "yards"]);
        self.aliases("mi", &["mile", "miles"]);
    }

    fn register_mass_units(&mut self) {
        let d = Dimension::MASS;
        self.register(Unit::new("kg", "kilogram", d, 1.0, "mass"));
        self.register(Unit::new("g", "gram", d, 0.001, "mass"));
        self.register(Unit::new("mg", "milligram", d, 1e-6, "mass"));
        self.register(Unit::new("ug", "microgram", d, 1e-9, "mass"));
        self.register(Unit::new("t", "tonne", d, 1000.0, "mass"));
        self.register(Unit::new("lb", "pound", d, 0.45359237, "mass"));
        self.register(Unit::new("oz", "ounce", d, 0.028349523125, "mass"));
        self.register(Unit::new("st", "stone", d, 6.35029318, "mass"));

        self.aliases("kg", &["kilogram", "kilograms"]);
        self.aliases("g", &["gram", "grams"]);
        self.aliases("mg", &["milligram", "milligrams"]);
        self.aliases("ug", &["µg", "μg", "mcg", "microgram"]);
        self.aliases("t", &["tonne", "tonnes"]);
        self.aliases("lb", &["lbs", "pound", "pounds"]);
        self.aliases("oz", &["ounce", "ounces"]);
    }

    fn register_time_units(&mut self) {
        let d = Dimension::TIME;
        self.register(Unit::new("s", "second", d, 1.0, "time"));
        self.register(Unit::new("ms", "millisecond", d, 0.001, "time"));
        self.register(Unit::new("us", "microsecond", d, 1e-6, "time"));
        self.register(Unit::new("min", "minute", d, 60.0, "time"));
        self.register(Unit::new("h", "hour", d, 3600.0, "time"));
        self.register(Unit::new("d", "day", d, 86400.0, "time"));
        self.register(Unit::new("wk", "week", d, 604800.0, "time"));

        self.aliases("s", &["sec", "second", "seconds"]);
        self.aliases("ms", &["millisecond", "milliseconds"]);
        self.aliases("us", &["µs", "μs", "microsecond", "microseconds"]);
        self.aliases("min", &["minute", "minutes"]);
        self.aliases("h", &["hr", "hour", "hours"]);
        self.aliases("d", &["day", "days"]);
        self.aliases("wk", &["week", "weeks"]);
    }

    fn register_temperature_units(&mut self) {
        let d = Dimension::TEMPERATURE;
        let celsius = Unit::with_offset("degC", "degree Celsius", d, 1.0, 273.15, "temperature");
        // K = (F + 459.67) * 5/9
        let fahrenheit = Unit::with_offset("degF", "degree Fahrenheit", d, 5.0 / 9.0, 459.67 * 5.0 / 9.0, "temperature");

        self.register(Unit::new("K", "kelvin", d, 1.0, "temperature"));
        self.register(Unit::new("degR", "degree Rankine", d, 5.0 / 9.0, "temperature"));
        let delta = self.delta_prefix.clone();
        let delta_c = Unit::delta_of(&celsius, &delta);
        let delta_f = Unit::delta_of(&fahrenheit, &delta);
        let (delta_c_symbol, delta_f_symbol) = (delta_c.symbol.clone(), delta_f.symbol.clone());
        self.register(delta_c);
        self.register(delta_f);
        self.register(celsius);
        self.register(fahrenheit);

        self.aliases("K", &["kelvin"]);
        self.aliases("degC", &["°C", "℃", "C", "celsius", "degree_Celsius"]);
        self.aliases("degF", &["°F", "℉", "F", "fahrenheit", "degree_Fahrenheit"]);
        self.aliases("degR", &["°R", "rankine"]);
        let spelled = [
            (&delta_c_symbol, ["°C", "celsius"]),
            (&delta_f_symbol, ["°F", "fahrenheit"]),
        ];
        for (symbol, names) in spelled {
            for name in names {
                self.alias(&format!("{delta}{name}"), symbol);
            }
        }
        self.alias("Δ°C", &delta_c_symbol);
        self.alias("Δ°F", &delta_f_symbol);
    }

    fn register_area_units(&mut self) {
        let d = Dimension::AREA;
        self.register(Unit::new("m²", "square meter", d, 1.0, "area"));
        self.register(Unit::new("cm²", "square centimeter", d, 1e-4, "area"));
        self.register(Unit::new("km²", "square kilometer", d, 1e6, "area"));
        self.register(Unit::new("ft²", "square foot", d, 0.09290304, "area"));
        self.register(Unit::new("ha", "hectare", d, 10000.0, "area"));
        self.register(Unit::new("acre", "acre", d, 4046.8564224, "area"));

        self.aliases("m²", &["m2", "sqm"]);
        self.aliases("ft²", &["ft2", "sqft"]);
        self.aliases("acre", &["acres"]);
    }

    fn register_volume_units(&mut self) {
        let d = Dimension::VOLUME;
        self.register(Unit::new("m³", "cubic meter", d, 1.0, "volume"));
        self.register(Unit::new("L", "liter", d, 0.001, "volume"));
        self.register(Unit::new("mL", "milliliter", d, 1e-6, "volume"));
        self.register(Unit::new("ft³", "cubic foot", d, 0.028316846592, "volume"));
        self.register(Unit::new("CCF", "centum cubic foot", d, 2.8316846592, "volume"));
        self.register(Unit::new("gal", "US gallon", d, 0.003785411784, "volume"));
        self.register(Unit::new("fl. oz.", "US fluid ounce", d, 2.95735295625e-5, "volume"));

        self.aliases("m³", &["m3"]);
        self.aliases("L", &["l", "liter", "liters", "litre", "litres"]);
        self.aliases("mL", &["ml", "milliliter", "milliliters"]);
        self.aliases("ft³", &["ft3"]);
        self.aliases("gal", &["gallon", "gallons"]);
        self.aliases("fl. oz.", &["floz", "fl_oz"]);
    }

    fn register_velocity_units(&mut self) {
        let d = Dimension::VELOCITY;
        self.register(Unit::new("m/s", "meter per second", d, 1.0, "velocity"));
        self.register(Unit::new("km/h", "kilometer per hour", d, 1000.0 / 3600.0, "velocity"));
        self.register(Unit::new("mph", "mile per hour", d, 0.44704, "velocity"));
        self.register(Unit::new("kn", "knot", d, 1852.0 / 3600.0, "velocity"));
        self.register(Unit::new("ft/s", "foot per second", d, 0.3048, "velocity"));

        self.aliases("km/h", &["kph", "kmh"]);
        self.aliases("kn", &["kt", "knot", "knots"]);
    }

    fn register_energy_units(&mut self) {
        let d = Dimension::ENERGY;
        self.register(Unit::new("J", "joule", d, 1.0, "energy"));
        self.register(Unit::new("kJ", "kilojoule", d, 1000.0, "energy"));
        self.register(Unit::new("MJ", "megajoule", d, 1e6, "energy"));
        self.register(Unit::new("GJ", "gigajoule", d, 1e9, "energy"));
        self.register(Unit::new("Wh", "watt hour", d, 3600.0, "energy"));
        self.register(Unit::new("kWh", "kilowatt hour", d, 3.6e6, "energy"));
        self.register(Unit::new("MWh", "megawatt hour", d, 3.6e9, "energy"));
        self.register(Unit::new("cal", "calorie", d, 4.184, "energy"));
        self.register(Unit::new("kcal", "kilocalorie", d, 4184.0, "energy"));
        self.register(Unit::new("BTU", "British thermal unit", d, 1055.05585262, "energy"));

        self.aliases("J", &["joule", "joules"]);
        self.aliases("Wh", &["watt_hour"]);
        self.aliases("kWh", &["kilowatt_hour"]);
        self.aliases("BTU", &["Btu", "btu"]);
    }

    fn register_power_units(&mut self) {
        let d = Dimension::POWER;
        self.register(Unit::new("W", "watt", d, 1.0, "power"));
        self.register(Unit::new("mW", "milliwatt", d, 0.001, "power"));
        self.register(Unit::new("kW", "kilowatt", d, 1000.0, "power"));
        self.register(Unit::new("MW", "megawatt", d, 1e6, "power"));
        self.register(Unit::new("hp", "horsepower", d, 745.69987158227022, "power"));

        self.aliases("W", &["watt", "watts"]);
        self.aliases("kW", &["kilowatt", "kilowatts"]);
    }

    fn register_pressure_units(&mut self) {
        let d = Dimension::PRESSURE;
        self.register(Unit::new("Pa", "pascal", d, 1.0, "pressure"));
        self.register(Unit::new("hPa", "hectopascal", d, 100.0, "pressure"));
        self.register(Unit::new("kPa", "kilopascal", d, 1000.0, "pressure"));
        self.register(Unit::new("bar", "bar", d, 100000.0, "pressure"));
        self.register(Unit::new("mbar", "millibar", d, 100.0, "pressure"));
        self.register(Unit::new("psi", "pound per square inch", d, 6894.757293168361, "pressure"));
        self.register(Unit::new("inHg", "inch of mercury", d, 3386.389, "pressure"));
        self.register(Unit::new("mmHg", "millimeter of mercury", d, 133.322387415, "pressure"));
        self.register(Unit::new("atm", "atmosphere", d, 101325.0, "pressure"));

        self.aliases("Pa", &["pascal"]);
        self.aliases("mbar", &["mb"]);
    }

    fn register_frequency_units(&mut self) {
        let d = Dimension::FREQUENCY;
        self.register(Unit::new("Hz", "hertz", d, 1.0, "frequency"));
        self.register(Unit::new("kHz", "kilohertz", d, 1e3, "frequency"));
        self.register(Unit::new("MHz", "megahertz", d, 1e6, "frequency"));
        self.register(Unit::new("GHz", "gigahertz", d, 1e9, "frequency"));
        self.register(Unit::new("rpm", "revolutions per minute", d, 1.0 / 60.0, "frequency"));

        self.aliases("Hz", &["hertz"]);
    }

    fn register_electrical_units(&mut self) {
        self.register(Unit::new("A", "ampere", Dimension::CURRENT, 1.0, "current"));
        self.register(Unit::new("mA", "milliampere", Dimension::CURRENT, 0.001, "current"));
        self.register(Unit::new("V", "volt", Dimension::VOLTAGE, 1.0, "voltage"));
        self.register(Unit::new("mV", "millivolt", Dimension::VOLTAGE, 0.001, "voltage"));
        self.register(Unit::new("kV", "kilovolt", Dimension::VOLTAGE, 1000.0, "voltage"));
        self.register(Unit::new("ohm", "ohm", Dimension::RESISTANCE, 1.0, "resistance"));
        self.register(Unit::new("kohm", "kiloohm", Dimension::RESISTANCE, 1000.0, "resistance"));
        // "C" is taken by Celsius, as in most sensor payloads
        self.register(Unit::new("Coul", "coulomb", Dimension::CHARGE, 1.0, "charge"));
        self.register(Unit::new("Ah", "ampere hour", Dimension::CHARGE, 3600.0, "charge"));
        self.register(Unit::new("mAh", "milliampere hour", Dimension::CHARGE, 3.6, "charge"));

        self.aliases("A", &["amp", "amps", "ampere"]);
        self.aliases("V", &["volt", "volts"]);
        self.aliases("ohm", &["Ω", "ohms"]);
        self.aliases("kohm", &["kΩ"]);
        self.aliases("Coul", &["coulomb"]);
    }

    fn register_light_units(&mut self) {
        self.register(Unit::new("cd", "candela", Dimension::LUMINOSITY, 1.0, "luminosity"));
        self.register(Unit::new("lm", "lumen", Dimension::LUMINOSITY, 1.0, "luminosity"));
        self.register(Unit::new("lx", "lux", Dimension::ILLUMINANCE, 1.0, "illuminance"));

        self.aliases("lx", &["lux"]);
    }

    fn register_data_units(&mut self) {
        // Information is counted in bits and treated as dimensionless
        let d = Dimension::DIMENSIONLESS;
        self.register(Unit::new("bit", "bit", d, 1.0, "data"));
        self.register(Unit::new("kbit", "kilobit", d, 1e3, "data"));
        self.register(Unit::new("Mbit", "megabit", d, 1e6, "data"));
        self.register(Unit::new("Gbit", "gigabit", d, 1e9, "data"));
        self.register(Unit::new("B", "byte", d, 8.0, "data"));
        self.register(Unit::new("kB", "kilobyte", d, 8e3, "data"));
        self.register(Unit::new("MB", "megabyte", d, 8e6, "data"));
        self.register(Unit::new("GB", "gigabyte", d, 8e9, "data"));
        self.register(Unit::new("TB", "terabyte", d, 8e12, "data"));
        self.register(Unit::new("KiB", "kibibyte", d, 8.0 * 1024.0, "data"));
        self.register(Unit::new("MiB", "mebibyte", d, 8.0 * 1024.0 * 1024.0, "data"));
        self.register(Unit::new("GiB", "gibibyte", d, 8.0 * 1024.0 * 1024.0 * 1024.0, "data"));

        self.aliases("bit", &["bits"]);
        self.aliases("B", &["byte", "bytes"]);
    }

    fn register_angle_units(&mut self) {
        let d = Dimension::DIMENSIONLESS;
        self.register(Unit::new("rad", "radian", d, 1.0, "angle"));
        self.register(Unit::new("deg", "degree", d, std::f64::consts::PI / 180.0, "angle"));

        self.aliases("rad", &["radian", "radians"]);
        self.aliases("deg", &["°", "degree", "degrees"]);
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}
