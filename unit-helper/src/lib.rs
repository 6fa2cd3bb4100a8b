//! Unit Helper - unit conversion for home-automation templates
//!
//! Templates can hand over plain numbers, `"5 km"` strings, `[value, unit]`
//! pairs, sensor states or `states.<entity_id>` references. The helpers
//! normalize them into quantities and convert between units:
//!
//! - `to_unit(expr, target_unit?, source_unit?)`
//! - `from_unit(expr, source_unit?, target_unit?)`
//! - `with_unit(expr, unit?)` (also `quantity`)
//! - `without_unit(expr)`

mod config;
mod normalize;
mod functions;

pub use config::{NormalizerConfig, STATE_PREFIX};
pub use normalize::{Normalizer, NormalizeError, RawValue};
pub use functions::{load_unit_functions, ToUnit, FromUnit, WithUnit, QuantityFn, WithoutUnit};

use std::sync::Arc;
use unit_helper_core::{StateLookup, Value};
use unit_helper_plugin::{EvalContext, PluginRegistry};
use unit_helper_units::UnitRegistry;

/// Unit helper engine: the function registry plus the normalizer behind it
pub struct UnitHelper {
    registry: Arc<PluginRegistry>,
    normalizer: Arc<Normalizer>,
}

impl UnitHelper {
    pub fn new(units: Arc<UnitRegistry>, config: NormalizerConfig) -> Self {
        let normalizer = Arc::new(Normalizer::new(units, config));
        let registry = load_unit_functions(PluginRegistry::new(), normalizer.clone());
        Self {
            registry: Arc::new(registry),
            normalizer,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// `name(args...)`
    pub fn call(&self, name: &str, args: &[Value], states: Arc<dyn StateLookup>) -> Value {
        self.registry.call_function(name, args, &EvalContext::new(states))
    }

    /// `input | name(args...)`
    pub fn call_filter(&self, name: &str, input: Value, args: &[Value], states: Arc<dyn StateLookup>) -> Value {
        self.registry.call_filter(name, input, args, &EvalContext::new(states))
    }

    pub fn help(&self, name: Option<&str>) -> Value {
        self.registry.help(name)
    }

    pub fn list_functions(&self, category: Option<&str>) -> Value {
        self.registry.list_functions(category)
    }
}

impl Default for UnitHelper {
    fn default() -> Self {
        Self::new(Arc::new(UnitRegistry::new()), NormalizerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use unit_helper_core::{codes, StateStore, TemplateState};

    fn states() -> Arc<dyn StateLookup> {
        Arc::new(StateStore::new()
            .with_state(TemplateState::new("sensor.outdoor", "21.5").with_unit("°C"))
            .with_state(TemplateState::new("sensor.power", "1200").with_unit("W")))
    }

    #[test]
    fn test_state_reference_to_fahrenheit() {
        let helper = UnitHelper::default();
        let v = helper.call("to_unit", &[Value::from("states.sensor.outdoor"), Value::from("degF")], states());
        assert!((v.as_number().unwrap() - 70.7).abs() < 1e-9);
    }

    #[test]
    fn test_filter_chain() {
        let helper = UnitHelper::default();
        let q = helper.call_filter("with_unit", Value::from("states.sensor.power"), &[], states());
        let kw = helper.call_filter("to_unit", q, &[Value::from("kW")], states());
        assert!((kw.as_number().unwrap() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_delta_example() {
        let helper = UnitHelper::default();
        let v = helper.call("to_unit", &[Value::pair(0.0, "delta_degC"), Value::from("degF")], states());
        assert!((v.as_number().unwrap() - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_function() {
        let helper = UnitHelper::default();
        let v = helper.call("to_unti", &[Value::from(1.0)], states());
        let err = v.as_error().unwrap();
        assert_eq!(err.code, codes::UNDEFINED_FUNC);
        assert!(err.suggestion.as_deref().unwrap().contains("to_unit"));
    }

    #[test]
    fn test_help_lists_unit_functions() {
        let helper = UnitHelper::default();
        let Value::Object(help) = helper.help(None) else { panic!("expected object") };
        let Value::Object(by_category) = &help["functions"] else { panic!("expected object") };
        assert_eq!(by_category["units"].as_list().unwrap().len(), 5);
        assert_eq!(helper.list_functions(Some("units")).as_list().unwrap().len(), 5);
    }

    const UNITS: [&str; 12] = ["m", "km", "ft", "kWh", "Wh", "J", "degC", "degF", "K", "hPa", "bar", "psi"];
    const TEMPERATURES: [&str; 4] = ["degC", "degF", "K", "degR"];

    proptest! {
        #[test]
        fn converting_to_own_unit_is_identity(value in -1.0e9f64..1.0e9, unit in 0usize..UNITS.len()) {
            let helper = UnitHelper::default();
            let unit = UNITS[unit];
            let v = helper.call("to_unit", &[Value::pair(value, unit), Value::from(unit)], states());
            prop_assert_eq!(v.as_number(), Some(value));
        }

        #[test]
        fn conversion_is_transitive(
            value in -200.0f64..200.0,
            a in 0usize..TEMPERATURES.len(),
            b in 0usize..TEMPERATURES.len(),
            c in 0usize..TEMPERATURES.len(),
        ) {
            let helper = UnitHelper::default();
            let (a, b, c) = (TEMPERATURES[a], TEMPERATURES[b], TEMPERATURES[c]);

            let via = helper.call("to_unit", &[Value::pair(value, a), Value::from(b)], states());
            let via = via.as_number().unwrap();
            let stepped = helper.call("to_unit", &[Value::pair(via, b), Value::from(c)], states());
            let direct = helper.call("to_unit", &[Value::pair(value, a), Value::from(c)], states());

            let (stepped, direct) = (stepped.as_number().unwrap(), direct.as_number().unwrap());
            prop_assert!((stepped - direct).abs() <= 1e-9 * direct.abs().max(1.0));
        }
    }
}
