//! Unit functions for templates
//!
//! Every function here is registered both as a global and as a filter, so
//! `to_unit(states.sensor.t, 'degF')` and `states.sensor.t | to_unit('degF')`
//! are the same call.

use crate::{NormalizeError, Normalizer};
use std::sync::Arc;
use unit_helper_plugin::prelude::*;

const CATEGORY: &str = "units";

/// Optional unit argument: absent and `null` both mean "not given"
fn unit_arg<'a>(args: &'a [Value], index: usize, func: &str, name: &str) -> Result<Option<&'a str>, TemplateError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Text(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(TemplateError::arg_type(func, name, "Text", other.type_name())),
    }
}

fn expr_arg<'a>(args: &'a [Value], func: &str) -> Result<&'a Value, Value> {
    match args.first() {
        None => Err(Value::Error(TemplateError::arg_count(func, 1, 0))),
        Some(v) if v.is_error() => Err(v.clone()),
        Some(v) => Ok(v),
    }
}

fn to_value(result: Result<f64, NormalizeError>) -> Value {
    match result {
        Ok(n) => Value::Number(n),
        Err(e) => Value::Error(e.into()),
    }
}

// ============ to_unit ============

pub struct ToUnit {
    normalizer: Arc<Normalizer>,
}

static TO_UNIT_ARGS: [ArgMeta; 3] = [
    ArgMeta::required("expr", "Any", "Number, \"5 km\" text, [value, unit] pair, state or states.<entity_id>"),
    ArgMeta::optional("target_unit", "Text", "Unit to convert to", "source_unit"),
    ArgMeta::optional("source_unit", "Text", "Unit of expr when it carries none", "target_unit"),
];

static TO_UNIT_EXAMPLES: [&str; 4] = [
    "to_unit(states.sensor.outdoor, 'degF') → 70.7",
    "[1.5, 'kWh'] | to_unit('Wh') → 1500",
    "to_unit(2, 'Wh', 'kWh') → 2000",
    "to_unit([0, 'delta_degC'], 'degF') → 32",
];

static TO_UNIT_RELATED: [&str; 3] = ["from_unit", "with_unit", "without_unit"];

impl FunctionPlugin for ToUnit {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "to_unit",
            description: "Convert a value to a target unit and return the bare number",
            usage: "to_unit(expr, target_unit?, source_unit?)",
            args: &TO_UNIT_ARGS,
            returns: "Number",
            examples: &TO_UNIT_EXAMPLES,
            category: CATEGORY,
            related: &TO_UNIT_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let expr = match expr_arg(args, "to_unit") {
            Ok(v) => v,
            Err(v) => return v,
        };
        let target = match unit_arg(args, 1, "to_unit", "target_unit") {
            Ok(u) => u,
            Err(e) => return Value::Error(e),
        };
        let source = match unit_arg(args, 2, "to_unit", "source_unit") {
            Ok(u) => u,
            Err(e) => return Value::Error(e),
        };
        to_value(self.normalizer.to_unit(expr, target, source, ctx.states()))
    }
}

// ============ from_unit ============

pub struct FromUnit {
    normalizer: Arc<Normalizer>,
}

static FROM_UNIT_ARGS: [ArgMeta; 3] = [
    ArgMeta::required("expr", "Any", "Number, \"5 km\" text, [value, unit] pair, state or states.<entity_id>"),
    ArgMeta::optional("source_unit", "Text", "Unit of expr when it carries none", "target_unit"),
    ArgMeta::optional("target_unit", "Text", "Unit to convert to", "source_unit"),
];

static FROM_UNIT_EXAMPLES: [&str; 2] = [
    "from_unit(2, 'kWh', 'Wh') → 2000",
    "70 | from_unit('degF', 'degC') → 21.11",
];

static FROM_UNIT_RELATED: [&str; 2] = ["to_unit", "with_unit"];

impl FunctionPlugin for FromUnit {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "from_unit",
            description: "Convert a value from a source unit; to_unit with the unit arguments swapped",
            usage: "from_unit(expr, source_unit?, target_unit?)",
            args: &FROM_UNIT_ARGS,
            returns: "Number",
            examples: &FROM_UNIT_EXAMPLES,
            category: CATEGORY,
            related: &FROM_UNIT_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let expr = match expr_arg(args, "from_unit") {
            Ok(v) => v,
            Err(v) => return v,
        };
        let source = match unit_arg(args, 1, "from_unit", "source_unit") {
            Ok(u) => u,
            Err(e) => return Value::Error(e),
        };
        let target = match unit_arg(args, 2, "from_unit", "target_unit") {
            Ok(u) => u,
            Err(e) => return Value::Error(e),
        };
        to_value(self.normalizer.from_unit(expr, source, target, ctx.states()))
    }
}

// ============ with_unit / quantity ============

static WITH_UNIT_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("expr", "Any", "Number, \"5 km\" text, [value, unit] pair, state or states.<entity_id>"),
    ArgMeta::optional("unit", "Text", "Unit for unit-less input, or unit to convert into", "own unit of expr"),
];

static WITH_UNIT_EXAMPLES: [&str; 3] = [
    "with_unit(42, 'm') → 42 m",
    "with_unit('states.sensor.energy') → 1.5 kWh",
    "with_unit([1, 'kWh'], 'Wh') → 1000 Wh",
];

static WITH_UNIT_RELATED: [&str; 3] = ["quantity", "to_unit", "without_unit"];

fn with_unit(normalizer: &Normalizer, func: &str, args: &[Value], ctx: &EvalContext) -> Value {
    let expr = match expr_arg(args, func) {
        Ok(v) => v,
        Err(v) => return v,
    };
    let unit = match unit_arg(args, 1, func, "unit") {
        Ok(u) => u,
        Err(e) => return Value::Error(e),
    };
    match normalizer.with_unit(expr, unit, ctx.states()) {
        Ok(q) => Value::Quantity(q),
        Err(e) => Value::Error(e.into()),
    }
}

pub struct WithUnit {
    normalizer: Arc<Normalizer>,
}

impl FunctionPlugin for WithUnit {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "with_unit",
            description: "Build a quantity (magnitude and unit) from a value",
            usage: "with_unit(expr, unit?)",
            args: &WITH_UNIT_ARGS,
            returns: "Quantity",
            examples: &WITH_UNIT_EXAMPLES,
            category: CATEGORY,
            related: &WITH_UNIT_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        with_unit(&self.normalizer, "with_unit", args, ctx)
    }
}

/// `quantity(...)`, another name for `with_unit(...)`
pub struct QuantityFn {
    normalizer: Arc<Normalizer>,
}

static QUANTITY_RELATED: [&str; 2] = ["with_unit", "to_unit"];

impl FunctionPlugin for QuantityFn {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "quantity",
            description: "Build a quantity from a value (same as with_unit)",
            usage: "quantity(expr, unit?)",
            args: &WITH_UNIT_ARGS,
            returns: "Quantity",
            examples: &["quantity('5 km') → 5 km"],
            category: CATEGORY,
            related: &QUANTITY_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        with_unit(&self.normalizer, "quantity", args, ctx)
    }
}

// ============ without_unit ============

pub struct WithoutUnit {
    normalizer: Arc<Normalizer>,
}

static WITHOUT_UNIT_ARGS: [ArgMeta; 1] = [
    ArgMeta::required("expr", "Any", "Value to strip the unit from"),
];

static WITHOUT_UNIT_EXAMPLES: [&str; 3] = [
    "without_unit([5, 'kg']) → 5",
    "with_unit(3, 'bar') | without_unit → 3",
    "without_unit('abc') → abc",
];

static WITHOUT_UNIT_RELATED: [&str; 2] = ["with_unit", "to_unit"];

impl FunctionPlugin for WithoutUnit {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "without_unit",
            description: "Return the bare magnitude of a value; values without one pass through",
            usage: "without_unit(expr)",
            args: &WITHOUT_UNIT_ARGS,
            returns: "Any",
            examples: &WITHOUT_UNIT_EXAMPLES,
            category: CATEGORY,
            related: &WITHOUT_UNIT_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        match args.first() {
            Some(expr) => self.normalizer.without_unit(expr, ctx.states()),
            None => Value::Error(TemplateError::arg_count("without_unit", 1, 0)),
        }
    }
}

/// Register `to_unit`, `from_unit`, `with_unit`, `quantity` and `without_unit`
pub fn load_unit_functions(registry: PluginRegistry, normalizer: Arc<Normalizer>) -> PluginRegistry {
    registry
        .with_function(ToUnit { normalizer: normalizer.clone() })
        .with_function(FromUnit { normalizer: normalizer.clone() })
        .with_function(WithUnit { normalizer: normalizer.clone() })
        .with_function(QuantityFn { normalizer: normalizer.clone() })
        .with_function(WithoutUnit { normalizer })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NormalizerConfig;
    use unit_helper_units::UnitRegistry;

    fn setup() -> (PluginRegistry, EvalContext) {
        let normalizer = Arc::new(Normalizer::new(Arc::new(UnitRegistry::new()), NormalizerConfig::default()));
        let registry = load_unit_functions(PluginRegistry::new(), normalizer);
        let states = StateStore::new()
            .with_state(TemplateState::new("sensor.outdoor", "21.5").with_unit("°C"));
        (registry, EvalContext::new(Arc::new(states)))
    }

    #[test]
    fn test_all_functions_registered() {
        let (registry, _) = setup();
        assert_eq!(
            registry.function_names(),
            vec!["from_unit", "quantity", "to_unit", "with_unit", "without_unit"]
        );
    }

    #[test]
    fn test_to_unit_filter_on_state_reference() {
        let (registry, ctx) = setup();
        let v = registry.call_filter("to_unit", Value::from("states.sensor.outdoor"), &[Value::from("degF")], &ctx);
        assert!((v.as_number().unwrap() - 70.7).abs() < 1e-9);
    }

    #[test]
    fn test_null_unit_means_absent() {
        let (registry, ctx) = setup();
        let v = registry.call_function("to_unit", &[Value::from(4.0), Value::Null, Value::from("kWh")], &ctx);
        assert_eq!(v.as_number(), Some(4.0));
    }

    #[test]
    fn test_unit_argument_type_checked() {
        let (registry, ctx) = setup();
        let v = registry.call_function("to_unit", &[Value::from(4.0), Value::from(true)], &ctx);
        assert_eq!(v.as_error().unwrap().code, codes::ARG_TYPE);
    }

    #[test]
    fn test_errors_become_values() {
        let (registry, ctx) = setup();
        let v = registry.call_function("with_unit", &[Value::from(42.0)], &ctx);
        assert_eq!(v.as_error().unwrap().code, codes::MISSING_UNIT);

        let v = registry.call_function("to_unit", &[Value::pair(1.0, "kWh"), Value::from("W")], &ctx);
        assert_eq!(v.as_error().unwrap().code, codes::UNIT_MISMATCH);

        let v = registry.call_function("with_unit", &[Value::from("states.sensor.x")], &ctx);
        assert_eq!(v.as_error().unwrap().code, codes::NOT_FOUND);
    }

    #[test]
    fn test_error_input_propagates() {
        let (registry, ctx) = setup();
        let input = Value::Error(TemplateError::internal("upstream"));
        let v = registry.call_filter("to_unit", input, &[Value::from("W")], &ctx);
        assert_eq!(v.as_error().unwrap().code, codes::INTERNAL);
    }

    #[test]
    fn test_quantity_alias_matches_with_unit() {
        let (registry, ctx) = setup();
        let a = registry.call_function("quantity", &[Value::from("5 km")], &ctx);
        let b = registry.call_function("with_unit", &[Value::from("5 km")], &ctx);
        assert_eq!(a.as_quantity(), b.as_quantity());
        assert_eq!(a.to_string(), "5 km");
    }

    #[test]
    fn test_quantity_then_without_unit() {
        let (registry, ctx) = setup();
        let q = registry.call_function("with_unit", &[Value::from(3.0), Value::from("bar")], &ctx);
        let bare = registry.call_filter("without_unit", q, &[], &ctx);
        assert_eq!(bare.as_number(), Some(3.0));
    }
}
