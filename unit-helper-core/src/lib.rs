//! Unit Helper Core - Fundamental types
//!
//! This crate provides the core types shared by the unit helpers:
//! - `Value`: Runtime values (numbers, text, states, quantities, errors)
//! - `TemplateState`: Read-only sensor state with attributes
//! - `StateLookup`: How the host exposes its state machine
//! - `TemplateError`: Structured errors for the template evaluator

mod value;
mod state;
mod error;

pub use value::Value;
pub use state::{TemplateState, StateLookup, StateStore, StateError, UNIT_OF_MEASUREMENT};
pub use error::{TemplateError, codes};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Value, TemplateState, StateLookup, StateStore, TemplateError};
    pub use crate::error::codes;
}

#[cfg(test)]
mod tests {
    use super::*;

    mod value_tests {
        use super::*;
        use unit_helper_units::{Quantity, UnitRegistry};

        #[test]
        fn test_pair() {
            let v = Value::pair(20.0, "degC");
            let items = v.as_list().unwrap();
            assert_eq!(items[0].as_number(), Some(20.0));
            assert_eq!(items[1].as_text(), Some("degC"));
        }

        #[test]
        fn test_type_names() {
            assert_eq!(Value::from(1.0).type_name(), "Number");
            assert_eq!(Value::from("x").type_name(), "Text");
            assert_eq!(Value::Null.type_name(), "Null");
            let state = TemplateState::new("sensor.a", "1");
            assert_eq!(Value::from(state).type_name(), "State");
        }

        #[test]
        fn test_quantity_display() {
            let registry = UnitRegistry::new();
            let q = Quantity::new(5.0, registry.get("kWh").unwrap().clone());
            assert_eq!(Value::from(q).to_string(), "5 kWh");
        }

        #[test]
        fn test_result_into_value() {
            let ok: Result<f64, TemplateError> = Ok(2.5);
            assert_eq!(Value::from(ok).as_number(), Some(2.5));

            let err: Result<f64, TemplateError> = Err(TemplateError::internal("boom"));
            let v = Value::from(err);
            assert!(v.is_error());
            assert_eq!(v.as_error().unwrap().code, codes::INTERNAL);
        }

        #[test]
        fn test_error_display() {
            let v = Value::Error(TemplateError::new(codes::NOT_FOUND, "gone"));
            assert_eq!(v.to_string(), "#ERROR: NOT_FOUND");
        }

        #[test]
        fn test_serde_tagging() {
            let json = serde_json::to_value(Value::from(3.0)).unwrap();
            assert_eq!(json, serde_json::json!({"type": "Number", "value": 3.0}));
            let back: Value = serde_json::from_value(json).unwrap();
            assert_eq!(back.as_number(), Some(3.0));
        }
    }

    mod state_tests {
        use super::*;

        #[test]
        fn test_lookup_through_trait_object() {
            let store = StateStore::new()
                .with_state(TemplateState::new("sensor.temp", "19.5").with_unit("degC"));
            let lookup: &dyn StateLookup = &store;
            let state = lookup.get("sensor.temp").unwrap();
            assert_eq!(state.unit_of_measurement(), Some("degC"));
        }
    }
}
