//! Quantity normalization
//!
//! Template values arrive in many shapes: bare numbers, strings like
//! `"21.5 °C"`, `[magnitude, unit]` pairs, sensor states carrying a
//! `unit_of_measurement` attribute, `states.<entity_id>` references and
//! quantities built by an earlier call. [`Normalizer`] turns any of them into
//! a [`Quantity`] and converts between units.

use crate::NormalizerConfig;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};
use unit_helper_core::{codes, StateLookup, TemplateError, TemplateState, Value};
use unit_helper_units::{ConversionError, Quantity, Unit, UnitRegistry};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("invalid unit '{unit}'")]
    InvalidUnit {
        unit: String,
        #[source]
        source: ConversionError,
    },

    #[error("'{value}' is not a number")]
    InvalidMagnitude { value: String },

    #[error("state {reference} not found")]
    NotFound { reference: String },

    #[error("'{value}' has no unit and none was given")]
    MissingUnit { value: String },

    #[error("cannot read {from} as {to}: different dimensions")]
    UnitMismatch { from: String, to: String },

    #[error("conversion failed with expr={quantity}, target_unit={target}")]
    Conversion {
        quantity: String,
        target: String,
        #[source]
        source: ConversionError,
    },
}

impl NormalizeError {
    pub fn code(&self) -> &'static str {
        match self {
            NormalizeError::InvalidUnit { .. } | NormalizeError::InvalidMagnitude { .. } => {
                codes::INVALID_UNIT
            }
            NormalizeError::NotFound { .. } => codes::NOT_FOUND,
            NormalizeError::MissingUnit { .. } => codes::MISSING_UNIT,
            NormalizeError::UnitMismatch { .. } => codes::UNIT_MISMATCH,
            NormalizeError::Conversion { .. } => codes::CONVERSION_ERROR,
        }
    }
}

impl From<NormalizeError> for TemplateError {
    fn from(err: NormalizeError) -> Self {
        let base = TemplateError::new(err.code(), err.to_string()).with_sources(&err);
        match err {
            NormalizeError::MissingUnit { .. } => base.with_suggestion(
                "Pass a unit, e.g. with_unit(value, 'degC'), or use a [value, unit] pair",
            ),
            NormalizeError::NotFound { .. } => base
                .with_suggestion("Check the entity id; references look like states.sensor.name"),
            NormalizeError::UnitMismatch { .. } => base
                .with_suggestion("The hint must measure the same thing as the value's own unit"),
            _ => base,
        }
    }
}

/// Shape of a template value, as far as unit handling cares
#[derive(Debug, Clone, Copy)]
pub enum RawValue<'a> {
    Quantity(&'a Quantity),
    /// `[magnitude, unit]`
    Pair(&'a Value, &'a Value),
    /// Entity id taken from a `states.<entity_id>` string
    StateRef(&'a str),
    State(&'a TemplateState),
    /// Numbers, numeric strings, `"5 km"`-style strings and anything else
    Scalar(&'a Value),
}

impl<'a> RawValue<'a> {
    pub fn classify(value: &'a Value, config: &NormalizerConfig) -> Self {
        match value {
            Value::Quantity(q) => RawValue::Quantity(q),
            Value::List(items) if items.len() == 2 => RawValue::Pair(&items[0], &items[1]),
            Value::State(s) => RawValue::State(s),
            Value::Text(s) => match s.strip_prefix(config.state_prefix.as_str()) {
                Some(entity_id) if !config.state_prefix.is_empty() => RawValue::StateRef(entity_id),
                _ => RawValue::Scalar(value),
            },
            _ => RawValue::Scalar(value),
        }
    }
}

/// Turns template values into quantities and converts them
#[derive(Debug, Clone)]
pub struct Normalizer {
    units: Arc<UnitRegistry>,
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(units: Arc<UnitRegistry>, config: NormalizerConfig) -> Self {
        Self { units, config }
    }

    pub fn units(&self) -> &UnitRegistry {
        &self.units
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Build a quantity from `expr`, using `unit` when `expr` carries none.
    ///
    /// When `expr` has its own unit and `unit` names a different, compatible
    /// one, the magnitude is converted into `unit`.
    pub fn with_unit(
        &self,
        expr: &Value,
        unit: Option<&str>,
        states: &dyn StateLookup,
    ) -> Result<Quantity, NormalizeError> {
        let hint = non_empty(unit);
        let raw = RawValue::classify(expr, &self.config);
        trace!(?raw, hint, "with_unit");

        if let (RawValue::Quantity(q), None) = (raw, hint) {
            return Ok(q.clone());
        }

        let (magnitude, own_unit) = self.resolve(raw, states)?;

        match (own_unit, hint) {
            (None, None) => Err(NormalizeError::MissingUnit { value: expr.to_string() }),
            (Some(own), None) => Ok(Quantity::new(magnitude, own)),
            (None, Some(hint)) => Ok(Quantity::new(magnitude, self.parse_unit(hint)?)),
            (Some(own), Some(hint)) => {
                let target = self.parse_unit(hint)?;
                if own.symbol == target.symbol {
                    return Ok(Quantity::new(magnitude, own));
                }
                if !own.is_compatible(&target) {
                    return Err(NormalizeError::UnitMismatch {
                        from: own.symbol,
                        to: target.symbol,
                    });
                }
                let converted = self.convert(&Quantity::new(magnitude, own), &target)?;
                Ok(Quantity::new(converted, target))
            }
        }
    }

    /// Magnitude of `expr` in `target_unit`.
    ///
    /// A missing source unit defaults to the target and vice versa. With
    /// neither, the magnitude is returned in the value's own unit.
    pub fn to_unit(
        &self,
        expr: &Value,
        target_unit: Option<&str>,
        source_unit: Option<&str>,
        states: &dyn StateLookup,
    ) -> Result<f64, NormalizeError> {
        let target = non_empty(target_unit);
        let source = non_empty(source_unit);
        let (source, target) = (source.or(target), target.or(source));

        let quantity = self.with_unit(expr, source, states)?;
        match target {
            Some(target) => {
                let target = self.parse_unit(target)?;
                self.convert(&quantity, &target)
            }
            None => Ok(quantity.magnitude),
        }
    }

    /// [`to_unit`](Self::to_unit) with the unit arguments swapped
    pub fn from_unit(
        &self,
        expr: &Value,
        source_unit: Option<&str>,
        target_unit: Option<&str>,
        states: &dyn StateLookup,
    ) -> Result<f64, NormalizeError> {
        self.to_unit(expr, target_unit, source_unit, states)
    }

    /// Bare magnitude of `expr`; values that have none come back unchanged
    pub fn without_unit(&self, expr: &Value, states: &dyn StateLookup) -> Value {
        let inner = match expr {
            Value::List(items) if items.len() == 2 => &items[0],
            _ => expr,
        };

        match RawValue::classify(inner, &self.config) {
            RawValue::Quantity(q) => Value::Number(q.magnitude),
            RawValue::State(s) => numeric_or(&s.state),
            RawValue::StateRef(entity_id) => match states.get(entity_id) {
                Some(s) => numeric_or(&s.state),
                None => inner.clone(),
            },
            RawValue::Pair(..) | RawValue::Scalar(_) => match inner {
                Value::Text(s) => numeric_or(s),
                other => other.clone(),
            },
        }
    }

    /// Convert with the delta fallback: a `delta_X` quantity that cannot be
    /// converted directly is retried as `delta_X + 0 X`, an absolute `X`.
    /// The delta prefix is the registry's own.
    fn convert(&self, quantity: &Quantity, target: &Unit) -> Result<f64, NormalizeError> {
        let original = match quantity.convert_to(target) {
            Ok(converted) => return Ok(converted.magnitude),
            Err(e) => e,
        };

        if let Some(base) = self.units.delta_base(&quantity.unit) {
            debug!(
                quantity = %quantity,
                target = %target.symbol,
                base = %base.symbol,
                "retrying delta conversion as absolute"
            );
            let absolute = quantity
                .add(&Quantity::new(0.0, base.clone()))
                .and_then(|q| q.convert_to(target));
            if let Ok(converted) = absolute {
                return Ok(converted.magnitude);
            }
        }

        Err(NormalizeError::Conversion {
            quantity: quantity.to_string(),
            target: target.symbol.clone(),
            source: original,
        })
    }

    fn resolve(
        &self,
        raw: RawValue<'_>,
        states: &dyn StateLookup,
    ) -> Result<(f64, Option<Unit>), NormalizeError> {
        match raw {
            RawValue::Quantity(q) => Ok((q.magnitude, Some(q.unit.clone()))),
            RawValue::Pair(magnitude, unit) => {
                let unit = match unit {
                    Value::Text(s) => non_empty(Some(s.as_str()))
                        .map(|s| self.parse_unit(s))
                        .transpose()?,
                    Value::Null => None,
                    other => {
                        return Err(NormalizeError::InvalidUnit {
                            unit: other.to_string(),
                            source: ConversionError::UnknownUnit(other.to_string()),
                        })
                    }
                };
                Ok((magnitude_of(magnitude)?, unit))
            }
            RawValue::StateRef(entity_id) => {
                let state = states.get(entity_id).ok_or_else(|| NormalizeError::NotFound {
                    reference: format!("{}{}", self.config.state_prefix, entity_id),
                })?;
                debug!(
                    entity_id,
                    state = %state.state,
                    unit = ?state.unit_of_measurement(),
                    "resolved state"
                );
                self.resolve_state(&state)
            }
            RawValue::State(state) => self.resolve_state(state),
            RawValue::Scalar(value) => match value {
                Value::Number(n) => Ok((*n, None)),
                Value::Text(s) => self.resolve_text(s),
                other => Err(NormalizeError::InvalidMagnitude { value: other.to_string() }),
            },
        }
    }

    fn resolve_state(
        &self,
        state: &TemplateState,
    ) -> Result<(f64, Option<Unit>), NormalizeError> {
        let magnitude = parse_number(&state.state)
            .ok_or_else(|| NormalizeError::InvalidMagnitude { value: state.state.clone() })?;
        let unit = state.unit_of_measurement().map(|u| self.parse_unit(u)).transpose()?;
        Ok((magnitude, unit))
    }

    /// `"5"`, `"5 km"`, `"21.5 °C"`
    fn resolve_text(&self, text: &str) -> Result<(f64, Option<Unit>), NormalizeError> {
        if let Some(n) = parse_number(text) {
            return Ok((n, None));
        }
        match self.units.parse_quantity(text) {
            Ok(parsed) => Ok(parsed),
            Err(ConversionError::InvalidQuantity(_)) => {
                Err(NormalizeError::InvalidMagnitude { value: text.to_string() })
            }
            Err(source) => Err(NormalizeError::InvalidUnit { unit: text.to_string(), source }),
        }
    }

    fn parse_unit(&self, unit: &str) -> Result<Unit, NormalizeError> {
        self.units.parse_unit(unit).map_err(|source| NormalizeError::InvalidUnit {
            unit: unit.to_string(),
            source,
        })
    }
}

fn non_empty(unit: Option<&str>) -> Option<&str> {
    unit.map(str::trim).filter(|u| !u.is_empty())
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

fn magnitude_of(value: &Value) -> Result<f64, NormalizeError> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Text(s) => {
            parse_number(s).ok_or_else(|| NormalizeError::InvalidMagnitude { value: s.clone() })
        }
        other => Err(NormalizeError::InvalidMagnitude { value: other.to_string() }),
    }
}

fn numeric_or(s: &str) -> Value {
    match parse_number(s) {
        Some(n) => Value::Number(n),
        None => Value::Text(s.to_string()),
    }
}
