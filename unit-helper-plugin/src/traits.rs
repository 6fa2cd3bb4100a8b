//! Plugin traits

use unit_helper_core::Value;
use crate::EvalContext;
use serde::Serialize;
use std::ops::RangeInclusive;

/// One positional argument of a template function
#[derive(Debug, Clone, Serialize)]
pub struct ArgMeta {
    pub name: &'static str,
    /// Accepted value types, e.g. "Text" or "Any"
    pub accepts: &'static str,
    pub description: &'static str,
    /// What an omitted optional argument falls back to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

impl ArgMeta {
    pub const fn required(name: &'static str, accepts: &'static str, description: &'static str) -> Self {
        Self { name, accepts, description, default: None }
    }

    pub const fn optional(name: &'static str, accepts: &'static str, description: &'static str, default: &'static str) -> Self {
        Self { name, accepts, description, default: Some(default) }
    }

    pub const fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

/// Documentation and signature of a template function
#[derive(Debug, Clone, Serialize)]
pub struct FunctionMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub args: &'static [ArgMeta],
    pub returns: &'static str,
    pub examples: &'static [&'static str],
    pub category: &'static str,
    pub related: &'static [&'static str],
}

impl FunctionMeta {
    /// Accepted argument counts, counting a piped filter input as the first
    pub fn arity(&self) -> RangeInclusive<usize> {
        let required = self.args.iter().filter(|a| !a.is_optional()).count();
        required..=self.args.len()
    }
}

/// A function callable from templates.
///
/// `call` never panics on bad input: failures come back as `Value::Error`.
pub trait FunctionPlugin: Send + Sync {
    fn meta(&self) -> FunctionMeta;
    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value;
}
