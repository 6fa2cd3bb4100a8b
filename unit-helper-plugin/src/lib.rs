//! Unit Helper Plugin System
//!
//! Template functions are plugins: each one carries its own metadata and is
//! callable both as a global (`to_unit(x, 'degF')`) and as a filter
//! (`x | to_unit('degF')`).

mod traits;
mod registry;
mod context;

pub use traits::{FunctionPlugin, FunctionMeta, ArgMeta};
pub use registry::PluginRegistry;
pub use context::EvalContext;

/// Re-export core types for plugin authors
pub mod prelude {
    pub use crate::{FunctionPlugin, FunctionMeta, ArgMeta, PluginRegistry, EvalContext};
    pub use unit_helper_core::prelude::*;
}
