//! Evaluation Context

use unit_helper_core::{StateLookup, StateStore};
use std::sync::Arc;

/// Evaluation context passed to plugins
#[derive(Clone)]
pub struct EvalContext {
    pub states: Arc<dyn StateLookup>,
}

impl EvalContext {
    pub fn new(states: Arc<dyn StateLookup>) -> Self {
        Self { states }
    }

    pub fn states(&self) -> &dyn StateLookup {
        self.states.as_ref()
    }
}

impl Default for EvalContext {
    /// Context with no entities
    fn default() -> Self {
        Self::new(Arc::new(StateStore::new()))
    }
}

impl std::fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalContext").finish_non_exhaustive()
    }
}
