//! Live sensor state, as seen by templates
//!
//! The host owns the state machine; templates only read it through
//! [`StateLookup`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use thiserror::Error;

/// Attribute holding a sensor's unit
pub const UNIT_OF_MEASUREMENT: &str = "unit_of_measurement";

/// Read-only snapshot of one entity's state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, JsonValue>,
}

impl TemplateState {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_unit(self, unit: &str) -> Self {
        self.with_attribute(UNIT_OF_MEASUREMENT, unit)
    }

    /// The `unit_of_measurement` attribute, if set to a non-empty string
    pub fn unit_of_measurement(&self) -> Option<&str> {
        self.attributes.get(UNIT_OF_MEASUREMENT)
            .and_then(|u| u.as_str())
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// Resolves entity ids to their current state
pub trait StateLookup: Send + Sync {
    fn get(&self, entity_id: &str) -> Option<TemplateState>;
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid state snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// In-memory state table
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    states: HashMap<String, TemplateState>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot: a JSON array of `{entity_id, state, attributes}` objects,
    /// the shape of a host's `/api/states` listing. Extra fields are ignored.
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        let states: Vec<TemplateState> = serde_json::from_str(json)?;
        Ok(states.into_iter().collect())
    }

    pub fn with_state(mut self, state: TemplateState) -> Self {
        self.insert(state);
        self
    }

    pub fn insert(&mut self, state: TemplateState) -> Option<TemplateState> {
        self.states.insert(state.entity_id.clone(), state)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl StateLookup for StateStore {
    fn get(&self, entity_id: &str) -> Option<TemplateState> {
        self.states.get(entity_id).cloned()
    }
}

impl FromIterator<TemplateState> for StateStore {
    fn from_iter<I: IntoIterator<Item = TemplateState>>(iter: I) -> Self {
        let mut store = StateStore::new();
        for state in iter {
            store.insert(state);
        }
        store
    }
}

impl Extend<TemplateState> for StateStore {
    fn extend<I: IntoIterator<Item = TemplateState>>(&mut self, iter: I) {
        for state in iter {
            self.insert(state);
        }
    }
}
