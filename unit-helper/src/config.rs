//! Normalizer configuration

use serde::{Deserialize, Serialize};

/// Prefix marking a state reference inside template text
pub const STATE_PREFIX: &str = "states.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Strings starting with this are entity references (`states.sensor.x`)
    pub state_prefix: String,
}

impl NormalizerConfig {
    pub fn with_state_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.state_prefix = prefix.into();
        self
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            state_prefix: STATE_PREFIX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NormalizerConfig::default();
        assert_eq!(config.state_prefix, "states.");
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: NormalizerConfig = serde_json::from_str(r#"{"state_prefix": "entities."}"#).unwrap();
        assert_eq!(config, NormalizerConfig::default().with_state_prefix("entities."));
    }
}
