//! Channel configuration.

use crate::MarkerChannelError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use txnq_cluster::types::ListenerName;

/// Settings for a [`TransactionMarkerChannel`](crate::TransactionMarkerChannel).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Listener whose endpoints marker requests are sent to.
    pub inter_broker_listener: ListenerName,
}

impl ChannelConfig {
    pub fn with_listener(listener: impl Into<String>) -> Self {
        Self {
            inter_broker_listener: ListenerName::new(listener),
        }
    }

    /// Load from a JSON (`.json`) or YAML (`.yaml`/`.yml`) file. Missing keys take defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MarkerChannelError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| MarkerChannelError::from_io_error(e, "channel config loading"))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        let config: ChannelConfig = match extension.as_str() {
            "json" => serde_json::from_str(&content)
                .map_err(|e| MarkerChannelError::from_parse_error(e, "JSON channel config"))?,
            _ => serde_yaml::from_str(&content)
                .map_err(|e| MarkerChannelError::from_parse_error(e, "YAML channel config"))?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MarkerChannelError> {
        if self.inter_broker_listener.as_str().trim().is_empty() {
            return Err(MarkerChannelError::Config {
                context: "inter_broker_listener".to_string(),
                reason: "listener name must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
