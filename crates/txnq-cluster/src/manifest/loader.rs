//! Cluster manifest loading from disk.

use super::types::ClusterManifest;
use crate::ClusterError;
use std::path::Path;

/// Reads cluster manifests from JSON or YAML files.
pub struct ManifestLoader;

impl ManifestLoader {
    /// Load and validate a manifest.
    /// The format is chosen from the extension (`.json`, `.yaml`, `.yml`); anything
    /// else is tried as JSON, then YAML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ClusterManifest, ClusterError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClusterError::from_io_error(e, "manifest loading"))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        let manifest: ClusterManifest = match extension.to_lowercase().as_str() {
            "json" => serde_json::from_str(&content)
                .map_err(|e| ClusterError::from_parse_error(e, "JSON manifest parsing"))?,
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| ClusterError::from_parse_error(e, "YAML manifest parsing"))?,
            _ => serde_json::from_str(&content)
                .or_else(|_| serde_yaml::from_str(&content))
                .map_err(|e| {
                    ClusterError::from_parse_error(e, "manifest parsing (tried both JSON and YAML)")
                })?,
        };

        manifest.validate()?;
        log::debug!(
            "Loaded manifest from {} ({} brokers, {} topics)",
            path.display(),
            manifest.brokers.len(),
            manifest.topics.len()
        );
        Ok(manifest)
    }
}
