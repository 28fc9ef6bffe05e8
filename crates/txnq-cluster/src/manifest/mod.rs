//! Cluster manifest definitions and loading.

pub mod loader;
pub mod types;

// Re-exports for ergonomics
pub use loader::ManifestLoader;
pub use types::{BrokerSpec, ClusterManifest, ListenerSpec, PartitionAssignment, TopicAssignment};
