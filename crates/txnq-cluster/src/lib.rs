//! Cluster view for the txnq transaction coordinator.
//!
//! This crate provides the broker and partition metadata the coordinator consults when
//! dispatching transaction markers: strongly typed identifiers, a manifest format for
//! describing brokers, listeners and partition leadership, and a `MetadataCache`
//! abstraction with an in-memory implementation.

pub mod error;
pub mod manifest;
pub mod metadata_cache;
pub mod types;

pub use error::ClusterError;

// Re-export commonly used metadata cache types for ergonomics
pub use metadata_cache::{InMemoryMetadataCache, MetadataCache};

/// Listener used for inter-broker traffic unless configured otherwise.
pub const DEFAULT_LISTENER: &str = "PLAINTEXT";

// Re-export logging macros for consistent usage across the crate
pub use log::{debug, error, info, trace, warn};
