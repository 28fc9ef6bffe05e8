//! Metadata cache trait and implementations.

pub mod memory;
pub mod r#trait;

// Re-exports for ergonomics
pub use memory::InMemoryMetadataCache;
pub use r#trait::MetadataCache;
