//! Transaction data model shared by the coordinator and the marker channel.

pub mod marker;
pub mod metadata;

// Re-exports for ergonomics
pub use marker::{MarkerBatch, TransactionResult, TxnMarkerEntry};
pub use metadata::{ProducerEpoch, ProducerId, TransactionMetadata, TransactionState};
