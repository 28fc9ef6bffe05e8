//! Transaction marker dispatch for the txnq transaction coordinator.
//!
//! When a transaction enters prepare-commit or prepare-abort, the coordinator must
//! write a commit or abort marker to every partition the transaction touched. This
//! crate batches those marker writes per destination broker, guards against two
//! completion cycles running for the same producer, and discards queued work for
//! coordinator partitions this node stops leading.

pub mod channel;
pub mod config;
pub mod error;
pub mod outcome;
pub mod telemetry;
pub mod transaction;

pub use channel::{EmigrationReport, RoutingReport, TransactionMarkerChannel};
pub use config::ChannelConfig;
pub use error::MarkerChannelError;
pub use outcome::{MarkerErrorKind, MarkerOutcome, PartitionMarkerResult};

// Re-export logging macros for consistent usage across the crate
pub use log::{debug, error, info, trace, warn};
