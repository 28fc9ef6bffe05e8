//! Error types for cluster metadata operations.

use std::fmt;

/// Main error type for cluster metadata operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterError {
    BrokerNotFound {
        broker_id: u32,
    },
    TopicNotFound {
        topic: String,
    },
    PartitionNotFound {
        topic: String,
        partition_id: u32,
    },
    /// Broker is not part of the partition's replica set.
    InvalidReplica {
        topic: String,
        partition_id: u32,
        replica_id: u32,
    },
    /// Invalid manifest structure or data.
    InvalidManifest {
        context: String,
        reason: String,
    },
    /// Manifest file I/O error.
    ManifestIo {
        context: String,
        reason: String,
    },
    /// Leader epochs must never move backwards.
    InvalidEpoch {
        topic: String,
        partition_id: u32,
        current_epoch: u64,
        new_epoch: u64,
    },
}

impl fmt::Display for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterError::BrokerNotFound { broker_id } => {
                write!(f, "Broker with ID {broker_id} not found")
            }
            ClusterError::TopicNotFound { topic } => {
                write!(f, "Topic '{topic}' not found")
            }
            ClusterError::PartitionNotFound {
                topic,
                partition_id,
            } => {
                write!(f, "Partition {partition_id} not found for topic '{topic}'")
            }
            ClusterError::InvalidReplica {
                topic,
                partition_id,
                replica_id,
            } => {
                write!(
                    f,
                    "Broker {replica_id} is not a replica of topic '{topic}' partition {partition_id}"
                )
            }
            ClusterError::InvalidManifest { context, reason } => {
                write!(f, "Invalid manifest in {context}: {reason}")
            }
            ClusterError::ManifestIo { context, reason } => {
                write!(f, "Manifest I/O error in {context}: {reason}")
            }
            ClusterError::InvalidEpoch {
                topic,
                partition_id,
                current_epoch,
                new_epoch,
            } => {
                write!(
                    f,
                    "Invalid epoch for topic '{topic}' partition {partition_id}: \
                     attempted {new_epoch}, current {current_epoch} (epochs must not decrease)"
                )
            }
        }
    }
}

impl std::error::Error for ClusterError {}

impl ClusterError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ClusterError::BrokerNotFound { .. }
                | ClusterError::TopicNotFound { .. }
                | ClusterError::PartitionNotFound { .. }
        )
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ClusterError::BrokerNotFound { .. }
                | ClusterError::TopicNotFound { .. }
                | ClusterError::PartitionNotFound { .. }
                | ClusterError::InvalidReplica { .. }
                | ClusterError::InvalidManifest { .. }
                | ClusterError::InvalidEpoch { .. }
        )
    }

    pub fn from_io_error(e: std::io::Error, context: &str) -> Self {
        ClusterError::ManifestIo {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }

    pub fn from_parse_error(e: impl std::fmt::Display, context: &str) -> Self {
        ClusterError::InvalidManifest {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }
}
