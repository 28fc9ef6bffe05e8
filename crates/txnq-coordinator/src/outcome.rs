//! Outcomes reported back by the marker sender.
//!
//! The sender transmits queued [`MarkerBatch`](crate::transaction::MarkerBatch)es and reports,
//! per producer and partition, how the destination broker answered. The channel
//! itself never acts on these values; the coordinator matches on them to decide
//! between completing, retrying and abandoning the transaction.

use crate::transaction::ProducerId;
use serde::{Deserialize, Serialize};
use std::fmt;
use txnq_cluster::types::TopicPartition;

/// Error kinds a broker can return for a single marker write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerErrorKind {
    None,
    UnknownTopicOrPartition,
    NotLeaderOrFollower,
    NotEnoughReplicas,
    NotEnoughReplicasAfterAppend,
    RequestTimedOut,
    StorageError,
    CorruptMessage,
    MessageTooLarge,
    RecordListTooLarge,
    InvalidRequiredAcks,
    UnknownProducerId,
    InvalidProducerEpoch,
    UnsupportedVersion,
    ClusterAuthorizationFailed,
    Unknown,
}

impl fmt::Display for MarkerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Classified result of a marker write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerOutcome {
    Success,
    /// Transient; resend once leadership or replication settles.
    Retryable(MarkerErrorKind),
    /// Resending cannot succeed.
    Fatal(MarkerErrorKind),
}

impl MarkerOutcome {
    pub fn from_error_kind(kind: MarkerErrorKind) -> Self {
        use MarkerErrorKind::*;
        match kind {
            MarkerErrorKind::None => MarkerOutcome::Success,
            UnknownTopicOrPartition
            | NotLeaderOrFollower
            | NotEnoughReplicas
            | NotEnoughReplicasAfterAppend
            | RequestTimedOut
            | StorageError => MarkerOutcome::Retryable(kind),
            CorruptMessage
            | MessageTooLarge
            | RecordListTooLarge
            | InvalidRequiredAcks
            | UnknownProducerId
            | InvalidProducerEpoch
            | UnsupportedVersion
            | ClusterAuthorizationFailed
            | Unknown => MarkerOutcome::Fatal(kind),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MarkerOutcome::Success)
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, MarkerOutcome::Retryable(_))
    }

    pub fn error_kind(&self) -> MarkerErrorKind {
        match self {
            MarkerOutcome::Success => MarkerErrorKind::None,
            MarkerOutcome::Retryable(kind) | MarkerOutcome::Fatal(kind) => *kind,
        }
    }
}

impl From<MarkerErrorKind> for MarkerOutcome {
    fn from(kind: MarkerErrorKind) -> Self {
        MarkerOutcome::from_error_kind(kind)
    }
}

/// Outcome of writing one producer's marker to one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionMarkerResult {
    pub producer_id: ProducerId,
    pub topic_partition: TopicPartition,
    pub outcome: MarkerOutcome,
}

impl PartitionMarkerResult {
    pub fn new(
        producer_id: ProducerId,
        topic_partition: TopicPartition,
        kind: MarkerErrorKind,
    ) -> Self {
        Self {
            producer_id,
            topic_partition,
            outcome: kind.into(),
        }
    }
}
