use super::marker::TransactionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use txnq_cluster::types::TopicPartition;

/// Identifier assigned to a transactional producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProducerId(pub i64);

/// Fencing counter for a producer id; bumped whenever a new producer instance takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProducerEpoch(pub i16);

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ProducerEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProducerId {
    fn from(id: i64) -> Self {
        ProducerId(id)
    }
}

impl From<i16> for ProducerEpoch {
    fn from(epoch: i16) -> Self {
        ProducerEpoch(epoch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionState {
    Empty,
    Ongoing,
    PrepareCommit,
    PrepareAbort,
    CompleteCommit,
    CompleteAbort,
    PrepareEpochFence,
    Dead,
}

impl TransactionState {
    /// Marker outcome implied by this state, if the transaction is ready to
    /// have markers written.
    pub fn marker_result(&self) -> Option<TransactionResult> {
        match self {
            TransactionState::PrepareCommit => Some(TransactionResult::Commit),
            TransactionState::PrepareAbort => Some(TransactionResult::Abort),
            _ => None,
        }
    }
}

/// Coordinator-side view of one producer's transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionMetadata {
    pub transactional_id: String,
    pub producer_id: ProducerId,
    pub producer_epoch: ProducerEpoch,
    pub txn_timeout_ms: u32,
    pub state: TransactionState,
    pub partitions: BTreeSet<TopicPartition>,
    pub txn_start_timestamp: DateTime<Utc>,
    pub txn_last_update_timestamp: DateTime<Utc>,
}

impl TransactionMetadata {
    /// A fresh transaction with no partitions, in the `Empty` state.
    pub fn new(
        transactional_id: impl Into<String>,
        producer_id: ProducerId,
        producer_epoch: ProducerEpoch,
        txn_timeout_ms: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            transactional_id: transactional_id.into(),
            producer_id,
            producer_epoch,
            txn_timeout_ms,
            state: TransactionState::Empty,
            partitions: BTreeSet::new(),
            txn_start_timestamp: now,
            txn_last_update_timestamp: now,
        }
    }

    pub fn with_partitions(mut self, partitions: impl IntoIterator<Item = TopicPartition>) -> Self {
        self.partitions.extend(partitions);
        self
    }

    pub fn with_state(mut self, state: TransactionState) -> Self {
        self.state = state;
        self
    }

    /// Move to `state`, stamping the update time.
    pub fn transition_to(&mut self, state: TransactionState) {
        self.state = state;
        self.txn_last_update_timestamp = Utc::now();
    }
}
