use super::metadata::{ProducerEpoch, ProducerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use txnq_cluster::types::{Epoch, PartitionId, TopicPartition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionResult {
    Commit,
    Abort,
}

impl fmt::Display for TransactionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionResult::Commit => f.write_str("COMMIT"),
            TransactionResult::Abort => f.write_str("ABORT"),
        }
    }
}

/// One producer's commit or abort marker, to be written to each listed partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnMarkerEntry {
    pub producer_id: ProducerId,
    pub producer_epoch: ProducerEpoch,
    pub transaction_result: TransactionResult,
    pub topic_partitions: BTreeSet<TopicPartition>,
}

/// Markers queued for a broker, tagged with the coordinator partition and
/// coordinator epoch that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerBatch {
    pub metadata_partition: PartitionId,
    pub coordinator_epoch: Epoch,
    pub entries: Vec<TxnMarkerEntry>,
}

impl MarkerBatch {
    pub fn new(
        metadata_partition: PartitionId,
        coordinator_epoch: Epoch,
        entries: Vec<TxnMarkerEntry>,
    ) -> Self {
        Self {
            metadata_partition,
            coordinator_epoch,
            entries,
        }
    }

    /// Number of partition writes this batch asks for.
    pub fn partition_count(&self) -> usize {
        self.entries.iter().map(|e| e.topic_partitions.len()).sum()
    }
}
