use crate::transaction::{ProducerId, TransactionMetadata};
use dashmap::DashMap;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use txnq_cluster::types::PartitionId;

/// Transactions with a marker completion cycle in flight, grouped by the
/// coordinator partition that owns them.
///
/// Grouping by partition makes emigration a single map removal.
#[derive(Debug, Default)]
pub struct PendingTransactionRegistry {
    pending: DashMap<PartitionId, HashMap<ProducerId, TransactionMetadata>>,
}

impl PendingTransactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the completion cycle for `txn_metadata.producer_id` under
    /// `metadata_partition`.
    ///
    /// Returns `false` without touching the stored entry if the producer
    /// already has one. The check and insert happen under the partition's shard
    /// lock, so concurrent callers for the same key see exactly one `true`.
    pub fn maybe_add_pending_request(
        &self,
        metadata_partition: PartitionId,
        txn_metadata: &TransactionMetadata,
    ) -> bool {
        let mut producers = self.pending.entry(metadata_partition).or_default();
        match producers.entry(txn_metadata.producer_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(txn_metadata.clone());
                true
            }
        }
    }

    pub fn pending_txn_metadata(
        &self,
        metadata_partition: PartitionId,
        producer_id: ProducerId,
    ) -> Option<TransactionMetadata> {
        self.pending
            .get(&metadata_partition)
            .and_then(|producers| producers.get(&producer_id).cloned())
    }

    /// Release a claim once its markers are written.
    pub fn remove_pending_request(
        &self,
        metadata_partition: PartitionId,
        producer_id: ProducerId,
    ) -> Option<TransactionMetadata> {
        let removed = self
            .pending
            .get_mut(&metadata_partition)
            .and_then(|mut producers| producers.remove(&producer_id));

        if removed.is_some() {
            self.pending
                .remove_if(&metadata_partition, |_, producers| producers.is_empty());
        }
        removed
    }

    /// Drop every claim for `metadata_partition`, returning the affected producer ids.
    pub fn remove_partition(&self, metadata_partition: PartitionId) -> Vec<ProducerId> {
        let mut producers: Vec<ProducerId> = self
            .pending
            .remove(&metadata_partition)
            .map(|(_, producers)| producers.into_keys().collect())
            .unwrap_or_default();
        producers.sort();
        producers
    }

    pub fn pending_count(&self, metadata_partition: PartitionId) -> usize {
        self.pending
            .get(&metadata_partition)
            .map(|producers| producers.len())
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.pending.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
