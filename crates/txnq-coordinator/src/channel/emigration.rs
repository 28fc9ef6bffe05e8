use super::broker_registry::BrokerRegistry;
use super::pending::PendingTransactionRegistry;
use crate::transaction::ProducerId;
use txnq_cluster::types::PartitionId;

/// What a partition emigration discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmigrationReport {
    pub metadata_partition: PartitionId,
    pub pending_removed: Vec<ProducerId>,
    pub batches_removed: usize,
}

impl EmigrationReport {
    pub fn is_noop(&self) -> bool {
        self.pending_removed.is_empty() && self.batches_removed == 0
    }
}

/// Forget all work owned by `metadata_partition` after losing its leadership.
///
/// Pending claims go first so no new completion cycle can start from a stale
/// claim while queues are swept. Each queue is filtered under its own lock.
pub fn remove_state_for_partition(
    brokers: &BrokerRegistry,
    pending: &PendingTransactionRegistry,
    metadata_partition: PartitionId,
) -> EmigrationReport {
    let pending_removed = pending.remove_partition(metadata_partition);
    let batches_removed = brokers.remove_batches_for_partition(metadata_partition);

    let report = EmigrationReport {
        metadata_partition,
        pending_removed,
        batches_removed,
    };

    if report.is_noop() {
        log::debug!("Emigration of coordinator partition {metadata_partition}: nothing tracked");
    } else {
        log::info!(
            "Emigration of coordinator partition {metadata_partition}: dropped {} pending transactions and {} queued batches",
            report.pending_removed.len(),
            report.batches_removed
        );
    }
    report
}
