//! Metadata cache trait definitions.

use crate::{ClusterError, types::*};

/// Read view of cluster metadata consumed by the transaction coordinator.
///
/// Implementations must be cheap to query; the marker channel calls them once
/// per topic-partition on every dispatch.
pub trait MetadataCache: Send + Sync {
    /// Current leader of a partition.
    ///
    /// `Ok(None)` means the partition exists but has no leader right now.
    /// Unknown topics or partitions are reported as not-found errors.
    fn get_partition_leader(
        &self,
        topic: &str,
        partition: PartitionId,
    ) -> Result<Option<BrokerId>, ClusterError>;

    /// Network endpoint of `broker` under `listener`, if the broker is alive and
    /// exposes that listener.
    fn get_alive_endpoint(&self, broker: BrokerId, listener: &ListenerName) -> Option<BrokerNode>;
}
