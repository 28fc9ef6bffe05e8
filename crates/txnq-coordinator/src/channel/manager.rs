use super::broker_registry::{BrokerRegistry, BrokerStateHandle};
use super::emigration::{self, EmigrationReport};
use super::pending::PendingTransactionRegistry;
use super::resolver::DestinationResolver;
use super::router::{MarkerRequest, MarkerRouter, RoutingPlan};
use crate::config::ChannelConfig;
use crate::error::MarkerChannelError;
use crate::transaction::{
    MarkerBatch, ProducerEpoch, ProducerId, TransactionMetadata, TransactionResult,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use txnq_cluster::manifest::ClusterManifest;
use txnq_cluster::{InMemoryMetadataCache, MetadataCache};
use txnq_cluster::types::{BrokerId, BrokerNode, Epoch, PartitionId, TopicPartition};

/// Result of routing one marker request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutingReport {
    /// Brokers that received a batch, with the number of partitions in it.
    pub enqueued: Vec<(BrokerId, usize)>,
    /// Partitions left out of this round because no live leader was found.
    /// The caller retries them once metadata changes.
    pub unresolved: Vec<TopicPartition>,
}

impl RoutingReport {
    /// True when every requested partition was queued.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    pub fn brokers(&self) -> Vec<BrokerId> {
        self.enqueued.iter().map(|(broker, _)| *broker).collect()
    }
}

/// Batches transaction markers per destination broker and tracks which
/// producers have a completion cycle in flight.
///
/// The broker and pending registries are injected so that the sender and
/// diagnostics can share them with the channel.
#[derive(Debug)]
pub struct TransactionMarkerChannel {
    config: ChannelConfig,
    router: MarkerRouter,
    brokers: Arc<BrokerRegistry>,
    pending: Arc<PendingTransactionRegistry>,
}

impl TransactionMarkerChannel {
    pub fn new(config: ChannelConfig, metadata: Arc<dyn MetadataCache>) -> Self {
        Self::with_registries(
            config,
            metadata,
            Arc::new(BrokerRegistry::new()),
            Arc::new(PendingTransactionRegistry::new()),
        )
    }

    /// Build a channel over a static cluster manifest held in an in-memory cache.
    pub fn from_manifest(
        config: ChannelConfig,
        manifest: ClusterManifest,
    ) -> Result<Self, MarkerChannelError> {
        config.validate()?;
        let metadata = InMemoryMetadataCache::new_with_manifest(manifest)?;
        Ok(Self::new(config, Arc::new(metadata)))
    }

    pub fn with_registries(
        config: ChannelConfig,
        metadata: Arc<dyn MetadataCache>,
        brokers: Arc<BrokerRegistry>,
        pending: Arc<PendingTransactionRegistry>,
    ) -> Self {
        let resolver = DestinationResolver::new(metadata, config.inter_broker_listener.clone());
        Self {
            config,
            router: MarkerRouter::new(resolver),
            brokers,
            pending,
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn broker_registry(&self) -> &Arc<BrokerRegistry> {
        &self.brokers
    }

    pub fn pending_registry(&self) -> &Arc<PendingTransactionRegistry> {
        &self.pending
    }

    // ===========================
    // Broker state
    // ===========================

    pub fn add_or_update_broker(&self, node: BrokerNode) {
        self.brokers.add_or_update_broker(node);
    }

    pub fn add_request_for_broker(
        &self,
        broker_id: BrokerId,
        batch: MarkerBatch,
    ) -> Result<(), MarkerChannelError> {
        self.brokers.add_request_for_broker(broker_id, batch)
    }

    pub fn broker_state(&self, broker_id: BrokerId) -> Option<BrokerStateHandle> {
        self.brokers.get(broker_id)
    }

    /// Hand the sender everything queued for `broker_id`, oldest first.
    pub fn drain_queue(&self, broker_id: BrokerId) -> Vec<MarkerBatch> {
        self.brokers.drain_queue(broker_id)
    }

    // ===========================
    // Routing
    // ===========================

    /// Queue `transaction_result` markers for `producer_id` on every partition in
    /// `topic_partitions`, one batch per destination broker.
    pub fn add_request_to_send(
        &self,
        coordinator_epoch: Epoch,
        producer_id: ProducerId,
        producer_epoch: ProducerEpoch,
        transaction_result: TransactionResult,
        metadata_partition: PartitionId,
        topic_partitions: BTreeSet<TopicPartition>,
    ) -> Result<RoutingReport, MarkerChannelError> {
        let request = MarkerRequest {
            coordinator_epoch,
            producer_id,
            producer_epoch,
            transaction_result,
            metadata_partition,
            topic_partitions,
        };
        let plan = self.router.plan(&request);
        self.enqueue_plan(plan)
    }

    /// Start the completion cycle for a transaction that is preparing to commit
    /// or abort: claim its pending slot, then route its markers.
    pub fn add_txn_markers_to_send(
        &self,
        metadata_partition: PartitionId,
        coordinator_epoch: Epoch,
        txn_metadata: &TransactionMetadata,
    ) -> Result<RoutingReport, MarkerChannelError> {
        let transaction_result = txn_metadata.state.marker_result().ok_or(
            MarkerChannelError::InvalidTransactionState {
                producer_id: txn_metadata.producer_id,
                state: txn_metadata.state,
            },
        )?;

        if !self.maybe_add_pending_request(metadata_partition, txn_metadata) {
            return Err(MarkerChannelError::ConcurrentTransactions {
                metadata_partition,
                producer_id: txn_metadata.producer_id,
            });
        }

        let report = self.add_request_to_send(
            coordinator_epoch,
            txn_metadata.producer_id,
            txn_metadata.producer_epoch,
            transaction_result,
            metadata_partition,
            txn_metadata.partitions.clone(),
        )?;

        if !report.is_complete() {
            log::warn!(
                "Producer {} ({}): {} of {} partitions have no live leader, markers not queued for them",
                txn_metadata.producer_id,
                txn_metadata.transactional_id,
                report.unresolved.len(),
                txn_metadata.partitions.len()
            );
        }
        Ok(report)
    }

    fn enqueue_plan(&self, plan: RoutingPlan) -> Result<RoutingReport, MarkerChannelError> {
        let mut report = RoutingReport {
            enqueued: Vec::with_capacity(plan.destinations.len()),
            unresolved: plan.unresolved,
        };

        for (node, batch) in plan.destinations {
            let broker_id = node.id;
            let partitions = batch.partition_count();
            self.brokers.add_or_update_broker(node);
            self.brokers.add_request_for_broker(broker_id, batch)?;
            report.enqueued.push((broker_id, partitions));
        }

        log::trace!(
            "Queued markers for {} brokers, {} partitions unresolved",
            report.enqueued.len(),
            report.unresolved.len()
        );
        Ok(report)
    }

    // ===========================
    // Pending transactions
    // ===========================

    pub fn maybe_add_pending_request(
        &self,
        metadata_partition: PartitionId,
        txn_metadata: &TransactionMetadata,
    ) -> bool {
        let added = self
            .pending
            .maybe_add_pending_request(metadata_partition, txn_metadata);
        if !added {
            log::debug!(
                "Producer {} already has a pending completion under coordinator partition {metadata_partition}",
                txn_metadata.producer_id
            );
        }
        added
    }

    pub fn pending_txn_metadata(
        &self,
        metadata_partition: PartitionId,
        producer_id: ProducerId,
    ) -> Option<TransactionMetadata> {
        self.pending
            .pending_txn_metadata(metadata_partition, producer_id)
    }

    /// Called from the sender's success path once all markers for the producer are written.
    pub fn remove_pending_request(
        &self,
        metadata_partition: PartitionId,
        producer_id: ProducerId,
    ) -> Option<TransactionMetadata> {
        self.pending
            .remove_pending_request(metadata_partition, producer_id)
    }

    // ===========================
    // Emigration
    // ===========================

    pub fn remove_state_for_partition(&self, metadata_partition: PartitionId) -> EmigrationReport {
        emigration::remove_state_for_partition(&self.brokers, &self.pending, metadata_partition)
    }
}
