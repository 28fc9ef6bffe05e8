//! Grouping of a transaction's partitions into one marker batch per destination broker.
//!
//! Planning is pure: it only consults a resolve function and produces a
//! [`RoutingPlan`]. Enqueuing the plan into the broker registry is a separate step
//! performed by the channel.

use super::resolver::DestinationResolver;
use crate::transaction::{MarkerBatch, ProducerEpoch, ProducerId, TransactionResult, TxnMarkerEntry};
use std::collections::{BTreeMap, BTreeSet};
use txnq_cluster::types::{BrokerId, BrokerNode, Epoch, PartitionId, TopicPartition};

/// Everything needed to write one producer's markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRequest {
    pub coordinator_epoch: Epoch,
    pub producer_id: ProducerId,
    pub producer_epoch: ProducerEpoch,
    pub transaction_result: TransactionResult,
    pub metadata_partition: PartitionId,
    pub topic_partitions: BTreeSet<TopicPartition>,
}

/// One batch per destination broker plus the partitions that could not be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingPlan {
    /// Ordered by broker id.
    pub destinations: Vec<(BrokerNode, MarkerBatch)>,
    pub unresolved: Vec<TopicPartition>,
}

/// Group `request`'s partitions by the broker `resolve` maps them to.
///
/// Every destination gets exactly one batch holding a single entry that covers
/// all of its partitions. Partitions for which `resolve` returns `None` are
/// listed in [`RoutingPlan::unresolved`] and appear in no batch.
pub fn plan_markers<F>(request: &MarkerRequest, mut resolve: F) -> RoutingPlan
where
    F: FnMut(&TopicPartition) -> Option<BrokerNode>,
{
    let mut grouped: BTreeMap<BrokerId, (BrokerNode, BTreeSet<TopicPartition>)> = BTreeMap::new();
    let mut unresolved = Vec::new();

    for topic_partition in &request.topic_partitions {
        match resolve(topic_partition) {
            Some(node) => {
                let (destination, partitions) = grouped
                    .entry(node.id)
                    .or_insert_with(|| (node.clone(), BTreeSet::new()));
                // Keep the most recently resolved address for the broker.
                *destination = node;
                partitions.insert(topic_partition.clone());
            }
            None => unresolved.push(topic_partition.clone()),
        }
    }

    let destinations = grouped
        .into_values()
        .map(|(node, topic_partitions)| {
            let entry = TxnMarkerEntry {
                producer_id: request.producer_id,
                producer_epoch: request.producer_epoch,
                transaction_result: request.transaction_result,
                topic_partitions,
            };
            let batch = MarkerBatch::new(
                request.metadata_partition,
                request.coordinator_epoch,
                vec![entry],
            );
            (node, batch)
        })
        .collect();

    RoutingPlan {
        destinations,
        unresolved,
    }
}

/// Plans marker requests against live cluster metadata.
#[derive(Debug, Clone)]
pub struct MarkerRouter {
    resolver: DestinationResolver,
}

impl MarkerRouter {
    pub fn new(resolver: DestinationResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &DestinationResolver {
        &self.resolver
    }

    #[tracing::instrument(
        level = "debug",
        skip(self, request),
        fields(
            producer_id = %request.producer_id,
            metadata_partition = %request.metadata_partition,
            partitions = request.topic_partitions.len()
        )
    )]
    pub fn plan(&self, request: &MarkerRequest) -> RoutingPlan {
        plan_markers(request, |tp| self.resolver.resolve(tp))
    }
}
