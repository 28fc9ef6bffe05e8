//! Integration tests for routing marker requests to destination brokers.

use crate::test_utilities::*;
use test_log::test;
use txnq_cluster::{ClusterError, manifest::BrokerSpec, types::*};
use txnq_coordinator::{
    ChannelConfig, MarkerChannelError, TransactionMarkerChannel,
    transaction::{ProducerEpoch, ProducerId, TransactionResult, TransactionState},
};

fn commit(
    channel: &TransactionMarkerChannel,
    producer_id: i64,
    metadata_partition: u32,
    indexes: &[u32],
) -> txnq_coordinator::RoutingReport {
    channel
        .add_request_to_send(
            Epoch(1),
            ProducerId(producer_id),
            ProducerEpoch(0),
            TransactionResult::Commit,
            PartitionId::new(metadata_partition),
            partitions(indexes),
        )
        .unwrap()
}

#[test]
fn test_partitions_on_distinct_leaders_get_one_batch_each() {
    let (channel, _cache) = create_test_channel();
    channel.add_or_update_broker(BrokerNode::new(1, "10.0.0.1", 9092));
    channel.add_or_update_broker(BrokerNode::new(2, "10.0.0.2", 9092));

    let report = commit(&channel, 7, 0, &[0, 1]);

    assert!(report.is_complete());
    assert_eq!(report.brokers(), vec![BrokerId(1), BrokerId(2)]);
    assert_eq!(channel.broker_registry().queue_len(BrokerId(1)), 1);
    assert_eq!(channel.broker_registry().queue_len(BrokerId(2)), 1);

    let batch = &channel.broker_registry().queued_batches(BrokerId(2))[0];
    assert_eq!(batch.entries.len(), 1);
    assert_eq!(batch.entries[0].topic_partitions, partitions(&[1]));
    assert_eq!(batch.entries[0].producer_id, ProducerId(7));
}

#[test]
fn test_leaderless_partition_queues_nothing() {
    let (channel, _cache) = create_test_channel();
    channel.add_or_update_broker(BrokerNode::new(1, "10.0.0.1", 9092));

    let report = commit(&channel, 7, 0, &[3]);

    assert!(!report.is_complete());
    assert_eq!(report.unresolved, vec![tp(3)]);
    assert!(report.enqueued.is_empty());
    assert_eq!(channel.broker_registry().total_queued(), 0);
}

#[test]
fn test_partial_resolution_queues_resolved_partitions() {
    let (channel, _cache) = create_test_channel();

    let report = commit(&channel, 7, 0, &[0, 3, 4]);

    assert_eq!(report.unresolved, vec![tp(3)]);
    assert_eq!(report.enqueued, vec![(BrokerId(1), 2)]);

    let queued = channel.broker_registry().queued_batches(BrokerId(1));
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].entries[0].topic_partitions, partitions(&[0, 4]));
}

#[test]
fn test_routing_registers_unknown_brokers() {
    let (channel, _cache) = create_test_channel();
    assert!(channel.broker_state(BrokerId(3)).is_none());

    commit(&channel, 7, 0, &[2]);

    let state = channel.broker_state(BrokerId(3)).unwrap();
    let state = state.lock();
    assert_eq!(state.destination().address(), "10.0.0.3:9092");
    assert_eq!(state.len(), 1);
}

#[test]
fn test_separate_calls_are_not_coalesced() {
    let (channel, _cache) = create_test_channel();

    commit(&channel, 1, 0, &[0]);
    commit(&channel, 2, 5, &[0, 4]);
    commit(&channel, 3, 2, &[4]);

    let queued = channel.broker_registry().queued_batches(BrokerId(1));
    assert_eq!(partition_tags(&queued), vec![0, 5, 2]);
    let producers: Vec<ProducerId> = queued.iter().map(|b| b.entries[0].producer_id).collect();
    assert_eq!(producers, vec![ProducerId(1), ProducerId(2), ProducerId(3)]);
}

#[test]
fn test_address_change_refreshes_destination_and_keeps_queue() {
    let (channel, cache) = create_test_channel();
    commit(&channel, 1, 0, &[0]);

    cache.upsert_broker(BrokerSpec::plaintext(1, "10.9.9.1", 19092));
    commit(&channel, 2, 0, &[0]);

    let registry = channel.broker_registry();
    assert_eq!(
        registry.destination(BrokerId(1)).unwrap().address(),
        "10.9.9.1:19092"
    );
    assert_eq!(registry.queue_len(BrokerId(1)), 2);
}

#[test]
fn test_dead_leader_and_leader_migration() {
    let (channel, cache) = create_test_channel();

    cache.set_broker_alive(BrokerId(1), false).unwrap();
    let report = commit(&channel, 1, 0, &[0]);
    assert_eq!(report.unresolved, vec![tp(0)]);

    cache
        .set_partition_leader(TOPIC, PartitionId::new(0), Some(BrokerId(2)), Epoch(2))
        .unwrap();
    let report = commit(&channel, 1, 0, &[0]);
    assert_eq!(report.enqueued, vec![(BrokerId(2), 1)]);
    assert_eq!(channel.broker_registry().queue_len(BrokerId(1)), 0);
}

#[test]
fn test_listener_without_endpoints_resolves_nothing() {
    let channel = TransactionMarkerChannel::from_manifest(
        ChannelConfig::with_listener("INTERNAL"),
        create_test_manifest(),
    )
    .unwrap();

    let report = commit(&channel, 1, 0, &[0, 1, 2]);
    assert_eq!(report.unresolved.len(), 3);
    assert!(channel.broker_registry().broker_ids().is_empty());
}

#[test]
fn test_from_manifest_rejects_invalid_cluster() {
    let mut manifest = create_test_manifest();
    if let Some(topic) = manifest.topics.get_mut(TOPIC) {
        topic.partitions[0].replicas = vec![BrokerId(7)];
    }

    let result = TransactionMarkerChannel::from_manifest(ChannelConfig::default(), manifest);
    let Err(err) = result else {
        panic!("manifest with an unknown replica must be rejected");
    };
    assert!(matches!(
        err,
        MarkerChannelError::Cluster(ClusterError::InvalidManifest { .. })
    ));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_from_manifest_rejects_empty_listener() {
    let result = TransactionMarkerChannel::from_manifest(
        ChannelConfig::with_listener(""),
        create_test_manifest(),
    );
    assert!(matches!(result, Err(MarkerChannelError::Config { .. })));
}

#[test]
fn test_txn_markers_follow_prepare_state() {
    let (channel, _cache) = create_test_channel();
    let txn = prepared_txn(11, &[0, 1], TransactionState::PrepareAbort);

    let report = channel
        .add_txn_markers_to_send(PartitionId::new(3), Epoch(4), &txn)
        .unwrap();
    assert_eq!(report.brokers(), vec![BrokerId(1), BrokerId(2)]);

    let batch = &channel.broker_registry().queued_batches(BrokerId(1))[0];
    assert_eq!(batch.coordinator_epoch, Epoch(4));
    assert_eq!(batch.metadata_partition, PartitionId::new(3));
    assert_eq!(batch.entries[0].transaction_result, TransactionResult::Abort);

    assert_eq!(
        channel.pending_txn_metadata(PartitionId::new(3), ProducerId(11)),
        Some(txn)
    );
}

#[test]
fn test_txn_markers_rejected_outside_prepare_states() {
    let (channel, _cache) = create_test_channel();
    let txn = prepared_txn(11, &[0], TransactionState::Ongoing);

    let result = channel.add_txn_markers_to_send(PartitionId::new(0), Epoch(1), &txn);
    assert_eq!(
        result,
        Err(MarkerChannelError::InvalidTransactionState {
            producer_id: ProducerId(11),
            state: TransactionState::Ongoing,
        })
    );
    assert!(channel.pending_registry().is_empty());
    assert_eq!(channel.broker_registry().total_queued(), 0);
}

#[test]
fn test_txn_markers_rejected_while_pending() {
    let (channel, _cache) = create_test_channel();
    let txn = prepared_txn(11, &[0], TransactionState::PrepareCommit);

    channel
        .add_txn_markers_to_send(PartitionId::new(0), Epoch(1), &txn)
        .unwrap();
    let err = channel
        .add_txn_markers_to_send(PartitionId::new(0), Epoch(1), &txn)
        .unwrap_err();

    assert!(err.is_retriable());
    assert_eq!(channel.broker_registry().queue_len(BrokerId(1)), 1);
}
