//! Integration tests for discarding state when a coordinator partition emigrates.

use crate::test_utilities::*;
use test_log::test;
use txnq_cluster::types::*;
use txnq_coordinator::transaction::{MarkerBatch, ProducerId, TransactionState};

fn empty_batch(metadata_partition: u32) -> MarkerBatch {
    MarkerBatch::new(PartitionId::new(metadata_partition), Epoch(1), Vec::new())
}

#[test]
fn test_removes_matching_batches_only() {
    let (channel, _cache) = create_test_channel();
    channel.add_or_update_broker(BrokerNode::new(1, "10.0.0.1", 9092));
    for p in [0, 1, 1] {
        channel.add_request_for_broker(BrokerId(1), empty_batch(p)).unwrap();
    }

    let report = channel.remove_state_for_partition(PartitionId::new(1));

    assert_eq!(report.batches_removed, 2);
    let remaining = channel.broker_registry().queued_batches(BrokerId(1));
    assert_eq!(partition_tags(&remaining), vec![0]);
}

#[test]
fn test_sweeps_every_broker_and_pending_entry() {
    let (channel, _cache) = create_test_channel();
    let p0 = PartitionId::new(0);
    let p1 = PartitionId::new(1);

    for (producer, partition, indexes) in [
        (1, p1, vec![0, 1]),
        (2, p0, vec![0, 2]),
        (3, p1, vec![2, 4]),
        (4, p0, vec![1]),
    ] {
        let txn = prepared_txn(producer, &indexes, TransactionState::PrepareCommit);
        channel.add_txn_markers_to_send(partition, Epoch(1), &txn).unwrap();
    }

    let report = channel.remove_state_for_partition(p1);

    assert_eq!(report.pending_removed, vec![ProducerId(1), ProducerId(3)]);
    assert_eq!(report.batches_removed, 4);
    assert!(channel.pending_txn_metadata(p1, ProducerId(1)).is_none());
    assert!(channel.pending_txn_metadata(p0, ProducerId(2)).is_some());
    assert_eq!(channel.pending_registry().len(), 2);

    let registry = channel.broker_registry();
    assert_eq!(partition_tags(&registry.queued_batches(BrokerId(1))), vec![0]);
    assert_eq!(partition_tags(&registry.queued_batches(BrokerId(2))), vec![0]);
    assert_eq!(partition_tags(&registry.queued_batches(BrokerId(3))), vec![0]);

    let survivors: Vec<ProducerId> = registry
        .queued_batches(BrokerId(1))
        .iter()
        .chain(registry.queued_batches(BrokerId(2)).iter())
        .map(|b| b.entries[0].producer_id)
        .collect();
    assert_eq!(survivors, vec![ProducerId(2), ProducerId(4)]);
}

#[test]
fn test_untracked_partition_is_noop() {
    let (channel, _cache) = create_test_channel();
    channel.add_or_update_broker(BrokerNode::new(1, "10.0.0.1", 9092));
    channel.add_request_for_broker(BrokerId(1), empty_batch(0)).unwrap();

    let report = channel.remove_state_for_partition(PartitionId::new(9));

    assert!(report.is_noop());
    assert_eq!(channel.broker_registry().queue_len(BrokerId(1)), 1);
}

#[test]
fn test_producer_can_be_claimed_again_after_emigration() {
    let (channel, _cache) = create_test_channel();
    let p0 = PartitionId::new(0);
    let txn = prepared_txn(8, &[0], TransactionState::PrepareCommit);

    channel.add_txn_markers_to_send(p0, Epoch(1), &txn).unwrap();
    channel.remove_state_for_partition(p0);

    let report = channel.add_txn_markers_to_send(p0, Epoch(2), &txn).unwrap();
    assert!(report.is_complete());
    let queued = channel.broker_registry().queued_batches(BrokerId(1));
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].coordinator_epoch, Epoch(2));
}
