//! Integration tests for the pending transaction guard exposed by the channel.

use crate::test_utilities::*;
use test_log::test;
use txnq_cluster::types::PartitionId;
use txnq_coordinator::transaction::{ProducerEpoch, ProducerId, TransactionState};

#[test]
fn test_claim_is_granted_once_per_key() {
    let (channel, _cache) = create_test_channel();
    let p0 = PartitionId::new(0);
    let first = prepared_txn(5, &[0], TransactionState::PrepareCommit);
    let mut second = prepared_txn(5, &[1, 2], TransactionState::PrepareAbort);
    second.producer_epoch = ProducerEpoch(3);

    assert!(channel.maybe_add_pending_request(p0, &first));
    assert!(!channel.maybe_add_pending_request(p0, &second));
    assert!(!channel.maybe_add_pending_request(p0, &first));

    assert_eq!(channel.pending_txn_metadata(p0, ProducerId(5)), Some(first));
}

#[test]
fn test_lookup_of_unknown_key_is_absent() {
    let (channel, _cache) = create_test_channel();
    channel.maybe_add_pending_request(
        PartitionId::new(0),
        &prepared_txn(5, &[0], TransactionState::PrepareCommit),
    );

    assert!(channel.pending_txn_metadata(PartitionId::new(1), ProducerId(5)).is_none());
    assert!(channel.pending_txn_metadata(PartitionId::new(0), ProducerId(6)).is_none());
}

#[test]
fn test_completion_releases_claim() {
    let (channel, _cache) = create_test_channel();
    let p2 = PartitionId::new(2);
    let txn = prepared_txn(5, &[0], TransactionState::PrepareCommit);

    assert!(channel.maybe_add_pending_request(p2, &txn));
    assert_eq!(channel.remove_pending_request(p2, ProducerId(5)), Some(txn.clone()));
    assert!(channel.pending_txn_metadata(p2, ProducerId(5)).is_none());
    assert!(channel.maybe_add_pending_request(p2, &txn));
}
