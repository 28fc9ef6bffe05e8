use crate::MarkerChannelError;
use crate::transaction::MarkerBatch;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use txnq_cluster::types::{BrokerId, BrokerNode, PartitionId};

/// Destination address and FIFO marker queue for one broker.
#[derive(Debug)]
pub struct BrokerState {
    destination: BrokerNode,
    markers_queue: VecDeque<MarkerBatch>,
}

impl BrokerState {
    fn new(destination: BrokerNode) -> Self {
        Self {
            destination,
            markers_queue: VecDeque::new(),
        }
    }

    pub fn destination(&self) -> &BrokerNode {
        &self.destination
    }

    /// Queued batches, oldest first.
    pub fn markers_queue(&self) -> impl Iterator<Item = &MarkerBatch> {
        self.markers_queue.iter()
    }

    pub fn len(&self) -> usize {
        self.markers_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers_queue.is_empty()
    }

    /// Take every queued batch, oldest first, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<MarkerBatch> {
        self.markers_queue.drain(..).collect()
    }

    fn retain_other_partitions(&mut self, metadata_partition: PartitionId) -> usize {
        let before = self.markers_queue.len();
        self.markers_queue
            .retain(|batch| batch.metadata_partition != metadata_partition);
        before - self.markers_queue.len()
    }
}

/// Shared handle to one broker's state. Holding the lock pins the queue.
pub type BrokerStateHandle = Arc<Mutex<BrokerState>>;

/// Per-broker marker queues.
///
/// Queue locks are only taken on handles cloned out of the map, never while a
/// map guard is held, and a queue lock is never held while touching the map.
#[derive(Debug, Default)]
pub struct BrokerRegistry {
    brokers: DashMap<BrokerId, BrokerStateHandle>,
}

impl BrokerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node`, or refresh the destination of an already known broker.
    /// The queue of a known broker is left untouched.
    pub fn add_or_update_broker(&self, node: BrokerNode) {
        let mut registered = false;
        let handle = {
            let entry = self.brokers.entry(node.id).or_insert_with(|| {
                registered = true;
                Arc::new(Mutex::new(BrokerState::new(node.clone())))
            });
            Arc::clone(entry.value())
        };

        if registered {
            log::debug!("Registering marker queue for {node}");
            return;
        }

        // Shard guard is released; only this broker's queue is locked here.
        let mut state = handle.lock();
        if !state.destination.same_endpoint(&node) {
            log::info!(
                "Updating destination of {} from {}:{} to {}:{}",
                node.id,
                state.destination.host,
                state.destination.port,
                node.host,
                node.port
            );
        }
        state.destination = node;
    }

    /// Append `batch` to the tail of the broker's queue.
    pub fn add_request_for_broker(
        &self,
        broker_id: BrokerId,
        batch: MarkerBatch,
    ) -> Result<(), MarkerChannelError> {
        let Some(handle) = self.get(broker_id) else {
            log::error!(
                "Dropping marker batch for coordinator partition {}: {broker_id} was never registered",
                batch.metadata_partition
            );
            return Err(MarkerChannelError::UnregisteredBroker { broker_id });
        };

        handle.lock().markers_queue.push_back(batch);
        Ok(())
    }

    pub fn get(&self, broker_id: BrokerId) -> Option<BrokerStateHandle> {
        self.brokers
            .get(&broker_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, broker_id: BrokerId) -> bool {
        self.brokers.contains_key(&broker_id)
    }

    pub fn destination(&self, broker_id: BrokerId) -> Option<BrokerNode> {
        self.get(broker_id)
            .map(|handle| handle.lock().destination.clone())
    }

    /// Copy of the broker's queue, oldest first. Empty for unknown brokers.
    pub fn queued_batches(&self, broker_id: BrokerId) -> Vec<MarkerBatch> {
        self.get(broker_id)
            .map(|handle| handle.lock().markers_queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn queue_len(&self, broker_id: BrokerId) -> usize {
        self.get(broker_id)
            .map(|handle| handle.lock().len())
            .unwrap_or(0)
    }

    /// Remove and return the broker's whole queue in FIFO order.
    pub fn drain_queue(&self, broker_id: BrokerId) -> Vec<MarkerBatch> {
        self.get(broker_id)
            .map(|handle| handle.lock().drain())
            .unwrap_or_default()
    }

    /// Known broker ids in ascending order.
    pub fn broker_ids(&self) -> Vec<BrokerId> {
        let mut ids: Vec<BrokerId> = self.brokers.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }

    pub fn total_queued(&self) -> usize {
        self.handles().iter().map(|handle| handle.lock().len()).sum()
    }

    /// Drop every queued batch tagged with `metadata_partition`, keeping the
    /// relative order of everything else. Returns the number removed.
    pub(crate) fn remove_batches_for_partition(&self, metadata_partition: PartitionId) -> usize {
        self.handles()
            .iter()
            .map(|handle| handle.lock().retain_other_partitions(metadata_partition))
            .sum()
    }

    fn handles(&self) -> Vec<BrokerStateHandle> {
        self.brokers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}
