//! In-memory metadata cache implementation.

use crate::{
    ClusterError,
    manifest::types::{BrokerSpec, ClusterManifest, PartitionAssignment, TopicAssignment},
    metadata_cache::r#trait::MetadataCache,
    types::*,
};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// In-memory implementation of the MetadataCache trait.
///
/// Holds the broker and partition view loaded from a manifest and lets callers
/// apply leadership, liveness and address changes as the cluster evolves.
/// Cloning shares the underlying state.
#[derive(Debug, Clone)]
pub struct InMemoryMetadataCache {
    /// Internal cluster view protected by RwLock for concurrent access
    state: Arc<RwLock<ClusterState>>,
}

#[derive(Debug, Clone, Default)]
struct ClusterState {
    /// Broker registrations indexed by broker ID
    brokers: HashMap<BrokerId, BrokerSpec>,
    /// Topic assignments indexed by topic name
    topics: HashMap<String, TopicAssignment>,
    /// Brokers currently considered reachable
    alive: HashSet<BrokerId>,
}

impl ClusterState {
    fn get_partition_mut(
        &mut self,
        topic: &str,
        partition_id: PartitionId,
    ) -> Result<&mut PartitionAssignment, ClusterError> {
        let topic_assignment = self
            .topics
            .get_mut(topic)
            .ok_or(ClusterError::TopicNotFound {
                topic: topic.to_string(),
            })?;

        topic_assignment
            .partitions
            .iter_mut()
            .find(|p| p.id == partition_id)
            .ok_or(ClusterError::PartitionNotFound {
                topic: topic.to_string(),
                partition_id: partition_id.into(),
            })
    }

    fn get_partition(
        &self,
        topic: &str,
        partition_id: PartitionId,
    ) -> Result<&PartitionAssignment, ClusterError> {
        let topic_assignment = self.topics.get(topic).ok_or(ClusterError::TopicNotFound {
            topic: topic.to_string(),
        })?;

        topic_assignment
            .partitions
            .iter()
            .find(|p| p.id == partition_id)
            .ok_or(ClusterError::PartitionNotFound {
                topic: topic.to_string(),
                partition_id: partition_id.into(),
            })
    }
}

impl InMemoryMetadataCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ClusterState::default())),
        }
    }

    /// Create a cache initialized with the given manifest.
    pub fn new_with_manifest(manifest: ClusterManifest) -> Result<Self, ClusterError> {
        let cache = Self::new();
        cache.load_from_manifest(manifest)?;
        Ok(cache)
    }

    /// Replace the whole cluster view. Every broker in the manifest starts alive.
    pub fn load_from_manifest(&self, manifest: ClusterManifest) -> Result<(), ClusterError> {
        manifest.validate()?;

        let mut state = self.state.write();
        state.brokers.clear();
        state.topics.clear();
        state.alive.clear();

        for broker in manifest.brokers {
            state.alive.insert(broker.id);
            state.brokers.insert(broker.id, broker);
        }
        state.topics.extend(manifest.topics);

        log::info!(
            "Loaded cluster view with {} brokers and {} topics",
            state.brokers.len(),
            state.topics.len()
        );
        Ok(())
    }

    /// Export the current view (liveness is runtime-only and not exported).
    pub fn export_to_manifest(&self) -> ClusterManifest {
        let state = self.state.read();
        let mut brokers: Vec<BrokerSpec> = state.brokers.values().cloned().collect();
        brokers.sort_by_key(|b| b.id);

        ClusterManifest {
            brokers,
            topics: state.topics.clone(),
        }
    }

    /// Register a broker or replace its listeners. New brokers start alive.
    pub fn upsert_broker(&self, spec: BrokerSpec) {
        let mut state = self.state.write();
        let broker_id = spec.id;
        if state.brokers.insert(broker_id, spec).is_none() {
            state.alive.insert(broker_id);
            log::debug!("Registered {broker_id}");
        } else {
            log::debug!("Updated listeners for {broker_id}");
        }
    }

    /// Mark a broker reachable or unreachable.
    pub fn set_broker_alive(&self, broker: BrokerId, alive: bool) -> Result<(), ClusterError> {
        let mut state = self.state.write();
        if !state.brokers.contains_key(&broker) {
            return Err(ClusterError::BrokerNotFound {
                broker_id: broker.into(),
            });
        }

        if alive {
            state.alive.insert(broker);
        } else {
            state.alive.remove(&broker);
        }
        Ok(())
    }

    pub fn is_broker_alive(&self, broker: BrokerId) -> bool {
        self.state.read().alive.contains(&broker)
    }

    /// Move leadership of a partition. `None` takes the partition offline.
    ///
    /// A new leader must be one of the partition's replicas and the epoch may
    /// not go backwards.
    pub fn set_partition_leader(
        &self,
        topic: &str,
        partition: PartitionId,
        leader: Option<BrokerId>,
        epoch: Epoch,
    ) -> Result<(), ClusterError> {
        let mut state = self.state.write();
        let assignment = state.get_partition_mut(topic, partition)?;

        if let Some(leader) = leader
            && !assignment.replicas.contains(&leader)
        {
            return Err(ClusterError::InvalidReplica {
                topic: topic.to_string(),
                partition_id: partition.into(),
                replica_id: leader.into(),
            });
        }

        if epoch < assignment.epoch {
            return Err(ClusterError::InvalidEpoch {
                topic: topic.to_string(),
                partition_id: partition.into(),
                current_epoch: assignment.epoch.into(),
                new_epoch: epoch.into(),
            });
        }

        assignment.leader = leader;
        assignment.epoch = epoch;
        Ok(())
    }

    pub fn get_partition_epoch(
        &self,
        topic: &str,
        partition: PartitionId,
    ) -> Result<Epoch, ClusterError> {
        let state = self.state.read();
        Ok(state.get_partition(topic, partition)?.epoch)
    }
}

impl Default for InMemoryMetadataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataCache for InMemoryMetadataCache {
    fn get_partition_leader(
        &self,
        topic: &str,
        partition: PartitionId,
    ) -> Result<Option<BrokerId>, ClusterError> {
        let state = self.state.read();
        Ok(state.get_partition(topic, partition)?.leader)
    }

    fn get_alive_endpoint(&self, broker: BrokerId, listener: &ListenerName) -> Option<BrokerNode> {
        let state = self.state.read();
        if !state.alive.contains(&broker) {
            return None;
        }
        state.brokers.get(&broker)?.endpoint(listener)
    }
}
