//! Cluster manifest data structures.

use crate::{ClusterError, types::*};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenerSpec {
    pub name: ListenerName,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerSpec {
    pub id: BrokerId,
    pub listeners: Vec<ListenerSpec>,
}

impl BrokerSpec {
    /// Broker reachable on a single `PLAINTEXT` listener.
    pub fn plaintext(id: impl Into<BrokerId>, host: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            listeners: vec![ListenerSpec {
                name: ListenerName::default(),
                host: host.into(),
                port,
            }],
        }
    }

    /// Resolve this broker's node under `listener`, if it exposes one.
    pub fn endpoint(&self, listener: &ListenerName) -> Option<BrokerNode> {
        self.listeners
            .iter()
            .find(|spec| &spec.name == listener)
            .map(|spec| BrokerNode::new(self.id, spec.host.clone(), spec.port))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionAssignment {
    pub id: PartitionId,
    /// `None` while the partition is offline or an election is in progress.
    #[serde(default)]
    pub leader: Option<BrokerId>,
    pub replicas: Vec<BrokerId>,
    #[serde(default = "initial_epoch")]
    pub epoch: Epoch,
}

fn initial_epoch() -> Epoch {
    Epoch(0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicAssignment {
    pub partitions: Vec<PartitionAssignment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterManifest {
    pub brokers: Vec<BrokerSpec>,
    #[serde(default)]
    pub topics: HashMap<String, TopicAssignment>,
}

impl ClusterManifest {
    /// Check referential integrity: unique broker ids, replicas that name known
    /// brokers, and leaders drawn from their replica set.
    pub fn validate(&self) -> Result<(), ClusterError> {
        let mut known = HashSet::new();
        for broker in &self.brokers {
            if !known.insert(broker.id) {
                return Err(ClusterError::InvalidManifest {
                    context: "brokers".to_string(),
                    reason: format!("duplicate broker id {}", broker.id.0),
                });
            }
        }

        for (topic, assignment) in &self.topics {
            for partition in &assignment.partitions {
                if let Some(unknown) = partition.replicas.iter().find(|r| !known.contains(*r)) {
                    return Err(ClusterError::InvalidManifest {
                        context: format!("topic '{topic}' partition {}", partition.id),
                        reason: format!("replica {} is not a known broker", unknown.0),
                    });
                }
                match partition.leader {
                    Some(leader) if !partition.replicas.contains(&leader) => {
                        return Err(ClusterError::InvalidReplica {
                            topic: topic.clone(),
                            partition_id: partition.id.into(),
                            replica_id: leader.into(),
                        });
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }
}
