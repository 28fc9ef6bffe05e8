//! Core identifier and addressing types shared by the cluster view and the
//! transaction marker channel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a broker in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BrokerId(pub u32);

/// Index of a partition within a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartitionId(pub u32);

/// Fencing epoch, used both for partition leadership and coordinator leadership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epoch(pub u64);

impl PartitionId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for BrokerId {
    fn from(id: u32) -> Self {
        BrokerId(id)
    }
}

impl From<BrokerId> for u32 {
    fn from(broker_id: BrokerId) -> Self {
        broker_id.0
    }
}

impl From<u32> for PartitionId {
    fn from(id: u32) -> Self {
        PartitionId(id)
    }
}

impl From<PartitionId> for u32 {
    fn from(partition_id: PartitionId) -> Self {
        partition_id.0
    }
}

impl From<u64> for Epoch {
    fn from(epoch: u64) -> Self {
        Epoch(epoch)
    }
}

impl From<Epoch> for u64 {
    fn from(epoch: Epoch) -> Self {
        epoch.0
    }
}

impl fmt::Display for BrokerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "broker-{}", self.0)
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch-{}", self.0)
    }
}

/// A (topic, partition index) pair.
///
/// Ordered by topic name first so that sets of partitions iterate in a
/// stable, human-readable order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: PartitionId,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: impl Into<PartitionId>) -> Self {
        Self {
            topic: topic.into(),
            partition: partition.into(),
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.topic, self.partition)
    }
}

/// Network address of a broker as seen through one listener.
///
/// Two nodes are the same broker when their ids match, regardless of address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerNode {
    pub id: BrokerId,
    pub host: String,
    pub port: u16,
}

impl BrokerNode {
    pub fn new(id: impl Into<BrokerId>, host: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            host: host.into(),
            port,
        }
    }

    /// `host:port` form suitable for dialing.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True when both id and address match, unlike `==` which compares ids only.
    pub fn same_endpoint(&self, other: &BrokerNode) -> bool {
        self.id == other.id && self.host == other.host && self.port == other.port
    }
}

impl PartialEq for BrokerNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BrokerNode {}

impl std::hash::Hash for BrokerNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for BrokerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.id, self.host, self.port)
    }
}

/// Name of a broker listener (e.g. `PLAINTEXT`, `INTERNAL`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenerName(pub String);

impl ListenerName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ListenerName {
    fn default() -> Self {
        Self(crate::DEFAULT_LISTENER.to_string())
    }
}

impl fmt::Display for ListenerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
