use std::sync::Arc;
use txnq_cluster::MetadataCache;
use txnq_cluster::types::{BrokerNode, ListenerName, TopicPartition};

/// Maps topic-partitions to the live broker that currently leads them.
#[derive(Clone)]
pub struct DestinationResolver {
    metadata: Arc<dyn MetadataCache>,
    listener: ListenerName,
}

impl DestinationResolver {
    pub fn new(metadata: Arc<dyn MetadataCache>, listener: ListenerName) -> Self {
        Self { metadata, listener }
    }

    pub fn listener(&self) -> &ListenerName {
        &self.listener
    }

    /// Leader endpoint for `topic_partition`, or `None` when the partition is
    /// unknown, leaderless, or led by a broker that is not reachable on the
    /// configured listener.
    #[tracing::instrument(
        level = "trace",
        skip(self, topic_partition),
        fields(tp = %topic_partition)
    )]
    pub fn resolve(&self, topic_partition: &TopicPartition) -> Option<BrokerNode> {
        let leader = match self
            .metadata
            .get_partition_leader(&topic_partition.topic, topic_partition.partition)
        {
            Ok(Some(leader)) => leader,
            Ok(None) => {
                log::debug!("No leader for {topic_partition}");
                return None;
            }
            Err(e) => {
                log::debug!("Cannot resolve {topic_partition}: {e}");
                return None;
            }
        };

        let node = self.metadata.get_alive_endpoint(leader, &self.listener);
        if node.is_none() {
            log::debug!(
                "Leader {leader} of {topic_partition} has no live endpoint on listener {}",
                self.listener
            );
        }
        node
    }
}

impl std::fmt::Debug for DestinationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationResolver")
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}
