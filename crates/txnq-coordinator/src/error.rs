use crate::transaction::{ProducerId, TransactionState};
use std::fmt;
use txnq_cluster::ClusterError;
use txnq_cluster::types::{BrokerId, PartitionId};

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerChannelError {
    /// A batch was queued for a broker that was never registered. Registration
    /// always precedes queuing, so this indicates a caller bug.
    UnregisteredBroker {
        broker_id: BrokerId,
    },
    /// Markers can only be derived from a transaction that is preparing to
    /// commit or abort.
    InvalidTransactionState {
        producer_id: ProducerId,
        state: TransactionState,
    },
    /// Another completion cycle for this producer is already in flight.
    ConcurrentTransactions {
        metadata_partition: PartitionId,
        producer_id: ProducerId,
    },
    Config {
        context: String,
        reason: String,
    },
    Cluster(ClusterError),
}

impl fmt::Display for MarkerChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerChannelError::UnregisteredBroker { broker_id } => {
                write!(f, "Cannot queue markers for unregistered {broker_id}")
            }
            MarkerChannelError::InvalidTransactionState { producer_id, state } => {
                write!(
                    f,
                    "Cannot send markers for producer {producer_id} in state {state:?}"
                )
            }
            MarkerChannelError::ConcurrentTransactions {
                metadata_partition,
                producer_id,
            } => {
                write!(
                    f,
                    "Producer {producer_id} already has markers pending under coordinator partition {metadata_partition}"
                )
            }
            MarkerChannelError::Config { context, reason } => {
                write!(f, "Invalid configuration in {context}: {reason}")
            }
            MarkerChannelError::Cluster(err) => write!(f, "Cluster error: {err}"),
        }
    }
}

impl std::error::Error for MarkerChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MarkerChannelError::Cluster(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ClusterError> for MarkerChannelError {
    fn from(err: ClusterError) -> Self {
        MarkerChannelError::Cluster(err)
    }
}

impl MarkerChannelError {
    /// Errors that can only come from misuse of the channel, never from cluster conditions.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, MarkerChannelError::UnregisteredBroker { .. })
    }

    /// Errors the coordinator should translate into a retriable client response.
    pub fn is_retriable(&self) -> bool {
        matches!(self, MarkerChannelError::ConcurrentTransactions { .. })
    }

    pub fn from_io_error(e: std::io::Error, context: &str) -> Self {
        MarkerChannelError::Config {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }

    pub fn from_parse_error(e: impl std::fmt::Display, context: &str) -> Self {
        MarkerChannelError::Config {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }
}
