//! The transaction marker channel and its building blocks.

pub mod broker_registry;
pub mod emigration;
pub mod manager;
pub mod pending;
pub mod resolver;
pub mod router;

// Re-exports for ergonomics
pub use broker_registry::{BrokerRegistry, BrokerState, BrokerStateHandle};
pub use emigration::EmigrationReport;
pub use manager::{RoutingReport, TransactionMarkerChannel};
pub use pending::PendingTransactionRegistry;
pub use resolver::DestinationResolver;
pub use router::{MarkerRequest, MarkerRouter, RoutingPlan, plan_markers};
