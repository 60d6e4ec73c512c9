//! Command façade for the AdhocLink orchestration layer.
//!
//! Composes one discovery session per radio, the peer-to-peer connection
//! controller and the advertiser, routes the inbound command surface to
//! the owning session, and merges their event streams into one outbound
//! stream.

pub mod connect;
pub mod orchestrator;
pub mod types;

pub use connect::ConnectionController;
pub use orchestrator::Orchestrator;
pub use types::{ConnectionAttempt, ConnectionEvent, OrchestratorConfig, OrchestratorEvent};
