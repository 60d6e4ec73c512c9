//! Public types for the orchestrator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use adhoclink_discovery::{AdvertiseEvent, DiscoveryEvent, SessionConfig};
use adhoclink_radio::{RadioError, Transport};

/// A single in-flight connection attempt.
///
/// Created when a connect command is accepted, resolved exactly once by
/// the platform callback, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionAttempt {
    pub id: Uuid,
    /// Target hardware address, lowercased.
    pub target_address: String,
    /// Role negotiation hint passed to the radio.
    pub group_owner_intent: i32,
}

/// Resolution of a connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ConnectionEvent {
    Succeeded {
        address: String,
    },
    Failed {
        address: String,
        error: RadioError,
    },
}

/// Merged outbound event stream of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "data")]
pub enum OrchestratorEvent {
    Discovery {
        transport: Transport,
        event: DiscoveryEvent,
    },
    Advertise(AdvertiseEvent),
    Connection(ConnectionEvent),
}

/// Configuration for the orchestrator and its sessions.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub session: SessionConfig,
    /// Role negotiation hint for outgoing connections. `-1` lets the
    /// platform decide.
    pub group_owner_intent: i32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            group_owner_intent: -1,
        }
    }
}
