//! Public types for the discovery and advertising sessions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use adhoclink_radio::{PeerRecord, RadioError};

/// Lifecycle state of a discovery session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No scan in flight.
    Idle,
    /// A scan was requested and has not finished.
    Discovering,
    /// A manual stop was issued; waiting for the radio's finished event
    /// or the stop timeout.
    Stopping,
}

/// Events emitted on a discovery session's subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event", content = "data")]
pub enum DiscoveryEvent {
    /// A scan cycle began. Prior peers are forgotten.
    DiscoveryStarted,
    /// A peer was seen for the first time this cycle.
    PeerFound(PeerRecord),
    /// A scan cycle ended, with every peer found during it in discovery
    /// order. Terminal for the cycle, not for the subscription.
    DiscoveryFinished(Vec<PeerRecord>),
}

/// Lifecycle state of an advertising session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertiseState {
    Idle,
    Advertising,
}

/// Outcomes surfaced by an advertising session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event", content = "data")]
pub enum AdvertiseEvent {
    /// The platform accepted the broadcast request.
    Started,
    /// The platform rejected the broadcast request.
    Failed(RadioError),
    /// Broadcasting was stopped.
    Stopped,
}

/// Tuning knobs for a discovery session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long to wait for the radio's finished event after a manual
    /// stop before finalizing anyway. Some radios never deliver one for
    /// a manual stop.
    pub stop_timeout: Duration,
    /// Capacity of the raw listener channel between the platform
    /// notification path and the session.
    pub raw_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(2),
            raw_buffer: 64,
        }
    }
}
