use std::fmt;

use serde::{Deserialize, Serialize};

/// Radio transport a peer was discovered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Classic discovery/pairing radio.
    ClassicDiscovery,
    /// Peer-to-peer local-network radio.
    PeerToPeer,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::ClassicDiscovery => write!(f, "classic"),
            Transport::PeerToPeer => write!(f, "p2p"),
        }
    }
}

/// A peer discovered during a scan cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    /// Human-readable device name. Empty if the radio did not disclose it.
    pub name: String,
    /// Hardware address. Unique per peer; the dedup key within a scan cycle.
    pub address: String,
    /// Received signal strength, for transports that report it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<i16>,
    pub transport: Transport,
}

/// A device bonded with the local adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedPeer {
    pub name: String,
    pub address: String,
}
