//! Shared vocabulary for the AdhocLink orchestration layer.
//!
//! Defines the canonical peer model, the stable error taxonomy with its
//! raw reason-code mappings, and the adapter traits behind which the
//! platform radios live.

pub mod adapter;
pub mod error;
pub mod peer;

pub use adapter::{
    ActionOutcome, Advertisement, ClassicRadio, ConnectConfig, DiscoveryRadio, ListenerId,
    P2pRadio, SERVICE_ID, ScanEvent,
};
pub use error::{RadioError, ReasonCode};
pub use peer::{PairedPeer, PeerRecord, Transport};
