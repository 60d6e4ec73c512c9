//! Stable error taxonomy and the mappings from raw platform reason codes.
//!
//! Raw codes never leak past the orchestration layer; callers branch on
//! [`RadioError`] variants instead.

use serde::{Deserialize, Serialize};

/// Raw failure code reported by the platform when a radio action fails.
pub type ReasonCode = i32;

/// Peer-to-peer radio: internal error.
pub const P2P_ERROR: ReasonCode = 0;
/// Peer-to-peer radio: operation not supported on this device.
pub const P2P_UNSUPPORTED: ReasonCode = 1;
/// Peer-to-peer radio: framework busy, request rejected.
pub const P2P_BUSY: ReasonCode = 2;

/// Advertiser: payload larger than the radio accepts.
pub const ADVERTISE_DATA_TOO_LARGE: ReasonCode = 1;
/// Advertiser: no advertising slot available.
pub const ADVERTISE_TOO_MANY_ADVERTISERS: ReasonCode = 2;
/// Advertiser: an advertisement is already running.
pub const ADVERTISE_ALREADY_STARTED: ReasonCode = 3;
/// Advertiser: internal radio failure.
pub const ADVERTISE_INTERNAL_ERROR: ReasonCode = 4;
/// Advertiser: advertising not supported on this device.
pub const ADVERTISE_FEATURE_UNSUPPORTED: ReasonCode = 5;

/// Errors surfaced by the orchestration layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum RadioError {
    #[error("radio is disabled or unavailable")]
    RadioUnavailable,

    #[error("radio reported an internal error")]
    RadioInternalError,

    #[error("operation is not supported by this radio")]
    RadioUnsupported,

    #[error("radio is busy")]
    RadioBusy,

    #[error("peer {0} has not been discovered")]
    PeerNotDiscovered(String),

    #[error("a connection attempt is already in flight")]
    ConnectionBusy,

    #[error("unknown radio error (reason code {0})")]
    Unknown(ReasonCode),
}

impl RadioError {
    /// Maps a peer-to-peer action failure code into the taxonomy.
    ///
    /// Total and pure: every code maps to something, unrecognized codes
    /// fall through to [`RadioError::Unknown`].
    pub fn from_p2p_reason(code: ReasonCode) -> Self {
        match code {
            P2P_ERROR => RadioError::RadioInternalError,
            P2P_UNSUPPORTED => RadioError::RadioUnsupported,
            P2P_BUSY => RadioError::RadioBusy,
            other => RadioError::Unknown(other),
        }
    }

    /// Maps an advertiser start-failure code into the taxonomy.
    pub fn from_advertise_reason(code: ReasonCode) -> Self {
        match code {
            ADVERTISE_DATA_TOO_LARGE => RadioError::RadioInternalError,
            ADVERTISE_TOO_MANY_ADVERTISERS => RadioError::RadioBusy,
            ADVERTISE_ALREADY_STARTED => RadioError::RadioBusy,
            ADVERTISE_INTERNAL_ERROR => RadioError::RadioInternalError,
            ADVERTISE_FEATURE_UNSUPPORTED => RadioError::RadioUnsupported,
            other => RadioError::Unknown(other),
        }
    }
}
