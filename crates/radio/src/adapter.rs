//! Platform radio adapter boundary.
//!
//! The orchestration layer never touches radio hardware directly: it is
//! handed one capability object per physical radio and drives it through
//! these traits. Asynchronous primitives report their outcome through a
//! oneshot sender, mirroring the platform's success/failure callbacks;
//! scan notifications arrive on a registered listener channel.

use tokio::sync::{mpsc, oneshot};

use crate::error::ReasonCode;
use crate::peer::PairedPeer;

/// Well-known service identifier included in the advertisement payload.
pub const SERVICE_ID: &str = "e0917680-d427-11e4-8830-0800200c9a66";

/// Outcome sender for an asynchronous radio action.
///
/// `Ok(())` corresponds to the platform's success callback, `Err(code)`
/// to the failure callback with its raw reason code.
pub type ActionOutcome = oneshot::Sender<Result<(), ReasonCode>>;

/// Raw notification delivered to a registered scan listener.
///
/// Both radios normalize to this shape at the adapter boundary; the
/// peer-to-peer adapter expands its peers-changed list into one `Found`
/// item per device and reports no signal strength.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A device was seen. Repeats for the same address are expected.
    Found {
        address: String,
        name: String,
        signal_strength: Option<i16>,
    },
    /// The radio began a scan cycle. Also fired when the platform
    /// restarts a scan internally.
    Started,
    /// The scan cycle ended.
    Finished,
}

/// Token identifying a registered scan listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Fixed payload broadcast while advertising local presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub service_id: String,
    pub local_name: String,
}

/// Parameters for a peer-to-peer connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectConfig {
    /// Target hardware address, lowercased.
    pub address: String,
    /// Negotiation hint for which side becomes the group owner.
    /// `-1` lets the platform decide.
    pub group_owner_intent: i32,
}

/// Scan lifecycle surface shared by both radios.
///
/// A discovery session drives its radio exclusively through this trait.
pub trait DiscoveryRadio: Send + Sync {
    /// Whether the radio is globally enabled on the device.
    fn is_enabled(&self) -> bool;

    /// Whether a scan is currently in flight.
    fn is_scanning(&self) -> bool;

    /// Issues the scan-start primitive. Returns `false` if the platform
    /// refused to start one.
    fn start_scan(&self) -> bool;

    /// Issues the scan-stop primitive. Fire-and-forget; completion is
    /// observed through a `Finished` event, if the radio sends one.
    fn cancel_scan(&self);

    /// Registers a scan listener. The adapter sends raw events to the
    /// channel until the listener is unregistered.
    fn register_listener(&self, events: mpsc::Sender<ScanEvent>) -> ListenerId;

    /// Unregisters a previously registered listener. Unknown tokens are
    /// ignored.
    fn unregister_listener(&self, id: ListenerId);
}

/// Classic discovery/pairing radio. Also hosts the low-energy advertiser.
pub trait ClassicRadio: DiscoveryRadio {
    fn enable(&self);
    fn disable(&self);

    /// Name the adapter currently announces.
    fn local_name(&self) -> String;

    /// Renames the local adapter. Returns `false` if the platform refused.
    fn set_local_name(&self, name: &str) -> bool;

    /// Asks the platform to make the device discoverable to other
    /// scanners for `duration_secs` seconds.
    fn request_discoverable(&self, duration_secs: u32);

    /// Snapshot of devices bonded with the local adapter.
    fn bonded_peers(&self) -> Vec<PairedPeer>;

    /// Starts broadcasting the advertisement. The outcome arrives on the
    /// sender once the platform accepts or rejects the request.
    fn start_advertise(&self, advertisement: Advertisement, outcome: ActionOutcome);

    /// Stops broadcasting. Safe to call when not advertising.
    fn stop_advertise(&self);
}

/// Peer-to-peer local-network radio.
pub trait P2pRadio: DiscoveryRadio {
    /// Initiates a connection to a previously discovered peer. The
    /// outcome arrives on the sender once the platform accepts or
    /// rejects the request.
    fn connect(&self, config: ConnectConfig, outcome: ActionOutcome);
}
