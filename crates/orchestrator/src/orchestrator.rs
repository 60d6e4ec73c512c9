//! Façade routing commands to the per-radio sessions.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use adhoclink_discovery::{
    AdvertiseEvent, AdvertisingSession, DiscoveryEvent, DiscoverySession, SessionState,
};
use adhoclink_radio::{ClassicRadio, P2pRadio, PairedPeer, RadioError, Transport};

use crate::connect::ConnectionController;
use crate::types::{ConnectionAttempt, ConnectionEvent, OrchestratorConfig, OrchestratorEvent};

/// Owns both radio capabilities and every session built on them.
///
/// Exactly one discovery session exists per transport, plus the
/// peer-to-peer connection controller and the advertiser. Inbound
/// commands are routed to the owning session; the sessions' event
/// streams are merged into a single outbound stream.
///
/// Must be constructed inside a Tokio runtime: the stream-merging tasks
/// are spawned at construction.
pub struct Orchestrator {
    classic: Arc<dyn ClassicRadio>,
    initial_name: String,
    classic_session: Arc<DiscoverySession>,
    p2p_session: Arc<DiscoverySession>,
    advertising: Arc<AdvertisingSession>,
    controller: Arc<ConnectionController>,
    events_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<OrchestratorEvent>>>,
}

impl Orchestrator {
    /// Builds the orchestrator around the two injected radio
    /// capabilities. The adapter's name at construction time is kept so
    /// it can be restored later.
    pub fn new<C, P>(classic: Arc<C>, p2p: Arc<P>, config: OrchestratorConfig) -> Self
    where
        C: ClassicRadio + 'static,
        P: P2pRadio + 'static,
    {
        let initial_name = classic.local_name();

        let classic_session = Arc::new(DiscoverySession::new(
            Transport::ClassicDiscovery,
            classic.clone(),
            config.session.clone(),
        ));
        let p2p_session = Arc::new(DiscoverySession::new(
            Transport::PeerToPeer,
            p2p.clone(),
            config.session.clone(),
        ));
        let advertising = Arc::new(AdvertisingSession::new(classic.clone()));
        let controller = Arc::new(ConnectionController::new(
            p2p.clone(),
            p2p_session.clone(),
            config.group_owner_intent,
        ));

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        if let Some(rx) = classic_session.take_events() {
            forward_discovery(Transport::ClassicDiscovery, rx, events_tx.clone());
        }
        if let Some(rx) = p2p_session.take_events() {
            forward_discovery(Transport::PeerToPeer, rx, events_tx.clone());
        }
        if let Some(rx) = advertising.take_events() {
            forward_advertise(rx, events_tx.clone());
        }
        if let Some(rx) = controller.take_events() {
            forward_connection(rx, events_tx);
        }

        Self {
            classic,
            initial_name,
            classic_session,
            p2p_session,
            advertising,
            controller,
            events_rx: std::sync::Mutex::new(Some(events_rx)),
        }
    }

    /// Takes the merged event receiver. Can only be called once.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<OrchestratorEvent>> {
        self.events_rx.lock().unwrap().take()
    }

    // --- Radio state ---

    pub fn enable_radio(&self) {
        self.classic.enable();
    }

    pub fn disable_radio(&self) {
        self.classic.disable();
    }

    pub fn is_radio_enabled(&self) -> bool {
        self.classic.is_enabled()
    }

    // --- Local name ---

    pub fn local_name(&self) -> String {
        self.classic.local_name()
    }

    /// Renames the adapter and returns the name it now announces.
    pub fn set_local_name(&self, name: &str) -> String {
        if !self.classic.set_local_name(name) {
            warn!(%name, "platform refused to rename the adapter");
        }
        self.classic.local_name()
    }

    /// Restores the name the adapter had when the orchestrator was
    /// built.
    pub fn reset_local_name(&self) {
        self.classic.set_local_name(&self.initial_name);
    }

    // --- Discoverable mode ---

    pub fn start_discoverable(&self, duration_secs: u32) {
        info!(duration_secs, "requesting discoverable mode");
        self.classic.request_discoverable(duration_secs);
    }

    // --- Discovery ---

    pub async fn start_discovery(&self, transport: Transport) -> Result<(), RadioError> {
        self.session(transport).start().await
    }

    pub async fn stop_discovery(&self, transport: Transport) {
        self.session(transport).stop().await;
    }

    pub async fn discovery_state(&self, transport: Transport) -> SessionState {
        self.session(transport).state().await
    }

    /// Peers found in the current scan cycle, in discovery order.
    pub async fn discovered_peers(&self, transport: Transport) -> Vec<adhoclink_radio::PeerRecord> {
        self.session(transport).peers().await
    }

    // --- Pairing ---

    /// Snapshot of devices bonded with the local adapter. Read straight
    /// from the platform; no session state is involved.
    pub fn paired_peers(&self) -> Vec<PairedPeer> {
        self.classic.bonded_peers()
    }

    // --- Connection ---

    pub async fn connect(&self, address: &str) -> Result<ConnectionAttempt, RadioError> {
        self.controller.connect(address).await
    }

    // --- Advertising ---

    pub async fn start_advertise(&self) -> Result<(), RadioError> {
        self.advertising.start().await
    }

    pub async fn stop_advertise(&self) {
        self.advertising.stop().await;
    }

    // --- Teardown ---

    /// Cancels both discovery subscriptions and stops advertising.
    pub async fn shutdown(&self) {
        self.classic_session.cancel().await;
        self.p2p_session.cancel().await;
        self.advertising.stop().await;
        info!("orchestrator shut down");
    }

    fn session(&self, transport: Transport) -> &Arc<DiscoverySession> {
        match transport {
            Transport::ClassicDiscovery => &self.classic_session,
            Transport::PeerToPeer => &self.p2p_session,
        }
    }
}

fn forward_discovery(
    transport: Transport,
    mut rx: mpsc::UnboundedReceiver<DiscoveryEvent>,
    tx: mpsc::UnboundedSender<OrchestratorEvent>,
) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if tx
                .send(OrchestratorEvent::Discovery { transport, event })
                .is_err()
            {
                break;
            }
        }
    });
}

fn forward_advertise(
    mut rx: mpsc::UnboundedReceiver<AdvertiseEvent>,
    tx: mpsc::UnboundedSender<OrchestratorEvent>,
) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if tx.send(OrchestratorEvent::Advertise(event)).is_err() {
                break;
            }
        }
    });
}

fn forward_connection(
    mut rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    tx: mpsc::UnboundedSender<OrchestratorEvent>,
) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if tx.send(OrchestratorEvent::Connection(event)).is_err() {
                break;
            }
        }
    });
}
