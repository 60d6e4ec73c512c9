//! Connection controller for the peer-to-peer radio.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{info, warn};
use uuid::Uuid;

use adhoclink_discovery::DiscoverySession;
use adhoclink_radio::{ConnectConfig, P2pRadio, RadioError};

use crate::types::{ConnectionAttempt, ConnectionEvent};

/// Initiates connections to peers discovered on the peer-to-peer radio.
///
/// A connect command is only issued for an address present in the active
/// discovery session's registry, which guards against connecting to
/// stale or unknown addresses. At most one attempt is outstanding at a
/// time; a second command fails rather than queueing.
pub struct ConnectionController {
    radio: Arc<dyn P2pRadio>,
    session: Arc<DiscoverySession>,
    group_owner_intent: i32,
    pending: Arc<Mutex<Option<ConnectionAttempt>>>,
    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    events_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<ConnectionEvent>>>,
}

impl ConnectionController {
    pub fn new(
        radio: Arc<dyn P2pRadio>,
        session: Arc<DiscoverySession>,
        group_owner_intent: i32,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            radio,
            session,
            group_owner_intent,
            pending: Arc::new(Mutex::new(None)),
            events_tx,
            events_rx: std::sync::Mutex::new(Some(events_rx)),
        }
    }

    /// Takes the outcome receiver. Can only be called once.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ConnectionEvent>> {
        self.events_rx.lock().unwrap().take()
    }

    /// Whether a connection attempt is outstanding.
    pub async fn is_busy(&self) -> bool {
        self.pending.lock().await.is_some()
    }

    /// Connects to a previously discovered peer.
    ///
    /// Fails fast, before any radio call, with
    /// [`RadioError::PeerNotDiscovered`] for an address the active scan
    /// has not seen, or [`RadioError::ConnectionBusy`] while another
    /// attempt is outstanding. Returns the accepted attempt; its
    /// resolution arrives later as a [`ConnectionEvent`].
    pub async fn connect(&self, address: &str) -> Result<ConnectionAttempt, RadioError> {
        if self.session.peer(address).await.is_none() {
            return Err(RadioError::PeerNotDiscovered(address.to_string()));
        }

        let mut pending = self.pending.lock().await;
        if pending.is_some() {
            return Err(RadioError::ConnectionBusy);
        }

        let attempt = ConnectionAttempt {
            id: Uuid::new_v4(),
            target_address: address.to_lowercase(),
            group_owner_intent: self.group_owner_intent,
        };
        *pending = Some(attempt.clone());
        drop(pending);

        let (outcome_tx, outcome_rx) = oneshot::channel();
        self.radio.connect(
            ConnectConfig {
                address: attempt.target_address.clone(),
                group_owner_intent: attempt.group_owner_intent,
            },
            outcome_tx,
        );
        info!(address = %attempt.target_address, attempt = %attempt.id, "connection attempt issued");

        let pending = self.pending.clone();
        let events_tx = self.events_tx.clone();
        let address = attempt.target_address.clone();
        tokio::spawn(async move {
            let event = match outcome_rx.await {
                Ok(Ok(())) => {
                    info!(%address, "connection attempt succeeded");
                    ConnectionEvent::Succeeded { address }
                }
                Ok(Err(code)) => {
                    let error = RadioError::from_p2p_reason(code);
                    warn!(%address, code, %error, "connection attempt failed");
                    ConnectionEvent::Failed { address, error }
                }
                Err(_) => {
                    warn!(%address, "connect outcome never delivered");
                    ConnectionEvent::Failed {
                        address,
                        error: RadioError::RadioInternalError,
                    }
                }
            };
            *pending.lock().await = None;
            let _ = events_tx.send(event);
        });

        Ok(attempt)
    }
}
