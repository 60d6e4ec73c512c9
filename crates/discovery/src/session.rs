//! Scan lifecycle and peer deduplication for a single radio.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use adhoclink_radio::{DiscoveryRadio, PeerRecord, RadioError, ScanEvent, Transport};

use crate::subscription::SubscriptionHandle;
use crate::types::{DiscoveryEvent, SessionConfig, SessionState};

/// Drives the discover lifecycle of one radio.
///
/// Raw adapter notifications arrive on a registered listener channel and
/// are folded into the session under a single lock: unseen addresses
/// become [`PeerRecord`]s and are emitted once, repeats are dropped, and
/// the platform's own started/finished signals reset and close each scan
/// cycle. The emitted event stream lives across start/stop cycles and
/// ends only when the subscription is cancelled.
pub struct DiscoverySession {
    transport: Transport,
    radio: Arc<dyn DiscoveryRadio>,
    config: SessionConfig,
    inner: Arc<Mutex<Inner>>,
    events_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<DiscoveryEvent>>>,
}

struct Inner {
    state: SessionState,
    registry: HashMap<String, PeerRecord>,
    snapshot: Vec<PeerRecord>,
    subscription: Option<SubscriptionHandle>,
    events_tx: Option<mpsc::UnboundedSender<DiscoveryEvent>>,
    cancel: CancellationToken,
}

impl Inner {
    fn emit(&self, event: DiscoveryEvent) {
        if let Some(tx) = &self.events_tx {
            let _ = tx.send(event);
        }
    }

    fn release_subscription(&mut self) {
        if let Some(mut handle) = self.subscription.take() {
            handle.release();
        }
    }
}

impl DiscoverySession {
    /// Creates a session for one radio. The radio reference is lent by
    /// the orchestrator; the session never copies it elsewhere.
    pub fn new(transport: Transport, radio: Arc<dyn DiscoveryRadio>, config: SessionConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            radio,
            config,
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::Idle,
                registry: HashMap::new(),
                snapshot: Vec::new(),
                subscription: None,
                events_tx: Some(events_tx),
                cancel: CancellationToken::new(),
            })),
            events_rx: std::sync::Mutex::new(Some(events_rx)),
        }
    }

    /// Transport this session scans on.
    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<DiscoveryEvent>> {
        self.events_rx.lock().unwrap().take()
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    /// Looks up a peer discovered this cycle.
    pub async fn peer(&self, address: &str) -> Option<PeerRecord> {
        self.inner.lock().await.registry.get(address).cloned()
    }

    /// All peers discovered this cycle, in discovery order.
    pub async fn peers(&self) -> Vec<PeerRecord> {
        self.inner.lock().await.snapshot.clone()
    }

    /// Starts a scan.
    ///
    /// Fails with [`RadioError::RadioUnavailable`] when the radio is
    /// globally disabled or refuses the scan; either way the session
    /// lands idle, no event is emitted and no registration is opened.
    /// If a scan is already running it is cancelled first, so a
    /// repeated start behaves as a restart. Opens the listener
    /// registration if none is open; a redundant open request is a
    /// logged no-op.
    pub async fn start(&self) -> Result<(), RadioError> {
        if !self.radio.is_enabled() {
            return Err(RadioError::RadioUnavailable);
        }

        let mut inner = self.inner.lock().await;
        if inner.events_tx.is_none() {
            warn!(transport = %self.transport, "start on a cancelled session");
            return Err(RadioError::RadioUnavailable);
        }

        if inner.state == SessionState::Discovering || self.radio.is_scanning() {
            debug!(transport = %self.transport, "scan already running, restarting");
            self.radio.cancel_scan();
        }

        // Issued before opening any registration, so a refused start
        // leaves nothing behind to unwind.
        if !self.radio.start_scan() {
            warn!(transport = %self.transport, "platform refused to start a scan");
            inner.state = SessionState::Idle;
            return Err(RadioError::RadioUnavailable);
        }

        inner.registry.clear();
        inner.snapshot.clear();

        if inner.subscription.is_none() {
            let (raw_tx, raw_rx) = mpsc::channel(self.config.raw_buffer);
            let id = self.radio.register_listener(raw_tx);
            inner.subscription = Some(SubscriptionHandle::new(self.radio.clone(), id));
            self.spawn_pump(raw_rx, inner.cancel.clone());
        } else {
            warn!(transport = %self.transport, "listener already registered, reusing it");
        }

        inner.state = SessionState::Discovering;
        info!(transport = %self.transport, "discovery started");
        Ok(())
    }

    /// Stops the running scan. A no-op when no scan is in flight.
    ///
    /// The listener registration is released once the radio reports the
    /// scan finished, or after [`SessionConfig::stop_timeout`] for
    /// radios that never deliver a finished event on a manual stop.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state != SessionState::Discovering {
            debug!(transport = %self.transport, "stop while not discovering is a no-op");
            return;
        }

        self.radio.cancel_scan();
        inner.state = SessionState::Stopping;
        info!(transport = %self.transport, "discovery stopping");
        drop(inner);

        let inner = self.inner.clone();
        let stop_timeout = self.config.stop_timeout;
        let transport = self.transport;
        tokio::spawn(async move {
            tokio::time::sleep(stop_timeout).await;
            let mut inner = inner.lock().await;
            if inner.state == SessionState::Stopping {
                warn!(%transport, "no finished event after stop, finalizing");
                inner.release_subscription();
                inner.state = SessionState::Idle;
            }
        });
    }

    /// Ends the subscription.
    ///
    /// Releases the listener registration immediately, without waiting
    /// for in-flight platform callbacks; anything still arriving is
    /// dropped. Closes the event stream and returns the session to idle.
    pub async fn cancel(&self) {
        let mut inner = self.inner.lock().await;
        inner.cancel.cancel();
        inner.release_subscription();
        inner.registry.clear();
        inner.snapshot.clear();
        inner.events_tx = None;
        inner.state = SessionState::Idle;
        info!(transport = %self.transport, "discovery subscription cancelled");
    }

    fn spawn_pump(&self, mut raw_rx: mpsc::Receiver<ScanEvent>, cancel: CancellationToken) {
        let inner = self.inner.clone();
        let transport = self.transport;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = raw_rx.recv() => {
                        let Some(event) = event else { break };
                        // Checked before taking the lock so a callback
                        // racing a cancel never mutates state.
                        if cancel.is_cancelled() {
                            break;
                        }
                        let mut inner = inner.lock().await;
                        handle_raw_event(transport, &mut inner, event);
                    }
                }
            }
        });
    }
}

fn handle_raw_event(transport: Transport, inner: &mut Inner, event: ScanEvent) {
    match event {
        ScanEvent::Started => {
            // The platform may restart a scan on its own; every started
            // signal gives the caller a clean slate.
            inner.registry.clear();
            inner.snapshot.clear();
            inner.emit(DiscoveryEvent::DiscoveryStarted);
        }
        ScanEvent::Found {
            address,
            name,
            signal_strength,
        } => {
            if inner.registry.contains_key(&address) {
                debug!(%address, "duplicate found event dropped");
                return;
            }
            let record = PeerRecord {
                name,
                address: address.clone(),
                signal_strength,
                transport,
            };
            debug!(%address, name = %record.name, "peer found");
            inner.registry.insert(address, record.clone());
            inner.snapshot.push(record.clone());
            inner.emit(DiscoveryEvent::PeerFound(record));
        }
        ScanEvent::Finished => {
            inner.emit(DiscoveryEvent::DiscoveryFinished(inner.snapshot.clone()));
            match inner.state {
                SessionState::Stopping => {
                    inner.release_subscription();
                    inner.state = SessionState::Idle;
                    info!(%transport, "discovery stopped");
                }
                SessionState::Discovering => {
                    inner.state = SessionState::Idle;
                    info!(%transport, "discovery finished");
                }
                SessionState::Idle => {}
            }
        }
    }
}
