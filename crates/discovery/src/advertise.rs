//! Broadcast lifecycle for the low-energy advertiser.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, info, warn};

use adhoclink_radio::{Advertisement, ClassicRadio, RadioError, SERVICE_ID};

use crate::types::{AdvertiseEvent, AdvertiseState};

/// Broadcasts local presence on the classic radio's advertiser.
///
/// Symmetric to a discovery session's lifecycle, but emits no peer
/// stream; observers only see start/stop outcomes.
pub struct AdvertisingSession {
    radio: Arc<dyn ClassicRadio>,
    inner: Arc<Mutex<Inner>>,
    events_tx: mpsc::UnboundedSender<AdvertiseEvent>,
    events_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<AdvertiseEvent>>>,
}

struct Inner {
    state: AdvertiseState,
    /// Bumped by every start and stop; an outcome resolves only if the
    /// epoch still matches the request that produced it.
    epoch: u64,
}

impl AdvertisingSession {
    pub fn new(radio: Arc<dyn ClassicRadio>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            radio,
            inner: Arc::new(Mutex::new(Inner {
                state: AdvertiseState::Idle,
                epoch: 0,
            })),
            events_tx,
            events_rx: std::sync::Mutex::new(Some(events_rx)),
        }
    }

    /// Takes the outcome receiver. Can only be called once.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<AdvertiseEvent>> {
        self.events_rx.lock().unwrap().take()
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> AdvertiseState {
        self.inner.lock().await.state
    }

    /// Requests the broadcast.
    ///
    /// Builds the fixed advertisement payload (the well-known service
    /// identifier plus the adapter's current name) and returns once the
    /// request is issued; the platform's accept/reject arrives later as
    /// an [`AdvertiseEvent`]. On rejection the session stays idle. An
    /// outcome arriving after an intervening stop or restart belongs to
    /// a broadcast that no longer exists and is dropped.
    pub async fn start(&self) -> Result<(), RadioError> {
        if !self.radio.is_enabled() {
            return Err(RadioError::RadioUnavailable);
        }

        let issued_epoch = {
            let mut inner = self.inner.lock().await;
            inner.epoch += 1;
            inner.epoch
        };

        let advertisement = Advertisement {
            service_id: SERVICE_ID.to_string(),
            local_name: self.radio.local_name(),
        };
        debug!(name = %advertisement.local_name, "requesting advertisement");

        let (outcome_tx, outcome_rx) = oneshot::channel();
        self.radio.start_advertise(advertisement, outcome_tx);

        let session_inner = self.inner.clone();
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = outcome_rx.await;
            let mut inner = session_inner.lock().await;
            if inner.epoch != issued_epoch {
                debug!("stale advertise outcome dropped");
                return;
            }
            match outcome {
                Ok(Ok(())) => {
                    inner.state = AdvertiseState::Advertising;
                    info!("advertising started");
                    let _ = events_tx.send(AdvertiseEvent::Started);
                }
                Ok(Err(code)) => {
                    let error = RadioError::from_advertise_reason(code);
                    warn!(code, %error, "advertise start failed");
                    inner.state = AdvertiseState::Idle;
                    let _ = events_tx.send(AdvertiseEvent::Failed(error));
                }
                Err(_) => {
                    warn!("advertise outcome never delivered");
                    inner.state = AdvertiseState::Idle;
                }
            }
        });

        Ok(())
    }

    /// Stops broadcasting. Idempotent, and always lands in idle, so a
    /// session whose start outcome was never observed can still be torn
    /// down cleanly; that outcome, should it arrive later, is dropped.
    pub async fn stop(&self) {
        self.radio.stop_advertise();
        let mut inner = self.inner.lock().await;
        inner.epoch += 1;
        if inner.state == AdvertiseState::Advertising {
            info!("advertising stopped");
            let _ = self.events_tx.send(AdvertiseEvent::Stopped);
        }
        inner.state = AdvertiseState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::Duration;

    use adhoclink_radio::error::ADVERTISE_FEATURE_UNSUPPORTED;
    use adhoclink_radio::{ActionOutcome, DiscoveryRadio, ListenerId, PairedPeer, ScanEvent};

    struct FakeAdvertiser {
        enabled: AtomicBool,
        last_advertisement: StdMutex<Option<Advertisement>>,
        pending_outcome: StdMutex<Option<ActionOutcome>>,
        stops: AtomicU32,
    }

    impl FakeAdvertiser {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                enabled: AtomicBool::new(true),
                last_advertisement: StdMutex::new(None),
                pending_outcome: StdMutex::new(None),
                stops: AtomicU32::new(0),
            })
        }

        fn resolve(&self, outcome: Result<(), i32>) {
            let tx = self
                .pending_outcome
                .lock()
                .unwrap()
                .take()
                .expect("no pending advertise request");
            let _ = tx.send(outcome);
        }
    }

    impl DiscoveryRadio for FakeAdvertiser {
        fn is_enabled(&self) -> bool {
            self.enabled.load(Ordering::SeqCst)
        }
        fn is_scanning(&self) -> bool {
            false
        }
        fn start_scan(&self) -> bool {
            true
        }
        fn cancel_scan(&self) {}
        fn register_listener(&self, _events: mpsc::Sender<ScanEvent>) -> ListenerId {
            ListenerId(0)
        }
        fn unregister_listener(&self, _id: ListenerId) {}
    }

    impl ClassicRadio for FakeAdvertiser {
        fn enable(&self) {
            self.enabled.store(true, Ordering::SeqCst);
        }
        fn disable(&self) {
            self.enabled.store(false, Ordering::SeqCst);
        }
        fn local_name(&self) -> String {
            "TestDevice".into()
        }
        fn set_local_name(&self, _name: &str) -> bool {
            true
        }
        fn request_discoverable(&self, _duration_secs: u32) {}
        fn bonded_peers(&self) -> Vec<PairedPeer> {
            Vec::new()
        }
        fn start_advertise(&self, advertisement: Advertisement, outcome: ActionOutcome) {
            *self.last_advertisement.lock().unwrap() = Some(advertisement);
            *self.pending_outcome.lock().unwrap() = Some(outcome);
        }
        fn stop_advertise(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<AdvertiseEvent>) -> AdvertiseEvent {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event stream closed")
    }

    #[tokio::test]
    async fn start_builds_fixed_payload() {
        let radio = FakeAdvertiser::new();
        let session = AdvertisingSession::new(radio.clone());
        let mut rx = session.take_events().expect("events");

        session.start().await.unwrap();
        let ad = radio
            .last_advertisement
            .lock()
            .unwrap()
            .clone()
            .expect("advertisement issued");
        assert_eq!(ad.service_id, SERVICE_ID);
        assert_eq!(ad.local_name, "TestDevice");

        radio.resolve(Ok(()));
        assert_eq!(next_event(&mut rx).await, AdvertiseEvent::Started);
        assert_eq!(session.state().await, AdvertiseState::Advertising);
    }

    #[tokio::test]
    async fn start_failure_stays_idle_and_maps_error() {
        let radio = FakeAdvertiser::new();
        let session = AdvertisingSession::new(radio.clone());
        let mut rx = session.take_events().expect("events");

        session.start().await.unwrap();
        radio.resolve(Err(ADVERTISE_FEATURE_UNSUPPORTED));

        assert_eq!(
            next_event(&mut rx).await,
            AdvertiseEvent::Failed(RadioError::RadioUnsupported)
        );
        assert_eq!(session.state().await, AdvertiseState::Idle);
    }

    #[tokio::test]
    async fn start_fails_when_radio_disabled() {
        let radio = FakeAdvertiser::new();
        radio.disable();
        let session = AdvertisingSession::new(radio.clone());

        assert_eq!(session.start().await, Err(RadioError::RadioUnavailable));
        assert!(radio.last_advertisement.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let radio = FakeAdvertiser::new();
        let session = AdvertisingSession::new(radio.clone());
        let mut rx = session.take_events().expect("events");

        session.start().await.unwrap();
        radio.resolve(Ok(()));
        assert_eq!(next_event(&mut rx).await, AdvertiseEvent::Started);

        session.stop().await;
        assert_eq!(next_event(&mut rx).await, AdvertiseEvent::Stopped);
        assert_eq!(session.state().await, AdvertiseState::Idle);

        // A second stop still calls into the platform but emits nothing.
        session.stop().await;
        assert_eq!(radio.stops.load(Ordering::SeqCst), 2);
        assert_eq!(session.state().await, AdvertiseState::Idle);
    }

    #[tokio::test]
    async fn late_success_after_stop_is_dropped() {
        let radio = FakeAdvertiser::new();
        let session = AdvertisingSession::new(radio.clone());
        let mut rx = session.take_events().expect("events");

        session.start().await.unwrap();
        session.stop().await;
        // The platform accepts the request only after the stop.
        radio.resolve(Ok(()));

        let late = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(late.is_err(), "late outcome produced {late:?}");
        assert_eq!(session.state().await, AdvertiseState::Idle);
    }

    #[tokio::test]
    async fn outcome_of_superseded_start_is_dropped() {
        let radio = FakeAdvertiser::new();
        let session = AdvertisingSession::new(radio.clone());
        let mut rx = session.take_events().expect("events");

        session.start().await.unwrap();
        let first = radio
            .pending_outcome
            .lock()
            .unwrap()
            .take()
            .expect("first request issued");

        session.start().await.unwrap();
        // The first request resolves after it was superseded.
        let _ = first.send(Err(ADVERTISE_FEATURE_UNSUPPORTED));
        radio.resolve(Ok(()));

        assert_eq!(next_event(&mut rx).await, AdvertiseEvent::Started);
        assert_eq!(session.state().await, AdvertiseState::Advertising);
    }

    #[tokio::test]
    async fn stop_before_outcome_lands_idle() {
        let radio = FakeAdvertiser::new();
        let session = AdvertisingSession::new(radio.clone());
        let _rx = session.take_events();

        session.start().await.unwrap();
        // Outcome never observed; stopping must still work.
        session.stop().await;
        assert_eq!(session.state().await, AdvertiseState::Idle);
        assert_eq!(radio.stops.load(Ordering::SeqCst), 1);
    }
}
