//! Ownership token for a live platform listener registration.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use adhoclink_radio::{DiscoveryRadio, ListenerId};

/// Represents one active listener registration with the platform.
///
/// A discovery session holds at most one of these at a time. Releasing
/// is idempotent, and dropping an unreleased handle unregisters the
/// listener so a registration can never leak.
pub struct SubscriptionHandle {
    radio: Arc<dyn DiscoveryRadio>,
    id: ListenerId,
    released: bool,
}

impl SubscriptionHandle {
    pub(crate) fn new(radio: Arc<dyn DiscoveryRadio>, id: ListenerId) -> Self {
        Self {
            radio,
            id,
            released: false,
        }
    }

    /// Token for the underlying registration.
    pub fn listener_id(&self) -> ListenerId {
        self.id
    }

    /// Unregisters the listener. Safe to call more than once.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.radio.unregister_listener(self.id);
        debug!(listener = self.id.0, "listener unregistered");
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::sync::mpsc;

    use adhoclink_radio::ScanEvent;

    #[derive(Default)]
    struct CountingRadio {
        unregistrations: AtomicU32,
    }

    impl DiscoveryRadio for CountingRadio {
        fn is_enabled(&self) -> bool {
            true
        }
        fn is_scanning(&self) -> bool {
            false
        }
        fn start_scan(&self) -> bool {
            true
        }
        fn cancel_scan(&self) {}
        fn register_listener(&self, _events: mpsc::Sender<ScanEvent>) -> ListenerId {
            ListenerId(1)
        }
        fn unregister_listener(&self, _id: ListenerId) {
            self.unregistrations.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn release_is_idempotent() {
        let radio = Arc::new(CountingRadio::default());
        let mut handle = SubscriptionHandle::new(radio.clone(), ListenerId(1));
        handle.release();
        handle.release();
        assert_eq!(radio.unregistrations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_once() {
        let radio = Arc::new(CountingRadio::default());
        {
            let _handle = SubscriptionHandle::new(radio.clone(), ListenerId(1));
        }
        assert_eq!(radio.unregistrations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_after_release_does_not_double_unregister() {
        let radio = Arc::new(CountingRadio::default());
        {
            let mut handle = SubscriptionHandle::new(radio.clone(), ListenerId(1));
            handle.release();
        }
        assert_eq!(radio.unregistrations.load(Ordering::SeqCst), 1);
    }
}
