//! Discovery and advertising sessions, one per radio.
//!
//! A [`DiscoverySession`] owns the scan lifecycle for a single radio:
//! it deduplicates raw adapter notifications into peer records and emits
//! an ordered event stream. An [`AdvertisingSession`] owns the symmetric
//! broadcast lifecycle and emits start/stop outcomes only.

pub mod advertise;
pub mod session;
pub mod subscription;
pub mod types;

pub use advertise::AdvertisingSession;
pub use session::DiscoverySession;
pub use subscription::SubscriptionHandle;
pub use types::{AdvertiseEvent, AdvertiseState, DiscoveryEvent, SessionConfig, SessionState};
