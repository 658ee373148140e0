//! Host side of a nearby settings session.
//!
//! A host (typically a TV or other device without a comfortable input
//! method) advertises itself over a short-range transport. A handheld
//! connects, both sides derive the same pairing symbol from the transport's
//! authentication token, and once the user picks the right symbol on the
//! host the two exchange the settings document as JSON.
//!
//! Typical flow:
//!
//! 1. Build a [`NearbySettingsHost`] with the settings document, a
//!    [`Transport`] implementation and a [`HostConfig`].
//! 2. [`subscribe`](NearbySettingsHost::subscribe) a [`HostSubscriber`] to
//!    receive challenges and settings changes.
//! 3. Call [`start_advertising`](NearbySettingsHost::start_advertising) or
//!    its async variant.
//! 4. When [`HostSubscriber::notify_challenge`] fires, show the options and
//!    pass the pick to
//!    [`resolve_challenge`](NearbySettingsHost::resolve_challenge).
//! 5. Read values from [`settings`](NearbySettingsHost::settings) whenever
//!    [`HostSubscriber::notify_settings_changed`] fires.

mod config;
mod host;
mod state;
mod subscriber;
pub mod transport;

pub use config::HostConfig;
pub use host::NearbySettingsHost;
pub use state::ConnectionState;
pub use subscriber::{ConnectionEvent, HostSubscriber};
pub use tokio_util::sync::CancellationToken;
pub use transport::{
    AdvertiseCompletion, AdvertiseOutcome, ConnectionLifecycle, EndpointId,
    PayloadListener, Strategy, Transport,
};
