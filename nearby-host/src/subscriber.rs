use std::sync::Arc;

use data_settings::SettingsSchema;
use nearby_common::PairingChallenge;

use crate::transport::EndpointId;

/// Observer interface for presentation layers.
///
/// Implementors must be thread-safe (`Send + Sync`) since notifications are
/// dispatched from whichever thread delivers transport callbacks. Schema
/// snapshots are immutable; a new one arrives with every change.
pub trait HostSubscriber: Send + Sync {
    /// A stable unique identifier for this subscriber (used as a map key).
    fn get_id(&self) -> String;

    /// The settings document was replaced, locally or by the peer.
    fn notify_settings_changed(&self, schema: Arc<SettingsSchema>);

    /// A device wants to connect. Show `challenge.options` and pass the
    /// user's pick to [`crate::NearbySettingsHost::resolve_challenge`].
    fn notify_challenge(&self, challenge: PairingChallenge);

    fn notify_advertising(&self, _is_advertising: bool) {}

    fn notify_connection(&self, _event: ConnectionEvent) {}
}

/// Peer connection milestones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The user confirmed the challenge; the transport is connecting.
    Accepted { endpoint: EndpointId },
    /// Wrong symbol, or a second device while one is already paired.
    Rejected { endpoint: EndpointId },
    /// The connection is up and the schema has been pushed.
    Authenticated { endpoint: EndpointId },
    /// The transport could not establish an accepted connection.
    Failed { endpoint: EndpointId },
    Disconnected { endpoint: EndpointId },
}
