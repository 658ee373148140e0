//! Boundary to the platform's short-range connection layer.
//!
//! The host never talks to radios directly. A platform integration
//! implements [`Transport`] and delivers its events back through
//! [`ConnectionLifecycle`] and [`PayloadListener`]. Implementations may
//! invoke callbacks from any thread, including synchronously from inside a
//! `Transport` call.

use std::fmt;
use std::sync::Arc;

use data_error::Result;

/// Opaque handle of a remote device, assigned by the transport.
pub type EndpointId = String;

/// Topology requested from the transport when advertising.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// One-to-one connection, the only topology the host uses by default.
    #[default]
    PointToPoint,
    Star,
    Cluster,
}

/// How an advertising request ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdvertiseOutcome {
    Started,
    Failed(String),
    Cancelled,
}

/// Completion for [`Transport::start_advertising`]. Called at most once.
pub type AdvertiseCompletion = Box<dyn FnOnce(AdvertiseOutcome) + Send>;

/// Connection lifecycle events delivered while advertising.
pub trait ConnectionLifecycle: Send + Sync {
    /// A remote device wants to connect. `auth_token` is the numeric token
    /// both sides were given by the transport.
    fn on_connection_initiated(&self, endpoint: &str, auth_token: &str);

    fn on_connection_result(&self, endpoint: &str, success: bool);

    fn on_disconnected(&self, endpoint: &str);
}

/// Receives byte payloads from an accepted connection.
pub trait PayloadListener: Send + Sync {
    fn on_payload_received(&self, endpoint: &str, bytes: &[u8]);
}

pub trait Transport: Send + Sync {
    /// Start advertising `app_id` under `device_label`. The outcome is
    /// reported through `completion`, possibly before this call returns.
    fn start_advertising(
        &self,
        device_label: &str,
        app_id: &str,
        lifecycle: Arc<dyn ConnectionLifecycle>,
        strategy: Strategy,
        completion: AdvertiseCompletion,
    );

    fn stop_advertising(&self);

    fn send_payload(&self, endpoint: &str, bytes: Vec<u8>) -> Result<()>;

    fn accept_connection(
        &self,
        endpoint: &str,
        listener: Arc<dyn PayloadListener>,
    ) -> Result<()>;

    fn reject_connection(&self, endpoint: &str) -> Result<()>;
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::PointToPoint => "P2P_POINT_TO_POINT",
            Strategy::Star => "P2P_STAR",
            Strategy::Cluster => "P2P_CLUSTER",
        };
        f.write_str(name)
    }
}
