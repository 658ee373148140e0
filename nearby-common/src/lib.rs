//! Types shared by both ends of a nearby settings session.
//!
//! - [`challenge`]: the visual pairing challenge both devices derive from
//!   the transport's authentication token.
//! - [`message`]: the payloads exchanged once a peer is authenticated.

pub mod challenge;
pub mod message;

pub use challenge::{PairingChallenge, PALETTE};
pub use message::{AppDetails, PeerMessage};

/// Service identifier both devices advertise and discover under.
pub const APP_ID: &str = "com.turtlepaw.nearby_settings";
