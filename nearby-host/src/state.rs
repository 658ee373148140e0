//! Connection lifecycle of a host, kept free of I/O so every transition can
//! be checked on its own. The host applies these transitions under a lock
//! and performs the matching transport calls after releasing it.

use nearby_common::PairingChallenge;

use crate::transport::EndpointId;

/// Where the host stands with respect to advertising and its single peer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Idle,
    Advertising,
    /// A device asked to connect and the user has to pick the symbol shown
    /// on that device.
    AwaitingAuthentication {
        endpoint: EndpointId,
        challenge: PairingChallenge,
    },
    Authenticated {
        endpoint: EndpointId,
    },
}

/// Result of the user answering a pending challenge.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Resolution {
    pub endpoint: EndpointId,
    pub accepted: bool,
}

#[derive(Debug, Default)]
pub(crate) struct Session {
    state: ConnectionState,
    advertising: bool,
    /// Endpoint accepted by the user whose connection result is still
    /// outstanding.
    accepted: Option<EndpointId>,
}

impl Session {
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_advertising(&self) -> bool {
        self.advertising
    }

    fn resting_state(&self) -> ConnectionState {
        if self.advertising {
            ConnectionState::Advertising
        } else {
            ConnectionState::Idle
        }
    }

    pub fn advertising_started(&mut self) {
        self.advertising = true;
        if self.state == ConnectionState::Idle {
            self.state = ConnectionState::Advertising;
        }
    }

    /// A start request failed or was cancelled. An existing peer is kept.
    pub fn advertising_failed(&mut self) {
        self.advertising = false;
        if self.state == ConnectionState::Advertising {
            self.state = ConnectionState::Idle;
        }
    }

    /// Explicit stop: forget every peer.
    pub fn advertising_stopped(&mut self) {
        self.advertising = false;
        self.accepted = None;
        self.state = ConnectionState::Idle;
    }

    fn is_busy(&self) -> bool {
        self.accepted.is_some()
            || matches!(
                self.state,
                ConnectionState::AwaitingAuthentication { .. }
                    | ConnectionState::Authenticated { .. }
            )
    }

    /// Starts a challenge for `endpoint`. Returns `false`, leaving the state
    /// untouched, when another peer is pairing or connected.
    pub fn connection_initiated(
        &mut self,
        endpoint: &str,
        challenge: PairingChallenge,
    ) -> bool {
        if self.is_busy() {
            return false;
        }
        self.state = ConnectionState::AwaitingAuthentication {
            endpoint: endpoint.to_owned(),
            challenge,
        };
        true
    }

    pub fn pending_challenge(&self) -> Option<&PairingChallenge> {
        match &self.state {
            ConnectionState::AwaitingAuthentication { challenge, .. } => {
                Some(challenge)
            }
            _ => None,
        }
    }

    /// Answers the pending challenge and discards it. `None` when nothing is
    /// pending.
    pub fn resolve(&mut self, selected: &str) -> Option<Resolution> {
        let ConnectionState::AwaitingAuthentication {
            endpoint,
            challenge,
        } = &self.state
        else {
            return None;
        };

        let resolution = Resolution {
            endpoint: endpoint.clone(),
            accepted: challenge.accepts(selected),
        };
        if resolution.accepted {
            self.accepted = Some(resolution.endpoint.clone());
        }
        self.state = self.resting_state();
        Some(resolution)
    }

    /// The transport refused to accept an endpoint the user confirmed.
    pub fn acceptance_failed(&mut self, endpoint: &str) {
        if self.accepted.as_deref() == Some(endpoint) {
            self.accepted = None;
        }
    }

    /// Returns `None` for endpoints that were never accepted, otherwise
    /// whether the peer is now authenticated.
    pub fn connection_result(
        &mut self,
        endpoint: &str,
        success: bool,
    ) -> Option<bool> {
        if self.accepted.as_deref() != Some(endpoint) {
            return None;
        }
        self.accepted = None;
        if success {
            self.state = ConnectionState::Authenticated {
                endpoint: endpoint.to_owned(),
            };
        }
        Some(success)
    }

    /// Returns whether `endpoint` was being tracked.
    pub fn disconnected(&mut self, endpoint: &str) -> bool {
        let was_accepted = self.accepted.as_deref() == Some(endpoint);
        if was_accepted {
            self.accepted = None;
        }

        let tracked = match &self.state {
            ConnectionState::AwaitingAuthentication { endpoint: e, .. }
            | ConnectionState::Authenticated { endpoint: e } => e == endpoint,
            _ => false,
        };
        if tracked {
            self.state = self.resting_state();
        }

        tracked || was_accepted
    }

    pub fn authenticated_peer(&self) -> Option<&str> {
        match &self.state {
            ConnectionState::Authenticated { endpoint } => {
                Some(endpoint.as_str())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "123456";

    fn challenge() -> PairingChallenge {
        PairingChallenge::for_token(TOKEN)
    }

    fn advertising() -> Session {
        let mut session = Session::default();
        session.advertising_started();
        session
    }

    fn authenticated(endpoint: &str) -> Session {
        let mut session = advertising();
        assert!(session.connection_initiated(endpoint, challenge()));
        let resolution = session.resolve("🎲").unwrap();
        assert!(resolution.accepted);
        assert_eq!(session.connection_result(endpoint, true), Some(true));
        session
    }

    #[test]
    fn starts_idle_and_moves_to_advertising() {
        let mut session = Session::default();
        assert_eq!(session.state(), &ConnectionState::Idle);
        session.advertising_started();
        assert_eq!(session.state(), &ConnectionState::Advertising);
        assert!(session.is_advertising());
    }

    #[test]
    fn failed_start_returns_to_idle() {
        let mut session = advertising();
        session.advertising_failed();
        assert_eq!(session.state(), &ConnectionState::Idle);
        assert!(!session.is_advertising());
    }

    #[test]
    fn correct_symbol_leads_to_authenticated() {
        let session = authenticated("peer-1");
        assert_eq!(session.authenticated_peer(), Some("peer-1"));
        assert!(session.pending_challenge().is_none());
    }

    #[test]
    fn accepted_peer_waits_for_connection_result() {
        let mut session = advertising();
        session.connection_initiated("peer-1", challenge());
        session.resolve("🎲").unwrap();

        assert_eq!(session.state(), &ConnectionState::Advertising);
        assert_eq!(session.authenticated_peer(), None);
        assert_eq!(session.connection_result("someone-else", true), None);
        assert_eq!(session.connection_result("peer-1", false), Some(false));
        assert_eq!(session.state(), &ConnectionState::Advertising);
        assert_eq!(session.connection_result("peer-1", true), None);
    }

    #[test]
    fn wrong_symbol_discards_challenge() {
        let mut session = advertising();
        session.connection_initiated("peer-1", challenge());
        let resolution = session.resolve("😀").unwrap();

        assert_eq!(
            resolution,
            Resolution {
                endpoint: "peer-1".to_owned(),
                accepted: false
            }
        );
        assert_eq!(session.state(), &ConnectionState::Advertising);
        assert!(session.resolve("🎲").is_none());
        assert_eq!(session.connection_result("peer-1", true), None);
    }

    #[test]
    fn second_attempt_is_refused_while_busy() {
        let mut session = advertising();
        assert!(session.connection_initiated("peer-1", challenge()));
        assert!(!session
            .connection_initiated("peer-2", PairingChallenge::for_token("1")));
        assert_eq!(
            session.pending_challenge().map(|c| c.correct_symbol.as_str()),
            Some("🎲")
        );

        let mut session = authenticated("peer-1");
        assert!(!session.connection_initiated("peer-2", challenge()));
        assert_eq!(session.authenticated_peer(), Some("peer-1"));
    }

    #[test]
    fn disconnect_returns_to_resting_state() {
        let mut session = authenticated("peer-1");
        assert!(!session.disconnected("peer-2"));
        assert!(session.disconnected("peer-1"));
        assert_eq!(session.state(), &ConnectionState::Advertising);

        assert!(session.connection_initiated("peer-3", challenge()));
        assert!(session.disconnected("peer-3"));
        assert!(session.pending_challenge().is_none());
    }

    #[test]
    fn stop_clears_peer() {
        let mut session = authenticated("peer-1");
        session.advertising_stopped();
        assert_eq!(session.state(), &ConnectionState::Idle);
        assert_eq!(session.authenticated_peer(), None);
    }

    #[test]
    fn failed_restart_keeps_peer() {
        let mut session = authenticated("peer-1");
        session.advertising_failed();
        assert_eq!(session.authenticated_peer(), Some("peer-1"));
        assert!(session.disconnected("peer-1"));
        assert_eq!(session.state(), &ConnectionState::Idle);
    }
}
