//! Per-connection mutable session state.
//!
//! One session per connection, owned by that connection's gateway and only
//! ever touched from its I/O task, so no synchronization is involved. The
//! session tracks the last known hotbar slot, the resource-bundle handshake
//! phase, and the detected client kind.

use std::time::{Duration, Instant};

/// Classification of the connecting client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    /// A stock client: custom assets must be disguised.
    Standard,
    /// A client that natively understands the custom catalogue; the gateway
    /// steps aside entirely for these.
    Alternate,
}

/// Resource-bundle handshake phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    /// No push outstanding.
    Idle,
    /// A bundle push was sent; awaiting the client's load report.
    AwaitingAck {
        /// When the push went out, for timeout enforcement.
        since: Instant,
        /// Whether a configuration-finished signal has been consumed and is
        /// owed to the client once the acknowledgment arrives.
        finish_suppressed: bool,
    },
}

/// Mutable per-connection state consulted by the gateway.
#[derive(Debug)]
pub struct ConnectionSession {
    /// Last hotbar slot observed in either direction.
    pub last_hotbar_slot: u8,
    handshake: HandshakePhase,
    client_kind: Option<ClientKind>,
}

impl ConnectionSession {
    /// Fresh session for a newly established connection.
    pub fn new() -> Self {
        Self {
            last_hotbar_slot: 0,
            handshake: HandshakePhase::Idle,
            client_kind: None,
        }
    }

    /// Current handshake phase.
    pub fn handshake(&self) -> HandshakePhase {
        self.handshake
    }

    /// Record that a bundle push went out at `now`.
    ///
    /// Returns `false` (and changes nothing) if a push is already awaiting
    /// acknowledgment; repeat pushes are ignored, not queued.
    pub fn begin_bundle_push(&mut self, now: Instant, finish_suppressed: bool) -> bool {
        match self.handshake {
            HandshakePhase::Idle => {
                self.handshake = HandshakePhase::AwaitingAck {
                    since: now,
                    finish_suppressed,
                };
                true
            }
            HandshakePhase::AwaitingAck { .. } => false,
        }
    }

    /// Record the client's successful-load acknowledgment.
    ///
    /// Returns `true` when a suppressed configuration-finished signal must
    /// now be released to the client.
    pub fn acknowledge_bundle(&mut self) -> bool {
        match self.handshake {
            HandshakePhase::AwaitingAck {
                finish_suppressed, ..
            } => {
                self.handshake = HandshakePhase::Idle;
                finish_suppressed
            }
            HandshakePhase::Idle => false,
        }
    }

    /// Consume a configuration-finished signal while a push is outstanding.
    ///
    /// At most one signal is ever suppressed; further ones pass through.
    /// Returns `true` if the caller must suppress the frame.
    pub fn suppress_finish(&mut self) -> bool {
        match &mut self.handshake {
            HandshakePhase::AwaitingAck {
                finish_suppressed, ..
            } if !*finish_suppressed => {
                *finish_suppressed = true;
                true
            }
            _ => false,
        }
    }

    /// How long the current push has been awaiting acknowledgment.
    pub fn awaiting_for(&self, now: Instant) -> Option<Duration> {
        match self.handshake {
            HandshakePhase::AwaitingAck { since, .. } => Some(now.duration_since(since)),
            HandshakePhase::Idle => None,
        }
    }

    /// Cached client kind, if detection has concluded.
    pub fn client_kind(&self) -> Option<ClientKind> {
        self.client_kind
    }

    /// Cache a concluded detection for the connection's lifetime.
    pub fn set_client_kind(&mut self, kind: ClientKind) {
        self.client_kind = Some(kind);
    }
}

impl Default for ConnectionSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_transitions_idle_to_awaiting() {
        let mut session = ConnectionSession::new();
        assert_eq!(session.handshake(), HandshakePhase::Idle);
        assert!(session.begin_bundle_push(Instant::now(), false));
        assert!(matches!(
            session.handshake(),
            HandshakePhase::AwaitingAck { .. }
        ));
    }

    #[test]
    fn second_push_while_awaiting_is_rejected() {
        let mut session = ConnectionSession::new();
        assert!(session.begin_bundle_push(Instant::now(), false));
        assert!(!session.begin_bundle_push(Instant::now(), false));
    }

    #[test]
    fn ack_releases_suppressed_finish_once() {
        let mut session = ConnectionSession::new();
        session.begin_bundle_push(Instant::now(), true);
        assert!(session.acknowledge_bundle());
        // Back to idle: a stray ack releases nothing.
        assert!(!session.acknowledge_bundle());
    }

    #[test]
    fn suppresses_at_most_one_finish() {
        let mut session = ConnectionSession::new();
        session.begin_bundle_push(Instant::now(), false);
        assert!(session.suppress_finish());
        assert!(!session.suppress_finish());
        assert!(session.acknowledge_bundle());
    }

    #[test]
    fn no_suppression_while_idle() {
        let mut session = ConnectionSession::new();
        assert!(!session.suppress_finish());
    }

    #[test]
    fn awaiting_duration_is_measured_from_push() {
        let mut session = ConnectionSession::new();
        let start = Instant::now();
        assert_eq!(session.awaiting_for(start), None);
        session.begin_bundle_push(start, false);
        let later = start + Duration::from_secs(40);
        assert_eq!(session.awaiting_for(later), Some(Duration::from_secs(40)));
    }

    #[test]
    fn client_kind_is_cached() {
        let mut session = ConnectionSession::new();
        assert_eq!(session.client_kind(), None);
        session.set_client_kind(ClientKind::Alternate);
        assert_eq!(session.client_kind(), Some(ClientKind::Alternate));
    }
}
