//! Connection lifecycle state.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──handshake sent──▶ Connected
//!      ▲                        ▲                              │
//!      │                        └────────── Reconnecting ◀─────┘ fault
//!      └──────────── disconnect (from any state but Disposed)
//! Disposed: terminal
//! ```

use std::fmt;

use parking_lot::Mutex;

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionState {
    /// No transport.
    #[default]
    Disconnected,
    /// Transport being established or handshake being sent.
    Connecting,
    /// Handshake sent; lines are flowing.
    Connected,
    /// The link failed and a coordinated reconnect is pending.
    Reconnecting,
    /// Released for good; every operation fails.
    Disposed,
}

impl ConnectionState {
    /// Whether lines can be sent.
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }

    /// Whether a connect is underway or done, so a reconnect is pointless.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        use ConnectionState::*;
        match (self, next) {
            (Disposed, _) => false,
            (_, Disposed) | (_, Disconnected) => true,
            (Disconnected, Connecting) | (Reconnecting, Connecting) => true,
            (Connecting, Connected) => true,
            (Connected, Reconnecting) | (Connecting, Reconnecting) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Disposed => "disposed",
        };
        f.write_str(s)
    }
}

/// Shared, lock-protected [`ConnectionState`].
#[derive(Debug, Default)]
pub struct StateCell {
    state: Mutex<ConnectionState>,
}

impl StateCell {
    /// The current state.
    pub fn get(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Move to `next` if the transition is legal; returns the previous state
    /// on success.
    pub fn transition(&self, next: ConnectionState) -> Option<ConnectionState> {
        let mut state = self.state.lock();
        let prev = *state;
        if !prev.can_transition_to(next) {
            return None;
        }
        *state = next;
        Some(prev)
    }

    /// Move to `next` only from `expected`.
    pub fn transition_from(&self, expected: ConnectionState, next: ConnectionState) -> bool {
        let mut state = self.state.lock();
        if *state != expected || !expected.can_transition_to(next) {
            return false;
        }
        *state = next;
        true
    }
}
