//! Connection lifecycle state machine.
//!
//! Provides a `ConnectionState` enum that models the full lifecycle of
//! the client's single TCP connection, with validated transitions that
//! return `Result` instead of panicking.

use std::time::Instant;

use crate::error::RconError;

// ── ConnectionState ──────────────────────────────────────────────

/// The current phase of the RCON connection.
///
/// ```text
///  Idle ──► Connecting ──► Authenticating ──► Ready
///               │                │               │
///               ▼                ▼               ▼
///          Disconnected ◄────────┴───────────────┘
///               │
///               └──(auto-reconnect)──► Connecting
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Never connected. Initial state.
    #[default]
    Idle,

    /// TCP connection initiated but not yet established.
    Connecting,

    /// TCP link is up; running the password handshake.
    Authenticating,

    /// Handshake complete; commands may be executed.
    Ready {
        /// When the connection entered the `Ready` state.
        since: Instant,
    },

    /// Connection lost or explicitly closed.
    Disconnected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Authenticating => write!(f, "Authenticating"),
            Self::Ready { .. } => write!(f, "Ready"),
            Self::Disconnected => write!(f, "Disconnected"),
        }
    }
}

impl ConnectionState {
    /// Returns `true` while a transport is open (authenticated or not).
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Authenticating | Self::Ready { .. })
    }

    /// Returns `true` once the handshake has completed.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// How long the connection has been `Ready`.
    ///
    /// Returns `None` for any other state.
    pub fn ready_duration(&self) -> Option<std::time::Duration> {
        match self {
            Self::Ready { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Connecting`.
    ///
    /// Valid from: `Idle`, `Disconnected`.
    pub fn begin_connect(&mut self) -> Result<(), RconError> {
        match self {
            Self::Idle | Self::Disconnected => {
                *self = Self::Connecting;
                Ok(())
            }
            _ => Err(RconError::HostPortUndefined),
        }
    }

    /// Transition to `Authenticating`.
    ///
    /// Valid from: `Connecting`.
    pub fn transport_connected(&mut self) -> Result<(), RconError> {
        match self {
            Self::Connecting => {
                *self = Self::Authenticating;
                Ok(())
            }
            _ => Err(RconError::ProtocolViolation(
                "cannot authenticate: not in Connecting state",
            )),
        }
    }

    /// Transition to `Ready`.
    ///
    /// Valid from: `Authenticating`.
    pub fn authenticated(&mut self) -> Result<(), RconError> {
        match self {
            Self::Authenticating => {
                *self = Self::Ready {
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(RconError::ProtocolViolation(
                "cannot complete handshake: not in Authenticating state",
            )),
        }
    }

    /// Force-reset to `Disconnected` regardless of current state.
    ///
    /// Used for close, I/O failure, auth failure and protocol
    /// violations alike.
    pub fn force_disconnect(&mut self) {
        *self = Self::Disconnected;
    }
}

// ── Tests ────────────────────────────────────────────────────────
