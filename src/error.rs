//! Domain-specific error types for the RCON client.
//!
//! All fallible operations return `Result<T, RconError>`.
//! No panics on invalid input — every error is typed and recoverable.

use thiserror::Error;

/// The canonical error type for the RCON client.
#[derive(Debug, Error)]
pub enum RconError {
    // ── Connection Errors ────────────────────────────────────────
    /// `connect()` was called without a host/port, or while a
    /// connection is already active.
    #[error("failed to connect: host or port undefined")]
    HostPortUndefined,

    /// The TCP connect itself failed.
    #[error("failed to connect: {0}")]
    Connect(#[source] std::io::Error),

    /// The TCP/IO layer reported an error on an established connection.
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    /// The server rejected the password.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// An operation required an open transport but none exists.
    #[error("not connected")]
    NotConnected,

    /// A command was issued before the auth handshake completed.
    #[error("not logged in")]
    NotLoggedIn,

    /// The connection dropped while requests were still in flight.
    #[error("disconnected")]
    Disconnected,

    // ── Packet Errors ────────────────────────────────────────────
    /// The encoded packet exceeds the server's frame limit.
    #[error("packet too large: {size} bytes (max {max})")]
    PacketTooLarge { size: usize, max: usize },

    /// The received frame is shorter than the minimum layout allows.
    #[error("invalid packet length: expected at least {expected}, got {actual}")]
    InvalidPacketLength { expected: usize, actual: usize },

    /// A numeric field did not map to any known enum variant.
    #[error("unknown {type_name} discriminant: {value:#x}")]
    UnknownVariant { type_name: &'static str, value: u32 },

    // ── Protocol Errors ──────────────────────────────────────────
    /// A frame violated protocol rules. Always fatal to the connection.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),
}

impl RconError {
    /// Returns `true` for errors that must force-close the connection.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RconError::ProtocolViolation(_)
                | RconError::UnknownVariant { .. }
                | RconError::InvalidPacketLength { .. }
        )
    }
}
