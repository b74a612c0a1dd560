//! Wire-level packet type and marker definitions.
//!
//! Uses proper enums with `TryFrom` — no panics on unknown values.

use crate::error::RconError;
use std::fmt;

// ── PacketType ───────────────────────────────────────────────────

/// The 4-byte type field of a frame.
///
/// The numbering is the server's, not ours. Note that `0x02` is
/// overloaded: outbound it carries a command to execute, inbound it is
/// the terminal auth response.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// A (possibly fragmented) reply to an executed command.
    Response = 0x00,
    /// An unsolicited push event (chat, kicks, bans, admin camera).
    Chat = 0x01,
    /// Outbound: execute a command. Inbound: auth response.
    ExecCommand = 0x02,
    /// Outbound only: the password login packet.
    Auth = 0x03,
}

impl TryFrom<u32> for PacketType {
    type Error = RconError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(PacketType::Response),
            0x01 => Ok(PacketType::Chat),
            0x02 => Ok(PacketType::ExecCommand),
            0x03 => Ok(PacketType::Auth),
            _ => Err(RconError::UnknownVariant {
                type_name: "PacketType",
                value,
            }),
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ── PacketId ─────────────────────────────────────────────────────

/// The 1-byte id marker of a frame.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketId {
    /// A continuation fragment of a multi-packet response.
    Mid = 0x01,
    /// The terminal (or only) packet of a response.
    End = 0x02,
}

/// Marker value the server puts on the terminal auth response when the
/// password was wrong. The wire field is one unsigned byte, so the
/// nominal `-1` arrives as `0xFF`.
pub const AUTH_FAILED_ID: u8 = 0xFF;

impl TryFrom<u8> for PacketId {
    type Error = RconError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(PacketId::Mid),
            0x02 => Ok(PacketId::End),
            _ => Err(RconError::UnknownVariant {
                type_name: "PacketId",
                value: value as u32,
            }),
        }
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
