//! # squad-rcon
//!
//! Async RCON client for Squad game servers.
//!
//! This crate contains:
//! - **Packet**: `Frame` — the binary little-endian wire layout, encode/decode
//! - **Codec**: `RconCodec` for framed TCP writes via `tokio_util`, and
//!   `FrameAssembler` for stream reassembly (including the server's
//!   filler-frame artifact)
//! - **State**: `ConnectionState` lifecycle machine and the FIFO
//!   `Correlator` matching responses to requests
//! - **Network**: `RconClient` — connect, authenticate, execute commands,
//!   auto-reconnect
//! - **Events**: typed push events (`ChatMessage`, `SquadCreated`, kicks,
//!   bans, warns, admin camera) fanned out through an `EventBus`
//! - **Error**: `RconError` — typed, `thiserror`-based error hierarchy

pub mod chat;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod message;
pub mod network;
pub mod packet;
pub mod state;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use codec::{FrameAssembler, RconCodec};
pub use config::RconConfig;
pub use error::RconError;
pub use events::{
    AdminCamera, ChatChannel, ChatMessage, EventBus, PlayerBanned, PlayerKicked, PlayerWarned,
    RconEvent, SquadCreated,
};
pub use message::{AUTH_FAILED_ID, PacketId, PacketType};
pub use network::RconClient;
pub use packet::{Frame, MAX_PACKET_SIZE};
pub use state::{ConnectionState, Correlator, Dispatch};
