//! Response correlation: pending callbacks, outstanding requests,
//! fragment reassembly, and the sequence counter.
//!
//! Correlation is FIFO. The wire format does not guarantee that a
//! reply can be matched to its request, so the engine relies on the
//! server answering strictly in send order; the sequence-id map only
//! gates which frames the assembler may consume. An out-of-order reply
//! is therefore a protocol-violation class failure, never silently
//! reordered.

use std::collections::{HashMap, VecDeque};

use tokio::sync::oneshot;

use crate::error::RconError;
use crate::message::{AUTH_FAILED_ID, PacketId, PacketType};
use crate::packet::Frame;

// ── PendingReply ─────────────────────────────────────────────────

/// One queued continuation, resolved when its terminal frame arrives.
pub enum PendingReply {
    /// Swallows the synthetic acknowledgment the server emits ahead of
    /// the real auth response.
    Placeholder,
    /// Resolves the auth handshake.
    Auth(oneshot::Sender<Result<(), RconError>>),
    /// Resolves one `execute()` call with the reassembled body.
    Command(oneshot::Sender<Result<String, RconError>>),
}

/// What the engine should do after a frame was dispatched.
#[derive(Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Fully handled internally.
    Handled,
    /// The handshake succeeded; the connection may become `Ready`.
    AuthOk,
    /// The server rejected the password; close the connection.
    AuthFailed,
    /// A push-event body to hand to the classifier.
    Chat(String),
}

// ── Correlator ───────────────────────────────────────────────────

/// Owns all per-connection request state. One per connection; a fresh
/// correlator starts the sequence counter back at 1.
pub struct Correlator {
    /// Callbacks in send order. Strict FIFO is the sole correlation
    /// mechanism for terminal frames.
    queue: VecDeque<PendingReply>,
    /// In-flight requests keyed by sequence id; gates frame acceptance
    /// in the assembler.
    outstanding: HashMap<u16, String>,
    /// Fragment bodies accumulated since the last terminal frame.
    fragments: Vec<String>,
    /// Next sequence id to stamp on an outgoing request. Never 0.
    sequence: u16,
}

impl Correlator {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            outstanding: HashMap::new(),
            fragments: Vec::new(),
            sequence: 1,
        }
    }

    /// The sequence id the next outgoing request will carry.
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Advance the counter after a non-auth command, wrapping 65535
    /// back to 1 (0 is reserved and never used).
    pub fn advance_sequence(&mut self) {
        self.sequence = if self.sequence == u16::MAX {
            1
        } else {
            self.sequence + 1
        };
    }

    /// Whether `sequence` belongs to an in-flight request.
    pub fn is_outstanding(&self, sequence: u16) -> bool {
        self.outstanding.contains_key(&sequence)
    }

    /// Number of unresolved callbacks.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Register the auth handshake under the current sequence id.
    ///
    /// Two callbacks go on the queue: a placeholder for the synthetic
    /// leading acknowledgment, then the real handshake resolver.
    pub fn register_auth(&mut self, tx: oneshot::Sender<Result<(), RconError>>) {
        self.outstanding.insert(self.sequence, String::new());
        self.queue.push_back(PendingReply::Placeholder);
        self.queue.push_back(PendingReply::Auth(tx));
    }

    /// Register one command under the current sequence id.
    pub fn register_command(
        &mut self,
        command: String,
        tx: oneshot::Sender<Result<String, RconError>>,
    ) {
        self.outstanding.insert(self.sequence, command);
        self.queue.push_back(PendingReply::Command(tx));
    }

    /// Route one decoded frame.
    ///
    /// Fragments accumulate; a terminal frame resolves the oldest
    /// pending callback with the concatenation of all fragment bodies
    /// plus its own (no separator). Push events pass through untouched.
    /// Anything else is a protocol violation.
    pub fn dispatch(&mut self, frame: Frame) -> Result<Dispatch, RconError> {
        match PacketType::try_from(frame.packet_type) {
            Ok(PacketType::Response) | Ok(PacketType::ExecCommand) => {
                // The failure sentinel is checked before marker
                // dispatch; it is not a legal marker value.
                if frame.id == AUTH_FAILED_ID {
                    return self.auth_rejected(frame.sequence);
                }

                match PacketId::try_from(frame.id)? {
                    PacketId::Mid => {
                        self.fragments.push(frame.body);
                        Ok(Dispatch::Handled)
                    }
                    PacketId::End => self.resolve_terminal(frame),
                }
            }
            Ok(PacketType::Chat) => Ok(Dispatch::Chat(frame.body)),
            Ok(PacketType::Auth) => Err(RconError::ProtocolViolation(
                "server sent an auth request frame",
            )),
            Err(e) => Err(e),
        }
    }

    fn resolve_terminal(&mut self, frame: Frame) -> Result<Dispatch, RconError> {
        self.outstanding.remove(&frame.sequence);

        let mut text: String = self.fragments.drain(..).collect();
        text.push_str(&frame.body);

        match self.queue.pop_front() {
            None => Err(RconError::ProtocolViolation(
                "terminal frame with no pending request",
            )),
            Some(PendingReply::Placeholder) => Ok(Dispatch::Handled),
            Some(PendingReply::Auth(tx)) => {
                let _ = tx.send(Ok(()));
                Ok(Dispatch::AuthOk)
            }
            Some(PendingReply::Command(tx)) => {
                let _ = tx.send(Ok(text));
                Ok(Dispatch::Handled)
            }
        }
    }

    fn auth_rejected(&mut self, sequence: u16) -> Result<Dispatch, RconError> {
        self.outstanding.remove(&sequence);
        self.fragments.clear();

        // The queue holds [Placeholder, Auth] during the handshake; the
        // placeholder may or may not have been consumed already.
        while let Some(pending) = self.queue.pop_front() {
            match pending {
                PendingReply::Placeholder => continue,
                PendingReply::Auth(tx) => {
                    let _ = tx.send(Err(RconError::AuthenticationFailed));
                    return Ok(Dispatch::AuthFailed);
                }
                PendingReply::Command(_) => break,
            }
        }
        Err(RconError::ProtocolViolation(
            "auth failure with no pending auth request",
        ))
    }

    /// Fail every pending callback with `Disconnected`, in FIFO order,
    /// and reset all per-connection state. Called on connection drop.
    pub fn fail_all(&mut self) {
        while let Some(pending) = self.queue.pop_front() {
            match pending {
                PendingReply::Placeholder => {}
                PendingReply::Auth(tx) => {
                    let _ = tx.send(Err(RconError::Disconnected));
                }
                PendingReply::Command(tx) => {
                    let _ = tx.send(Err(RconError::Disconnected));
                }
            }
        }
        self.outstanding.clear();
        self.fragments.clear();
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────
