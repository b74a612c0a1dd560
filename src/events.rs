//! Typed events published by the client.
//!
//! A closed set of variants instead of stringly-named emit/subscribe:
//! push packets that match a known pattern become one of these, and
//! socket-level errors that do not close the transport are broadcast as
//! [`RconEvent::SocketError`].

use std::time::SystemTime;

use tokio::sync::mpsc;

// ── Event payloads ───────────────────────────────────────────────

/// Scope of an in-game chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatChannel {
    All,
    Team,
    Squad,
    Admin,
}

impl ChatChannel {
    /// Parse the bracketed channel tag the server prefixes messages
    /// with, e.g. `ChatAll`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ChatAll" => Some(Self::All),
            "ChatTeam" => Some(Self::Team),
            "ChatSquad" => Some(Self::Squad),
            "ChatAdmin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChatChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "ChatAll"),
            Self::Team => write!(f, "ChatTeam"),
            Self::Squad => write!(f, "ChatSquad"),
            Self::Admin => write!(f, "ChatAdmin"),
        }
    }
}

/// A player spoke in one of the chat channels.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub raw: String,
    pub channel: ChatChannel,
    pub eos_id: String,
    pub steam_id: String,
    /// Player name, trimmed of surrounding whitespace.
    pub name: String,
    pub message: String,
    pub time: SystemTime,
}

/// A player created a squad.
#[derive(Debug, Clone, PartialEq)]
pub struct SquadCreated {
    pub raw: String,
    pub player_name: String,
    pub eos_id: String,
    /// Absent for players without a linked Steam account.
    pub steam_id: Option<String>,
    pub squad_id: u32,
    pub squad_name: String,
    pub team_name: String,
    pub time: SystemTime,
}

/// An admin kicked a player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerKicked {
    pub raw: String,
    pub player_id: u32,
    pub eos_id: String,
    pub steam_id: String,
    pub name: String,
    pub time: SystemTime,
}

/// An admin banned a player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerBanned {
    pub raw: String,
    pub player_id: u32,
    pub steam_id: String,
    pub name: String,
    /// Ban duration exactly as the server printed it.
    pub interval: String,
    pub time: SystemTime,
}

/// An admin warned a player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerWarned {
    pub raw: String,
    pub name: String,
    pub message: String,
    pub time: SystemTime,
}

/// An admin entered or left the admin camera.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminCamera {
    pub raw: String,
    pub eos_id: String,
    pub steam_id: String,
    pub name: String,
    pub time: SystemTime,
}

// ── RconEvent ────────────────────────────────────────────────────

/// Everything the client can publish.
#[derive(Debug, Clone, PartialEq)]
pub enum RconEvent {
    ChatMessage(ChatMessage),
    SquadCreated(SquadCreated),
    PlayerKicked(PlayerKicked),
    PlayerBanned(PlayerBanned),
    PlayerWarned(PlayerWarned),
    AdminCamPossessed(AdminCamera),
    AdminCamUnpossessed(AdminCamera),
    /// A socket-level error that did not close the transport.
    SocketError(String),
}

// ── EventBus ─────────────────────────────────────────────────────

/// Fan-out of [`RconEvent`]s to subscribers, in subscription order.
///
/// Subscribers that drop their receiver are pruned on the next
/// publish; publishing never blocks the engine.
pub struct EventBus {
    subscribers: std::sync::Mutex<Vec<mpsc::UnboundedSender<RconEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Register a new subscriber and return its receiving end.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<RconEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber, oldest subscription
    /// first.
    pub fn publish(&self, event: RconEvent) {
        let mut subs = self.subscribers.lock().unwrap();
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers (as of the last publish).
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_channel_tags() {
        assert_eq!(ChatChannel::from_tag("ChatAll"), Some(ChatChannel::All));
        assert_eq!(ChatChannel::from_tag("ChatTeam"), Some(ChatChannel::Team));
        assert_eq!(ChatChannel::from_tag("ChatSquad"), Some(ChatChannel::Squad));
        assert_eq!(ChatChannel::from_tag("ChatAdmin"), Some(ChatChannel::Admin));
        assert_eq!(ChatChannel::from_tag("ChatVoice"), None);
        assert_eq!(ChatChannel::All.to_string(), "ChatAll");
    }

    #[tokio::test]
    async fn publish_reaches_all_subscribers_in_order() {
        let bus = EventBus::new();
        let mut rx_a = bus.subscribe();
        let mut rx_b = bus.subscribe();

        bus.publish(RconEvent::SocketError("boom".into()));

        assert_eq!(
            rx_a.recv().await,
            Some(RconEvent::SocketError("boom".into()))
        );
        assert_eq!(
            rx_b.recv().await,
            Some(RconEvent::SocketError("boom".into()))
        );
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let rx_a = bus.subscribe();
        let mut rx_b = bus.subscribe();
        drop(rx_a);

        bus.publish(RconEvent::SocketError("x".into()));
        assert_eq!(bus.subscriber_count(), 1);
        assert!(rx_b.recv().await.is_some());
    }
}
