//! Classification of unsolicited push packets into typed events.
//!
//! An ordered, mutually exclusive set of patterns; the first match
//! wins. A body matching nothing produces no event — the server emits
//! plenty of administrative chatter this client does not model.

use std::sync::LazyLock;
use std::time::SystemTime;

use regex::Regex;

use crate::events::{
    AdminCamera, ChatChannel, ChatMessage, PlayerBanned, PlayerKicked, PlayerWarned, RconEvent,
    SquadCreated,
};

static SQUAD_CREATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<name>.+) \(Online IDs: EOS: (?P<eos>[\da-f]{32})(?: steam: (?P<steam>\d{17}))?\) has created Squad (?P<squad_id>\d+) \(Squad Name: (?P<squad_name>.+)\) on (?P<team>.+)",
    )
    .expect("squad-created pattern")
});

static CHAT_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[(ChatAll|ChatTeam|ChatSquad|ChatAdmin)\] \[Online IDs:EOS: ([0-9a-f]{32}) steam: (\d{17})\] (.+?) : (.*)",
    )
    .expect("chat-message pattern")
});

static PLAYER_KICKED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Kicked player ([0-9]+)\. \[Online IDs= EOS: ([0-9a-f]{32}) steam: (\d{17})\] (.*)",
    )
    .expect("player-kicked pattern")
});

static PLAYER_BANNED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Banned player ([0-9]+)\. \[steamid=(.*?)\] (.*) for interval (.*)")
        .expect("player-banned pattern")
});

static PLAYER_WARNED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"Remote admin has warned player (.*)\. Message was "(.*)""#)
        .expect("player-warned pattern")
});

// The server really does spell this one `Online Ids`.
static CAM_POSSESSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[Online Ids:EOS: ([0-9a-f]{32}) steam: (\d{17})\] (.+) has possessed admin camera\.",
    )
    .expect("cam-possessed pattern")
});

static CAM_UNPOSSESSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[Online IDs:EOS: ([0-9a-f]{32}) steam: (\d{17})\] (.+) has unpossessed admin camera\.",
    )
    .expect("cam-unpossessed pattern")
});

/// Classify one push-packet body. Returns `None` when no pattern
/// matches; that is not an error.
pub fn classify(body: &str) -> Option<RconEvent> {
    let time = SystemTime::now();

    if let Some(caps) = SQUAD_CREATED.captures(body) {
        return Some(RconEvent::SquadCreated(SquadCreated {
            raw: body.to_string(),
            player_name: caps["name"].to_string(),
            eos_id: caps["eos"].to_string(),
            steam_id: caps.name("steam").map(|m| m.as_str().to_string()),
            squad_id: caps["squad_id"].parse().ok()?,
            squad_name: caps["squad_name"].to_string(),
            team_name: caps["team"].to_string(),
            time,
        }));
    }

    if let Some(caps) = CHAT_MESSAGE.captures(body) {
        return Some(RconEvent::ChatMessage(ChatMessage {
            raw: body.to_string(),
            channel: ChatChannel::from_tag(&caps[1])?,
            eos_id: caps[2].to_string(),
            steam_id: caps[3].to_string(),
            name: caps[4].trim().to_string(),
            message: caps[5].to_string(),
            time,
        }));
    }

    if let Some(caps) = PLAYER_KICKED.captures(body) {
        return Some(RconEvent::PlayerKicked(PlayerKicked {
            raw: body.to_string(),
            player_id: caps[1].parse().ok()?,
            eos_id: caps[2].to_string(),
            steam_id: caps[3].to_string(),
            name: caps[4].to_string(),
            time,
        }));
    }

    if let Some(caps) = PLAYER_BANNED.captures(body) {
        return Some(RconEvent::PlayerBanned(PlayerBanned {
            raw: body.to_string(),
            player_id: caps[1].parse().ok()?,
            steam_id: caps[2].to_string(),
            name: caps[3].to_string(),
            interval: caps[4].to_string(),
            time,
        }));
    }

    if let Some(caps) = PLAYER_WARNED.captures(body) {
        return Some(RconEvent::PlayerWarned(PlayerWarned {
            raw: body.to_string(),
            name: caps[1].to_string(),
            message: caps[2].to_string(),
            time,
        }));
    }

    if let Some(caps) = CAM_POSSESSED.captures(body) {
        return Some(RconEvent::AdminCamPossessed(AdminCamera {
            raw: body.to_string(),
            eos_id: caps[1].to_string(),
            steam_id: caps[2].to_string(),
            name: caps[3].to_string(),
            time,
        }));
    }

    if let Some(caps) = CAM_UNPOSSESSED.captures(body) {
        return Some(RconEvent::AdminCamUnpossessed(AdminCamera {
            raw: body.to_string(),
            eos_id: caps[1].to_string(),
            steam_id: caps[2].to_string(),
            name: caps[3].to_string(),
            time,
        }));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const EOS: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const STEAM: &str = "12345678901234567";

    #[test]
    fn chat_all_message() {
        let body =
            format!("[ChatAll] [Online IDs:EOS: {EOS} steam: {STEAM}] PlayerName : hello");
        match classify(&body) {
            Some(RconEvent::ChatMessage(msg)) => {
                assert_eq!(msg.channel, ChatChannel::All);
                assert_eq!(msg.name, "PlayerName");
                assert_eq!(msg.message, "hello");
                assert_eq!(msg.eos_id, EOS);
                assert_eq!(msg.steam_id, STEAM);
                assert_eq!(msg.raw, body);
            }
            other => panic!("expected chat message, got {other:?}"),
        }
    }

    #[test]
    fn chat_channels() {
        for (tag, channel) in [
            ("ChatTeam", ChatChannel::Team),
            ("ChatSquad", ChatChannel::Squad),
            ("ChatAdmin", ChatChannel::Admin),
        ] {
            let body = format!("[{tag}] [Online IDs:EOS: {EOS} steam: {STEAM}] A : b");
            match classify(&body) {
                Some(RconEvent::ChatMessage(msg)) => assert_eq!(msg.channel, channel),
                other => panic!("expected chat message, got {other:?}"),
            }
        }
    }

    #[test]
    fn squad_created() {
        let body = format!(
            "Player One (Online IDs: EOS: {EOS} steam: {STEAM}) has created Squad 3 (Squad Name: Bravo) on Team A"
        );
        match classify(&body) {
            Some(RconEvent::SquadCreated(ev)) => {
                assert_eq!(ev.player_name, "Player One");
                assert_eq!(ev.squad_id, 3);
                assert_eq!(ev.squad_name, "Bravo");
                assert_eq!(ev.team_name, "Team A");
                assert_eq!(ev.steam_id.as_deref(), Some(STEAM));
            }
            other => panic!("expected squad created, got {other:?}"),
        }
    }

    #[test]
    fn squad_created_without_steam_id() {
        let body = format!(
            "NoSteam (Online IDs: EOS: {EOS}) has created Squad 1 (Squad Name: Alpha) on Team B"
        );
        match classify(&body) {
            Some(RconEvent::SquadCreated(ev)) => assert_eq!(ev.steam_id, None),
            other => panic!("expected squad created, got {other:?}"),
        }
    }

    #[test]
    fn player_kicked() {
        let body = format!("Kicked player 12. [Online IDs= EOS: {EOS} steam: {STEAM}] BadActor");
        match classify(&body) {
            Some(RconEvent::PlayerKicked(ev)) => {
                assert_eq!(ev.player_id, 12);
                assert_eq!(ev.name, "BadActor");
                assert_eq!(ev.steam_id, STEAM);
            }
            other => panic!("expected kick, got {other:?}"),
        }
    }

    #[test]
    fn player_banned() {
        let body = format!("Banned player 4. [steamid={STEAM}] Griefer for interval 7d");
        match classify(&body) {
            Some(RconEvent::PlayerBanned(ev)) => {
                assert_eq!(ev.player_id, 4);
                assert_eq!(ev.name, "Griefer");
                assert_eq!(ev.interval, "7d");
            }
            other => panic!("expected ban, got {other:?}"),
        }
    }

    #[test]
    fn player_warned() {
        let body = r#"Remote admin has warned player Newbie. Message was "watch your fire""#;
        match classify(body) {
            Some(RconEvent::PlayerWarned(ev)) => {
                assert_eq!(ev.name, "Newbie");
                assert_eq!(ev.message, "watch your fire");
            }
            other => panic!("expected warn, got {other:?}"),
        }
    }

    #[test]
    fn admin_camera_possessed_and_unpossessed() {
        let body =
            format!("[Online Ids:EOS: {EOS} steam: {STEAM}] AdminGuy has possessed admin camera.");
        assert!(matches!(
            classify(&body),
            Some(RconEvent::AdminCamPossessed(_))
        ));

        let body = format!(
            "[Online IDs:EOS: {EOS} steam: {STEAM}] AdminGuy has unpossessed admin camera."
        );
        match classify(&body) {
            Some(RconEvent::AdminCamUnpossessed(ev)) => assert_eq!(ev.name, "AdminGuy"),
            other => panic!("expected unpossess, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_body_is_no_event() {
        assert!(classify("Current level is Gorodok, layer is Gorodok_AAS_v1").is_none());
        assert!(classify("").is_none());
    }
}
