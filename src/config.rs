//! Client configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings for one RCON endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RconConfig {
    /// Server hostname or IP.
    pub host: String,
    /// RCON port.
    pub port: u16,
    /// RCON password.
    pub password: String,
    /// Delay before an automatic reconnect attempt, in milliseconds.
    pub auto_reconnect_delay_ms: u64,
}

impl Default for RconConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 0,
            password: String::new(),
            auto_reconnect_delay_ms: 5000,
        }
    }
}

impl RconConfig {
    /// Minimal constructor for the common case.
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password: password.into(),
            ..Self::default()
        }
    }

    /// The reconnect delay as a [`Duration`].
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.auto_reconnect_delay_ms)
    }

    /// `true` when both host and port are set.
    pub fn has_endpoint(&self) -> bool {
        !self.host.is_empty() && self.port != 0
    }

    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_delay_is_five_seconds() {
        let cfg = RconConfig::default();
        assert_eq!(cfg.reconnect_delay(), Duration::from_secs(5));
        assert!(!cfg.has_endpoint());
    }

    #[test]
    fn new_fills_endpoint() {
        let cfg = RconConfig::new("10.0.0.1", 21114, "hunter2");
        assert!(cfg.has_endpoint());
        assert_eq!(cfg.port, 21114);
        assert_eq!(cfg.password, "hunter2");
        assert_eq!(cfg.auto_reconnect_delay_ms, 5000);
    }

    #[test]
    fn toml_roundtrip() {
        let cfg = RconConfig::new("squad.example.net", 21114, "pw");
        let text = toml::to_string(&cfg).unwrap();
        let parsed: RconConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.host, "squad.example.net");
        assert_eq!(parsed.port, 21114);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let parsed: RconConfig = toml::from_str(r#"host = "h""#).unwrap();
        assert_eq!(parsed.host, "h");
        assert_eq!(parsed.port, 0);
        assert_eq!(parsed.auto_reconnect_delay_ms, 5000);
    }
}
