//! Connection state and status text classification.
//!
//! `warp-cli status` prints free-form human-readable text ("Status update:
//! Connected", "Status update: Disconnected. Reason: ...", "Connecting").
//! The exact vocabulary is not contractually fixed across versions of the
//! tool, so classification is substring-based rather than exact-match.

use serde::{Deserialize, Serialize};

/// The reconciler's belief about the VPN connection.
///
/// Derived from parsed status output on every poll; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No tunnel, or status output we could not classify.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Tunnel is up.
    Connected,
}

impl ConnectionState {
    /// Classifies raw status output.
    ///
    /// Case-insensitive substring matching. "disconnected" is checked
    /// before "connected" because the former contains the latter; without
    /// that order warp-cli's own "Status update: Disconnected" would be
    /// misread as Connected. Anything unrecognized (including empty
    /// output) is treated as Disconnected, never as an error.
    pub fn parse(raw: &str) -> Self {
        let text = raw.to_lowercase();
        if text.contains("disconnected") {
            Self::Disconnected
        } else if text.contains("connected") {
            Self::Connected
        } else if text.contains("connecting") {
            Self::Connecting
        } else {
            Self::Disconnected
        }
    }

    /// True only for the Connected steady state.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// True while the state may still be settling (anything but Connected).
    pub fn is_settling(self) -> bool {
        !self.is_connected()
    }

    /// Stable lowercase name, used as the Waybar CSS class.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_anywhere_in_text() {
        assert_eq!(
            ConnectionState::parse("Status update: Connected"),
            ConnectionState::Connected
        );
        assert_eq!(
            ConnectionState::parse("warp is CONNECTED (happy eyeballs)"),
            ConnectionState::Connected
        );
    }

    #[test]
    fn connecting_variants() {
        assert_eq!(
            ConnectionState::parse("Connecting..."),
            ConnectionState::Connecting
        );
        assert_eq!(
            ConnectionState::parse("Status update: connecting"),
            ConnectionState::Connecting
        );
    }

    #[test]
    fn disconnected_wins_over_embedded_connected() {
        // "Disconnected" contains "connected"; the order of checks must
        // not fail-open to Connected here.
        assert_eq!(
            ConnectionState::parse("Status update: Disconnected. Reason: Manual Disconnection"),
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn empty_and_garbage_default_to_disconnected() {
        assert_eq!(ConnectionState::parse(""), ConnectionState::Disconnected);
        assert_eq!(
            ConnectionState::parse("Something unexpected"),
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn settling_covers_everything_but_connected() {
        assert!(ConnectionState::Disconnected.is_settling());
        assert!(ConnectionState::Connecting.is_settling());
        assert!(!ConnectionState::Connected.is_settling());
    }

    #[test]
    fn serde_names_are_stable() {
        let json = serde_json::to_string(&ConnectionState::Connecting).unwrap();
        assert_eq!(json, "\"connecting\"");
        let back: ConnectionState = serde_json::from_str("\"connected\"").unwrap();
        assert_eq!(back, ConnectionState::Connected);
    }
}
