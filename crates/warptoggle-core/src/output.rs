//! Output formatting for status bars and terminals.
//!
//! The client renders the daemon's belief in one of three shapes: Waybar
//! JSON (one object per line, `class` drives CSS), plain JSON for
//! machine consumption, or TTY text.

use serde::{Deserialize, Serialize};

use crate::status::ConnectionState;

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable terminal output (default).
    #[default]
    Tty,
    /// Waybar custom-module JSON.
    Waybar,
    /// Plain JSON.
    Json,
}

/// Waybar custom-module output object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaybarOutput {
    /// Text shown in the bar.
    pub text: String,
    /// Tooltip shown on hover.
    pub tooltip: String,
    /// CSS class for styling ("connected", "connecting", "disconnected",
    /// or "stale" when the daemon is unreachable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Alternative text, used by Waybar's `format-icons` lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl WaybarOutput {
    pub fn new(text: impl Into<String>, tooltip: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tooltip: tooltip.into(),
            class: None,
            alt: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }
}

/// Bar text per state. Overridable from client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateText {
    pub connected: String,
    pub connecting: String,
    pub disconnected: String,
}

impl Default for StateText {
    fn default() -> Self {
        Self {
            connected: "WARP".to_string(),
            connecting: "WARP…".to_string(),
            disconnected: "WARP off".to_string(),
        }
    }
}

impl StateText {
    pub fn for_state(&self, state: ConnectionState) -> &str {
        match state {
            ConnectionState::Connected => &self.connected,
            ConnectionState::Connecting => &self.connecting,
            ConnectionState::Disconnected => &self.disconnected,
        }
    }
}

/// Builds the Waybar object for a parsed state.
///
/// The tooltip carries whatever detail the caller has (last check time,
/// failure info); the class and alt always track the state itself.
pub fn format_state(state: ConnectionState, text: &StateText, tooltip: &str) -> WaybarOutput {
    WaybarOutput::new(text.for_state(state), tooltip)
        .with_class(state.as_str())
        .with_alt(state.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waybar_connected_shape() {
        let out = format_state(
            ConnectionState::Connected,
            &StateText::default(),
            "connected since boot",
        );
        insta::assert_json_snapshot!(out, @r###"
        {
          "text": "WARP",
          "tooltip": "connected since boot",
          "class": "connected",
          "alt": "connected"
        }
        "###);
    }

    #[test]
    fn waybar_disconnected_shape() {
        let out = format_state(
            ConnectionState::Disconnected,
            &StateText::default(),
            "no tunnel",
        );
        insta::assert_json_snapshot!(out, @r###"
        {
          "text": "WARP off",
          "tooltip": "no tunnel",
          "class": "disconnected",
          "alt": "disconnected"
        }
        "###);
    }

    #[test]
    fn optional_fields_are_omitted() {
        let out = WaybarOutput::new("x", "y");
        let json = serde_json::to_string(&out).unwrap();
        assert!(!json.contains("class"));
        assert!(!json.contains("alt"));
    }

    #[test]
    fn custom_texts() {
        let texts = StateText {
            connected: "🔒".into(),
            connecting: "…".into(),
            disconnected: "🔓".into(),
        };
        assert_eq!(texts.for_state(ConnectionState::Connecting), "…");
    }
}
