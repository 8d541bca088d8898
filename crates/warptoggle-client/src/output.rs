//! Rendering of the daemon's belief for bars and terminals.

use warptoggle_core::{OutputFormat, StateText, WaybarOutput, format_state};
use warptoggle_protocol::StateInfo;

use crate::config::DisplaySettings;

/// Renders a state snapshot in the requested format.
pub fn render_state(info: &StateInfo, display: &DisplaySettings, format: OutputFormat) -> String {
    match format {
        OutputFormat::Waybar => {
            let waybar = format_state(info.state, &display.state_text(), &tooltip(info));
            serde_json::to_string(&waybar).expect("waybar output serializes")
        }
        OutputFormat::Json => serde_json::to_string(info).expect("state info serializes"),
        OutputFormat::Tty => tty_line(info, &display.state_text()),
    }
}

/// Renders the "daemon unreachable" placeholder.
///
/// Bars keep invoking the client on their own schedule, so this must be
/// ordinary output rather than a hard failure; the caller still exits
/// nonzero.
pub fn render_stale(display: &DisplaySettings, format: OutputFormat) -> String {
    match format {
        OutputFormat::Waybar => {
            let waybar = WaybarOutput::new(&display.stale_text, "warptoggle daemon not running")
                .with_class("stale")
                .with_alt("stale");
            serde_json::to_string(&waybar).expect("waybar output serializes")
        }
        OutputFormat::Json => r#"{"error":"daemon not running"}"#.to_string(),
        OutputFormat::Tty => "daemon not running (start with `warptoggle server`)".to_string(),
    }
}

fn tooltip(info: &StateInfo) -> String {
    let mut parts = vec![format!("WARP: {}", info.state)];
    if let Some(last_check) = info.last_check {
        parts.push(format!("checked {}", last_check.format("%H:%M:%S")));
    }
    if info.consecutive_failures > 0 {
        parts.push(format!("{} failed checks", info.consecutive_failures));
    }
    if let Some(ref error) = info.last_error {
        parts.push(error.clone());
    }
    parts.join("\n")
}

fn tty_line(info: &StateInfo, texts: &StateText) -> String {
    let mut line = texts.for_state(info.state).to_string();
    if let Some(ref error) = info.last_error {
        line.push_str(&format!(" (last check failed: {})", error));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use warptoggle_core::ConnectionState;

    fn info(state: ConnectionState) -> StateInfo {
        StateInfo {
            state,
            polling: state.is_settling(),
            consecutive_failures: 0,
            last_check: None,
            last_error: None,
        }
    }

    #[test]
    fn waybar_connected() {
        let rendered = render_state(
            &info(ConnectionState::Connected),
            &DisplaySettings::default(),
            OutputFormat::Waybar,
        );
        insta::assert_snapshot!(rendered, @r###"{"text":"WARP","tooltip":"WARP: connected","class":"connected","alt":"connected"}"###);
    }

    #[test]
    fn waybar_stale() {
        let rendered = render_stale(&DisplaySettings::default(), OutputFormat::Waybar);
        insta::assert_snapshot!(rendered, @r###"{"text":"WARP ?","tooltip":"warptoggle daemon not running","class":"stale","alt":"stale"}"###);
    }

    #[test]
    fn tty_disconnected() {
        let rendered = render_state(
            &info(ConnectionState::Disconnected),
            &DisplaySettings::default(),
            OutputFormat::Tty,
        );
        assert_eq!(rendered, "WARP off");
    }

    #[test]
    fn tty_shows_last_error() {
        let mut state = info(ConnectionState::Disconnected);
        state.last_error = Some("spawn failed".into());
        let rendered = render_state(&state, &DisplaySettings::default(), OutputFormat::Tty);
        assert_eq!(rendered, "WARP off (last check failed: spawn failed)");
    }

    #[test]
    fn tooltip_accumulates_failure_detail() {
        let mut state = info(ConnectionState::Connecting);
        state.consecutive_failures = 3;
        state.last_error = Some("exit status 1".into());
        let text = tooltip(&state);
        assert!(text.contains("WARP: connecting"));
        assert!(text.contains("3 failed checks"));
        assert!(text.contains("exit status 1"));
    }

    #[test]
    fn json_roundtrips_state_info() {
        let rendered = render_state(
            &info(ConnectionState::Connected),
            &DisplaySettings::default(),
            OutputFormat::Json,
        );
        let back: StateInfo = serde_json::from_str(&rendered).unwrap();
        assert_eq!(back.state, ConnectionState::Connected);
    }
}
