//! Desktop notification escalation.
//!
//! The reconciler reports sustained failure through an [`ErrorNotifier`];
//! delivery is fire-and-forget and nothing downstream consumes a result.

use notify_rust::Notification;
#[cfg(target_os = "linux")]
use notify_rust::Urgency;
use tracing::{debug, warn};

/// Notification collaborator boundary.
///
/// Test doubles record invocations; the production implementation talks
/// to the desktop notification daemon.
pub trait ErrorNotifier: Send + Sync {
    /// Shows a user-visible error notification.
    fn notify_error(&self, title: &str, message: &str);
}

/// Configuration for desktop notifications.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Application name for notifications.
    pub app_name: String,
    /// Notification timeout in seconds.
    pub timeout_secs: u32,
    /// Whether notifications are delivered at all.
    pub enabled: bool,
    /// Notification icon name.
    pub icon: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            app_name: "warptoggle".to_string(),
            timeout_secs: 10,
            enabled: true,
            icon: "network-vpn-symbolic".to_string(),
        }
    }
}

impl NotifyConfig {
    /// Builder: set app name.
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Builder: enable or disable delivery.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Production notifier backed by `notify-rust`.
#[derive(Debug, Clone, Default)]
pub struct DesktopNotifier {
    config: NotifyConfig,
}

impl DesktopNotifier {
    pub fn new(config: NotifyConfig) -> Self {
        Self { config }
    }
}

impl ErrorNotifier for DesktopNotifier {
    fn notify_error(&self, title: &str, message: &str) {
        if !self.config.enabled {
            debug!(title = title, "notifications disabled, dropping");
            return;
        }

        let mut notification = Notification::new();
        notification
            .appname(&self.config.app_name)
            .summary(title)
            .body(message)
            .icon(&self.config.icon)
            .timeout(notify_rust::Timeout::Milliseconds(
                self.config.timeout_secs * 1000,
            ));

        #[cfg(target_os = "linux")]
        notification.urgency(Urgency::Critical);

        if let Err(e) = notification.show() {
            // Delivery failure is not an error path for the daemon.
            warn!(error = %e, title = title, "failed to deliver notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = NotifyConfig::default();
        assert_eq!(config.app_name, "warptoggle");
        assert!(config.enabled);
    }

    #[test]
    fn builders() {
        let config = NotifyConfig::default()
            .with_app_name("testapp")
            .with_enabled(false);
        assert_eq!(config.app_name, "testapp");
        assert!(!config.enabled);
    }

    #[test]
    fn disabled_notifier_is_a_noop() {
        // Must not touch the notification daemon when disabled.
        let notifier = DesktopNotifier::new(NotifyConfig::default().with_enabled(false));
        notifier.notify_error("title", "message");
    }
}
