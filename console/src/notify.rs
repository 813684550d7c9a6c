//! User-facing notifications

use colored::Colorize;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// A user-facing notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notification {
    /// Render for terminal output
    pub fn render(&self) -> String {
        match self.severity {
            Severity::Success => format!("{} {}: {}", "✓".green(), self.title.bold(), self.message),
            Severity::Error => format!("{} {}: {}", "✗".red(), self.title.bold(), self.message),
        }
    }
}

/// Sender half of the notification channel
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

/// Create a notification channel
pub fn channel() -> (Notifier, mpsc::UnboundedReceiver<Notification>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx }, rx)
}

impl Notifier {
    /// Emit a success notification
    pub fn success(&self, title: &str, message: impl Into<String>) {
        let message = message.into();
        info!("{}: {}", title, message);
        let _ = self.tx.send(Notification {
            severity: Severity::Success,
            title: title.to_string(),
            message,
        });
    }

    /// Emit a failure notification
    pub fn error(&self, title: &str, message: impl Into<String>) {
        let message = message.into();
        error!("{}: {}", title, message);
        let _ = self.tx.send(Notification {
            severity: Severity::Error,
            title: title.to_string(),
            message,
        });
    }
}
