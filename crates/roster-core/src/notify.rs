//! User-visible notifications queued by the flows.

use serde::{Deserialize, Serialize};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// The action completed.
    Success,
    /// The action failed; nothing was changed.
    Error,
}

/// A toast-style message for the admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity.
    pub kind: NotificationKind,
    /// Message text.
    pub message: String,
}

impl Notification {
    /// Creates a success notification.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    /// Creates an error notification.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    /// Returns `true` for error notifications.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            NotificationKind::Success => write!(f, "✓ {}", self.message),
            NotificationKind::Error => write!(f, "✗ {}", self.message),
        }
    }
}

/// An ordered queue of pending notifications.
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    pending: Vec<Notification>,
}

impl Notifications {
    /// Queues a notification.
    pub fn push(&mut self, notification: Notification) {
        self.pending.push(notification);
    }

    /// Pending notifications, oldest first.
    #[must_use]
    pub fn pending(&self) -> &[Notification] {
        &self.pending
    }

    /// Removes and returns every pending notification.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }
}
