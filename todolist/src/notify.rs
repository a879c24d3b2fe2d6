//! Fire-and-forget user notifications.
//!
//! Components that need to surface a problem to the user (rejected input,
//! a failed write, a malformed payload from another context) hold some
//! [`Notifier`] and call [`Notifier::notify`]. Nothing is returned and
//! nothing waits on the display.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastKind {
    /// Something failed.
    Error,
    /// Something was refused or adjusted.
    Warning,
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A notification as delivered through a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub kind: ToastKind,
    /// Human-readable message.
    pub message: String,
}

/// The `notify(kind, message)` capability.
pub trait Notifier: Send + Sync {
    /// Surfaces `message` to the user.
    fn notify(&self, kind: ToastKind, message: &str);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, kind: ToastKind, message: &str) {
        (**self).notify(kind, message);
    }
}

impl Notifier for mpsc::UnboundedSender<Notification> {
    fn notify(&self, kind: ToastKind, message: &str) {
        // The receiving view may already be gone.
        let _ = self.send(Notification {
            kind,
            message: message.to_string(),
        });
    }
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Notifier for Silent {
    fn notify(&self, kind: ToastKind, message: &str) {
        tracing::debug!(%kind, message, "notification discarded");
    }
}
