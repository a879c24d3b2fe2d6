//! Transient user-facing messages with auto-dismiss.
//!
//! [`toast_reducer`] is the pure transition function; [`ToastCenter`] wraps
//! it with one cancellable expiry timer per visible toast. Two toasts with
//! the same message never coexist: a repeated message while the first is
//! still showing is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::notify::{Notifier, ToastKind};

/// Default time a toast stays visible.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

/// Unique toast identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToastId(Uuid);

impl ToastId {
    /// Creates a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ToastId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ToastId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Identifier used for dismissal.
    pub id: ToastId,
    /// Severity.
    pub kind: ToastKind,
    /// Message text; unique among visible toasts.
    pub message: String,
}

/// Transitions over the visible toast list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastAction {
    /// Show a toast unless one with the same message is already visible.
    Show(Toast),
    /// Remove the toast with this id.
    Hide(ToastId),
}

/// Applies `action` to the visible toasts.
#[must_use]
pub fn toast_reducer(state: &[Toast], action: ToastAction) -> Vec<Toast> {
    match action {
        ToastAction::Show(toast) => {
            let mut next = state.to_vec();
            if !state.iter().any(|t| t.message == toast.message) {
                next.push(toast);
            }
            next
        }
        ToastAction::Hide(id) => state.iter().filter(|t| t.id != id).cloned().collect(),
    }
}

struct Inner {
    duration: Duration,
    timers: Mutex<HashMap<ToastId, JoinHandle<()>>>,
    toasts: watch::Sender<Vec<Toast>>,
}

impl Inner {
    /// Removes a toast; `cancel_timer` aborts its pending expiry.
    fn remove(&self, id: &ToastId, cancel_timer: bool) {
        if let Some(timer) = self.timers.lock().remove(id) {
            if cancel_timer {
                timer.abort();
            }
        }
        self.toasts.send_if_modified(|toasts| {
            let next = toast_reducer(toasts, ToastAction::Hide(id.clone()));
            let changed = next.len() != toasts.len();
            *toasts = next;
            changed
        });
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        for (_, timer) in self.timers.get_mut().drain() {
            timer.abort();
        }
    }
}

/// Visible toast list with per-toast expiry timers.
///
/// Clones share the same list. Timers run on the current Tokio runtime, so
/// toasts must be shown from within one. Dropping the last clone cancels
/// every pending timer.
#[derive(Clone)]
pub struct ToastCenter {
    inner: Arc<Inner>,
}

impl ToastCenter {
    /// Creates an empty center whose toasts expire after `duration`.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        let (toasts, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                duration,
                timers: Mutex::new(HashMap::new()),
                toasts,
            }),
        }
    }

    /// Shows a toast and arms its expiry timer.
    ///
    /// Returns `None` when an identical message is already visible.
    pub fn show(&self, kind: ToastKind, message: &str) -> Option<ToastId> {
        let toast = Toast {
            id: ToastId::new(),
            kind,
            message: message.to_string(),
        };
        let id = toast.id.clone();

        let shown = self.inner.toasts.send_if_modified(|toasts| {
            let next = toast_reducer(toasts, ToastAction::Show(toast));
            let changed = next.len() != toasts.len();
            *toasts = next;
            changed
        });
        if !shown {
            tracing::debug!(message, "duplicate toast suppressed");
            return None;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let timer_id = id.clone();
        let duration = self.inner.duration;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = weak.upgrade() {
                inner.remove(&timer_id, false);
            }
        });
        self.inner.timers.lock().insert(id.clone(), timer);

        tracing::debug!(toast_id = %id, %kind, message, "toast shown");
        Some(id)
    }

    /// Dismisses a toast before it expires.
    pub fn dismiss(&self, id: &ToastId) {
        self.inner.remove(id, true);
    }

    /// Snapshot of the visible toasts, oldest first.
    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        self.inner.toasts.borrow().clone()
    }

    /// Receiver that observes every change to the visible toasts.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Toast>> {
        self.inner.toasts.subscribe()
    }

    /// Number of armed expiry timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.lock().len()
    }
}

impl Notifier for ToastCenter {
    fn notify(&self, kind: ToastKind, message: &str) {
        self.show(kind, message);
    }
}
