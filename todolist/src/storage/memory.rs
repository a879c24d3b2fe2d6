//! In-process storage shared by several contexts.
//!
//! [`MemoryStorage`] models a single origin's key-value area. Each view of
//! the list opens its own [`MemoryContext`] on it (one per "tab"). A write
//! through one context is published as a [`StorageEvent`] to every *other*
//! context that subscribed; the writer never hears its own writes, and a
//! write that leaves the value unchanged publishes nothing.
//!
//! ```text
//! context A ──set_item──▶ shared cells ──StorageEvent──▶ context B, C, …
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::broadcast;

use todolist_proto::event::StorageEvent;

use super::{Storage, StorageError};

/// Default per-context event buffer.
const DEFAULT_EVENT_BUFFER: usize = 64;

struct Shared {
    cells: Mutex<HashMap<String, String>>,
    /// Context id -> that context's event sender.
    listeners: Mutex<HashMap<u64, broadcast::Sender<StorageEvent>>>,
    next_context: AtomicU64,
    quota: Option<usize>,
    event_buffer: usize,
}

impl Shared {
    fn publish(&self, origin: u64, event: &StorageEvent) {
        let listeners = self.listeners.lock();
        for (id, tx) in listeners.iter() {
            if *id != origin {
                // No receiver on that context is fine.
                let _ = tx.send(event.clone());
            }
        }
    }
}

/// A key-value area shared by every context opened on it.
#[derive(Clone)]
pub struct MemoryStorage {
    shared: Arc<Shared>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Creates an empty, unbounded storage area.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None, DEFAULT_EVENT_BUFFER)
    }

    /// Creates an empty storage area holding at most `quota` bytes of keys
    /// and values combined.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self::build(Some(quota), DEFAULT_EVENT_BUFFER)
    }

    /// Creates an empty storage area whose per-context event buffer holds
    /// `event_buffer` undelivered events before subscribers start lagging.
    #[must_use]
    pub fn with_event_buffer(event_buffer: usize) -> Self {
        Self::build(None, event_buffer.max(1))
    }

    fn build(quota: Option<usize>, event_buffer: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                cells: Mutex::new(HashMap::new()),
                listeners: Mutex::new(HashMap::new()),
                next_context: AtomicU64::new(1),
                quota,
                event_buffer,
            }),
        }
    }

    /// Opens a new context on this storage area.
    #[must_use]
    pub fn context(&self) -> MemoryContext {
        let id = self.shared.next_context.fetch_add(1, Ordering::Relaxed);
        let (tx, _) = broadcast::channel(self.shared.event_buffer);
        self.shared.listeners.lock().insert(id, tx);
        MemoryContext {
            shared: Arc::clone(&self.shared),
            id,
        }
    }

    /// Reads a value directly, outside any context.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.shared.cells.lock().get(key).cloned()
    }

    /// Number of contexts currently open.
    #[must_use]
    pub fn context_count(&self) -> usize {
        self.shared.listeners.lock().len()
    }
}

/// One context's handle on a [`MemoryStorage`].
///
/// Dropping the context unregisters it; subscribers obtained from it then
/// see their channel close.
pub struct MemoryContext {
    shared: Arc<Shared>,
    id: u64,
}

impl MemoryContext {
    /// Subscribes to writes made by other contexts.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if the context has been
    /// unregistered.
    pub fn subscribe(&self) -> Result<broadcast::Receiver<StorageEvent>, StorageError> {
        self.shared
            .listeners
            .lock()
            .get(&self.id)
            .map(broadcast::Sender::subscribe)
            .ok_or_else(|| StorageError::Unavailable(format!("context {} closed", self.id)))
    }

    /// Removes `key`, publishing a removal event if it was present.
    pub fn remove_item(&self, key: &str) {
        let removed = self.shared.cells.lock().remove(key).is_some();
        if removed {
            self.shared.publish(self.id, &StorageEvent::removed(key));
        }
    }

    /// Identifier of this context within its storage area.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    fn write(&self, key: &str, value: &str) -> Result<bool, StorageError> {
        let mut cells = self.shared.cells.lock();
        if cells.get(key).is_some_and(|old| old == value) {
            return Ok(false);
        }

        if let Some(quota) = self.shared.quota {
            let others: usize = cells
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        cells.insert(key.to_string(), value.to_string());
        Ok(true)
    }
}

impl Drop for MemoryContext {
    fn drop(&mut self) {
        self.shared.listeners.lock().remove(&self.id);
    }
}

impl Storage for MemoryContext {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.shared.cells.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.write(key, value)? {
            self.shared
                .publish(self.id, &StorageEvent::set(key, value));
        }
        Ok(())
    }
}
