//! Cross-context change signal.
//!
//! When another execution context sharing the same storage writes a key,
//! every *other* context observes a [`StorageEvent`]. The writer never
//! observes its own writes.

/// Storage key under which the task list record is kept.
pub const STORAGE_KEY: &str = "todoStorage";

/// A storage mutation observed from another context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Key that changed.
    pub key: String,
    /// New raw value, or `None` if the key was removed.
    pub new_value: Option<String>,
}

impl StorageEvent {
    /// Creates an event for a key that now holds `value`.
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            new_value: Some(value.into()),
        }
    }

    /// Creates an event for a key that was removed.
    pub fn removed(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            new_value: None,
        }
    }

    /// Returns `true` if this event concerns exactly `key`.
    #[must_use]
    pub fn is_for(&self, key: &str) -> bool {
        self.key == key
    }
}
