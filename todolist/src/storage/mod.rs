//! Durable key-value storage for serialized task lists.
//!
//! Defines the [`Storage`] trait the persistence controller writes through.
//! Implementations:
//! - [`memory::MemoryStorage`]: an in-process cell shared by several
//!   contexts, publishing cross-context [`StorageEvent`]s
//! - [`file::FileStorage`]: one file per key in a directory
//!
//! [`StorageEvent`]: todolist_proto::event::StorageEvent

pub mod file;
pub mod memory;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The write would exceed the storage quota.
    #[error("storage quota exceeded ({needed} bytes needed, {quota} allowed)")]
    QuotaExceeded {
        /// Bytes the store would hold after the write.
        needed: usize,
        /// Configured limit.
        quota: usize,
    },

    /// The key cannot be used by this backend.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The backing store cannot be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// An underlying I/O error occurred.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Async key-value storage for raw string records.
///
/// The store treats values as opaque strings; encoding and validation
/// happen in the persistence layer.
pub trait Storage: Send + Sync {
    /// Reads the value stored under `key`, or `None` if absent.
    fn get_item(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}
