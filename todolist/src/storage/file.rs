//! File-backed storage: one file per key in a directory.
//!
//! Writes go to a temporary sibling first and are renamed into place, so a
//! reader never observes a half-written record. There is no change feed;
//! writes from other processes are picked up on the next load only.

use std::path::{Path, PathBuf};

use super::{Storage, StorageError};
use crate::config::TodoConfig;

/// Directory name used under the platform data directory.
const APP_DIR: &str = "todolist";

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates a storage rooted at `dir`. The directory is created on the
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage in the platform data directory
    /// (e.g. `~/.local/share/todolist`), if one can be determined.
    #[must_use]
    pub fn default_location() -> Option<Self> {
        dirs::data_dir().map(|d| Self::new(d.join(APP_DIR)))
    }

    /// Storage in the configured directory, falling back to
    /// [`default_location`](Self::default_location) when none is set.
    #[must_use]
    pub fn from_config(config: &TodoConfig) -> Option<Self> {
        config
            .storage_dir
            .clone()
            .map(Self::new)
            .or_else(Self::default_location)
    }

    /// Directory holding the record files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Storage for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::trace!(path = %path.display(), bytes = value.len(), "record written");
        Ok(())
    }
}
