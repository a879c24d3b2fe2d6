//! Configuration for a `todolist` view.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. TOML config file (`~/.config/todolist/config.toml`)
//! 2. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! path that doesn't exist is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use todolist_proto::event::STORAGE_KEY;
use todolist_proto::task::{MAX_TASK_TEXT_LENGTH, MAX_TASKS};

use crate::toast::DEFAULT_TOAST_DURATION;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    storage: StorageFileConfig,
    limits: LimitsFileConfig,
    toast: ToastFileConfig,
    log: LogFileConfig,
}

/// `[storage]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StorageFileConfig {
    key: Option<String>,
    dir: Option<PathBuf>,
    debounce_ms: Option<u64>,
    channel_capacity: Option<usize>,
}

/// `[limits]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct LimitsFileConfig {
    max_tasks: Option<usize>,
    max_text_len: Option<usize>,
}

/// `[toast]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ToastFileConfig {
    dismiss_ms: Option<u64>,
}

/// `[log]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct LogFileConfig {
    level: Option<String>,
    file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Bounds enforced at the input boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of tasks in the list.
    pub max_tasks: usize,
    /// Maximum task text length in characters.
    pub max_text_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_tasks: MAX_TASKS,
            max_text_len: MAX_TASK_TEXT_LENGTH,
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct TodoConfig {
    // -- Storage --
    /// Key the task list record is stored under.
    pub storage_key: String,
    /// Directory for file-backed storage (`None`: platform data dir).
    pub storage_dir: Option<PathBuf>,
    /// Quiet period before a state change is written.
    pub debounce: Duration,
    /// Capacity of the store's command channel.
    pub channel_capacity: usize,

    // -- Limits --
    /// Input-boundary limits.
    pub limits: Limits,

    // -- Toast --
    /// How long a toast stays visible.
    pub toast_duration: Duration,

    // -- Log --
    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log file path (`None`: `$TMPDIR/todolist.log`).
    pub log_file: Option<PathBuf>,
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            storage_key: STORAGE_KEY.to_string(),
            storage_dir: None,
            debounce: Duration::from_millis(500),
            channel_capacity: 64,
            limits: Limits::default(),
            toast_duration: DEFAULT_TOAST_DURATION,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl TodoConfig {
    /// Load configuration from a TOML file layered over the defaults.
    ///
    /// If `explicit_path` is given and the file does not exist, returns an
    /// error. Otherwise the default path
    /// (`~/.config/todolist/config.toml`) is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = load_config_file(explicit_path)?;
        Ok(Self::resolve(&file))
    }

    /// Resolve a `TodoConfig` from a parsed config file.
    #[must_use]
    fn resolve(file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            storage_key: file
                .storage
                .key
                .clone()
                .unwrap_or(defaults.storage_key),
            storage_dir: file.storage.dir.clone().or(defaults.storage_dir),
            debounce: file
                .storage
                .debounce_ms
                .map_or(defaults.debounce, Duration::from_millis),
            channel_capacity: file
                .storage
                .channel_capacity
                .unwrap_or(defaults.channel_capacity)
                .max(1),
            limits: Limits {
                max_tasks: file
                    .limits
                    .max_tasks
                    .unwrap_or(defaults.limits.max_tasks),
                max_text_len: file
                    .limits
                    .max_text_len
                    .unwrap_or(defaults.limits.max_text_len),
            },
            toast_duration: file
                .toast
                .dismiss_ms
                .map_or(defaults.toast_duration, Duration::from_millis),
            log_level: file.log.level.clone().unwrap_or(defaults.log_level),
            log_file: file.log.file.clone().or(defaults.log_file),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("todolist").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
