//! File-based logging setup for a host embedding the store.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;

use crate::config::TodoConfig;

/// Default log file name under the temp directory.
const DEFAULT_LOG_FILE: &str = "todolist.log";

/// Initialize file-based logging.
///
/// Logs go to `file_path`, or `$TMPDIR/todolist.log` when unset. `RUST_LOG`
/// takes precedence over `level`. Returns a [`WorkerGuard`] that must be
/// held until shutdown so buffered entries are flushed, or `None` if the
/// path has no usable file name or a global subscriber is already set.
pub fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join(DEFAULT_LOG_FILE);
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(guard)
}

/// Initialize logging from the `[log]` section of a resolved config.
pub fn init_from_config(config: &TodoConfig) -> Option<WorkerGuard> {
    init_logging(&config.log_level, config.log_file.as_deref())
}
