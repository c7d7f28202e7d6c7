//! Logging bootstrap for hosts embedding the mapper.
//!
//! # Responsibility
//! - Install a `flexi_logger` backend for the `log` facade once per process.
//! - Route output to rolling files or to stderr (statement tracing).
//!
//! # Invariants
//! - Initialization is idempotent for an identical level and target.
//! - Re-initialization with a different level or target is rejected.
//! - Initialization never panics.
//!
//! Library code only emits `event=<name> module=<module> status=<..>` lines
//! through `log`; nothing here is required for the adapter to work.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "swiftmap";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Rolling files inside an absolute directory.
    Directory(PathBuf),
}

impl LogTarget {
    /// Builds a directory target, rejecting empty or relative paths.
    pub fn directory(log_dir: &str) -> Result<Self, String> {
        let trimmed = log_dir.trim();
        if trimmed.is_empty() {
            return Err("log_dir cannot be empty".to_string());
        }
        let path = Path::new(trimmed);
        if !path.is_absolute() {
            return Err(format!("log_dir must be an absolute path, got `{trimmed}`"));
        }
        Ok(Self::Directory(path.to_path_buf()))
    }

    fn describe(&self) -> String {
        match self {
            Self::Stderr => "stderr".to_string(),
            Self::Directory(dir) => dir.display().to_string(),
        }
    }
}

struct LoggingState {
    level: &'static str,
    target: LogTarget,
    _logger: LoggerHandle,
}

/// Initializes logging with `level` (`trace|debug|info|warn|error`).
///
/// # Errors
/// - Unsupported level.
/// - Log directory cannot be created or the backend fails to start.
/// - Logging is already active with a different level or target.
pub fn init_logging(level: &str, target: LogTarget) -> Result<(), String> {
    let level = normalize_level(level)?;

    let state = LOGGING_STATE.get_or_try_init(|| start_logger(level, target.clone()))?;
    if state.target != target {
        return Err(format!(
            "logging already initialized for `{}`; refusing to switch to `{}`",
            state.target.describe(),
            target.describe()
        ));
    }
    if state.level != level {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            state.level, level
        ));
    }
    Ok(())
}

fn start_logger(level: &'static str, target: LogTarget) -> Result<LoggingState, String> {
    let logger = Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?;

    let logger = match &target {
        LogTarget::Stderr => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::detailed_format)
            .start(),
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| {
                format!("failed to create log directory `{}`: {err}", dir.display())
            })?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
                .start()
        }
    }
    .map_err(|err| format!("failed to start logger: {err}"))?;

    info!(
        "event=logging_init module=logging status=ok level={} target={} version={}",
        level,
        target.describe(),
        env!("CARGO_PKG_VERSION")
    );

    Ok(LoggingState {
        level,
        target,
        _logger: logger,
    })
}

/// Returns `(level, target)` when logging is active.
pub fn logging_status() -> Option<(&'static str, LogTarget)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.target.clone()))
}

/// `debug` in debug builds, `info` in release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, normalize_level, LogTarget};

    #[test]
    fn normalize_level_accepts_known_values() {
        assert_eq!(normalize_level("INFO").unwrap(), "info");
        assert_eq!(normalize_level(" warning ").unwrap(), "warn");
        assert!(normalize_level("verbose").is_err());
    }

    #[test]
    fn directory_target_rejects_relative_and_empty_paths() {
        assert!(LogTarget::directory("logs/dev")
            .unwrap_err()
            .contains("absolute"));
        assert!(LogTarget::directory("  ").is_err());
    }

    #[test]
    fn init_logging_is_idempotent_and_rejects_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let target = LogTarget::directory(dir.path().to_str().unwrap()).unwrap();

        init_logging("info", target.clone()).unwrap();
        init_logging("INFO", target.clone()).unwrap();

        let level_error = init_logging("debug", target.clone()).unwrap_err();
        assert!(level_error.contains("refusing to switch"));

        let target_error = init_logging("info", LogTarget::Stderr).unwrap_err();
        assert!(target_error.contains("refusing to switch"));

        assert_eq!(logging_status(), Some(("info", target)));
    }
}
