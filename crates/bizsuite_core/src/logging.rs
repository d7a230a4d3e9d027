//! Process-wide logging for the host core.
//!
//! Log lines are metadata-only key-value records
//! (`event=<name> module=<area> status=<ok|error|skip> ...`). Tenant business
//! data never appears in them beyond ids.
//!
//! # Invariants
//! - The file logger starts at most once; repeating the same configuration is
//!   a no-op and a different configuration is rejected.
//! - Starting the logger never panics.

use crate::config::CoreConfig;
use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "bizsuite";
const ROTATE_AT_BYTES: u64 = 8 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 7;
const PANIC_TEXT_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    level: &'static str,
    dir: PathBuf,
    _handle: LoggerHandle,
}

/// Starts rolling file logs under `log_dir` at `level`.
///
/// Warnings and errors are also copied to stderr so listener faults show up
/// when the host runs in a terminal.
///
/// # Errors
/// Unknown level, empty or relative directory, a directory that cannot be
/// created, a conflicting earlier initialisation, or a backend start failure.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let level = normalize_level(level)?;
    let dir = absolute_dir(log_dir)?;
    let active = ACTIVE.get_or_try_init(|| start(level, &dir))?;
    ensure_matches(active, level, &dir)
}

/// Starts logging from configuration. Returns `false` when no log directory
/// is configured, in which case log macros stay no-ops.
pub fn init_logging_from(config: &CoreConfig) -> Result<bool, String> {
    match &config.log_dir {
        Some(dir) => {
            init_logging(&config.log_level, &dir.to_string_lossy())?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// `(level, directory)` of the running logger, if any.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE.get().map(|active| (active.level, active.dir.clone()))
}

pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Canonical level name for `level`, accepting `warning` as `warn`.
pub(crate) fn normalize_level(level: &str) -> Result<&'static str, String> {
    let canonical = match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        other => {
            return Err(format!(
                "unsupported log level `{other}`; expected trace|debug|info|warn|error"
            ))
        }
    };
    Ok(canonical)
}

/// One-line, length-capped form of untrusted text.
pub(crate) fn sanitize_message(value: &str, max_chars: usize) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut capped: String = flat.chars().take(max_chars).collect();
    capped.push_str("...");
    capped
}

/// Text of a panic payload, sanitised for logs and fault reports.
pub(crate) fn panic_payload_text(payload: &(dyn Any + Send)) -> String {
    let raw = payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    sanitize_message(&raw, PANIC_TEXT_LIMIT)
}

fn absolute_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    let dir = PathBuf::from(trimmed);
    if dir.is_relative() {
        return Err(format!("log_dir must be an absolute path, got `{trimmed}`"));
    }
    Ok(dir)
}

fn start(level: &'static str, dir: &Path) -> Result<ActiveLogger, String> {
    std::fs::create_dir_all(dir)
        .map_err(|err| format!("failed to create log directory `{}`: {err}", dir.display()))?;

    let handle = Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?
        .log_to_file(FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME))
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    install_panic_hook();
    info!(
        "event=logging_start module=core status=ok version={} level={} log_dir={}",
        env!("CARGO_PKG_VERSION"),
        level,
        dir.display()
    );

    Ok(ActiveLogger {
        level,
        dir: dir.to_path_buf(),
        _handle: handle,
    })
}

fn ensure_matches(active: &ActiveLogger, level: &str, dir: &Path) -> Result<(), String> {
    if active.dir != dir {
        return Err(format!(
            "logging already initialized at `{}`; refusing to switch to `{}`",
            active.dir.display(),
            dir.display()
        ));
    }
    if active.level != level {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            active.level, level
        ));
    }
    Ok(())
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location,
            panic_payload_text(panic_info.payload())
        );
        previous(panic_info);
    }));
}
