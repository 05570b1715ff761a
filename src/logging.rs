//! Structured logging via the tracing crate.
//!
//! Writes to daily-rotated log files under the XDG state directory and never
//! to the terminal, so log output cannot interleave with recording prompts
//! or piped command output. Old log files are pruned at startup, keeping the
//! 7 most recent days.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::rolling;
use tracing_subscriber::prelude::*;

/// Keeps the non-blocking appender alive for the program lifetime.
static APPENDER_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

const MAX_LOG_FILES: usize = 7;

/// Initializes file-based logging.
///
/// Log level is controlled by the RUST_LOG environment variable and defaults
/// to "info".
///
/// # Errors
/// - If the log directory cannot be determined or created
/// - If logging was already initialized
pub fn init_logging() -> anyhow::Result<()> {
    let log_dir = log_dir()?;

    if let Err(e) = prune_old_logs(&log_dir) {
        eprintln!("Warning: failed to clean up old logs: {e}");
    }

    let file_appender = rolling::daily(&log_dir, "lingo.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    APPENDER_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Logging already initialized"))?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_level(true)
                .with_ansi(false),
        )
        .init();

    tracing::debug!("Logging initialized. Log directory: {}", log_dir.display());
    Ok(())
}

/// Log directory per the XDG Base Directory Specification:
/// `$XDG_STATE_HOME/lingo`, falling back to `~/.local/state/lingo`.
pub fn log_dir() -> anyhow::Result<PathBuf> {
    let log_dir = if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        PathBuf::from(xdg_state).join("lingo")
    } else {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        home.join(".local/state/lingo")
    };

    fs::create_dir_all(&log_dir)?;
    Ok(log_dir)
}

/// Deletes dated log files beyond the newest [`MAX_LOG_FILES`].
fn prune_old_logs(log_dir: &Path) -> anyhow::Result<()> {
    let mut dated_logs: Vec<(PathBuf, std::time::SystemTime)> = fs::read_dir(log_dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let name = path.file_name()?.to_string_lossy().to_string();
            // Only dated rotations: lingo.log.YYYY-MM-DD
            if !name.starts_with("lingo.log.") || name.matches('-').count() != 2 {
                return None;
            }
            let modified = fs::metadata(&path).ok()?.modified().ok()?;
            Some((path, modified))
        })
        .collect();

    dated_logs.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in dated_logs.iter().skip(MAX_LOG_FILES) {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Failed to delete old log file {}: {e}", path.display());
        }
    }

    Ok(())
}
