use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "MIA_CHAT_LOG";

pub fn default_log_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("mia-chat").join("logs"))
}

/// Sends `tracing` output to a daily rolling file; the terminal belongs to the UI.
///
/// Returns `None` when no log directory can be created. Keep the guard alive
/// for as long as events should be flushed.
pub fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let dir = log_dir.or_else(default_log_dir)?;
    std::fs::create_dir_all(&dir).ok()?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("mia_chat=info"));
    let appender = tracing_appender::rolling::daily(&dir, "mia-chat.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();

    Some(guard)
}
