//! File logging.
//!
//! The terminal belongs to the TUI, so `tracing` output goes to a daily
//! rotated file instead of stderr.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;

const LOG_FILE_PREFIX: &str = "mymusic.log";

/// Install the global subscriber writing to `dir/mymusic.log.YYYY-MM-DD`.
///
/// `RUST_LOG` takes precedence over `settings.filter`. The returned guard
/// flushes pending lines on drop and must be held until exit.
pub fn init(dir: &Path, settings: &LoggingSettings) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("mymusic=info,warn"));

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();

    tracing::info!(dir = %dir.display(), "logging initialized");
    Ok(guard)
}
