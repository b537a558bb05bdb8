//! Logging configuration using tracing
//!
//! Trigger invocations run unattended, so besides stderr every process
//! appends to a daily-rotated file under `<data_dir>/logs/`.

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use versegate_core::storage::data_dir;
use versegate_core::Config;

/// Initialize the logging subsystem
///
/// Log level is controlled by the `VERSEGATE_LOG` environment variable.
///
/// # Examples
/// ```bash
/// VERSEGATE_LOG=debug versegate-cli trigger tick
/// ```
pub fn init(config: &Config) {
    let env_filter = EnvFilter::try_from_env("VERSEGATE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("versegate_core=info,versegate_cli=info,warn"));

    let file_layer = if config.logging.file_logging {
        log_directory().map(|dir| {
            fmt::layer()
                .with_writer(RollingFileAppender::new(
                    Rotation::DAILY,
                    dir,
                    "versegate.log",
                ))
                .with_ansi(false)
                .with_target(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                ))
        })
    } else {
        None
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
}

fn log_directory() -> Option<PathBuf> {
    let dir = data_dir().ok()?.join("logs");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}
