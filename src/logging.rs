//! Tracing setup for hosts embedding the engine.
//!
//! Stdout always; a daily-rolling file under `LOG_DIR` when `ENABLE_FILE_LOGS` is set.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::DrillConfig;

const LOG_FILE_PREFIX: &str = "sumdrill.log";

/// Keeps the background file writer alive. Drop it last.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

fn flag_enabled(value: Option<&str>) -> bool {
    matches!(value, Some("true") | Some("1"))
}

pub fn file_logging_enabled() -> bool {
    flag_enabled(std::env::var("ENABLE_FILE_LOGS").ok().as_deref())
}

/// Installs the global subscriber with the filter from `config.log_level`.
pub fn init_from_config(config: &DrillConfig) -> Option<FileLogGuard> {
    init_tracing(&config.log_level)
}

/// Installs the global subscriber. A second call leaves the first subscriber in place.
pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);

    if file_logging_enabled() {
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
        if let Err(err) = std::fs::create_dir_all(&log_dir) {
            eprintln!("failed to create log directory {log_dir}: {err}");
        } else {
            let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true);

            let installed = tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer)
                .try_init();
            if installed.is_err() {
                return None;
            }
            return Some(FileLogGuard { _guard: guard });
        }
    }

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
    {
        tracing::debug!(error = %err, "tracing already initialised");
    }
    None
}
