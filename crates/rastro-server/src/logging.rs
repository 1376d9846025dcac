//! Logging initialization.
//!
//! The node is headless and runs under systemd, so the primary sink is
//! stdout in a compact, ANSI-free format that journald captures cleanly.
//! When `[log] directory` is configured, a daily-rolling JSON file sink is
//! added for ingestion by external tooling.
//!
//! The filter comes from the `RASTRO_LOG_LEVEL` environment variable when
//! set, otherwise from `[log] level` in the node configuration.

use std::sync::OnceLock;

use rastro_core::LogConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the non-blocking file writer alive for the process lifetime.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global tracing subscriber per the node's log settings.
///
/// # Errors
///
/// Returns an error if the configured filter directive cannot be parsed
/// or the log directory cannot be created.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    let filter = filter_from(config)?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(true)
        .with_ansi(false);

    let file_layer = match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "rastro.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(tracing_subscriber::fmt::layer().json().with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(())
}

/// Build the env filter: `RASTRO_LOG_LEVEL` wins over the config value.
fn filter_from(config: &LogConfig) -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::try_from_env("RASTRO_LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new(&config.level))?)
}
