use crate::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Routes tracing output to a daily log file under `config.dir`.
///
/// The terminal belongs to the UI, so nothing is written to stdout. `RUST_LOG`
/// takes precedence over `config.level`. Keep the guard alive until exit or
/// buffered lines are lost.
pub fn initialize_logging(config: &LoggingConfig) -> WorkerGuard {
    let _ = std::fs::create_dir_all(&config.dir);

    let file_appender = tracing_appender::rolling::daily(&config.dir, "skysearch.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::info!("Logging to {}/skysearch.log", config.dir);
    guard
}
