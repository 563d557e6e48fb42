//! Logging setup for the agent
//!
//! Console output plus a daily rolling log file under the configured log
//! folder. The file is the local record of every step report the agent
//! produces, delivered or not.

use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_FILE: &str = "courier-agent.log";

/// Keeps the file writer alive; dropping it flushes and closes the log file
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Installs the global subscriber with console and file layers
pub fn init_logging(log_dir: &Path) -> Result<LoggingGuard, io::Error> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stdout_layer = tracing_subscriber::fmt::layer().with_writer(io::stdout);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier_agent=info,courier_client=info".into()),
        )
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
