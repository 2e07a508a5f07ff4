//! Tracing initialisation.
//!
//! Logs always go to stderr. When `logging.log_dir` is set they are also
//! written to a daily rolling file through a non-blocking writer; keep the
//! returned [`WorkerGuard`] alive or buffered lines are lost on exit.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;
use crate::error::{HostError, Result};

/// `RUST_LOG` wins over the configured filter.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`HostError::Io`] if the log directory cannot be created and
/// [`HostError::Config`] if a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| HostError::Config(format!("tracing already initialised: {e}")))?;

    tracing::debug!(
        filter = %config.filter,
        log_dir = ?config.log_dir,
        "logging initialised"
    );
    Ok(guard)
}
