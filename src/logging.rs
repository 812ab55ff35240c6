use crate::config::LoggingConfig;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid log filter '{directive}': {source}")]
    Filter {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("logging already initialized")]
    AlreadyInitialized,
}

/// `RUST_LOG` wins when set; otherwise the configured level is used.
pub fn make_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|source| LoggingError::Filter {
        directive: level.to_string(),
        source,
    })
}

/// Installs the global subscriber. Records go to the log file only, since the
/// terminal belongs to the form while the app runs.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(&config.file)
        .map_err(|source| LoggingError::Open {
            path: config.file.clone(),
            source,
        })?;
    let filter = make_filter(&config.level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)
}
