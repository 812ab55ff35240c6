use std::env;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

pub const BACKEND_URL_VAR: &str = "LOAN_CALCULATOR_BACKEND_URL";
pub const LOG_FILE_VAR: &str = "LOAN_CALCULATOR_LOG";
pub const LOG_LEVEL_VAR: &str = "LOAN_CALCULATOR_LOG_LEVEL";

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_LOG_FILE: &str = "loan-calculator.log";
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Backend URL baked in when the binary was built, if any.
const BUILD_BACKEND_URL: Option<&str> = option_env!("LOAN_CALCULATOR_BACKEND_URL");

/// Values supplied on the command line. They win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend_url: Option<String>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend_url: Url,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub file: PathBuf,
    pub level: String,
}

impl AppConfig {
    pub fn load(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::resolve(overrides, |key| env::var(key).ok())
    }

    /// Resolves settings from `overrides`, then `lookup`, then build-time and
    /// built-in defaults. Blank values count as unset.
    pub fn resolve<F>(overrides: ConfigOverrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend_url = overrides
            .backend_url
            .or_else(|| lookup(BACKEND_URL_VAR))
            .or_else(|| BUILD_BACKEND_URL.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let file = overrides
            .log_file
            .or_else(|| lookup(LOG_FILE_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
        let level = overrides
            .log_level
            .or_else(|| lookup(LOG_LEVEL_VAR))
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            backend_url: parse_backend_url(&backend_url)?,
            logging: LoggingConfig { file, level },
        })
    }
}

pub fn parse_backend_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidBackendUrl {
        value: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::UnsupportedScheme(scheme.to_string())),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("LOAN_CALCULATOR_BACKEND_URL must be an absolute URL, got '{value}': {source}")]
    InvalidBackendUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("backend URL scheme must be http or https, got '{0}'")]
    UnsupportedScheme(String),
}
