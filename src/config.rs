//! Runtime configuration derived from the command line.

use crate::cli::Cli;
use crate::controllers::news::DEFAULT_REFRESH_DELAY;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API URL {url:?}: {source}")]
    InvalidApiUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("API URL must use http or https, got {0:?}")]
    UnsupportedScheme(String),
    #[error("request timeout must be at least one second")]
    ZeroTimeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, normalized to end with `/`.
    pub api_base_url: Url,
    pub refresh_delay: Duration,
    pub request_timeout: Duration,
    pub dark_mode: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse("http://localhost:8080/").expect("static URL"),
            refresh_delay: DEFAULT_REFRESH_DELAY,
            request_timeout: Duration::from_secs(20),
            dark_mode: false,
        }
    }
}

impl ClientConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        if cli.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self {
            api_base_url: parse_base_url(&cli.api_url)?,
            refresh_delay: Duration::from_millis(cli.refresh_delay_ms),
            request_timeout: Duration::from_secs(cli.request_timeout_secs),
            dark_mode: cli.dark_mode,
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidApiUrl {
        url: raw.to_string(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
    }
    // Endpoints are joined relative to the base, so keep any path prefix.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
