//! Client configuration: credentials plus the few knobs the engine exposes.
//!
//! A [`Config`] is built explicitly and handed to [`crate::YouTube`]; there is no
//! process-wide credential state. For convenience it can be read from a TOML file:
//!
//! ```toml
//! [youtube]
//! developer_key = "AIza..."
//! # optional
//! base_url = "https://www.googleapis.com/youtube/v3"
//! max_batch_size = 50
//! page_size = 50
//! timeout_secs = 30
//! ```
//!
//! or from the `YOUTUBE_API_KEY` environment variable.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// The most ids a single `*.list` request may carry, and the largest `maxResults`.
pub const API_MAX_BATCH: usize = 50;

/// Environment variable consulted by [`Config::from_env`].
pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// How requests are authenticated.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Developer key, sent as the `key` query parameter.
    ApiKey(String),
    /// OAuth 2.0 access token, sent as `Authorization: Bearer`. Obtaining and refreshing it
    /// is the caller's business.
    BearerToken(String),
}

// Keep secrets out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::BearerToken(_) => f.write_str("BearerToken(<redacted>)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Identifiers per lookup request. Clamped to `1..=50` by [`Config::max_batch_size`].
    pub max_batch_size: usize,
    /// Default `maxResults` for paginated requests.
    pub page_size: u32,
    /// Per-request timeout handed to the HTTP client. `None` means no timeout.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Config {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_batch_size: API_MAX_BATCH,
            page_size: 50,
            timeout: Some(Duration::from_secs(30)),
            user_agent: concat!("youtube-data/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self::new(Credentials::ApiKey(key.into()))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Reads the developer key from [`API_KEY_ENV`].
    pub fn from_env() -> Result<Self> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::with_api_key(key.trim())),
            _ => Err(Error::Config(format!("{API_KEY_ENV} is not set"))),
        }
    }

    /// Reads a TOML configuration file (see the module docs for the format).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml(&raw).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
        let section = file.youtube;

        let credentials = match (section.developer_key, section.access_token) {
            (Some(key), None) => Credentials::ApiKey(key),
            (None, Some(token)) => Credentials::BearerToken(token),
            (Some(_), Some(_)) => {
                return Err(Error::Config(
                    "set either developer_key or access_token, not both".into(),
                ));
            }
            (None, None) => {
                return Err(Error::Config(
                    "missing [youtube] developer_key or access_token".into(),
                ));
            }
        };

        let mut config = Self::new(credentials);
        if let Some(base_url) = section.base_url {
            config.base_url = base_url;
        }
        if let Some(max_batch_size) = section.max_batch_size {
            config.max_batch_size = max_batch_size;
        }
        if let Some(page_size) = section.page_size {
            config.page_size = page_size;
        }
        if let Some(timeout_secs) = section.timeout_secs {
            config.timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));
        }
        Ok(config)
    }

    /// The batch size actually used: at least one, at most what the API accepts.
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size.clamp(1, API_MAX_BATCH)
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    youtube: YouTubeSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct YouTubeSection {
    developer_key: Option<String>,
    access_token: Option<String>,
    base_url: Option<String>,
    max_batch_size: Option<usize>,
    page_size: Option<u32>,
    timeout_secs: Option<u64>,
}
