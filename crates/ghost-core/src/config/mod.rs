//! Client configuration.
//!
//! The API origin is supplied externally (`GHOST_API_BASE_URL`) and falls back
//! to the hosted development backend when unset.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Origin used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://dev.api.ghosttransfer.tech";

/// Environment variable overriding the API origin.
pub const API_BASE_URL_ENV: &str = "GHOST_API_BASE_URL";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Resolved settings for talking to the Ghost API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Normalized API origin without trailing slash
    pub api_base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Value of the `public` flag sent with every upload
    pub public_uploads: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            public_uploads: false,
        }
    }
}

impl ClientConfig {
    /// Default configuration with the origin taken from the environment.
    pub fn from_env() -> Result<Self> {
        let base_url = resolve_api_base_url(None, std::env::var(API_BASE_URL_ENV).ok(), None)?;
        Ok(Self {
            api_base_url: base_url,
            ..Self::default()
        })
    }

    /// Replace the API origin, normalizing and validating it.
    pub fn with_api_base_url(mut self, base_url: impl Into<String>) -> Result<Self> {
        self.api_base_url = normalize_base_url(&base_url.into())?;
        Ok(self)
    }

    #[must_use]
    pub const fn with_public_uploads(mut self, public_uploads: bool) -> Self {
        self.public_uploads = public_uploads;
        self
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Pick the API origin: explicit value, then environment, then profile, then
/// [`DEFAULT_API_BASE_URL`].
pub fn resolve_api_base_url(
    explicit: Option<String>,
    env_value: Option<String>,
    profile_value: Option<String>,
) -> Result<String> {
    let chosen = normalize_text_option(explicit)
        .or_else(|| normalize_text_option(env_value))
        .or_else(|| normalize_text_option(profile_value));
    match chosen {
        Some(url) => normalize_base_url(&url),
        None => Ok(DEFAULT_API_BASE_URL.to_string()),
    }
}

/// Trim whitespace and trailing slashes, requiring an http(s) scheme.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let base = raw.trim().trim_end_matches('/').to_string();
    if base.is_empty() {
        return Err(Error::Config("API base URL must not be empty".to_string()));
    }
    if !is_http_url(&base) {
        return Err(Error::Config(
            "API base URL must include http:// or https://".to_string(),
        ));
    }
    Ok(base)
}
