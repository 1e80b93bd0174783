//! Fetcher configuration.
//!
//! | Setting | Default | Environment |
//! |---------|---------|-------------|
//! | `base_url` | `https://graph.facebook.com` | `ADARCHIVE_BASE_URL` |
//! | `api_version` | `v21.0` | `ADARCHIVE_GRAPH_VERSION` |
//! | `access_token` | empty | `ADARCHIVE_ACCESS_TOKEN` |
//! | `timeout_ms` | `30000` | |
//! | `max_pages` | `50` | |
//! | `retry` | 10 attempts, 2s doubling, 10s cap | |

use crate::error::ValidationError;
use crate::retry::RetryConfig;

pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_API_VERSION: &str = "v21.0";
pub const DEFAULT_MAX_PAGES: usize = 50;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Settings shared by every fetch issued through a [`crate::PageFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub base_url: String,
    pub api_version: String,
    pub access_token: String,
    /// Per-request transport timeout.
    pub timeout_ms: u64,
    /// Page ceiling. A fetch stops after yielding this many non-empty pages
    /// even when the server still offers a continuation cursor.
    pub max_pages: usize,
    pub retry: RetryConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            api_version: String::from(DEFAULT_API_VERSION),
            access_token: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_pages: DEFAULT_MAX_PAGES,
            retry: RetryConfig::default(),
        }
    }
}

impl FetchConfig {
    /// Defaults overridden by `ADARCHIVE_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(token) = std::env::var("ADARCHIVE_ACCESS_TOKEN") {
            config.access_token = token;
        }
        if let Ok(version) = std::env::var("ADARCHIVE_GRAPH_VERSION") {
            config.api_version = version;
        }
        if let Ok(base_url) = std::env::var("ADARCHIVE_BASE_URL") {
            config.base_url = base_url;
        }
        config
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = access_token.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ValidationError::InvalidBaseUrl {
                value: self.base_url.clone(),
            });
        }
        if self.max_pages == 0 {
            return Err(ValidationError::ZeroPageCeiling);
        }
        if self.timeout_ms == 0 {
            return Err(ValidationError::ZeroTimeout);
        }
        self.retry.validate()
    }
}
