use thiserror::Error;

/// Configuration and input validation errors exposed by `adarchive-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("resource path cannot be empty")]
    EmptyPath,
    #[error("page ceiling must be at least 1")]
    ZeroPageCeiling,
    #[error("retry policy must allow at least one attempt")]
    ZeroAttempts,
    #[error("backoff factor must be a finite number of at least 1.0, found {value}")]
    InvalidBackoffFactor { value: String },
    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,
    #[error("base url must start with http:// or https://: '{value}'")]
    InvalidBaseUrl { value: String },
    #[error("column list cannot be empty")]
    EmptyColumns,
    #[error("end_time is not a recognised timestamp: '{value}'")]
    InvalidTimestamp { value: String },
    #[error("end_time must be a string, found {value}")]
    NonStringTimestamp { value: String },
}

/// Errors raised while fetching pages from the Graph API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure or non-success status without an API error body.
    #[error("upstream http error{}: {message}", status_suffix(.status))]
    Http { status: Option<u16>, message: String },

    /// The API answered with an `error` object.
    #[error("upstream api error (code {code}, type {kind}): {message}")]
    Api {
        code: i64,
        kind: String,
        message: String,
    },

    #[error("response body is not valid JSON: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("giving up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<FetchError> },
}

impl FetchError {
    pub fn http(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Default retry classifier: only upstream HTTP and API errors are transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Api { .. })
    }

    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

impl From<ValidationError> for FetchError {
    fn from(error: ValidationError) -> Self {
        Self::InvalidRequest(error.to_string())
    }
}

/// Errors raised while writing records to tabular output.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
