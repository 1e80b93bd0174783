use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] adarchive_core::ValidationError),

    #[error(transparent)]
    Fetch(#[from] adarchive_core::FetchError),

    #[error(transparent)]
    Export(#[from] adarchive_core::ExportError),

    #[error("missing access token: pass --access-token or set ADARCHIVE_ACCESS_TOKEN")]
    MissingAccessToken,

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::MissingAccessToken => 2,
            Self::Fetch(_) => 3,
            Self::Export(adarchive_core::ExportError::Fetch(_)) => 3,
            Self::Export(_) => 4,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
