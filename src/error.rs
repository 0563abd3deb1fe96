//! Custom error types for docqa

use serde::Serialize;
use thiserror::Error;

/// Main error type for docqa operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Setup error: {0}")]
    Setup(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedInput(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Qdrant error: {0}")]
    Qdrant(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Coarse classification of an [`Error`], used by callers to decide
/// whether a batch can continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Setup,
    Config,
    UnsupportedInput,
    Extraction,
    Store,
    Generation,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Setup(_) => ErrorKind::Setup,
            Error::Config(_) | Error::UrlParse(_) | Error::TomlParse(_) => ErrorKind::Config,
            Error::UnsupportedInput(_) => ErrorKind::UnsupportedInput,
            Error::Extraction(_) => ErrorKind::Extraction,
            Error::Embedding(_)
            | Error::Store(_)
            | Error::Qdrant(_)
            | Error::Database(_)
            | Error::Json(_) => ErrorKind::Store,
            Error::Generation(_) => ErrorKind::Generation,
            Error::Io(_) | Error::Http(_) => ErrorKind::Io,
        }
    }

    /// Setup and configuration failures end the session; everything else is
    /// reported and the next action may proceed.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Setup | ErrorKind::Config)
    }
}

/// Result type alias for docqa
pub type Result<T> = std::result::Result<T, Error>;

/// Convert qdrant errors
impl From<qdrant_client::QdrantError> for Error {
    fn from(err: qdrant_client::QdrantError) -> Self {
        Error::Qdrant(err.to_string())
    }
}
