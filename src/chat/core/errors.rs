//! Error types for the chat relay.

use thiserror::Error;

/// Chat relay error type.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A stored document could not be read or written.
    #[error("store error: {0}")]
    Store(String),
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// HTTP transport error talking to the completion service.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Completion service answered with a non-success status.
    #[error("completion service returned status {status}: {body}")]
    CompletionStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the service.
        body: String,
    },
    /// HTTP client error from Rig.
    #[error("http client error: {0}")]
    HttpClient(#[from] rig::http_client::Error),
    /// Completion error from Rig.
    #[error("completion error: {0}")]
    Completion(#[from] rig::completion::CompletionError),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for chat relay operations.
pub type ChatResult<T> = Result<T, ChatError>;
