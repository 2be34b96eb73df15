//! Error types for newsbrief
//!
//! Every stage of the pipeline reports failures through [`Error`]:
//! - [`Error::Config`] for missing or invalid configuration (never retried)
//! - [`Error::Network`] once the HTTP layer has given up on a request
//! - [`Error::ResponseShape`] when an upstream service answers with an unexpected document
//! - [`Error::Storage`] once the persistence layer has given up on a run
//!
//! Whether a failure is worth another attempt is decided by
//! [`IsRetryable`](crate::retry::IsRetryable), not by the call sites.

use thiserror::Error;

/// Result type alias for newsbrief operations
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum number of payload characters kept on a [`Error::ResponseShape`]
pub const PAYLOAD_SNIPPET_CHARS: usize = 500;

/// Main error type for newsbrief
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is missing or invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "NEWS_API_KEY")
        key: Option<String>,
    },

    /// Outbound HTTP request failed
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// An upstream service returned a document without the expected structure
    #[error("unexpected response shape: {message}")]
    ResponseShape {
        /// What was missing or malformed
        message: String,
        /// The raw payload, truncated to [`PAYLOAD_SNIPPET_CHARS`] characters
        payload: String,
    },

    /// Persistence failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// HTTP-level failures
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Request URL (without query string)
        url: String,
        /// Response body, truncated to [`PAYLOAD_SNIPPET_CHARS`] characters
        body: String,
    },

    /// The request never produced a response (connect failure, timeout, reset)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Persistence-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// No connection string configured
    #[error("no database connection string configured")]
    MissingConnection,

    /// Database driver or query error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An article's raw document could not be encoded for storage
    #[error("failed to encode article {id}: {source}")]
    Encode {
        /// The article whose raw document failed to encode
        id: String,
        /// Underlying serializer error
        source: serde_json::Error,
    },
}

impl Error {
    /// Shorthand for a configuration error naming the offending key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Build a [`Error::ResponseShape`] keeping only the head of the payload
    pub fn response_shape(message: impl Into<String>, payload: &str) -> Self {
        Error::ResponseShape {
            message: message.into(),
            payload: truncate_chars(payload, PAYLOAD_SNIPPET_CHARS),
        }
    }
}

/// Truncate to at most `max` characters without splitting a UTF-8 sequence
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
