//! Error types for Team Pulse.
//!
//! Aggregation itself never fails; only the edges do (configuration,
//! task sources, HTTP request parsing).

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Task source error: {0}")]
    Source(#[from] SourceError),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised while loading a task feed.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("Malformed task feed: {0}")]
    Parse(String),
}

/// Errors in an incoming pulse query.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },
}

/// Result type alias for Team Pulse.
pub type Result<T> = std::result::Result<T, Error>;
