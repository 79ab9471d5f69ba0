//! Error type definitions for the playlist synchronization engine
//!
//! Only two kinds of failure ever reach a caller: a sync started with no
//! sources, and a feed request made before anything has been committed.
//! Everything else is a collaborator failure that the engine folds into a
//! fallback value, but the types below still carry those failures up to the
//! point where they are folded so the fallback decision stays explicit.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// `sync` was invoked with an empty source list
    #[error("No sources configured: add at least one playlist URL before syncing")]
    NoSourcesConfigured,

    /// No committed state yet, or the committed state has no entries
    #[error("Nothing available yet: no playlist has been synced")]
    NothingAvailable,

    /// Source handling errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// External service errors
    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a single call against an external source
#[derive(Error, Debug)]
pub enum SourceError {
    /// Network timeouts
    #[error("Connection timeout: {url}")]
    Timeout { url: String },

    /// Non-success HTTP status from an external source
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// Parsing errors for source data
    #[error("Parse error: {source_type} - {message}")]
    ParseError {
        source_type: String,
        message: String,
    },
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an external service error
    pub fn external_service<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a source parse error
    pub fn parse_error<S: Into<String>, M: Into<String>>(source_type: S, message: M) -> Self {
        Self::Source(SourceError::ParseError {
            source_type: source_type.into(),
            message: message.into(),
        })
    }

    /// Create an HTTP status error
    pub fn http_status<M: Into<String>>(status: u16, message: M) -> Self {
        Self::Source(SourceError::Http {
            status,
            message: message.into(),
        })
    }

    /// Whether this error is a caller-visible precondition failure rather
    /// than a transient collaborator failure
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::NoSourcesConfigured | Self::NothingAvailable)
    }
}
