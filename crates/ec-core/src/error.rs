//! Error types for the provider resources
//!
//! This module defines all error types used throughout the crate.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the provider resources
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed user input (JSON, identifiers, durations)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Remote object not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote API returned an error
    #[error("API error ({service}): {message}")]
    Api {
        /// Remote service name
        service: String,
        /// Error message
        message: String,
    },

    /// A business rule of the remote service rejected the request
    #[error("{0}")]
    Rejected(String),

    /// Polling gave up after the deadline elapsed
    #[error("timeout while waiting after {timeout:?} ({attempts} attempt(s)): {last_condition}")]
    Timeout {
        /// Configured wait timeout
        timeout: Duration,
        /// Number of attempts made
        attempts: u32,
        /// Last observed retry condition
        last_condition: String,
    },

    /// Polling was cancelled by the host
    #[error("cancelled after {attempts} attempt(s): {last_condition}")]
    Cancelled {
        /// Number of attempts made
        attempts: u32,
        /// Last observed retry condition
        last_condition: String,
    },

    /// Error wrapped with the name of the stage that failed
    #[error("{operation}: {source}")]
    Context {
        /// Failing operation or stage
        operation: &'static str,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a remote API error
    pub fn api(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a business-rule rejection
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Wrap this error with the name of the failing operation
    pub fn context(self, operation: &'static str) -> Self {
        Self::Context {
            operation,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping any `Context` wrappers
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Extension for attaching operation context to results
pub trait ResultExt<T> {
    /// Wrap the error, if any, with the failing operation name
    fn context(self, operation: &'static str) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, operation: &'static str) -> Result<T> {
        self.map_err(|e| e.into().context(operation))
    }
}
