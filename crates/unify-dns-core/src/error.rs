//! Error types for the record provider
//!
//! The taxonomy mirrors what the provider runtime needs to decide between
//! local recovery (retry) and surfacing to the host engine.

use thiserror::Error;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the record provider
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed desired state, detected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication or permission failure (401/403); never retried
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Record absent on the controller (404); an absence value on
    /// read/delete, an error everywhere else
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Create collided with an existing, divergent record; requires
    /// operator resolution, never auto-merged
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Timeout, connection reset, 5xx or rate limit; retried with backoff
    #[error("Transient error: {0}")]
    Transient(String),

    /// Controller API misbehavior (unexpected status or payload shape)
    #[error("Controller API error: {0}")]
    Api(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation cancelled by the caller before completion
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a transient error
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Create a controller API error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Whether the retry loop may attempt this operation again
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Whether this error signals remote absence rather than failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Helper for converting anyhow::Error at integration seams
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Api(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(Error::transient("timeout").is_transient());
        assert!(!Error::auth("bad token").is_transient());
        assert!(!Error::conflict("divergent record").is_transient());
        assert!(!Error::validation("bad name").is_transient());
        assert!(!Error::cancelled("deadline").is_transient());
    }

    #[test]
    fn not_found_classification() {
        assert!(Error::not_found("gone").is_not_found());
        assert!(!Error::transient("502").is_not_found());
    }
}
