//! Error types for vault client operations.
//!
//! Authentication and request errors carry a retryability
//! classification which helps callers decide whether to retry
//! failed operations.

use thiserror::Error;

/// Errors produced while acquiring an authorization token.
///
/// Cloneable so a single refresh outcome can be handed to every
/// caller awaiting the same in-flight authentication.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Credentials rejected by the vault
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Transient network or server failure during authentication
    #[error("authentication unavailable: {0}")]
    Transient(String),

    /// Token envelope did not match the protocol version's wire shape
    #[error("authentication protocol error: {0}")]
    Protocol(String),
}

impl AuthError {
    /// Check if the failure may succeed on retry.
    ///
    /// Rejected credentials are never retryable; silently retrying
    /// them risks lockout policies on the vault side.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Create an invalid credentials error.
    #[must_use]
    pub fn invalid_credentials(msg: impl Into<String>) -> Self {
        Self::InvalidCredentials(msg.into())
    }

    /// Create a transient error.
    #[must_use]
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Create a protocol error.
    #[must_use]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}

/// Errors surfaced by authenticated request dispatch.
#[derive(Error, Debug)]
pub enum RequestError {
    /// No authorization token could be obtained
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] AuthError),

    /// The vault rejected the attached token twice in a row
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Retry budget exhausted against an unavailable vault
    #[error("vault unavailable: {0}")]
    Unavailable(String),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation not exposed by the configured protocol version
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Response did not match the protocol
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invalid input provided by the caller
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl RequestError {
    /// Check if the failure may succeed on retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Create a forbidden error.
    #[must_use]
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an unsupported operation error.
    #[must_use]
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    /// Create a protocol error.
    #[must_use]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Errors raised while constructing a client.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration field is missing
    #[error("missing configuration field: {0}")]
    MissingField(&'static str),

    /// The appliance URL could not be parsed
    #[error("invalid appliance URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS certificate material was rejected
    #[error("invalid certificate material: {0}")]
    InvalidCertificate(String),

    /// The HTTP client could not be built
    #[error("HTTP client construction failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for vault client operations.
pub type ApiResult<T> = Result<T, RequestError>;
