//! Error types for identities and delegation.

use blah_core::CoreError;
use thiserror::Error;

/// Errors that can occur while managing identities and act keys.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// A mutating operation needs a private key that is not held.
    #[error("permission denied: {0}")]
    Permission(String),

    /// A supplied key pair does not match the key it stands in for.
    #[error("key mismatch: expected {expected}, got {actual}")]
    KeyMismatch { expected: String, actual: String },

    #[error("act key not found: {0}")]
    ActKeyNotFound(String),

    /// The payload was signed after the act key expired.
    #[error("act key expired at {expires_at}, payload signed at {signed_at}")]
    ActKeyExpired { expires_at: i64, signed_at: i64 },

    /// The signing act key is unknown to the identity or its delegation
    /// record did not verify.
    #[error("untrusted act key: {0}")]
    UntrustedActKey(String),

    #[error("invalid ID URL: {0}")]
    InvalidIdUrl(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for identity operations.
pub type Result<T> = std::result::Result<T, IdentityError>;
