//! Error types for the unified API.

use blah_core::CoreError;
use blah_identity::IdentityError;
use thiserror::Error;

/// Errors that can occur anywhere in blah.
#[derive(Debug, Error)]
pub enum Error {
    /// Canonicalization, key or signed-payload error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Delegation or identity error.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
}

impl Error {
    /// The underlying core error, whichever layer raised it.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            Error::Core(e) | Error::Identity(IdentityError::Core(e)) => Some(e),
            Error::Identity(_) => None,
        }
    }
}

/// Result type for blah operations.
pub type Result<T> = std::result::Result<T, Error>;
