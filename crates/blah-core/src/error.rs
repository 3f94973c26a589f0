//! Error types for blah core.

use thiserror::Error;

/// Errors raised by canonicalization, key handling and the signed-payload
/// protocol.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed hex, key id or private key material.
    #[error("decode error: {0}")]
    Decode(String),

    /// The encoded key pair carries a version tag this library does not know.
    #[error("unsupported key encoding version: {0:?}")]
    UnsupportedVersion(String),

    /// A required option is missing or out of range.
    #[error("configuration error: {0}")]
    Config(String),

    /// AEAD unwrap failed. Wrong password and corrupted ciphertext are
    /// reported identically.
    #[error("failed to decrypt private key")]
    Decryption,

    /// Sealing the private key failed.
    #[error("failed to encrypt private key")]
    Encryption,

    /// The private key is held as non-extractable and cannot be encoded.
    #[error("private key is not extractable")]
    NotExtractable,

    /// `id_key` / `act_key` do not line up with the verifying key or the
    /// expected identity.
    #[error("signing identity mismatch: {0}")]
    SigningIdentityMismatch(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("proof-of-work not met for difficulty {difficulty}")]
    ProofOfWorkUnmet { difficulty: u32 },

    /// The document shape was rejected (missing, extra or mistyped fields).
    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    /// The value cannot be represented canonically (non-finite number,
    /// non-string map key).
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
