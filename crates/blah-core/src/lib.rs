//! # blah core
//!
//! Cryptographic primitives for blah identities: canonicalization, Ed25519
//! keys, password-protected key storage and the signed-payload protocol.
//!
//! This crate does no I/O. Randomness is drawn from the operating system by
//! default, and every randomized operation has a `*_with` form taking an
//! explicit RNG.
//!
//! ## Key Types
//!
//! - [`KeyPair`] / [`PublicKey`] - Ed25519 keys identified by their hex public key
//! - [`Key`] - a key that is public-only or carries its private half
//! - [`SignedPayload`] / [`Signee`] - the signed envelope around any payload
//! - [`EncodedKeyPair`] - storage form of a key pair
//!
//! ## Canonicalization
//!
//! Signatures are always made over canonical JSON. See [`canonical`].

pub mod canonical;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod pow;
pub mod schema;
pub mod signed;

pub use canonical::{canonical_bytes, canonicalize, canonicalize_value};
pub use crypto::{Key, KeyPair, PublicKey, KEY_ID_LEN};
pub use encoding::{EncodedKeyPair, EncodedPrivateKey, KEY_ENCODING_VERSION, PBKDF2_ITERATIONS};
pub use error::{CoreError, Result};
pub use pow::MAX_POW_DIFFICULTY;
pub use signed::{
    sign_payload, unix_now, verify_from_signer, verify_payload, SignOptions, SignedPayload,
    Signee, VerifyOptions,
};
