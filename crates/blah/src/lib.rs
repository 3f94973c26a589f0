//! # blah
//!
//! The unified API for blah identities: canonical signing, act-key
//! delegation and self-describing identity documents.
//!
//! ## Overview
//!
//! - **Signed payloads**: any serializable value, wrapped with a nonce, a
//!   timestamp and the signing keys, signed over its canonical JSON form
//! - **Act keys**: short-lived keys an identity key delegates to
//! - **Identities**: an identity key, its act keys and a signed profile,
//!   published as an identity description
//!
//! ## Usage
//!
//! ```rust
//! use blah::{ActKeyConfig, IdUrl, Identity, KeyPair, Profile, SignOptions, VerifyOptions};
//!
//! let id_key = KeyPair::generate();
//! let act_key = KeyPair::generate();
//! let profile = Profile::new("alice", IdUrl::parse("https://alice.example")?);
//!
//! let identity = Identity::create(id_key, act_key, profile, ActKeyConfig::new())?;
//! let signed = identity.sign_payload("hello", &SignOptions::new())?;
//!
//! // Anyone holding the published description can check it.
//! let reader = Identity::from_description(identity.to_description(), None, None)?;
//! assert!(reader.profile_sig_valid());
//! assert_eq!(*reader.verify_payload(&signed, &VerifyOptions::new())?, "hello");
//! # Ok::<(), blah::Error>(())
//! ```
//!
//! ## Re-exports
//!
//! - `blah::core` - canonicalization, keys, signed payloads
//! - `blah::identity` - act keys, profiles, identities

pub mod error;
pub mod rich_text;

pub use blah_core as core;
pub use blah_identity as identity;

pub use error::{Error, Result};
pub use rich_text::{to_plain_text, RichText, RichTextSpan, SpanAttributes};

pub use blah_core::{
    canonicalize, EncodedKeyPair, Key, KeyPair, PublicKey, SignOptions, SignedPayload, Signee,
    VerifyOptions,
};
pub use blah_identity::{
    identity_description_url, validate_id_url_format, AbsoluteUrl, AccessLevel, ActKey,
    ActKeyConfig, IdUrl, Identity, IdentityDescription, Profile,
};
