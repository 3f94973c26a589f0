//! # blah identity
//!
//! Act-key delegation, profiles, identity descriptions and the
//! [`Identity`] aggregate built on [`blah_core`].
//!
//! ## Overview
//!
//! - [`ActKey`] - a key delegated by the identity key until an expiry
//! - [`Profile`] - the signed user profile
//! - [`IdentityDescription`] - the published document (`id_key`, `act_keys`, `profile`)
//! - [`Identity`] - the aggregate, with Full / Limited / Read-only access
//!
//! ## ID URLs
//!
//! Identities are discovered through ID URLs. See [`id_url`].

pub mod act_key;
pub mod description;
pub mod error;
pub mod id_url;
pub mod identity;
pub mod profile;

pub use act_key::{
    ActKey, ActKeyConfig, ActKeyRecord, ActKeyRecordType, DEFAULT_ACT_KEY_LIFETIME_SECS,
};
pub use description::IdentityDescription;
pub use error::{IdentityError, Result};
pub use id_url::{identity_description_url, validate_id_url_format, IdUrl, IDENTITY_DESCRIPTION_PATH};
pub use identity::{AccessLevel, Identity};
pub use profile::{AbsoluteUrl, Profile, ProfileType};
