//! The identity description document.
//!
//! This is the published, self-contained form of an identity:
//!
//! ```text
//! { "id_key": "<hex>", "act_keys": [SignedPayload<ActKeyRecord>, ...], "profile": SignedPayload<Profile> }
//! ```
//!
//! Parsing here only checks shape. Signatures are checked when the document
//! is turned into an [`Identity`](crate::Identity).

use blah_core::schema::{self, non_empty};
use blah_core::{CoreError, PublicKey, SignedPayload};
use serde::{Deserialize, Serialize};

use crate::act_key::ActKeyRecord;
use crate::error::Result;
use crate::profile::Profile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityDescription {
    /// The identity key, as its hex id on the wire.
    pub id_key: PublicKey,
    /// Delegation records, at least one.
    #[serde(deserialize_with = "non_empty")]
    pub act_keys: Vec<SignedPayload<ActKeyRecord>>,
    pub profile: SignedPayload<Profile>,
}

impl IdentityDescription {
    /// Validate the shape of an untrusted JSON value.
    pub fn parse(value: serde_json::Value) -> Result<Self> {
        Ok(schema::parse(value)?)
    }

    /// Validate the shape of untrusted JSON text.
    pub fn parse_str(json: &str) -> Result<Self> {
        Ok(schema::parse_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| CoreError::SchemaValidation(e.to_string()).into())
    }
}
