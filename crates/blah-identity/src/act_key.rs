//! Act keys: keys delegated by an identity key.
//!
//! ## Overview
//!
//! The identity key signs a delegation record naming the act key, an expiry
//! and a comment. Payloads signed by the act key count for the identity as
//! long as they were signed before the expiry. Expiry is judged against
//! the payload's own timestamp, so a key that expires later never
//! invalidates what it signed while it was valid.
//!
//! Records loaded from untrusted sources are kept even when their signature
//! fails; [`ActKey::is_sig_valid`] reports the outcome.

use blah_core::{
    unix_now, Key, KeyPair, PublicKey, SignOptions, SignedPayload, VerifyOptions,
};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, Result};

/// Default act key lifetime: 365 days.
pub const DEFAULT_ACT_KEY_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// Literal `typ` tag of a delegation record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActKeyRecordType {
    #[default]
    UserActKey,
}

/// The payload of a delegation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActKeyRecord {
    pub typ: ActKeyRecordType,
    /// The delegated key, as its hex id on the wire.
    pub act_key: PublicKey,
    /// Unix seconds.
    pub expire_time: i64,
    pub comment: String,
}

/// Expiry and comment for creating or updating an act key.
#[derive(Debug, Clone, Default)]
pub struct ActKeyConfig {
    /// Unix seconds.
    pub expires_at: Option<i64>,
    pub comment: Option<String>,
}

impl ActKeyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expires_at(mut self, unix_secs: i64) -> Self {
        self.expires_at = Some(unix_secs);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// A key delegated by an identity key.
#[derive(Debug, Clone)]
pub struct ActKey {
    key: Key,
    id_key: PublicKey,
    expires_at: i64,
    comment: String,
    sig_valid: bool,
    record: SignedPayload<ActKeyRecord>,
}

impl ActKey {
    /// Delegate to `key`, signing the record with the identity key pair.
    pub fn create(key: impl Into<Key>, id_key_pair: &KeyPair, config: ActKeyConfig) -> Result<Self> {
        Self::create_with(&mut OsRng, key, id_key_pair, config)
    }

    /// Like [`ActKey::create`], drawing signing randomness from `rng`.
    pub fn create_with<R: RngCore + CryptoRng>(
        rng: &mut R,
        key: impl Into<Key>,
        id_key_pair: &KeyPair,
        config: ActKeyConfig,
    ) -> Result<Self> {
        let key = key.into();
        let expires_at = config
            .expires_at
            .unwrap_or_else(|| unix_now() + DEFAULT_ACT_KEY_LIFETIME_SECS);
        let comment = config.comment.unwrap_or_default();

        let record = sign_record(rng, id_key_pair, key.public_key(), expires_at, &comment)?;
        tracing::debug!(act_key = %key.public_key().name(), expires_at, "delegated act key");

        Ok(Self {
            key,
            id_key: id_key_pair.public_key().clone(),
            expires_at,
            comment,
            sig_valid: true,
            record,
        })
    }

    /// Load a delegation record from an untrusted source.
    ///
    /// A record that fails verification against `id_key` is still loaded,
    /// with [`ActKey::is_sig_valid`] returning `false`. The only error is a
    /// `key_pair` that is not the delegated key.
    pub fn from_signed_record(
        raw: SignedPayload<ActKeyRecord>,
        id_key: &PublicKey,
        key_pair: Option<KeyPair>,
    ) -> Result<Self> {
        let sig_valid = match id_key.verify_payload(&raw, &VerifyOptions::new()) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(
                    act_key = %raw.signee.payload.act_key,
                    error = %err,
                    "delegation record failed verification"
                );
                false
            }
        };

        let record = &raw.signee.payload;
        let key = match key_pair {
            Some(kp) if kp.public_key() == &record.act_key => Key::WithPrivate(kp),
            Some(kp) => {
                return Err(IdentityError::KeyMismatch {
                    expected: record.act_key.id().to_string(),
                    actual: kp.id().to_string(),
                })
            }
            None => Key::PublicOnly(record.act_key.clone()),
        };

        Ok(Self {
            key,
            id_key: id_key.clone(),
            expires_at: record.expire_time,
            comment: record.comment.clone(),
            sig_valid,
            record: raw,
        })
    }

    pub fn id(&self) -> &str {
        self.key.id()
    }

    pub fn public_key(&self) -> &PublicKey {
        self.key.public_key()
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The identity key this act key was delegated by.
    pub fn id_key(&self) -> &PublicKey {
        &self.id_key
    }

    /// Expiry in unix seconds.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Whether the delegation record verified against the identity key.
    pub fn is_sig_valid(&self) -> bool {
        self.sig_valid
    }

    pub fn can_sign(&self) -> bool {
        self.key.can_sign()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now())
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.expires_at
    }

    /// The signed delegation record.
    pub fn signed_record(&self) -> &SignedPayload<ActKeyRecord> {
        &self.record
    }

    /// Attach the private half of this act key.
    pub fn attach_key_pair(&mut self, key_pair: KeyPair) -> Result<()> {
        if key_pair.id() != self.id() {
            return Err(IdentityError::KeyMismatch {
                expected: self.id().to_string(),
                actual: key_pair.id().to_string(),
            });
        }
        self.key = Key::WithPrivate(key_pair);
        Ok(())
    }

    /// Sign a payload on behalf of the identity.
    ///
    /// `options.identity_key_id` is always replaced by the identity key.
    pub fn sign_payload<P: Serialize>(
        &self,
        payload: P,
        options: &SignOptions,
    ) -> Result<SignedPayload<P>> {
        self.sign_payload_with(&mut OsRng, payload, options)
    }

    pub fn sign_payload_with<P: Serialize, R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        payload: P,
        options: &SignOptions,
    ) -> Result<SignedPayload<P>> {
        let key_pair = self.key.key_pair().ok_or_else(|| {
            IdentityError::Permission(format!(
                "act key {} has no private key",
                self.public_key().name()
            ))
        })?;

        let options = options.clone().with_identity_key_id(self.id_key.id());
        Ok(key_pair.sign_payload_with(rng, payload, &options)?)
    }

    /// Verify a payload signed by this act key on behalf of its identity.
    ///
    /// Rejects payloads whose timestamp is after this key's expiry.
    /// `options.identity_key_id` is always replaced by the identity key.
    pub fn verify_payload<'a, P: Serialize>(
        &self,
        signed: &'a SignedPayload<P>,
        options: &VerifyOptions,
    ) -> Result<&'a P> {
        let signed_at = signed.signee.timestamp;
        if signed_at > self.expires_at {
            return Err(IdentityError::ActKeyExpired {
                expires_at: self.expires_at,
                signed_at,
            });
        }

        let options = options.clone().with_identity_key_id(self.id_key.id());
        Ok(self.public_key().verify_payload(signed, &options)?)
    }

    /// Re-sign the delegation record with a new expiry and/or comment.
    ///
    /// Returns the replacement; the previous record is not retained. The
    /// identity key must carry its private half.
    pub fn update(&self, patch: ActKeyConfig, id_key: &Key) -> Result<Self> {
        self.update_with(&mut OsRng, patch, id_key)
    }

    pub fn update_with<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        patch: ActKeyConfig,
        id_key: &Key,
    ) -> Result<Self> {
        let id_key_pair = id_key.key_pair().ok_or_else(|| {
            IdentityError::Permission("cannot update act key without the identity key pair".into())
        })?;
        if id_key_pair.id() != self.id_key.id() {
            return Err(IdentityError::KeyMismatch {
                expected: self.id_key.id().to_string(),
                actual: id_key_pair.id().to_string(),
            });
        }

        let expires_at = patch.expires_at.unwrap_or(self.expires_at);
        let comment = patch.comment.unwrap_or_else(|| self.comment.clone());
        let record = sign_record(rng, id_key_pair, self.public_key(), expires_at, &comment)?;
        tracing::debug!(act_key = %self.public_key().name(), expires_at, "updated act key");

        Ok(Self {
            key: self.key.clone(),
            id_key: self.id_key.clone(),
            expires_at,
            comment,
            sig_valid: true,
            record,
        })
    }
}

fn sign_record<R: RngCore + CryptoRng>(
    rng: &mut R,
    id_key_pair: &KeyPair,
    act_key: &PublicKey,
    expires_at: i64,
    comment: &str,
) -> Result<SignedPayload<ActKeyRecord>> {
    let record = ActKeyRecord {
        typ: ActKeyRecordType::UserActKey,
        act_key: act_key.clone(),
        expire_time: expires_at,
        comment: comment.to_string(),
    };
    Ok(id_key_pair.sign_payload_with(rng, record, &SignOptions::new())?)
}
