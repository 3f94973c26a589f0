//! The identity aggregate.
//!
//! An [`Identity`] is an identity key, its act keys and a profile signed by
//! one of them. What it can do depends on which private keys it holds:
//!
//! - **Full**: the identity key pair is present. Act keys can be added and
//!   updated.
//! - **Limited**: at least one act key pair is present. Payloads and the
//!   profile can be signed.
//! - **Read-only**: public keys only. Inspection and verification.
//!
//! Loading a description is two stages: [`IdentityDescription::parse`]
//! fails on malformed shape, then [`Identity::from_description`] checks
//! signatures and records the outcome in validity flags instead of failing.

use blah_core::{Key, KeyPair, PublicKey, SignOptions, SignedPayload, VerifyOptions};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::Serialize;

use crate::act_key::{ActKey, ActKeyConfig};
use crate::description::IdentityDescription;
use crate::error::{IdentityError, Result};
use crate::profile::Profile;

/// Which operations an identity can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Full,
    Limited,
    ReadOnly,
}

#[derive(Debug, Clone)]
pub struct Identity {
    id_key: Key,
    act_keys: Vec<ActKey>,
    profile: SignedPayload<Profile>,
    profile_sig_valid: bool,
}

impl Identity {
    /// Create a fresh identity with one act key and a signed profile.
    pub fn create(
        id_key_pair: KeyPair,
        first_act_key_pair: KeyPair,
        profile: Profile,
        act_key_config: ActKeyConfig,
    ) -> Result<Self> {
        Self::create_with(
            &mut OsRng,
            id_key_pair,
            first_act_key_pair,
            profile,
            act_key_config,
        )
    }

    pub fn create_with<R: RngCore + CryptoRng>(
        rng: &mut R,
        id_key_pair: KeyPair,
        first_act_key_pair: KeyPair,
        profile: Profile,
        act_key_config: ActKeyConfig,
    ) -> Result<Self> {
        profile.validate()?;

        let act_key = ActKey::create_with(rng, first_act_key_pair, &id_key_pair, act_key_config)?;
        let profile = act_key.sign_payload_with(rng, profile, &SignOptions::new())?;

        Ok(Self {
            id_key: Key::WithPrivate(id_key_pair),
            act_keys: vec![act_key],
            profile,
            profile_sig_valid: true,
        })
    }

    /// Build an identity from a shape-checked description.
    ///
    /// `id_key_pair` must match `desc.id_key` if given. `acting_key_pair` is
    /// attached to the act key with the same id, if any. Signature problems
    /// never fail this call: bad delegation records load with
    /// `is_sig_valid() == false` and a bad profile leaves
    /// [`Identity::profile_sig_valid`] false. Key ids were checked when the
    /// description was parsed, so the only error is a mismatched
    /// `id_key_pair`.
    pub fn from_description(
        desc: IdentityDescription,
        id_key_pair: Option<KeyPair>,
        acting_key_pair: Option<KeyPair>,
    ) -> Result<Self> {
        let id_key = match id_key_pair {
            Some(kp) if kp.public_key() != &desc.id_key => {
                return Err(IdentityError::KeyMismatch {
                    expected: desc.id_key.id().to_string(),
                    actual: kp.id().to_string(),
                })
            }
            Some(kp) => Key::WithPrivate(kp),
            None => Key::PublicOnly(desc.id_key),
        };

        let act_keys = desc
            .act_keys
            .into_iter()
            .map(|raw| {
                let owned = acting_key_pair
                    .as_ref()
                    .filter(|kp| kp.public_key() == &raw.signee.payload.act_key)
                    .cloned();
                ActKey::from_signed_record(raw, id_key.public_key(), owned)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut identity = Self {
            id_key,
            act_keys,
            profile: desc.profile,
            profile_sig_valid: false,
        };
        identity.profile_sig_valid = identity.check_profile();
        Ok(identity)
    }

    /// Parse, validate and load a description from JSON text.
    pub fn from_description_json(
        json: &str,
        id_key_pair: Option<KeyPair>,
        acting_key_pair: Option<KeyPair>,
    ) -> Result<Self> {
        let desc = IdentityDescription::parse_str(json)?;
        Self::from_description(desc, id_key_pair, acting_key_pair)
    }

    fn check_profile(&self) -> bool {
        let signee = &self.profile.signee;
        if signee.id_key != self.id_key.id() {
            tracing::debug!(id_key = %signee.id_key, "profile signed for a different identity");
            return false;
        }

        let Some(act_key) = self.find_act_key(&signee.act_key) else {
            tracing::debug!(act_key = %signee.act_key, "profile signed by unknown act key");
            return false;
        };
        if !act_key.is_sig_valid() {
            tracing::debug!(act_key = %signee.act_key, "profile signed by untrusted act key");
            return false;
        }

        match act_key.verify_payload(&self.profile, &VerifyOptions::new()) {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(error = %err, "profile signature invalid");
                false
            }
        }
    }

    /// Produce the publishable description of this identity.
    pub fn to_description(&self) -> IdentityDescription {
        IdentityDescription {
            id_key: self.id_key.public_key().clone(),
            act_keys: self
                .act_keys
                .iter()
                .map(|k| k.signed_record().clone())
                .collect(),
            profile: self.profile.clone(),
        }
    }

    pub fn id_public_key(&self) -> &PublicKey {
        self.id_key.public_key()
    }

    pub fn id(&self) -> &str {
        self.id_key.id()
    }

    pub fn act_keys(&self) -> &[ActKey] {
        &self.act_keys
    }

    pub fn profile(&self) -> &Profile {
        &self.profile.signee.payload
    }

    pub fn signed_profile(&self) -> &SignedPayload<Profile> {
        &self.profile
    }

    pub fn profile_sig_valid(&self) -> bool {
        self.profile_sig_valid
    }

    pub fn access_level(&self) -> AccessLevel {
        if self.id_key.can_sign() {
            AccessLevel::Full
        } else if self.act_keys.iter().any(ActKey::can_sign) {
            AccessLevel::Limited
        } else {
            AccessLevel::ReadOnly
        }
    }

    /// The first act key holding a private key.
    pub fn acting_key(&self) -> Option<&ActKey> {
        self.act_keys.iter().find(|k| k.can_sign())
    }

    fn find_act_key(&self, id: &str) -> Option<&ActKey> {
        self.act_keys.iter().find(|k| k.id() == id)
    }

    fn require_id_key_pair(&self, action: &str) -> Result<&KeyPair> {
        self.id_key.key_pair().ok_or_else(|| {
            IdentityError::Permission(format!("cannot {action} without the identity key pair"))
        })
    }

    /// Delegate to another key. Requires the identity key pair.
    pub fn add_act_key(&mut self, key: impl Into<Key>, config: ActKeyConfig) -> Result<()> {
        self.add_act_key_with(&mut OsRng, key, config)
    }

    pub fn add_act_key_with<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        key: impl Into<Key>,
        config: ActKeyConfig,
    ) -> Result<()> {
        let id_key_pair = self.require_id_key_pair("add act key")?;
        let act_key = ActKey::create_with(rng, key, id_key_pair, config)?;
        self.act_keys.push(act_key);
        Ok(())
    }

    /// Re-sign the delegation record of act key `id`. Requires the identity
    /// key pair.
    pub fn update_act_key(&mut self, id: &str, patch: ActKeyConfig) -> Result<()> {
        self.require_id_key_pair("update act key")?;

        let index = self
            .act_keys
            .iter()
            .position(|k| k.id() == id)
            .ok_or_else(|| IdentityError::ActKeyNotFound(id.to_string()))?;

        let updated = self.act_keys[index].update(patch, &self.id_key)?;
        self.act_keys[index] = updated;
        Ok(())
    }

    /// Sign a payload with the acting key, on behalf of this identity.
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
        let act_key = self.acting_key().ok_or_else(|| {
            IdentityError::Permission("no act key with a private key to sign with".into())
        })?;
        act_key.sign_payload_with(rng, payload, options)
    }

    /// Replace the profile, signing it with the acting key.
    pub fn update_profile(&mut self, profile: Profile) -> Result<()> {
        profile.validate()?;
        self.profile = self.sign_payload(profile, &SignOptions::new())?;
        self.profile_sig_valid = true;
        Ok(())
    }

    /// Verify a payload signed by one of this identity's act keys.
    ///
    /// The act key must be known and its delegation record valid; the
    /// payload must have been signed before the act key expired.
    pub fn verify_payload<'a, P: Serialize>(
        &self,
        signed: &'a SignedPayload<P>,
        options: &VerifyOptions,
    ) -> Result<&'a P> {
        let act_key_id = &signed.signee.act_key;
        let act_key = self
            .find_act_key(act_key_id)
            .filter(|k| k.is_sig_valid())
            .ok_or_else(|| IdentityError::UntrustedActKey(act_key_id.clone()))?;
        act_key.verify_payload(signed, options)
    }
}
