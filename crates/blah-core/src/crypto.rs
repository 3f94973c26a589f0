//! Ed25519 keys for blah identities.
//!
//! A key is identified by the lowercase hex encoding of its 32-byte raw
//! public key. That id is used everywhere a key is referenced on the wire.

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::signed::{self, SignOptions, SignedPayload, VerifyOptions};

/// Length of an encoded key id in hex characters.
pub const KEY_ID_LEN: usize = 64;

/// A verification-only Ed25519 key.
///
/// Serializes as its hex id. Deserializing checks the id the same way
/// [`PublicKey::from_id`] does, so malformed ids fail at the schema stage.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey {
    key: VerifyingKey,
    id: String,
}

impl PublicKey {
    /// Reconstruct a public key from its hex id.
    ///
    /// The id must be exactly 64 lowercase hex characters encoding a valid
    /// curve point.
    pub fn from_id(id: &str) -> Result<Self> {
        if id.len() != KEY_ID_LEN {
            return Err(CoreError::Decode(format!(
                "key id must be {KEY_ID_LEN} hex characters, got {}",
                id.len()
            )));
        }
        if !id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(CoreError::Decode("key id must be lowercase hex".into()));
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(id, &mut bytes).map_err(|e| CoreError::Decode(e.to_string()))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|_| CoreError::Decode("key id is not a valid Ed25519 point".into()))?;

        Ok(Self {
            key,
            id: id.to_string(),
        })
    }

    fn from_verifying_key(key: VerifyingKey) -> Self {
        Self {
            id: hex::encode(key.as_bytes()),
            key,
        }
    }

    /// The hex id of this key.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Short display name, `first4...last4` of the id. Not authoritative.
    pub fn name(&self) -> String {
        format!("{}...{}", &self.id[..4], &self.id[KEY_ID_LEN - 4..])
    }

    /// Raw public key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.key.as_bytes()
    }

    /// Verify a raw Ed25519 signature over a message.
    pub fn verify_raw(&self, message: &[u8], signature: &[u8; 64]) -> Result<()> {
        let sig = Signature::from_bytes(signature);
        self.key
            .verify(message, &sig)
            .map_err(|_| CoreError::InvalidSignature)
    }

    /// Verify a signed payload produced by this key and return its payload.
    pub fn verify_payload<'a, P: Serialize>(
        &self,
        signed: &'a SignedPayload<P>,
        options: &VerifyOptions,
    ) -> Result<&'a P> {
        signed::verify_payload(self, signed, options)
    }

    /// Validate the shape of an untrusted signed payload, then verify it.
    ///
    /// Shape errors surface as [`CoreError::SchemaValidation`] before any
    /// signature check runs.
    pub fn parse_and_verify<P: Serialize + DeserializeOwned>(
        &self,
        value: serde_json::Value,
        options: &VerifyOptions,
    ) -> Result<P> {
        let signed: SignedPayload<P> = crate::schema::parse(value)?;
        self.verify_payload(&signed, options)?;
        Ok(signed.signee.payload)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.name())
    }
}

impl TryFrom<String> for PublicKey {
    type Error = CoreError;

    fn try_from(id: String) -> Result<Self> {
        Self::from_id(&id)
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        key.id
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// An Ed25519 key pair.
///
/// The private half is either extractable (may be encoded for storage) or
/// not. Key pairs are immutable; rotation means generating a new pair and
/// delegating to it.
#[derive(Clone)]
pub struct KeyPair {
    pub(crate) signing_key: SigningKey,
    public: PublicKey,
    extractable: bool,
}

impl KeyPair {
    /// Generate a new random key pair from the operating system RNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a new key pair from the given RNG.
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::from_signing_key(SigningKey::generate(rng))
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        Self {
            public: PublicKey::from_verifying_key(signing_key.verifying_key()),
            signing_key,
            extractable: true,
        }
    }

    /// Mark the private key as non-extractable. Encoding will then fail.
    pub fn into_non_extractable(mut self) -> Self {
        self.extractable = false;
        self
    }

    /// Whether the private key may be encoded.
    pub fn is_extractable(&self) -> bool {
        self.extractable
    }

    /// The public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// The hex id of this key pair.
    pub fn id(&self) -> &str {
        self.public.id()
    }

    /// Sign a raw message.
    pub fn sign_raw(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Sign a payload using the operating system RNG for the nonce.
    pub fn sign_payload<P: Serialize>(
        &self,
        payload: P,
        options: &SignOptions,
    ) -> Result<SignedPayload<P>> {
        signed::sign_payload(self, payload, options, &mut OsRng)
    }

    /// Sign a payload, drawing the nonce from the given RNG.
    pub fn sign_payload_with<P: Serialize, R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        payload: P,
        options: &SignOptions,
    ) -> Result<SignedPayload<P>> {
        signed::sign_payload(self, payload, options, rng)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair({:?})", self.public)
    }
}

/// A key that may or may not carry a usable private half.
#[derive(Debug, Clone)]
pub enum Key {
    PublicOnly(PublicKey),
    WithPrivate(KeyPair),
}

impl Key {
    /// Whether this key can produce signatures.
    pub fn can_sign(&self) -> bool {
        matches!(self, Key::WithPrivate(_))
    }

    pub fn public_key(&self) -> &PublicKey {
        match self {
            Key::PublicOnly(pk) => pk,
            Key::WithPrivate(kp) => kp.public_key(),
        }
    }

    pub fn id(&self) -> &str {
        self.public_key().id()
    }

    /// The key pair, if the private half is present.
    pub fn key_pair(&self) -> Option<&KeyPair> {
        match self {
            Key::PublicOnly(_) => None,
            Key::WithPrivate(kp) => Some(kp),
        }
    }
}

impl From<PublicKey> for Key {
    fn from(pk: PublicKey) -> Self {
        Key::PublicOnly(pk)
    }
}

impl From<KeyPair> for Key {
    fn from(kp: KeyPair) -> Self {
        Key::WithPrivate(kp)
    }
}
