//! The signed-payload protocol.
//!
//! ## Overview
//!
//! A payload is wrapped in a [`Signee`] envelope carrying a nonce, the
//! signing time, the identity the signature counts for (`id_key`) and the
//! key that actually signed (`act_key`). The canonical bytes of the signee
//! are signed with Ed25519 and optionally stamped with proof-of-work by
//! grinding the nonce.
//!
//! ```text
//! { "sig": "<hex>", "signee": { "nonce", "payload", "timestamp", "id_key", "act_key" } }
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::canonical::canonical_bytes;
use crate::crypto::{KeyPair, PublicKey};
use crate::error::{CoreError, Result};
use crate::pow::{self, MAX_POW_DIFFICULTY, POW_NONCE_MASK};

/// The record that is canonicalized and signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Signee<P> {
    pub nonce: u32,
    pub payload: P,
    /// Unix seconds at signing time.
    pub timestamp: i64,
    /// The identity on whose behalf the signature counts.
    pub id_key: String,
    /// The key that produced the signature.
    pub act_key: String,
}

/// A payload together with its signee envelope and signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignedPayload<P> {
    /// Hex-encoded Ed25519 signature over the canonical signee.
    pub sig: String,
    pub signee: Signee<P>,
}

impl<P> SignedPayload<P> {
    /// The payload, without any verification.
    pub fn payload(&self) -> &P {
        &self.signee.payload
    }
}

/// Options for signing.
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    /// Signing time in unix seconds. Defaults to now.
    pub date: Option<i64>,
    /// Identity to sign on behalf of. Defaults to the signing key itself.
    pub identity_key_id: Option<String>,
    /// Proof-of-work difficulty in bits. `None` or `Some(0)` skips grinding.
    pub pow_difficulty: Option<u32>,
}

impl SignOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date(mut self, unix_secs: i64) -> Self {
        self.date = Some(unix_secs);
        self
    }

    pub fn with_identity_key_id(mut self, id: impl Into<String>) -> Self {
        self.identity_key_id = Some(id.into());
        self
    }

    pub fn with_pow_difficulty(mut self, difficulty: u32) -> Self {
        self.pow_difficulty = Some(difficulty);
        self
    }
}

/// Options for verification.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Expected `id_key`. When absent the payload must be self-signed
    /// (`id_key == act_key`).
    pub identity_key_id: Option<String>,
    /// Required proof-of-work difficulty in bits.
    pub pow_difficulty: Option<u32>,
}

impl VerifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity_key_id(mut self, id: impl Into<String>) -> Self {
        self.identity_key_id = Some(id.into());
        self
    }

    pub fn with_pow_difficulty(mut self, difficulty: u32) -> Self {
        self.pow_difficulty = Some(difficulty);
        self
    }
}

/// Current time in unix seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Sign a payload with `key_pair`.
///
/// Draws a random nonce from `rng`. With a non-zero PoW difficulty the
/// nonce is incremented (within 31 bits) until the digest of the
/// canonical signee meets the threshold. The loop has no upper bound.
pub fn sign_payload<P: Serialize, R: RngCore + CryptoRng>(
    key_pair: &KeyPair,
    payload: P,
    options: &SignOptions,
    rng: &mut R,
) -> Result<SignedPayload<P>> {
    let difficulty = options.pow_difficulty.unwrap_or(0);
    if difficulty > MAX_POW_DIFFICULTY {
        return Err(CoreError::Config(format!(
            "proof-of-work difficulty {difficulty} exceeds {MAX_POW_DIFFICULTY}"
        )));
    }

    let mut signee = Signee {
        nonce: rng.next_u32(),
        payload,
        timestamp: options.date.unwrap_or_else(unix_now),
        id_key: options
            .identity_key_id
            .clone()
            .unwrap_or_else(|| key_pair.id().to_string()),
        act_key: key_pair.id().to_string(),
    };

    if difficulty > 0 {
        signee.nonce &= POW_NONCE_MASK;
    }

    let mut bytes = canonical_bytes(&signee)?;
    if difficulty > 0 {
        let mut attempts: u64 = 1;
        while !pow::meets_difficulty(&pow::digest(&bytes), difficulty) {
            signee.nonce = pow::next_nonce(signee.nonce);
            bytes = canonical_bytes(&signee)?;
            attempts += 1;
        }
        tracing::debug!(difficulty, attempts, nonce = signee.nonce, "proof-of-work satisfied");
    }

    let sig = key_pair.sign_raw(&bytes);
    Ok(SignedPayload {
        sig: hex::encode(sig),
        signee,
    })
}

/// Verify `signed` against `public_key` and return the payload.
///
/// Checks run in order: signing identity, signer key, proof-of-work,
/// signature. Every failure is an error.
pub fn verify_payload<'a, P: Serialize>(
    public_key: &PublicKey,
    signed: &'a SignedPayload<P>,
    options: &VerifyOptions,
) -> Result<&'a P> {
    let signee = &signed.signee;

    match &options.identity_key_id {
        Some(expected) if &signee.id_key != expected => {
            return Err(CoreError::SigningIdentityMismatch(format!(
                "expected id_key {expected}, got {}",
                signee.id_key
            )));
        }
        None if signee.id_key != signee.act_key => {
            return Err(CoreError::SigningIdentityMismatch(format!(
                "payload is signed by act key {} on behalf of {}, not self-signed",
                signee.act_key, signee.id_key
            )));
        }
        _ => {}
    }

    if signee.act_key != public_key.id() {
        return Err(CoreError::SigningIdentityMismatch(format!(
            "payload was signed by {}, not {}",
            signee.act_key,
            public_key.id()
        )));
    }

    let bytes = canonical_bytes(signee)?;

    if let Some(difficulty) = options.pow_difficulty {
        if !pow::meets_difficulty(&pow::digest(&bytes), difficulty) {
            return Err(CoreError::ProofOfWorkUnmet { difficulty });
        }
    }

    let mut sig = [0u8; 64];
    hex::decode_to_slice(&signed.sig, &mut sig).map_err(|_| CoreError::InvalidSignature)?;
    public_key.verify_raw(&bytes, &sig)?;

    Ok(&signee.payload)
}

/// Verify a signed payload using the key named by its own `act_key`.
///
/// This is how untrusted documents bootstrap verification when no public
/// key is known in advance.
pub fn verify_from_signer<'a, P: Serialize>(
    signed: &'a SignedPayload<P>,
    options: &VerifyOptions,
) -> Result<&'a P> {
    let public_key = PublicKey::from_id(&signed.signee.act_key)?;
    verify_payload(&public_key, signed, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::{json, Value};

    fn keypair(seed: u8) -> KeyPair {
        KeyPair::from_seed(&[seed; 32])
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Chat {
        text: String,
        room: String,
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let kp = keypair(0x42);
        let payload = json!({ "typ": "chat", "text": "hello" });
        let signed = kp.sign_payload(payload.clone(), &SignOptions::new()).unwrap();

        assert_eq!(signed.signee.id_key, kp.id());
        assert_eq!(signed.signee.act_key, kp.id());
        assert_eq!(signed.sig.len(), 128);

        let verified = kp
            .public_key()
            .verify_payload(&signed, &VerifyOptions::new())
            .unwrap();
        assert_eq!(verified, &payload);
    }

    #[test]
    fn test_timestamp_taken_from_options() {
        let kp = keypair(0x42);
        let signed = kp
            .sign_payload("x", &SignOptions::new().with_date(1_700_000_000))
            .unwrap();
        assert_eq!(signed.signee.timestamp, 1_700_000_000);
    }

    #[test]
    fn test_deterministic_with_seeded_rng() {
        let kp = keypair(0x42);
        let opts = SignOptions::new().with_date(1_000);
        let a = kp
            .sign_payload_with(&mut StdRng::seed_from_u64(1), "hi", &opts)
            .unwrap();
        let b = kp
            .sign_payload_with(&mut StdRng::seed_from_u64(1), "hi", &opts)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reordered_signee_still_verifies() {
        let kp = keypair(0x42);
        let signed = kp
            .sign_payload(json!({ "b": 1, "a": [true, null] }), &SignOptions::new())
            .unwrap();

        // Rebuild the document with members in a different order.
        let s = &signed.signee;
        let text = format!(
            r#"{{"signee":{{"act_key":"{}","id_key":"{}","timestamp":{},"payload":{{"a":[true,null],"b":1}},"nonce":{}}},"sig":"{}"}}"#,
            s.act_key, s.id_key, s.timestamp, s.nonce, signed.sig
        );
        let reparsed: SignedPayload<Value> = serde_json::from_str(&text).unwrap();

        kp.public_key()
            .verify_payload(&reparsed, &VerifyOptions::new())
            .unwrap();
    }

    #[test]
    fn test_wrong_key_rejected() {
        let signer = keypair(1);
        let other = keypair(2);
        let signed = signer.sign_payload("msg", &SignOptions::new()).unwrap();

        assert!(matches!(
            other.public_key().verify_payload(&signed, &VerifyOptions::new()),
            Err(CoreError::SigningIdentityMismatch(_))
        ));
    }

    #[test]
    fn test_forged_act_key_rejected_by_signature() {
        let signer = keypair(1);
        let victim = keypair(2);
        let mut signed = signer.sign_payload("msg", &SignOptions::new()).unwrap();
        signed.signee.act_key = victim.id().to_string();
        signed.signee.id_key = victim.id().to_string();

        assert!(matches!(
            victim.public_key().verify_payload(&signed, &VerifyOptions::new()),
            Err(CoreError::InvalidSignature)
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let kp = keypair(0x42);
        let mut signed = kp.sign_payload(json!({ "n": 1 }), &SignOptions::new()).unwrap();
        signed.signee.payload = json!({ "n": 2 });

        assert!(matches!(
            kp.public_key().verify_payload(&signed, &VerifyOptions::new()),
            Err(CoreError::InvalidSignature)
        ));
    }

    #[test]
    fn test_garbage_sig_is_invalid_signature() {
        let kp = keypair(0x42);
        let mut signed = kp.sign_payload("x", &SignOptions::new()).unwrap();
        signed.sig = "not hex".into();

        assert!(matches!(
            kp.public_key().verify_payload(&signed, &VerifyOptions::new()),
            Err(CoreError::InvalidSignature)
        ));
    }

    #[test]
    fn test_delegated_signature_needs_identity_option() {
        let root = keypair(1);
        let act = keypair(2);
        let signed = act
            .sign_payload("x", &SignOptions::new().with_identity_key_id(root.id()))
            .unwrap();
        assert_eq!(signed.signee.id_key, root.id());
        assert_eq!(signed.signee.act_key, act.id());

        assert!(matches!(
            act.public_key().verify_payload(&signed, &VerifyOptions::new()),
            Err(CoreError::SigningIdentityMismatch(_))
        ));
        assert!(matches!(
            act.public_key().verify_payload(
                &signed,
                &VerifyOptions::new().with_identity_key_id(act.id())
            ),
            Err(CoreError::SigningIdentityMismatch(_))
        ));
        act.public_key()
            .verify_payload(&signed, &VerifyOptions::new().with_identity_key_id(root.id()))
            .unwrap();
    }

    #[test]
    fn test_proof_of_work() {
        let kp = keypair(0x42);
        let signed = kp
            .sign_payload("work", &SignOptions::new().with_pow_difficulty(8))
            .unwrap();

        let bytes = canonical_bytes(&signed.signee).unwrap();
        assert_eq!(pow::digest(&bytes)[0], 0);
        assert!(signed.signee.nonce <= POW_NONCE_MASK);

        let pk = kp.public_key();
        pk.verify_payload(&signed, &VerifyOptions::new().with_pow_difficulty(8))
            .unwrap();
        pk.verify_payload(&signed, &VerifyOptions::new().with_pow_difficulty(0))
            .unwrap();
    }

    #[test]
    fn test_stricter_pow_rejected() {
        let kp = keypair(0x42);
        // Find a signature that meets 4 bits but not 24.
        let mut rng = StdRng::seed_from_u64(99);
        let signed = loop {
            let s = kp
                .sign_payload_with(&mut rng, "work", &SignOptions::new().with_pow_difficulty(4))
                .unwrap();
            let digest = pow::digest(&canonical_bytes(&s.signee).unwrap());
            if !pow::meets_difficulty(&digest, 24) {
                break s;
            }
        };

        assert!(matches!(
            kp.public_key()
                .verify_payload(&signed, &VerifyOptions::new().with_pow_difficulty(24)),
            Err(CoreError::ProofOfWorkUnmet { difficulty: 24 })
        ));
    }

    #[test]
    fn test_zero_difficulty_never_grinds() {
        let kp = keypair(0x42);
        let mut rng = StdRng::seed_from_u64(5);
        let expected_nonce = StdRng::seed_from_u64(5).next_u32();
        let signed = kp
            .sign_payload_with(&mut rng, "x", &SignOptions::new().with_pow_difficulty(0))
            .unwrap();
        assert_eq!(signed.signee.nonce, expected_nonce);
    }

    #[test]
    fn test_excessive_difficulty_is_config_error() {
        let kp = keypair(0x42);
        assert!(matches!(
            kp.sign_payload("x", &SignOptions::new().with_pow_difficulty(256)),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn test_verify_from_signer() {
        let kp = keypair(0x42);
        let signed = kp.sign_payload(7u32, &SignOptions::new()).unwrap();
        assert_eq!(*verify_from_signer(&signed, &VerifyOptions::new()).unwrap(), 7);

        let mut bad = signed.clone();
        bad.signee.act_key = "00".into();
        assert!(matches!(
            verify_from_signer(&bad, &VerifyOptions::new()),
            Err(CoreError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_and_verify_rejects_extra_payload_field() {
        let kp = keypair(0x42);
        let mut raw = json!({ "text": "hi", "room": "r", "extra": true });
        let signed = kp.sign_payload(raw.clone(), &SignOptions::new()).unwrap();
        let doc = serde_json::to_value(&signed).unwrap();

        let result: Result<Chat> = kp.public_key().parse_and_verify(doc, &VerifyOptions::new());
        assert!(matches!(result, Err(CoreError::SchemaValidation(_))));

        raw.as_object_mut().unwrap().remove("extra");
        let signed = kp.sign_payload(raw, &SignOptions::new()).unwrap();
        let doc = serde_json::to_value(&signed).unwrap();
        let chat: Chat = kp
            .public_key()
            .parse_and_verify(doc, &VerifyOptions::new())
            .unwrap();
        assert_eq!(chat.text, "hi");
    }

    #[test]
    fn test_parse_and_verify_rejects_extra_envelope_field() {
        let kp = keypair(0x42);
        let signed = kp.sign_payload("x", &SignOptions::new()).unwrap();
        let mut doc = serde_json::to_value(&signed).unwrap();
        doc["signee"]["extra"] = json!(1);

        let result: Result<String> = kp.public_key().parse_and_verify(doc, &VerifyOptions::new());
        assert!(matches!(result, Err(CoreError::SchemaValidation(_))));
    }

    proptest! {
        #[test]
        fn test_roundtrip_any_payload(seed in any::<[u8; 32]>(), text in ".*", n in any::<i64>()) {
            let kp = KeyPair::from_seed(&seed);
            let payload = json!({ "text": text, "n": n });
            let signed = kp.sign_payload(payload.clone(), &SignOptions::new()).unwrap();
            let verified = kp.public_key().verify_payload(&signed, &VerifyOptions::new()).unwrap();
            prop_assert_eq!(verified, &payload);
        }

        #[test]
        fn test_wrong_key_always_rejected(a in any::<[u8; 32]>(), b in any::<[u8; 32]>()) {
            prop_assume!(a != b);
            let k1 = KeyPair::from_seed(&a);
            let k2 = KeyPair::from_seed(&b);
            let signed = k1.sign_payload("m", &SignOptions::new()).unwrap();
            prop_assert!(k2.public_key().verify_payload(&signed, &VerifyOptions::new()).is_err());
        }
    }
}
