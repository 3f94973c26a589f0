//! Storage encoding for key pairs.
//!
//! The private key is stored as its raw 32-byte Ed25519 seed, either hex
//! encoded or sealed with AES-256-GCM under a key derived from a password
//! with PBKDF2-HMAC-SHA256.
//!
//! ```text
//! { "v": "0", "id": "<hex>", "privateKey": "<hex seed>" }
//! { "v": "0", "id": "<hex>", "passwordProtectedPrivateKey": "<hex ct+tag>",
//!   "iv": "<hex 12 bytes>", "salt": "<hex 16 bytes>" }
//! ```

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{de, Deserialize, Deserializer, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::crypto::KeyPair;
use crate::error::{CoreError, Result};

/// Current encoding version tag.
pub const KEY_ENCODING_VERSION: &str = "0";

/// PBKDF2 rounds. Not stored in the encoding, so changing it breaks
/// existing protected keys.
pub const PBKDF2_ITERATIONS: u32 = 250_000;

pub const SALT_LEN: usize = 16;
pub const IV_LEN: usize = 12;

/// A serialized key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedKeyPair {
    /// Format version tag.
    pub v: String,
    /// Hex id of the public key.
    pub id: String,
    #[serde(flatten)]
    pub private_key: EncodedPrivateKey,
}

/// Private key material, plain or password-protected.
///
/// Exactly one form must be present when decoding. A document carrying
/// `privateKey` alongside any of the sealed fields is rejected.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EncodedPrivateKey {
    Plain {
        #[serde(rename = "privateKey")]
        private_key: String,
    },
    PasswordProtected {
        #[serde(rename = "passwordProtectedPrivateKey")]
        ciphertext: String,
        iv: String,
        salt: String,
    },
}

#[derive(Deserialize)]
struct RawPrivateKey {
    #[serde(rename = "privateKey")]
    private_key: Option<String>,
    #[serde(rename = "passwordProtectedPrivateKey")]
    ciphertext: Option<String>,
    iv: Option<String>,
    salt: Option<String>,
}

impl<'de> Deserialize<'de> for EncodedPrivateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match RawPrivateKey::deserialize(deserializer)? {
            RawPrivateKey {
                private_key: Some(private_key),
                ciphertext: None,
                iv: None,
                salt: None,
            } => Ok(EncodedPrivateKey::Plain { private_key }),
            RawPrivateKey {
                private_key: None,
                ciphertext: Some(ciphertext),
                iv: Some(iv),
                salt: Some(salt),
            } => Ok(EncodedPrivateKey::PasswordProtected {
                ciphertext,
                iv,
                salt,
            }),
            _ => Err(de::Error::custom(
                "expected either privateKey or passwordProtectedPrivateKey with iv and salt",
            )),
        }
    }
}

impl EncodedPrivateKey {
    pub fn is_password_protected(&self) -> bool {
        matches!(self, EncodedPrivateKey::PasswordProtected { .. })
    }
}

impl fmt::Debug for EncodedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodedPrivateKey::Plain { .. } => f.write_str("Plain(..)"),
            EncodedPrivateKey::PasswordProtected { iv, salt, .. } => f
                .debug_struct("PasswordProtected")
                .field("iv", iv)
                .field("salt", salt)
                .finish_non_exhaustive(),
        }
    }
}

impl KeyPair {
    /// Encode the private key for storage, optionally under a password.
    ///
    /// Fails with [`CoreError::NotExtractable`] for non-extractable keys.
    pub fn encode(&self, password: Option<&str>) -> Result<EncodedKeyPair> {
        self.encode_with(&mut OsRng, password)
    }

    /// Encode, drawing salt and IV from the given RNG.
    pub fn encode_with<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        password: Option<&str>,
    ) -> Result<EncodedKeyPair> {
        if !self.is_extractable() {
            return Err(CoreError::NotExtractable);
        }

        let seed = Zeroizing::new(self.signing_key.to_bytes());
        let private_key = match password {
            None => EncodedPrivateKey::Plain {
                private_key: hex::encode(&seed[..]),
            },
            Some(password) => seal(rng, &seed[..], password)?,
        };

        Ok(EncodedKeyPair {
            v: KEY_ENCODING_VERSION.to_string(),
            id: self.id().to_string(),
            private_key,
        })
    }

    /// Decode a key pair. Password-protected encodings require `password`.
    ///
    /// A wrong password and corrupted ciphertext both yield
    /// [`CoreError::Decryption`].
    pub fn from_encoded(encoded: &EncodedKeyPair, password: Option<&str>) -> Result<Self> {
        if encoded.v != KEY_ENCODING_VERSION {
            return Err(CoreError::UnsupportedVersion(encoded.v.clone()));
        }

        let seed = match &encoded.private_key {
            EncodedPrivateKey::Plain { private_key } => {
                let bytes = Zeroizing::new(
                    hex::decode(private_key).map_err(|e| CoreError::Decode(e.to_string()))?,
                );
                seed_from_slice(&bytes)?
            }
            EncodedPrivateKey::PasswordProtected {
                ciphertext,
                iv,
                salt,
            } => {
                let password = password.ok_or_else(|| {
                    CoreError::Config("password required for protected private key".into())
                })?;
                let plaintext = open(ciphertext, iv, salt, password)?;
                seed_from_slice(&plaintext)?
            }
        };

        let key_pair = KeyPair::from_seed(&seed);
        if key_pair.id() != encoded.id {
            return Err(CoreError::Decode(format!(
                "encoded id {} does not match private key {}",
                encoded.id,
                key_pair.id()
            )));
        }
        Ok(key_pair)
    }
}

fn seed_from_slice(bytes: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    if bytes.len() != 32 {
        return Err(CoreError::Decode(format!(
            "private key must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    let mut seed = Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(bytes);
    Ok(seed)
}

fn derive_key(password: &str, salt: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key[..]);
    key
}

fn seal<R: RngCore + CryptoRng>(
    rng: &mut R,
    plaintext: &[u8],
    password: &str,
) -> Result<EncodedPrivateKey> {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut iv);

    let key = derive_key(password, &salt);
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| CoreError::Encryption)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|_| CoreError::Encryption)?;

    Ok(EncodedPrivateKey::PasswordProtected {
        ciphertext: hex::encode(ciphertext),
        iv: hex::encode(iv),
        salt: hex::encode(salt),
    })
}

fn open(ciphertext: &str, iv: &str, salt: &str, password: &str) -> Result<Zeroizing<Vec<u8>>> {
    let ciphertext = hex::decode(ciphertext).map_err(|e| CoreError::Decode(e.to_string()))?;
    let mut iv_bytes = [0u8; IV_LEN];
    hex::decode_to_slice(iv, &mut iv_bytes)
        .map_err(|e| CoreError::Decode(format!("iv: {e}")))?;
    let mut salt_bytes = [0u8; SALT_LEN];
    hex::decode_to_slice(salt, &mut salt_bytes)
        .map_err(|e| CoreError::Decode(format!("salt: {e}")))?;

    let key = derive_key(password, &salt_bytes);
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| CoreError::Decryption)?;
    cipher
        .decrypt(Nonce::from_slice(&iv_bytes), ciphertext.as_slice())
        .map(Zeroizing::new)
        .map_err(|_| CoreError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn keypair() -> KeyPair {
        KeyPair::from_seed(&[0x42; 32])
    }

    #[test]
    fn test_plain_roundtrip() {
        let kp = keypair();
        let encoded = kp.encode(None).unwrap();
        assert_eq!(encoded.v, "0");
        assert_eq!(encoded.id, kp.id());
        assert!(!encoded.private_key.is_password_protected());

        let decoded = KeyPair::from_encoded(&encoded, None).unwrap();
        assert_eq!(decoded.id(), kp.id());
    }

    #[test]
    fn test_plain_wire_format() {
        let kp = keypair();
        let value = serde_json::to_value(kp.encode(None).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({ "v": "0", "id": kp.id(), "privateKey": hex::encode([0x42u8; 32]) })
        );

        let parsed: EncodedKeyPair = serde_json::from_value(value).unwrap();
        assert_eq!(KeyPair::from_encoded(&parsed, None).unwrap().id(), kp.id());
    }

    #[test]
    fn test_rejects_mixed_or_partial_forms() {
        let kp = keypair();
        let sealed = serde_json::to_value(
            kp.encode_with(&mut StdRng::seed_from_u64(5), Some("pw"))
                .unwrap(),
        )
        .unwrap();

        let mut both = sealed.clone();
        both["privateKey"] = json!(hex::encode([0x42u8; 32]));
        assert!(serde_json::from_value::<EncodedKeyPair>(both).is_err());

        let mut no_salt = sealed;
        no_salt.as_object_mut().unwrap().remove("salt");
        assert!(serde_json::from_value::<EncodedKeyPair>(no_salt).is_err());

        let neither = json!({ "v": "0", "id": kp.id() });
        assert!(serde_json::from_value::<EncodedKeyPair>(neither).is_err());
    }

    #[test]
    fn test_password_roundtrip() {
        let kp = keypair();
        let encoded = kp
            .encode_with(&mut StdRng::seed_from_u64(3), Some("hunter2"))
            .unwrap();

        let value = serde_json::to_value(&encoded).unwrap();
        assert_eq!(value["iv"].as_str().unwrap().len(), IV_LEN * 2);
        assert_eq!(value["salt"].as_str().unwrap().len(), SALT_LEN * 2);
        // 32-byte seed plus 16-byte tag
        assert_eq!(
            value["passwordProtectedPrivateKey"].as_str().unwrap().len(),
            48 * 2
        );
        assert!(value.get("privateKey").is_none());

        let parsed: EncodedKeyPair = serde_json::from_value(value).unwrap();
        let decoded = KeyPair::from_encoded(&parsed, Some("hunter2")).unwrap();
        assert_eq!(decoded.id(), kp.id());
    }

    #[test]
    fn test_fresh_salt_and_iv_per_encode() {
        let kp = keypair();
        let a = kp.encode(Some("pw")).unwrap();
        let b = kp.encode(Some("pw")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_password_is_decryption_error() {
        let kp = keypair();
        let encoded = kp.encode(Some("right")).unwrap();
        assert!(matches!(
            KeyPair::from_encoded(&encoded, Some("wrong")),
            Err(CoreError::Decryption)
        ));
    }

    #[test]
    fn test_corrupted_ciphertext_is_decryption_error() {
        let kp = keypair();
        let mut encoded = kp.encode(Some("pw")).unwrap();
        if let EncodedPrivateKey::PasswordProtected { ciphertext, .. } = &mut encoded.private_key {
            let flipped = if ciphertext.starts_with('0') { "1" } else { "0" };
            ciphertext.replace_range(0..1, flipped);
        }
        assert!(matches!(
            KeyPair::from_encoded(&encoded, Some("pw")),
            Err(CoreError::Decryption)
        ));
    }

    #[test]
    fn test_missing_password_is_config_error() {
        let encoded = keypair().encode(Some("pw")).unwrap();
        assert!(matches!(
            KeyPair::from_encoded(&encoded, None),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut encoded = keypair().encode(None).unwrap();
        encoded.v = "1".into();
        assert!(matches!(
            KeyPair::from_encoded(&encoded, None),
            Err(CoreError::UnsupportedVersion(v)) if v == "1"
        ));
    }

    #[test]
    fn test_mismatched_id_rejected() {
        let mut encoded = keypair().encode(None).unwrap();
        encoded.id = KeyPair::from_seed(&[0x01; 32]).id().to_string();
        assert!(matches!(
            KeyPair::from_encoded(&encoded, None),
            Err(CoreError::Decode(_))
        ));
    }

    #[test]
    fn test_malformed_private_key_rejected() {
        let mut encoded = keypair().encode(None).unwrap();
        encoded.private_key = EncodedPrivateKey::Plain {
            private_key: "abcd".into(),
        };
        assert!(matches!(
            KeyPair::from_encoded(&encoded, None),
            Err(CoreError::Decode(_))
        ));
    }

    #[test]
    fn test_non_extractable_cannot_encode() {
        let kp = keypair().into_non_extractable();
        assert!(matches!(kp.encode(None), Err(CoreError::NotExtractable)));
        assert!(matches!(kp.encode(Some("pw")), Err(CoreError::NotExtractable)));
    }

    #[test]
    fn test_debug_redacts_material() {
        let encoded = keypair().encode(None).unwrap();
        let debug = format!("{encoded:?}");
        assert!(!debug.contains(&hex::encode([0x42u8; 32])));
    }
}
