//! Golden test vectors for deterministic verification.
//!
//! Canonical vectors pin the exact byte form every implementation must
//! produce. Signing vectors fix the key, nonce and timestamp so the signee
//! bytes and the (deterministic) Ed25519 signature are reproducible.

use blah_core::{canonical_bytes, canonicalize, KeyPair, SignedPayload, Signee, VerifyOptions};
use serde_json::Value;

/// A canonicalization vector: JSON input and its expected canonical text.
#[derive(Debug, Clone)]
pub struct CanonicalVector {
    pub name: &'static str,
    pub input: &'static str,
    pub expected: &'static str,
}

/// All canonicalization vectors.
pub fn canonical_vectors() -> Vec<CanonicalVector> {
    vec![
        CanonicalVector {
            name: "scalars",
            input: r#"[null, true, false, 0, -1, 1.5, "s"]"#,
            expected: r#"[null,true,false,0,-1,1.5,"s"]"#,
        },
        CanonicalVector {
            name: "object keys sorted",
            input: r#"{ "b": 2, "a": 1, "c": { "z": 0, "y": [] } }"#,
            expected: r#"{"a":1,"b":2,"c":{"y":[],"z":0}}"#,
        },
        CanonicalVector {
            name: "signee field order",
            input: r#"{ "signee": { "timestamp": 1, "nonce": 2, "payload": {}, "id_key": "i", "act_key": "a" }, "sig": "" }"#,
            expected: r#"{"sig":"","signee":{"act_key":"a","id_key":"i","nonce":2,"payload":{},"timestamp":1}}"#,
        },
        CanonicalVector {
            name: "uppercase sorts first",
            input: r#"{ "a": 1, "B": 2, "_": 3 }"#,
            expected: r#"{"B":2,"_":3,"a":1}"#,
        },
        CanonicalVector {
            name: "escapes",
            input: r#"{ "k": "line\nbreak \"quoted\" \\ \u0007" }"#,
            expected: r#"{"k":"line\nbreak \"quoted\" \\ \u0007"}"#,
        },
        CanonicalVector {
            name: "exponent floats",
            input: r#"[1e21, 1e-7, 2.5e-8, 100.0, 0.000001]"#,
            expected: r#"[1e+21,1e-7,2.5e-8,100,0.000001]"#,
        },
        CanonicalVector {
            name: "unicode kept verbatim",
            input: r#"{ "名前": "Shibo Lyu", "emoji": "🧧" }"#,
            expected: r#"{"emoji":"🧧","名前":"Shibo Lyu"}"#,
        },
    ]
}

/// A signing vector with every random input fixed.
#[derive(Debug, Clone)]
pub struct SigningVector {
    pub name: &'static str,
    /// Seed of the signing (act) key.
    pub seed: [u8; 32],
    /// Seed of the identity key, if signing on behalf of another key.
    pub id_seed: Option<[u8; 32]>,
    pub nonce: u32,
    pub timestamp: i64,
    /// Payload as JSON text.
    pub payload: &'static str,
}

/// All signing vectors.
pub fn signing_vectors() -> Vec<SigningVector> {
    vec![
        SigningVector {
            name: "self-signed text",
            seed: [0x42; 32],
            id_seed: None,
            nonce: 0,
            timestamp: 1_736_870_400,
            payload: r#"{"typ":"chat","text":"hello"}"#,
        },
        SigningVector {
            name: "delegated profile",
            seed: [0x02; 32],
            id_seed: Some([0x01; 32]),
            nonce: 0x7FFF_FFFF,
            timestamp: 1_700_000_000,
            payload: r#"{"typ":"profile","preferred_chat_server_urls":[],"id_urls":["https://localhost"],"name":"Shibo Lyu"}"#,
        },
        SigningVector {
            name: "empty payload",
            seed: [0x00; 32],
            id_seed: None,
            nonce: u32::MAX,
            timestamp: 0,
            payload: "{}",
        },
    ]
}

/// Build the signed payload described by a vector.
pub fn signed_from_vector(vector: &SigningVector) -> SignedPayload<Value> {
    let key_pair = KeyPair::from_seed(&vector.seed);
    let id_key = vector
        .id_seed
        .map(|seed| KeyPair::from_seed(&seed).id().to_string())
        .unwrap_or_else(|| key_pair.id().to_string());

    let signee = Signee {
        nonce: vector.nonce,
        payload: serde_json::from_str(vector.payload).expect("vector payload is valid JSON"),
        timestamp: vector.timestamp,
        id_key,
        act_key: key_pair.id().to_string(),
    };
    let bytes = canonical_bytes(&signee).expect("vector payload is canonical");

    SignedPayload {
        sig: hex::encode(key_pair.sign_raw(&bytes)),
        signee,
    }
}

/// The canonical signee text a vector must produce.
pub fn expected_signee_text(vector: &SigningVector) -> String {
    let signed = signed_from_vector(vector);
    let payload: Value = serde_json::from_str(vector.payload).expect("vector payload is valid JSON");
    format!(
        r#"{{"act_key":"{}","id_key":"{}","nonce":{},"payload":{},"timestamp":{}}}"#,
        signed.signee.act_key,
        signed.signee.id_key,
        vector.nonce,
        blah_core::canonicalize_value(&payload),
        vector.timestamp,
    )
}

/// Check every vector. Returns `(name, passed, detail)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let mut results = Vec::new();

    for v in canonical_vectors() {
        let outcome = serde_json::from_str::<Value>(v.input)
            .map_err(|e| e.to_string())
            .and_then(|value| canonicalize(&value).map_err(|e| e.to_string()));
        match outcome {
            Ok(text) if text == v.expected => results.push((v.name.to_string(), true, text)),
            Ok(text) => results.push((v.name.to_string(), false, format!("got {text}"))),
            Err(e) => results.push((v.name.to_string(), false, e)),
        }
    }

    for v in signing_vectors() {
        let signed = signed_from_vector(&v);
        let public = KeyPair::from_seed(&v.seed).public_key().clone();
        let options = VerifyOptions {
            identity_key_id: Some(signed.signee.id_key.clone()),
            pow_difficulty: None,
        };
        match public.verify_payload(&signed, &options) {
            Ok(_) => results.push((v.name.to_string(), true, signed.sig.clone())),
            Err(e) => results.push((v.name.to_string(), false, e.to_string())),
        }
    }

    results
}
