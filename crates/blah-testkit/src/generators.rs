//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Number, Value};

use blah_core::{KeyPair, SignOptions, SignedPayload};
use blah_identity::{IdUrl, Profile};

/// Generate a random key pair.
pub fn key_pair() -> impl Strategy<Value = KeyPair> {
    any::<[u8; 32]>().prop_map(|seed| KeyPair::from_seed(&seed))
}

/// Generate a finite float that survives a JSON round trip.
pub fn finite_f64() -> impl Strategy<Value = f64> {
    (-1.0e15f64..1.0e15f64).prop_filter("finite", |f| f.is_finite())
}

/// Generate an arbitrary JSON value with finite numbers.
pub fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        finite_f64().prop_filter_map("representable", |f| Number::from_f64(f).map(Value::Number)),
        "\\PC{0,12}".prop_map(Value::String),
    ];

    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Generate a JSON object payload.
pub fn json_object() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z_]{1,8}", json_value(), 0..6)
        .prop_map(|m| Value::Object(m.into_iter().collect()))
}

/// Generate a valid ID URL.
pub fn id_url() -> impl Strategy<Value = IdUrl> {
    "[a-z][a-z0-9]{0,10}(\\.[a-z]{2,4})?".prop_map(|host| {
        IdUrl::parse(format!("https://{host}")).expect("generated host is a valid ID URL")
    })
}

/// Generate a profile.
pub fn profile() -> impl Strategy<Value = Profile> {
    (
        "\\PC{0,24}",
        prop::collection::vec(id_url(), 1..4),
        prop::option::of("\\PC{0,40}"),
    )
        .prop_map(|(name, id_urls, bio)| Profile {
            id_urls,
            bio,
            ..Profile::new(name, IdUrl::parse("https://localhost").expect("static ID URL is valid"))
        })
}

/// Parameters for a deterministic signature.
#[derive(Debug, Clone)]
pub struct SignParams {
    pub key_pair: KeyPair,
    pub payload: Value,
    pub timestamp: i64,
}

impl Arbitrary for SignParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>(),
            json_object(),
            0i64..=4_102_444_800, // through 2100-01-01
        )
            .prop_map(|(seed, payload, timestamp)| SignParams {
                key_pair: KeyPair::from_seed(&seed),
                payload,
                timestamp,
            })
            .boxed()
    }
}

/// Sign the parameters' payload at their timestamp.
pub fn signed_from_params(params: &SignParams) -> SignedPayload<Value> {
    params
        .key_pair
        .sign_payload(
            params.payload.clone(),
            &SignOptions::new().with_date(params.timestamp),
        )
        .expect("finite JSON always signs")
}
