//! # blah testkit
//!
//! Testing utilities for blah.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known canonical forms and fixed-input signatures for cross-implementation checks
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Ready-made identities at each access level
//!
//! ## Golden Vectors
//!
//! ```rust
//! use blah_testkit::vectors::verify_all_vectors;
//!
//! for (name, passed, detail) in verify_all_vectors() {
//!     assert!(passed, "{name}: {detail}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use blah_testkit::generators::{signed_from_params, SignParams};
//!
//! proptest! {
//!     #[test]
//!     fn signatures_verify(params: SignParams) {
//!         let signed = signed_from_params(&params);
//!         prop_assert!(params.key_pair.public_key()
//!             .verify_payload(&signed, &Default::default())
//!             .is_ok());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use blah_testkit::fixtures::TestIdentity;
//!
//! let fixture = TestIdentity::with_seed(1);
//! let reader = fixture.read_only();
//! assert!(reader.profile_sig_valid());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_identities, sample_profile, seeded_rng, TestIdentity};
pub use generators::{signed_from_params, SignParams};
pub use vectors::{
    canonical_vectors, signed_from_vector, signing_vectors, verify_all_vectors, CanonicalVector,
    SigningVector,
};
