//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use blah_core::KeyPair;
use blah_identity::{ActKeyConfig, IdUrl, Identity, IdentityDescription, Profile};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// An identity together with the key pairs that created it.
pub struct TestIdentity {
    pub id_key: KeyPair,
    pub act_key: KeyPair,
    pub identity: Identity,
}

impl TestIdentity {
    /// Create a new identity with random keys.
    pub fn new() -> Self {
        Self::from_keys(KeyPair::generate(), KeyPair::generate())
    }

    /// Create with deterministic keys derived from `seed`.
    pub fn with_seed(seed: u8) -> Self {
        let mut id_seed = [seed; 32];
        id_seed[0] = 0x1d;
        let mut act_seed = [seed; 32];
        act_seed[0] = 0xac;
        Self::from_keys(KeyPair::from_seed(&id_seed), KeyPair::from_seed(&act_seed))
    }

    fn from_keys(id_key: KeyPair, act_key: KeyPair) -> Self {
        let identity = Identity::create(
            id_key.clone(),
            act_key.clone(),
            sample_profile(),
            ActKeyConfig::new().with_comment("test"),
        )
        .expect("fresh identity should be valid");
        Self {
            id_key,
            act_key,
            identity,
        }
    }

    /// The published description.
    pub fn description(&self) -> IdentityDescription {
        self.identity.to_description()
    }

    /// Reload from the description without any private keys.
    pub fn read_only(&self) -> Identity {
        Identity::from_description(self.description(), None, None)
            .expect("own description should load")
    }

    /// Reload from the description holding only the act key pair.
    pub fn limited(&self) -> Identity {
        Identity::from_description(self.description(), None, Some(self.act_key.clone()))
            .expect("own description should load")
    }
}

impl Default for TestIdentity {
    fn default() -> Self {
        Self::new()
    }
}

/// The profile used throughout the tests.
pub fn sample_profile() -> Profile {
    Profile::new(
        "Shibo Lyu",
        IdUrl::parse("https://localhost").expect("static ID URL is valid"),
    )
}

/// Create multiple deterministic identities for multi-party tests.
pub fn multi_party_identities(count: usize) -> Vec<TestIdentity> {
    (0..count).map(|i| TestIdentity::with_seed(i as u8)).collect()
}

/// A seeded RNG for reproducible nonces, salts and IVs.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blah_identity::AccessLevel;

    #[test]
    fn test_fixture_access_levels() {
        let fixture = TestIdentity::with_seed(1);
        assert_eq!(fixture.identity.access_level(), AccessLevel::Full);
        assert_eq!(fixture.limited().access_level(), AccessLevel::Limited);
        assert_eq!(fixture.read_only().access_level(), AccessLevel::ReadOnly);
        assert!(fixture.read_only().profile_sig_valid());
    }

    #[test]
    fn test_with_seed_is_deterministic() {
        let a = TestIdentity::with_seed(3);
        let b = TestIdentity::with_seed(3);
        assert_eq!(a.identity.id(), b.identity.id());
        assert_ne!(a.id_key.id(), a.act_key.id());
    }

    #[test]
    fn test_multi_party() {
        let parties = multi_party_identities(3);
        let ids: Vec<_> = parties.iter().map(|p| p.identity.id().to_string()).collect();
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
    }
}
