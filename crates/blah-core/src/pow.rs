//! Proof-of-work over the canonical signee bytes.
//!
//! A difficulty of `d` bits requires the SHA-256 digest of the canonical
//! signee to start with `d >> 3` zero bytes, followed by a byte strictly
//! below `1 << (8 - (d & 7))`. Difficulty 0 disables the check.

use sha2::{Digest, Sha256};

/// Highest difficulty that a 32-byte digest can satisfy.
pub const MAX_POW_DIFFICULTY: u32 = 255;

/// Nonces stay within 31 bits so they never look negative to
/// signed-integer readers.
pub const POW_NONCE_MASK: u32 = 0x7FFF_FFFF;

/// SHA-256 of the given bytes.
pub fn digest(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Check whether a digest satisfies `difficulty` leading zero bits.
pub fn meets_difficulty(digest: &[u8; 32], difficulty: u32) -> bool {
    if difficulty == 0 {
        return true;
    }

    let zero_bytes = (difficulty >> 3) as usize;
    if zero_bytes >= digest.len() {
        return false;
    }

    let max_next_byte = 1u16 << (8 - (difficulty & 7));
    digest[..zero_bytes].iter().all(|b| *b == 0) && u16::from(digest[zero_bytes]) < max_next_byte
}

/// Advance a nonce for the next grinding attempt.
pub fn next_nonce(nonce: u32) -> u32 {
    nonce.wrapping_add(1) & POW_NONCE_MASK
}
