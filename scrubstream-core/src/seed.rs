//! Content-derived deterministic randomness.
//!
//! Every random choice made while scrubbing is drawn from a PRNG seeded by
//! hashing the value being scrubbed, so the same input always produces the
//! same output across processes and runs without a persisted mapping table.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Incremental FNV-1a 64-bit hasher.
#[derive(Debug, Clone, Copy)]
pub struct Fnv64 {
    state: u64,
}

impl Default for Fnv64 {
    fn default() -> Self {
        Self::new()
    }
}

impl Fnv64 {
    /// Creates a hasher at the FNV offset basis.
    pub fn new() -> Self {
        Self {
            state: FNV_OFFSET_BASIS,
        }
    }

    /// Feeds bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.state ^= u64::from(*byte);
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    /// Returns the current hash value.
    pub fn finish(&self) -> u64 {
        self.state
    }
}

/// Hashes a string with FNV-1a 64.
pub fn hash(s: &str) -> u64 {
    let mut h = Fnv64::new();
    h.write(s.as_bytes());
    h.finish()
}

/// Hashes `salt ++ 0x00 ++ s`, or just `s` when the salt is empty.
pub fn salted_hash(salt: &str, s: &str) -> u64 {
    let mut h = Fnv64::new();
    if !salt.is_empty() {
        h.write(salt.as_bytes());
        h.write(&[0]);
    }
    h.write(s.as_bytes());
    h.finish()
}

/// Creates a PRNG seeded from a string.
pub fn rng_for(seed: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(hash(seed))
}

/// Creates a PRNG seeded from a salt and a string.
pub fn salted_rng_for(salt: &str, seed: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(salted_hash(salt, seed))
}
