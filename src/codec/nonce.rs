/// Nonce sources for encoded filenames
///
/// The capture device caches photos by filename, so every encoding embeds a
/// random value. The value never takes part in decoding.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Largest nonce value (inclusive)
pub const MAX_NONCE: u32 = 100;

/// Supplies nonces in `[0, MAX_NONCE]`
pub trait NonceSource {
    fn next_nonce(&mut self) -> u32;
}

/// Process-wide random source, used by the CLI
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadNonce;

impl NonceSource for ThreadNonce {
    fn next_nonce(&mut self) -> u32 {
        rand::thread_rng().gen_range(0..=MAX_NONCE)
    }
}

/// Reproducible random source
#[derive(Debug, Clone)]
pub struct SeededNonce {
    rng: StdRng,
}

impl SeededNonce {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl NonceSource for SeededNonce {
    fn next_nonce(&mut self) -> u32 {
        self.rng.gen_range(0..=MAX_NONCE)
    }
}

/// Always returns the same nonce
#[derive(Debug, Clone, Copy)]
pub struct FixedNonce(pub u32);

impl NonceSource for FixedNonce {
    fn next_nonce(&mut self) -> u32 {
        self.0
    }
}
