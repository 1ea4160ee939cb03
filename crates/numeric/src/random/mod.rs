// Seeded randomness for reproducible test vectors. OS entropy is reached
// directly through `rand::rng()`.

use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};

/// Deterministic RNG for testing, seeded from a u64.
///
/// Implements `RngCore`, so it can be handed to anything that samples from an
/// `impl Rng` (e.g. `Field::random_element_with`).
pub struct DebugRng {
    inner: StdRng,
}

impl DebugRng {
    pub fn new(seed: u64) -> Self {
        Self { inner: StdRng::seed_from_u64(seed) }
    }

    pub fn get_random_u128(&mut self) -> u128 {
        self.inner.random()
    }
}

impl RngCore for DebugRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        self.inner.fill_bytes(dst)
    }
}
