use chrono::Utc;
use num_bigint::{BigUint, RandBigInt};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Seeded random source shared by prime search, exponent search and the
/// witness sampling of the primality test. Owned by the caller, never global.
pub struct RandState {
    rng: StdRng,
    seed: u64,
}

impl RandState {
    pub fn new(seed: u64) -> Self {
        log::trace!("random state initialised with seed {}", seed);
        Self { rng: StdRng::seed_from_u64(seed), seed }
    }

    pub fn from_clock() -> Self {
        Self::new(Utc::now().timestamp() as u64)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform value with `bits` random bits, i.e. in `[0, 2^bits)`.
    pub fn bits(&mut self, bits: u64) -> BigUint {
        self.rng.gen_biguint(bits)
    }

    /// Uniform value in `[low, high)`.
    pub fn range(&mut self, low: &BigUint, high: &BigUint) -> BigUint {
        self.rng.gen_biguint_range(low, high)
    }

    /// Uniform value in `[low, high]`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        self.rng.gen_range(low..=high)
    }

    pub fn fill(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest);
    }
}

impl Drop for RandState {
    fn drop(&mut self) {
        log::trace!("random state for seed {} cleared", self.seed);
    }
}
