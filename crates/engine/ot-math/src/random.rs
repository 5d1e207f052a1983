use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Default seed used when a model does not specify one, matching the
/// source's `RZ_SHARED_STATE_DEFAULT_SEED`.
pub const DEFAULT_SEED: u64 = 0x12345;

/// Seedable PRNG with an epoch counter, owned one-per-model so that nested
/// composite models can each advance independently before the top-level
/// epoch bumps.
#[derive(Debug, Clone)]
pub struct ExprRandomState {
    epoch: u64,
    rng: rand::rngs::StdRng,
}

impl ExprRandomState {
    pub fn new(seed: u64) -> Self {
        Self {
            epoch: 0,
            rng: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.rng = rand::rngs::StdRng::seed_from_u64(seed);
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Bumps the epoch counter, invalidating any cached `randu()`/`randn()`
    /// draws an expression evaluator may have memoized for this pass.
    pub fn update(&mut self) {
        self.epoch += 1;
    }

    pub fn randu(&mut self) -> f64 {
        self.rng.random_range(0.0..1.0)
    }

    pub fn randn(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }
}

impl Default for ExprRandomState {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
