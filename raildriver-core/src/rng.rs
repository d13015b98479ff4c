//! Deterministic simulation RNG.
//!
//! All randomness in the core (track feature layout, dwell duration, and
//! passenger draws) flows through [SimRng] so that identical seeds produce
//! identical sessions.  The default is entropy-seeded; session-to-session
//! layout variation is a feature, not an accident.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
pub struct SimRng(pub ChaCha8Rng);

impl Default for SimRng {
    fn default() -> Self {
        Self(ChaCha8Rng::seed_from_u64(rand::random()))
    }
}

impl SimRng {
    pub fn from_seed_u64(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    /// `None` seeds from entropy; `Some` reproduces a session exactly.
    pub fn from_seed_opt(seed: Option<u64>) -> Self {
        seed.map(Self::from_seed_u64).unwrap_or_default()
    }
}
