//! Deterministic RNG utilities for reproducible tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uttt_core::types::NUM_ACTIONS;

/// Create a deterministic `ChaCha8Rng` from a seed.
///
/// All test randomization should go through this to ensure reproducibility.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// One logit per action in `[-1, 1)`, reproducible from `seed`.
pub fn deterministic_logits(seed: u64) -> Vec<f32> {
    let mut rng = seeded_rng(seed);
    (0..NUM_ACTIONS).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
