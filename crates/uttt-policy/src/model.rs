//! The model collaborator and two reference implementations.

use std::sync::{Mutex, PoisonError};

use ndarray::Array3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uttt_core::types::NUM_ACTIONS;

/// Output of one forward pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Inference {
    /// One unnormalized score per flat action index.
    pub logits: Vec<f32>,
    /// Value estimate for the side to move.
    pub value: f32,
}

impl Inference {
    #[must_use]
    pub fn zeros() -> Self {
        Self {
            logits: vec![0.0; NUM_ACTIONS],
            value: 0.0,
        }
    }
}

/// Maps an encoded observation to action logits and a value.
///
/// The bridge treats implementations as opaque; a trained network sits
/// behind this trait in practice.
pub trait Model: Send + Sync + 'static {
    /// Run inference on a `[9, 9, D]` observation.
    fn infer(&self, observation: &Array3<f32>) -> Inference;

    /// Human-readable name for this model.
    fn name(&self) -> &str;

    /// Whether repeated calls on the same input give the same output.
    fn is_deterministic(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// UniformModel
// ---------------------------------------------------------------------------

/// All-zero logits and value: every action equally likely.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformModel;

impl Model for UniformModel {
    fn infer(&self, _observation: &Array3<f32>) -> Inference {
        Inference::zeros()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "UniformModel"
    }
}

// ---------------------------------------------------------------------------
// RandomModel
// ---------------------------------------------------------------------------

/// Logits and value drawn uniformly from `[-1, 1)`.
///
/// Uses a seeded RNG for determinism. Thread-safe via [`Mutex`].
#[derive(Debug)]
pub struct RandomModel {
    rng: Mutex<ChaCha8Rng>,
}

impl RandomModel {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl Model for RandomModel {
    fn infer(&self, _observation: &Array3<f32>) -> Inference {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let logits = (0..NUM_ACTIONS).map(|_| rng.gen_range(-1.0..1.0)).collect();
        Inference {
            logits,
            value: rng.gen_range(-1.0..1.0),
        }
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "RandomModel"
    }

    fn is_deterministic(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn obs() -> Array3<f32> {
        Array3::zeros((9, 9, 4))
    }

    #[test]
    fn uniform_model_is_flat() {
        let out = UniformModel.infer(&obs());
        assert_eq!(out.logits.len(), NUM_ACTIONS);
        for logit in &out.logits {
            assert_abs_diff_eq!(*logit, 0.0);
        }
        assert_abs_diff_eq!(out.value, 0.0);
        assert!(UniformModel.is_deterministic());
        assert_eq!(UniformModel.name(), "UniformModel");
    }

    #[test]
    fn random_model_is_seeded() {
        let a = RandomModel::new(3).infer(&obs());
        let b = RandomModel::new(3).infer(&obs());
        assert_eq!(a, b);
        assert_eq!(a.logits.len(), NUM_ACTIONS);
        assert!(a.logits.iter().all(|l| (-1.0..1.0).contains(l)));
    }

    #[test]
    fn random_model_advances() {
        let model = RandomModel::new(3);
        assert_ne!(model.infer(&obs()), model.infer(&obs()));
        assert!(!model.is_deterministic());
    }
}
