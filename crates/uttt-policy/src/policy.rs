//! A model plus a selection rule, ready to choose moves.

use ndarray::Array3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uttt_core::types::GameState;

use crate::model::{Inference, Model};
use crate::selection::{ActionSelection, SelectionError, masked_logits, select_action};

/// Chooses a flat action index for an observation.
///
/// Masking against the current [`GameState`] is on by default; disable it
/// with [`with_masking`](Self::with_masking) to let the agent learn the
/// rules from the invalid-move penalty instead.
pub struct ModelPolicy {
    model: Box<dyn Model>,
    selection: ActionSelection,
    mask: bool,
    rng: ChaCha8Rng,
    last: Option<Inference>,
}

impl ModelPolicy {
    #[must_use]
    pub fn new(model: Box<dyn Model>, selection: ActionSelection, seed: u64) -> Self {
        Self {
            model,
            selection,
            mask: true,
            rng: ChaCha8Rng::seed_from_u64(seed),
            last: None,
        }
    }

    #[must_use]
    pub const fn with_masking(mut self, mask: bool) -> Self {
        self.mask = mask;
        self
    }

    /// Run the model and pick an action.
    ///
    /// # Errors
    ///
    /// Whatever [`select_action`] reports for the model's logits.
    pub fn act(&mut self, observation: &Array3<f32>, state: &GameState) -> Result<usize, SelectionError> {
        let inference = self.model.infer(observation);
        let action = if self.mask {
            let logits = masked_logits(&inference.logits, state);
            select_action(&logits, self.selection, &mut self.rng)
        } else {
            select_action(&inference.logits, self.selection, &mut self.rng)
        };
        self.last = Some(inference);
        action
    }

    /// Output of the most recent [`act`](Self::act).
    #[must_use]
    pub const fn last_inference(&self) -> Option<&Inference> {
        self.last.as_ref()
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    #[must_use]
    pub const fn selection(&self) -> ActionSelection {
        self.selection
    }
}

impl std::fmt::Debug for ModelPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelPolicy")
            .field("model", &self.model.name())
            .field("selection", &self.selection)
            .field("mask", &self.mask)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
