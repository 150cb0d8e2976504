//! Policy side of the bridge: the model interface and action selection.
//!
//! A [`Model`](model::Model) maps an encoded observation to 81 logits and a
//! value estimate. [`select_action`](selection::select_action) turns logits
//! into a flat action index, greedily or by sampling.
//! [`ModelPolicy`](policy::ModelPolicy) bundles the two with legal-move
//! masking.
//!
//! # Example
//!
//! ```
//! use uttt_core::types::GameState;
//! use uttt_policy::prelude::*;
//!
//! let mut policy = ModelPolicy::new(Box::new(UniformModel), ActionSelection::Argmax, 7);
//! let state = GameState::default();
//! let obs = ndarray::Array3::<f32>::zeros((9, 9, 4));
//! let action = policy.act(&obs, &state).unwrap();
//! assert!(action < 81);
//! ```

pub mod model;
pub mod policy;
pub mod selection;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        model::{Inference, Model, RandomModel, UniformModel},
        policy::ModelPolicy,
        selection::{ActionSelection, SelectionError, masked_logits, select_action},
    };
}
