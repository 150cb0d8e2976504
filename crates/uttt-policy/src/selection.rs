//! Turning logits into a flat action index.

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use thiserror::Error;
use uttt_core::types::{GameState, Move, NUM_ACTIONS};

/// How to pick an action from logits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActionSelection {
    /// Highest logit; ties go to the lowest index.
    #[default]
    Argmax,
    /// Draw from the softmax distribution.
    Sample,
}

impl ActionSelection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Argmax => "argmax",
            Self::Sample => "sample",
        }
    }
}

/// Errors from [`select_action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("expected {expected} logits, got {got}")]
    WrongLength { expected: usize, got: usize },

    #[error("no selectable action: every logit is masked or not a number")]
    NoLegalAction,
}

/// Pick a flat action index from `logits`.
///
/// Entries that are `-inf` or NaN are never chosen, so masked logits from
/// [`masked_logits`] can be passed straight in.
///
/// # Errors
///
/// [`SelectionError::WrongLength`] unless there are exactly 81 logits,
/// [`SelectionError::NoLegalAction`] if every entry is excluded.
pub fn select_action<R: Rng + ?Sized>(
    logits: &[f32],
    selection: ActionSelection,
    rng: &mut R,
) -> Result<usize, SelectionError> {
    if logits.len() != NUM_ACTIONS {
        return Err(SelectionError::WrongLength {
            expected: NUM_ACTIONS,
            got: logits.len(),
        });
    }
    match selection {
        ActionSelection::Argmax => argmax(logits),
        ActionSelection::Sample => {
            let weights = softmax(logits)?;
            let dist = WeightedIndex::new(&weights).map_err(|_| SelectionError::NoLegalAction)?;
            Ok(dist.sample(rng))
        }
    }
}

fn selectable(logit: f32) -> bool {
    !logit.is_nan() && logit != f32::NEG_INFINITY
}

fn argmax(logits: &[f32]) -> Result<usize, SelectionError> {
    logits
        .iter()
        .enumerate()
        .filter(|(_, l)| selectable(**l))
        // Reversed so `max_by` keeps the first of equal maxima.
        .rev()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(idx, _)| idx)
        .ok_or(SelectionError::NoLegalAction)
}

/// Softmax over selectable entries; excluded entries get weight 0.
///
/// A `+inf` logit takes all the mass, shared evenly with any other `+inf`.
fn softmax(logits: &[f32]) -> Result<Vec<f32>, SelectionError> {
    let max = logits
        .iter()
        .copied()
        .filter(|l| selectable(*l))
        .max_by(f32::total_cmp)
        .ok_or(SelectionError::NoLegalAction)?;
    if max == f32::INFINITY {
        return Ok(logits
            .iter()
            .map(|&l| if l == f32::INFINITY { 1.0 } else { 0.0 })
            .collect());
    }
    Ok(logits
        .iter()
        .map(|&l| if selectable(l) { (l - max).exp() } else { 0.0 })
        .collect())
}

/// Copy of `logits` with `-inf` on every move [`GameState::is_open`]
/// rejects.
///
/// A convenience for callers: the engine's verdict stays authoritative and
/// an unmasked agent simply collects the invalid-move penalty.
#[must_use]
pub fn masked_logits(logits: &[f32], state: &GameState) -> Vec<f32> {
    logits
        .iter()
        .enumerate()
        .map(|(action, &logit)| match Move::from_action(action) {
            Ok(mv) if state.is_open(mv) => logit,
            _ => f32::NEG_INFINITY,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
