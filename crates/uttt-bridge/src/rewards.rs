//! Reward shaping for engine-reported outcomes.
//!
//! The engine only reports states, so every shaped signal is derived on the
//! bridge side by comparing consecutive states. [`RewardShaper`] sums three
//! terms per step:
//!
//! - exploration: a fixed valid/invalid signal, or a novelty bonus that
//!   decays with how often an action has been played
//! - cell capture: a one-off bonus when the mover's count of owned
//!   sub-boards goes up
//! - win/loss: paid when the engine reports the mover as the winner

use std::sync::{Arc, Mutex, PoisonError};

use uttt_core::config::{ExplorationConfig, RewardConfig};
use uttt_core::types::{CELLS, MoveOutcome, NUM_ACTIONS, Owner, count_owned};

// ---------------------------------------------------------------------------
// NoveltyTable
// ---------------------------------------------------------------------------

/// Per-action count of valid plays.
///
/// Lives as long as its owner and is never cleared by an episode reset.
/// Clones share the same counts, so several shapers (or environments on
/// other threads) can feed one table.
#[derive(Clone, Debug)]
pub struct NoveltyTable {
    counts: Arc<Mutex<Vec<u32>>>,
}

impl NoveltyTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counts: Arc::new(Mutex::new(vec![0; NUM_ACTIONS])),
        }
    }

    /// Times `action` has been played validly.
    #[must_use]
    pub fn count(&self, action: usize) -> u32 {
        let counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        counts.get(action).copied().unwrap_or(0)
    }

    /// Increment the count for `action` and return the previous count.
    pub fn record(&self, action: usize) -> u32 {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        counts.get_mut(action).map_or(0, |count| {
            let previous = *count;
            *count = count.saturating_add(1);
            previous
        })
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        let counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        counts.iter().map(|c| u64::from(*c)).sum()
    }
}

impl Default for NoveltyTable {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// ExplorationModel
// ---------------------------------------------------------------------------

/// The exploration term. Exactly one model is active per shaper.
#[derive(Clone, Debug)]
pub enum ExplorationModel {
    InvalidPenalty {
        valid_reward: f32,
        invalid_penalty: f32,
    },
    NoveltyDecay {
        decay_rate: f32,
        table: NoveltyTable,
    },
}

impl ExplorationModel {
    #[must_use]
    pub fn from_config(config: &ExplorationConfig) -> Self {
        match *config {
            ExplorationConfig::InvalidPenalty {
                valid_reward,
                invalid_penalty,
            } => Self::InvalidPenalty {
                valid_reward,
                invalid_penalty,
            },
            ExplorationConfig::NoveltyDecay { decay_rate } => Self::NoveltyDecay {
                decay_rate,
                table: NoveltyTable::new(),
            },
        }
    }

    fn score(&self, action: usize, valid: bool) -> f32 {
        match self {
            Self::InvalidPenalty {
                valid_reward,
                invalid_penalty,
            } => {
                if valid {
                    *valid_reward
                } else {
                    *invalid_penalty
                }
            }
            Self::NoveltyDecay { decay_rate, table } => {
                if !valid {
                    return 0.0;
                }
                #[allow(clippy::cast_precision_loss)]
                let seen = table.record(action) as f32;
                (-decay_rate * seen).exp()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Perspective / RewardBreakdown
// ---------------------------------------------------------------------------

/// Whose move is being scored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Perspective {
    /// The agent being trained made the move.
    #[default]
    Agent,
    /// The other side made the move (self-play through one bridge).
    Opponent,
}

/// Per-term reward for one step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RewardBreakdown {
    pub exploration: f32,
    pub cell_capture: f32,
    pub win: f32,
    pub loss: f32,
}

impl RewardBreakdown {
    /// Sum of all terms, unclipped.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.exploration + self.cell_capture + self.win - self.loss
    }
}

// ---------------------------------------------------------------------------
// RewardShaper
// ---------------------------------------------------------------------------

/// Stateful reward computation for one environment.
///
/// The cell-owner baseline and the won/lost flags are per episode and
/// cleared by [`reset`](Self::reset). A novelty table, if any, outlives
/// resets.
#[derive(Clone, Debug)]
pub struct RewardShaper {
    exploration: ExplorationModel,
    cell_reward: f32,
    win_reward: f32,
    loss_penalty: f32,
    prev_cell_owners: [Owner; CELLS],
    won: bool,
    lost: bool,
}

impl RewardShaper {
    #[must_use]
    pub fn new(config: &RewardConfig) -> Self {
        Self::with_exploration(config, ExplorationModel::from_config(&config.exploration))
    }

    /// Use an explicit exploration model, e.g. one sharing a
    /// [`NoveltyTable`] with another shaper.
    #[must_use]
    pub const fn with_exploration(config: &RewardConfig, exploration: ExplorationModel) -> Self {
        Self {
            exploration,
            cell_reward: config.cell_reward,
            win_reward: config.win_reward,
            loss_penalty: config.loss_penalty,
            prev_cell_owners: [Owner::None; CELLS],
            won: false,
            lost: false,
        }
    }

    /// Clear the per-episode state.
    pub const fn reset(&mut self) {
        self.prev_cell_owners = [Owner::None; CELLS];
        self.won = false;
        self.lost = false;
    }

    /// Score `action` given the engine's verdict.
    ///
    /// The engine stamps `outcome.state.turn` with the side that just moved,
    /// so the mover is read from there.
    pub fn score(
        &mut self,
        action: usize,
        outcome: &MoveOutcome,
        perspective: Perspective,
    ) -> RewardBreakdown {
        let state = &outcome.state;
        let mover = state.turn.owner();
        let mut breakdown = RewardBreakdown {
            exploration: self.exploration.score(action, outcome.valid),
            ..Default::default()
        };

        let before = count_owned(&self.prev_cell_owners, mover);
        if state.cells_owned_by(mover) > before {
            breakdown.cell_capture = self.cell_reward;
            self.prev_cell_owners = state.cell_owners;
        }

        if state.mover_won() {
            match perspective {
                Perspective::Agent => {
                    breakdown.win = self.win_reward;
                    self.won = true;
                }
                Perspective::Opponent => {
                    breakdown.loss = self.loss_penalty;
                    self.lost = true;
                }
            }
        }
        breakdown
    }

    #[must_use]
    pub const fn won(&self) -> bool {
        self.won
    }

    #[must_use]
    pub const fn lost(&self) -> bool {
        self.lost
    }

    /// Cell owners the next capture is measured against.
    #[must_use]
    pub const fn baseline(&self) -> &[Owner; CELLS] {
        &self.prev_cell_owners
    }

    #[must_use]
    pub const fn exploration(&self) -> &ExplorationModel {
        &self.exploration
    }

    /// The novelty table, when the novelty model is active.
    #[must_use]
    pub const fn novelty_table(&self) -> Option<&NoveltyTable> {
        match &self.exploration {
            ExplorationModel::NoveltyDecay { table, .. } => Some(table),
            ExplorationModel::InvalidPenalty { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use uttt_core::types::{GameState, Player};

    use super::*;

    fn penalty_shaper() -> RewardShaper {
        RewardShaper::new(&RewardConfig::default())
    }

    fn novelty_shaper(decay_rate: f32) -> RewardShaper {
        RewardShaper::new(&RewardConfig {
            exploration: ExplorationConfig::NoveltyDecay { decay_rate },
            ..Default::default()
        })
    }

    fn outcome(valid: bool, turn: Player) -> MoveOutcome {
        MoveOutcome {
            valid,
            state: GameState {
                turn,
                ..Default::default()
            },
        }
    }

    // -- exploration --

    #[test]
    fn invalid_penalty_model() {
        let mut shaper = penalty_shaper();
        let valid = shaper.score(0, &outcome(true, Player::Player1), Perspective::Agent);
        let invalid = shaper.score(0, &outcome(false, Player::Player1), Perspective::Agent);
        assert_relative_eq!(valid.total(), 0.1);
        assert_relative_eq!(invalid.total(), -1.0);
    }

    #[test]
    fn novelty_first_play_is_one() {
        let mut shaper = novelty_shaper(0.1);
        let r = shaper.score(5, &outcome(true, Player::Player1), Perspective::Agent);
        assert_relative_eq!(r.exploration, 1.0);
    }

    #[test]
    fn novelty_strictly_decreasing_towards_zero() {
        let mut shaper = novelty_shaper(0.5);
        let mut last = f32::INFINITY;
        for _ in 0..50 {
            let r = shaper
                .score(7, &outcome(true, Player::Player1), Perspective::Agent)
                .exploration;
            assert!(r < last);
            last = r;
        }
        assert!(last < 1e-9);
    }

    #[test]
    fn novelty_invalid_is_zero_and_not_counted() {
        let mut shaper = novelty_shaper(0.1);
        let r = shaper.score(3, &outcome(false, Player::Player1), Perspective::Agent);
        assert_relative_eq!(r.exploration, 0.0);
        assert_eq!(shaper.novelty_table().unwrap().count(3), 0);
    }

    #[test]
    fn novelty_survives_reset() {
        let mut shaper = novelty_shaper(0.1);
        shaper.score(3, &outcome(true, Player::Player1), Perspective::Agent);
        shaper.reset();
        let r = shaper.score(3, &outcome(true, Player::Player1), Perspective::Agent);
        assert_relative_eq!(r.exploration, (-0.1f32).exp());
        assert_eq!(shaper.novelty_table().unwrap().count(3), 2);
    }

    #[test]
    fn novelty_table_is_shared_between_clones() {
        let table = NoveltyTable::new();
        let config = RewardConfig::default();
        let mut a = RewardShaper::with_exploration(
            &config,
            ExplorationModel::NoveltyDecay {
                decay_rate: 1.0,
                table: table.clone(),
            },
        );
        let mut b = RewardShaper::with_exploration(
            &config,
            ExplorationModel::NoveltyDecay {
                decay_rate: 1.0,
                table: table.clone(),
            },
        );
        a.score(10, &outcome(true, Player::Player1), Perspective::Agent);
        let r = b.score(10, &outcome(true, Player::Player2), Perspective::Agent);
        assert_relative_eq!(r.exploration, (-1.0f32).exp());
        assert_eq!(table.total(), 2);
    }

    #[test]
    fn penalty_model_has_no_table() {
        let shaper = penalty_shaper();
        assert!(shaper.novelty_table().is_none());
        assert!(matches!(
            shaper.exploration(),
            ExplorationModel::InvalidPenalty { .. }
        ));
    }

    #[test]
    fn default_table_counts_every_action() {
        let table = NoveltyTable::default();
        assert_eq!(table.record(NUM_ACTIONS - 1), 0);
        assert_eq!(table.record(NUM_ACTIONS - 1), 1);
        assert_eq!(table.count(NUM_ACTIONS - 1), 2);
        assert_eq!(table.record(NUM_ACTIONS), 0);
        assert_eq!(table.total(), 2);
    }

    // -- cell capture --

    #[test]
    fn capture_pays_once_per_increase() {
        let mut shaper = penalty_shaper();
        let mut o = outcome(true, Player::Player1);

        let r0 = shaper.score(0, &o, Perspective::Agent);
        assert_relative_eq!(r0.cell_capture, 0.0);

        o.state.cell_owners[0] = Owner::Player1;
        let r1 = shaper.score(1, &o, Perspective::Agent);
        assert_relative_eq!(r1.cell_capture, 1.0);
        assert_eq!(shaper.baseline()[0], Owner::Player1);

        // Same owners again: no further bonus.
        let r2 = shaper.score(2, &o, Perspective::Agent);
        assert_relative_eq!(r2.cell_capture, 0.0);
    }

    #[test]
    fn capture_pays_once_for_several_new_cells() {
        let mut shaper = penalty_shaper();
        let mut o = outcome(true, Player::Player2);
        o.state.cell_owners[1] = Owner::Player2;
        o.state.cell_owners[2] = Owner::Player2;
        let r = shaper.score(0, &o, Perspective::Agent);
        assert_relative_eq!(r.cell_capture, 1.0);
    }

    #[test]
    fn capture_counts_only_mover_cells() {
        let mut shaper = penalty_shaper();
        let mut o = outcome(true, Player::Player1);
        o.state.cell_owners[4] = Owner::Player2;
        let r = shaper.score(0, &o, Perspective::Agent);
        assert_relative_eq!(r.cell_capture, 0.0);
        assert_eq!(shaper.baseline(), &[Owner::None; CELLS]);
    }

    #[test]
    fn capture_baseline_cleared_on_reset() {
        let mut shaper = penalty_shaper();
        let mut o = outcome(true, Player::Player1);
        o.state.cell_owners[0] = Owner::Player1;
        shaper.score(0, &o, Perspective::Agent);
        shaper.reset();
        let r = shaper.score(0, &o, Perspective::Agent);
        assert_relative_eq!(r.cell_capture, 1.0);
    }

    // -- win / loss --

    #[test]
    fn agent_win_pays_win_reward() {
        let mut shaper = penalty_shaper();
        let mut o = outcome(true, Player::Player1);
        o.state.winner = Owner::Player1;
        o.state.done = true;
        let r = shaper.score(0, &o, Perspective::Agent);
        assert_relative_eq!(r.win, 10.0);
        assert_relative_eq!(r.loss, 0.0);
        assert!(shaper.won());
        assert!(!shaper.lost());
    }

    #[test]
    fn opponent_win_pays_loss_penalty() {
        let mut shaper = penalty_shaper();
        let mut o = outcome(true, Player::Player2);
        o.state.winner = Owner::Player2;
        o.state.done = true;
        let r = shaper.score(0, &o, Perspective::Opponent);
        assert_relative_eq!(r.win, 0.0);
        assert_relative_eq!(r.loss, 10.0);
        assert_relative_eq!(r.total(), 0.1 - 10.0);
        assert!(shaper.lost());
        assert!(!shaper.won());
    }

    #[test]
    fn winner_other_than_mover_pays_nothing() {
        let mut shaper = penalty_shaper();
        let mut o = outcome(true, Player::Player1);
        o.state.winner = Owner::Player2;
        let r = shaper.score(0, &o, Perspective::Agent);
        assert_relative_eq!(r.win, 0.0);
        assert_relative_eq!(r.loss, 0.0);
    }

    #[test]
    fn win_and_loss_never_both_fire() {
        for perspective in [Perspective::Agent, Perspective::Opponent] {
            for winner in [Owner::None, Owner::Player1, Owner::Player2] {
                let mut shaper = penalty_shaper();
                let mut o = outcome(true, Player::Player1);
                o.state.winner = winner;
                let r = shaper.score(0, &o, perspective);
                assert!(r.win == 0.0 || r.loss == 0.0);
            }
        }
    }

    #[test]
    fn terms_sum_without_clipping() {
        let mut shaper = penalty_shaper();
        let mut o = outcome(true, Player::Player1);
        o.state.cell_owners[0] = Owner::Player1;
        o.state.winner = Owner::Player1;
        let r = shaper.score(0, &o, Perspective::Agent);
        assert_relative_eq!(r.total(), 0.1 + 1.0 + 10.0);
    }
}
