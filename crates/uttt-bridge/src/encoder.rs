//! Board state to observation tensor.

use ndarray::Array3;

use uttt_core::config::EncoderConfig;
use uttt_core::types::{CELLS, GameState};

/// Channel holding the raw owner of each space (0, 1 or 2).
pub const CHANNEL_SPACE: usize = 0;
/// Channel holding the owner of the enclosing sub-board.
pub const CHANNEL_CELL_OWNER: usize = 1;
/// Channel set to 1 across the sub-board the next move must land in.
pub const CHANNEL_CUR_CELL: usize = 2;
/// Optional channel holding the turn value (1 or 2) everywhere.
pub const CHANNEL_TURN: usize = 3;

/// Encodes a [`GameState`] as a `[9, 9, D]` tensor indexed
/// `[cell, space, channel]`.
///
/// `D` is 3, or 4 when the turn channel is enabled. When the mover has a
/// free choice of sub-board, [`CHANNEL_CUR_CELL`] is all zeros.
///
/// # Example
///
/// ```
/// use uttt_bridge::encoder::BoardEncoder;
/// use uttt_core::types::GameState;
///
/// let encoder = BoardEncoder::new(true);
/// let obs = encoder.encode(&GameState::default());
/// assert_eq!(obs.shape(), &[9, 9, 4]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardEncoder {
    include_turn_channel: bool,
}

impl BoardEncoder {
    #[must_use]
    pub const fn new(include_turn_channel: bool) -> Self {
        Self {
            include_turn_channel,
        }
    }

    #[must_use]
    pub const fn from_config(config: &EncoderConfig) -> Self {
        Self::new(config.include_turn_channel)
    }

    /// Number of channels, `D`.
    #[must_use]
    pub const fn channels(&self) -> usize {
        if self.include_turn_channel { 4 } else { 3 }
    }

    /// Output shape `[9, 9, D]`.
    #[must_use]
    pub const fn shape(&self) -> [usize; 3] {
        [CELLS, CELLS, self.channels()]
    }

    /// Encode `state`. Pure: the same state always gives the same tensor.
    #[must_use]
    pub fn encode(&self, state: &GameState) -> Array3<f32> {
        let mut obs = Array3::<f32>::zeros((CELLS, CELLS, self.channels()));
        let cur = state.board.cur_cell.map(|c| c.index());
        let turn = f32::from(state.turn.value());

        for (cell_idx, cell) in state.board.cells.iter().enumerate() {
            let cell_owner = f32::from(state.cell_owners[cell_idx].value());
            let is_cur = if cur == Some(cell_idx) { 1.0 } else { 0.0 };
            for (space_idx, space) in cell.iter().enumerate() {
                obs[[cell_idx, space_idx, CHANNEL_SPACE]] = f32::from(space.value());
                obs[[cell_idx, space_idx, CHANNEL_CELL_OWNER]] = cell_owner;
                obs[[cell_idx, space_idx, CHANNEL_CUR_CELL]] = is_cur;
                if self.include_turn_channel {
                    obs[[cell_idx, space_idx, CHANNEL_TURN]] = turn;
                }
            }
        }
        obs
    }
}

impl Default for BoardEncoder {
    fn default() -> Self {
        Self::from_config(&EncoderConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
