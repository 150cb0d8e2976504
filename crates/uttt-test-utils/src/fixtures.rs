//! Game-state builders for tests.
//!
//! These only place marks and move `cur_cell`; they do not check rules or
//! detect wins. Tests set `cell_owners`, `winner` and `done` explicitly.

use uttt_core::types::{Coord, GameState, Move, MoveOutcome, Owner, Player};

/// The engine's opening state: empty board, player 1 to move, constrained
/// to the centre sub-board.
pub fn opening_state() -> GameState {
    let mut state = GameState::default();
    state.board.cur_cell = Some(Coord::center());
    state
}

/// A `ReturnMessage` accepting a move.
pub fn accepted(state: GameState) -> MoveOutcome {
    MoveOutcome { valid: true, state }
}

/// A `ReturnMessage` rejecting a move; the board is unchanged.
pub fn rejected(state: GameState) -> MoveOutcome {
    MoveOutcome {
        valid: false,
        state,
    }
}

/// Builds a sequence of states by placing marks.
#[derive(Clone, Debug)]
pub struct GameBuilder {
    state: GameState,
}

impl GameBuilder {
    pub fn new() -> Self {
        Self {
            state: opening_state(),
        }
    }

    /// Place the side-to-move's mark for flat `action` and return the
    /// state as the engine reports it in a `ReturnMessage`: `turn` is the
    /// mover. The builder then passes the turn and points `cur_cell` at the
    /// sub-board matching the small coordinate, or frees it if that
    /// sub-board is owned.
    pub fn play(&mut self, action: usize) -> GameState {
        let mv = Move::from_action(action).expect("action in range");
        let mover = self.state.turn;
        self.state.board.cells[mv.large.index()][mv.small.index()] = mover.owner();
        let reported = self.state.clone();

        self.state.turn = mover.opponent();
        self.state.board.cur_cell = if self.state.cell_owners[mv.small.index()].is_none() {
            Some(mv.small)
        } else {
            None
        };
        reported
    }

    /// Award sub-board `cell` to `owner` in the current state.
    pub fn claim(&mut self, cell: usize, owner: Owner) -> &mut Self {
        self.state.cell_owners[cell] = owner;
        self
    }

    /// Mark the game over with `winner`.
    pub fn finish(&mut self, winner: Owner) -> &mut Self {
        self.state.winner = winner;
        self.state.done = true;
        self
    }

    /// Hand the move to `turn`, e.g. to open a game with the second player.
    pub fn set_turn(&mut self, turn: Player) -> &mut Self {
        self.state.turn = turn;
        self
    }

    /// The state the engine would push at the start of the next turn.
    pub fn state(&self) -> GameState {
        self.state.clone()
    }
}

impl Default for GameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_state_is_centre_constrained() {
        let state = opening_state();
        assert_eq!(state.board.cur_cell, Some(Coord::center()));
        assert_eq!(state.turn, Player::Player1);
        assert_eq!(state.board.occupied(), 0);
    }

    #[test]
    fn play_reports_mover_then_passes_turn() {
        let mut game = GameBuilder::new();
        let reported = game.play(40);
        assert_eq!(reported.turn, Player::Player1);
        assert_eq!(reported.board.cells[4][4], Owner::Player1);

        let next = game.state();
        assert_eq!(next.turn, Player::Player2);
        assert_eq!(next.board.cur_cell, Some(Coord::center()));
    }

    #[test]
    fn set_turn_changes_mover() {
        let mut game = GameBuilder::new();
        game.set_turn(Player::Player2);
        let reported = game.play(40);
        assert_eq!(reported.turn, Player::Player2);
        assert_eq!(reported.board.cells[4][4], Owner::Player2);
        assert_eq!(game.state().turn, Player::Player1);
    }

    #[test]
    fn play_into_owned_cell_frees_choice() {
        let mut game = GameBuilder::new();
        game.claim(0, Owner::Player2);
        // small index 0 -> sub-board 0, which is owned
        game.play(36);
        assert_eq!(game.state().board.cur_cell, None);
    }
}
