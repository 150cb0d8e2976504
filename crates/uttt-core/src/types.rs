//! Board model shared by the codec, encoder, reward shaper and policies.
//!
//! These are the bridge's own view of the engine's messages: fixed-size
//! arrays instead of repeated fields, `Option<Coord>` instead of an
//! invalidated coordinate. Conversion from the wire lives in `uttt-bridge`.

use crate::error::ValidationError;

/// Rows per grid (both the large board and each sub-board).
pub const ROWS: usize = 3;
/// Columns per grid.
pub const COLS: usize = 3;
/// Cells per grid.
pub const CELLS: usize = ROWS * COLS;
/// Size of the flat action space: one index per `(large, small)` pair.
pub const NUM_ACTIONS: usize = CELLS * CELLS;

// ---------------------------------------------------------------------------
// Owner / Player
// ---------------------------------------------------------------------------

/// Ownership of a space or a cell. Discriminants match the wire enum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Owner {
    #[default]
    None = 0,
    Player1 = 1,
    Player2 = 2,
}

impl Owner {
    /// Numeric wire value (0, 1 or 2).
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Parse a wire value. Returns `None` for anything outside `0..=2`.
    #[must_use]
    pub const fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Player1),
            2 => Some(Self::Player2),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

/// The side whose turn it is. Never `NONE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Player {
    #[default]
    Player1,
    Player2,
}

impl Player {
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Player1 => 1,
            Self::Player2 => 2,
        }
    }

    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player1 => Self::Player2,
            Self::Player2 => Self::Player1,
        }
    }

    #[must_use]
    pub const fn owner(self) -> Owner {
        match self {
            Self::Player1 => Owner::Player1,
            Self::Player2 => Owner::Player2,
        }
    }

    /// `Owner::None` has no corresponding player.
    #[must_use]
    pub const fn from_owner(owner: Owner) -> Option<Self> {
        match owner {
            Owner::None => None,
            Owner::Player1 => Some(Self::Player1),
            Owner::Player2 => Some(Self::Player2),
        }
    }
}

impl From<Player> for Owner {
    fn from(player: Player) -> Self {
        player.owner()
    }
}

// ---------------------------------------------------------------------------
// Coord / Move
// ---------------------------------------------------------------------------

/// A position on a 3x3 grid. Always in range once constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Coord {
    row: usize,
    col: usize,
}

impl Coord {
    /// Build a coordinate, or `None` if either component is off the grid.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Option<Self> {
        if row < ROWS && col < COLS {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// Inverse of [`index`](Self::index).
    #[must_use]
    pub const fn from_index(idx: usize) -> Option<Self> {
        if idx < CELLS {
            Some(Self {
                row: idx / COLS,
                col: idx % COLS,
            })
        } else {
            None
        }
    }

    /// `row * COLS + col`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.row * COLS + self.col
    }

    #[must_use]
    pub const fn row(self) -> usize {
        self.row
    }

    #[must_use]
    pub const fn col(self) -> usize {
        self.col
    }

    /// The centre of the grid, where the engine starts `curCell`.
    #[must_use]
    pub const fn center() -> Self {
        Self {
            row: ROWS / 2,
            col: COLS / 2,
        }
    }
}

/// A sub-board (`large`) plus a space inside it (`small`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub large: Coord,
    pub small: Coord,
}

impl Move {
    #[must_use]
    pub const fn new(large: Coord, small: Coord) -> Self {
        Self { large, small }
    }

    /// Decode a flat action index: `large = action / 9`, `small = action % 9`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ActionOutOfRange`] if `action >= 81`.
    pub const fn from_action(action: usize) -> Result<Self, ValidationError> {
        match (Coord::from_index(action / CELLS), Coord::from_index(action % CELLS)) {
            (Some(large), Some(small)) if action < NUM_ACTIONS => Ok(Self { large, small }),
            _ => Err(ValidationError::ActionOutOfRange {
                value: action,
                max: NUM_ACTIONS,
            }),
        }
    }

    /// Flat action index in `[0, 81)`.
    #[must_use]
    pub const fn to_action(self) -> usize {
        self.large.index() * CELLS + self.small.index()
    }
}

// ---------------------------------------------------------------------------
// Board / GameState
// ---------------------------------------------------------------------------

/// Nine sub-boards of nine spaces each, plus the sub-board the next move
/// must land in. `cur_cell == None` means the mover may pick any sub-board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Board {
    pub cells: [[Owner; CELLS]; CELLS],
    pub cur_cell: Option<Coord>,
}

impl Board {
    #[must_use]
    pub const fn space(&self, mv: Move) -> Owner {
        self.cells[mv.large.index()][mv.small.index()]
    }

    /// Number of spaces claimed by anyone.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|space| !space.is_none())
            .count()
    }
}

/// A full snapshot reported by the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub cell_owners: [Owner; CELLS],
    pub turn: Player,
    pub winner: Owner,
    pub done: bool,
}

impl GameState {
    /// Number of sub-boards owned by `owner`.
    #[must_use]
    pub fn cells_owned_by(&self, owner: Owner) -> usize {
        count_owned(&self.cell_owners, owner)
    }

    /// Whether the engine reports the side in `turn` as the winner.
    ///
    /// The engine stamps a result with the mover's own turn, so this reads
    /// as "the move just played won the game".
    #[must_use]
    pub fn mover_won(&self) -> bool {
        self.winner == self.turn.owner()
    }

    /// Whether `mv` targets an open space in a sub-board the mover may use.
    ///
    /// Mirrors the constraint the engine reports through `cur_cell` and cell
    /// ownership. The engine's verdict in `ReturnMessage.valid` stays
    /// authoritative.
    #[must_use]
    pub fn is_open(&self, mv: Move) -> bool {
        let cell_allowed = match self.board.cur_cell {
            Some(cur) => cur == mv.large,
            None => self.cell_owners[mv.large.index()].is_none(),
        };
        cell_allowed && self.board.space(mv).is_none()
    }
}

/// Count entries of `owners` equal to `owner`.
#[must_use]
pub fn count_owned(owners: &[Owner; CELLS], owner: Owner) -> usize {
    owners.iter().filter(|o| **o == owner).count()
}

/// The engine's verdict on a submitted move plus the resulting state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub valid: bool,
    pub state: GameState,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
