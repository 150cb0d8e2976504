//! Protobuf codec for the engine's wire schema.
//!
//! The schema belongs to the engine; the structs in [`wire`] only mirror it.
//! There is no framing and no version field: one encoded message per send.
//!
//! ```text
//! enum    Owner         { NONE = 0; PLAYER1 = 1; PLAYER2 = 2; }
//! message Coord         { int32 row = 1; int32 col = 2; }
//! message Move          { Coord large = 1; Coord small = 2; }
//! message Space         { Owner val = 1; }
//! message Cell          { repeated Space spaces = 1; }
//! message Board         { repeated Cell cells = 1; Coord curCell = 2; }
//! message StateMessage  { Board board = 1; repeated Owner cellowners = 2;
//!                         Owner turn = 3; Owner winner = 4; bool done = 5; }
//! message ActionMessage { Move move = 1; }
//! message ReturnMessage { bool valid = 1; StateMessage state = 2; }
//! ```
//!
//! Decoding validates the shape (nine cells of nine spaces, nine cell
//! owners, known enum values, on-grid move coordinates) and converts into
//! the fixed-size types of `uttt_core::types`. An off-grid `curCell` is the
//! engine's "free choice" marker and decodes to `None`.

use bytes::Bytes;
use prost::Message as _;

use uttt_core::types::{Board, CELLS, Coord, GameState, Move, MoveOutcome, Owner, Player};

use crate::protocol::{Message, MessageKind, ProtocolError};

/// Value written for `curCell` when the mover may choose any sub-board.
pub const FREE_CHOICE: i32 = -1;

// ---------------------------------------------------------------------------
// Wire schema
// ---------------------------------------------------------------------------

/// Protobuf structs matching the engine's schema field-for-field.
pub mod wire {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum Owner {
        None = 0,
        Player1 = 1,
        Player2 = 2,
    }

    #[derive(Clone, Copy, PartialEq, Eq, prost::Message)]
    pub struct Coord {
        #[prost(int32, tag = "1")]
        pub row: i32,
        #[prost(int32, tag = "2")]
        pub col: i32,
    }

    #[derive(Clone, Copy, PartialEq, Eq, prost::Message)]
    pub struct Move {
        #[prost(message, optional, tag = "1")]
        pub large: Option<Coord>,
        #[prost(message, optional, tag = "2")]
        pub small: Option<Coord>,
    }

    #[derive(Clone, Copy, PartialEq, Eq, prost::Message)]
    pub struct Space {
        #[prost(enumeration = "Owner", tag = "1")]
        pub val: i32,
    }

    #[derive(Clone, PartialEq, Eq, prost::Message)]
    pub struct Cell {
        #[prost(message, repeated, tag = "1")]
        pub spaces: Vec<Space>,
    }

    #[derive(Clone, PartialEq, Eq, prost::Message)]
    pub struct Board {
        #[prost(message, repeated, tag = "1")]
        pub cells: Vec<Cell>,
        #[prost(message, optional, tag = "2")]
        pub cur_cell: Option<Coord>,
    }

    #[derive(Clone, PartialEq, Eq, prost::Message)]
    pub struct StateMessage {
        #[prost(message, optional, tag = "1")]
        pub board: Option<Board>,
        #[prost(enumeration = "Owner", repeated, tag = "2")]
        pub cellowners: Vec<i32>,
        #[prost(enumeration = "Owner", tag = "3")]
        pub turn: i32,
        #[prost(enumeration = "Owner", tag = "4")]
        pub winner: i32,
        #[prost(bool, tag = "5")]
        pub done: bool,
    }

    #[derive(Clone, Copy, PartialEq, Eq, prost::Message)]
    pub struct ActionMessage {
        #[prost(message, optional, tag = "1")]
        pub r#move: Option<Move>,
    }

    #[derive(Clone, PartialEq, Eq, prost::Message)]
    pub struct ReturnMessage {
        #[prost(bool, tag = "1")]
        pub valid: bool,
        #[prost(message, optional, tag = "2")]
        pub state: Option<StateMessage>,
    }
}

// ---------------------------------------------------------------------------
// encode / decode
// ---------------------------------------------------------------------------

/// Serialise a message to its protobuf bytes.
#[must_use]
pub fn encode(msg: &Message) -> Bytes {
    let bytes = match msg {
        Message::State(state) => state_to_wire(state).encode_to_vec(),
        Message::Action(mv) => wire::ActionMessage {
            r#move: Some(move_to_wire(*mv)),
        }
        .encode_to_vec(),
        Message::Return(outcome) => wire::ReturnMessage {
            valid: outcome.valid,
            state: Some(state_to_wire(&outcome.state)),
        }
        .encode_to_vec(),
    };
    Bytes::from(bytes)
}

/// Decode `bytes` as a message of the given kind.
///
/// # Errors
///
/// [`ProtocolError::Decode`] if the bytes are not valid protobuf for `kind`,
/// or a shape error if required fields are missing or out of range.
pub fn decode(bytes: &[u8], kind: MessageKind) -> Result<Message, ProtocolError> {
    let decode_err = |source| ProtocolError::Decode { kind, source };
    match kind {
        MessageKind::State => {
            let msg = wire::StateMessage::decode(bytes).map_err(decode_err)?;
            Ok(Message::State(state_from_wire(kind, msg)?))
        }
        MessageKind::Action => {
            let msg = wire::ActionMessage::decode(bytes).map_err(decode_err)?;
            let mv = msg.r#move.ok_or(ProtocolError::MissingField {
                kind,
                field: "move",
            })?;
            Ok(Message::Action(move_from_wire(kind, mv)?))
        }
        MessageKind::Return => {
            let msg = wire::ReturnMessage::decode(bytes).map_err(decode_err)?;
            let state = msg.state.ok_or(ProtocolError::MissingField {
                kind,
                field: "state",
            })?;
            Ok(Message::Return(MoveOutcome {
                valid: msg.valid,
                state: state_from_wire(kind, state)?,
            }))
        }
    }
}

// ---------------------------------------------------------------------------
// Domain -> wire
// ---------------------------------------------------------------------------

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const fn coord_to_wire(c: Coord) -> wire::Coord {
    // row, col < 3
    wire::Coord {
        row: c.row() as i32,
        col: c.col() as i32,
    }
}

const fn move_to_wire(mv: Move) -> wire::Move {
    wire::Move {
        large: Some(coord_to_wire(mv.large)),
        small: Some(coord_to_wire(mv.small)),
    }
}

const fn owner_to_wire(owner: Owner) -> i32 {
    owner as i32
}

fn state_to_wire(state: &GameState) -> wire::StateMessage {
    let cells = state
        .board
        .cells
        .iter()
        .map(|cell| wire::Cell {
            spaces: cell
                .iter()
                .map(|space| wire::Space {
                    val: owner_to_wire(*space),
                })
                .collect(),
        })
        .collect();
    let cur_cell = state.board.cur_cell.map_or(
        wire::Coord {
            row: FREE_CHOICE,
            col: FREE_CHOICE,
        },
        coord_to_wire,
    );
    wire::StateMessage {
        board: Some(wire::Board {
            cells,
            cur_cell: Some(cur_cell),
        }),
        cellowners: state.cell_owners.iter().map(|o| owner_to_wire(*o)).collect(),
        turn: owner_to_wire(state.turn.owner()),
        winner: owner_to_wire(state.winner),
        done: state.done,
    }
}

// ---------------------------------------------------------------------------
// Wire -> domain
// ---------------------------------------------------------------------------

fn grid_coord(c: wire::Coord) -> Option<Coord> {
    let row = usize::try_from(c.row).ok()?;
    let col = usize::try_from(c.col).ok()?;
    Coord::new(row, col)
}

fn coord_from_wire(
    kind: MessageKind,
    field: &'static str,
    c: Option<wire::Coord>,
) -> Result<Coord, ProtocolError> {
    let c = c.ok_or(ProtocolError::MissingField { kind, field })?;
    grid_coord(c).ok_or(ProtocolError::CoordOutOfRange {
        kind,
        field,
        row: c.row,
        col: c.col,
    })
}

fn move_from_wire(kind: MessageKind, mv: wire::Move) -> Result<Move, ProtocolError> {
    Ok(Move::new(
        coord_from_wire(kind, "move.large", mv.large)?,
        coord_from_wire(kind, "move.small", mv.small)?,
    ))
}

fn owner_from_wire(
    kind: MessageKind,
    field: &'static str,
    value: i32,
) -> Result<Owner, ProtocolError> {
    Owner::from_value(value).ok_or(ProtocolError::UnknownEnum { kind, field, value })
}

fn nine<T>(
    kind: MessageKind,
    field: &'static str,
    items: impl ExactSizeIterator<Item = Result<T, ProtocolError>>,
) -> Result<[T; CELLS], ProtocolError>
where
    T: Copy + Default,
{
    if items.len() != CELLS {
        return Err(ProtocolError::BadLength {
            kind,
            field,
            expected: CELLS,
            got: items.len(),
        });
    }
    let mut out = [T::default(); CELLS];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item?;
    }
    Ok(out)
}

fn state_from_wire(kind: MessageKind, msg: wire::StateMessage) -> Result<GameState, ProtocolError> {
    let board = msg.board.ok_or(ProtocolError::MissingField {
        kind,
        field: "board",
    })?;

    if board.cells.len() != CELLS {
        return Err(ProtocolError::BadLength {
            kind,
            field: "board.cells",
            expected: CELLS,
            got: board.cells.len(),
        });
    }
    let mut cells = [[Owner::None; CELLS]; CELLS];
    for (slot, cell) in cells.iter_mut().zip(&board.cells) {
        *slot = nine(
            kind,
            "board.cells.spaces",
            cell.spaces
                .iter()
                .map(|space| owner_from_wire(kind, "board.cells.spaces.val", space.val)),
        )?;
    }

    let cell_owners = nine(
        kind,
        "cellowners",
        msg.cellowners
            .iter()
            .map(|value| owner_from_wire(kind, "cellowners", *value)),
    )?;

    let turn = owner_from_wire(kind, "turn", msg.turn)?;
    let turn = Player::from_owner(turn).ok_or(ProtocolError::NoTurn { kind })?;

    Ok(GameState {
        board: Board {
            cells,
            cur_cell: board.cur_cell.and_then(grid_coord),
        },
        cell_owners,
        turn,
        winner: owner_from_wire(kind, "winner", msg.winner)?,
        done: msg.done,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use uttt_core::types::NUM_ACTIONS;

    use super::*;

    fn sample_state() -> GameState {
        let mut state = GameState {
            turn: Player::Player2,
            ..Default::default()
        };
        state.board.cells[0][4] = Owner::Player1;
        state.board.cells[4][8] = Owner::Player2;
        state.board.cur_cell = Coord::new(2, 2);
        state.cell_owners[3] = Owner::Player1;
        state
    }

    #[test]
    fn move_roundtrip_all_actions() {
        for action in 0..NUM_ACTIONS {
            let mv = Move::from_action(action).unwrap();
            let bytes = encode(&Message::Action(mv));
            let decoded = decode(&bytes, MessageKind::Action).unwrap();
            assert_eq!(decoded, Message::Action(mv));
        }
    }

    #[test]
    fn action_zero_wire_bytes() {
        // move { large {} small {} }: zero coordinates encode as empty sub-messages.
        let bytes = encode(&Message::Action(Move::from_action(0).unwrap()));
        assert_eq!(bytes.as_ref(), &[0x0a, 0x04, 0x0a, 0x00, 0x12, 0x00]);

        let parsed = wire::ActionMessage::decode(bytes.as_ref()).unwrap();
        let mv = parsed.r#move.unwrap();
        assert_eq!(mv.large, Some(wire::Coord { row: 0, col: 0 }));
        assert_eq!(mv.small, Some(wire::Coord { row: 0, col: 0 }));
    }

    #[test]
    fn state_roundtrip() {
        let state = sample_state();
        let bytes = encode(&Message::State(state.clone()));
        let decoded = decode(&bytes, MessageKind::State).unwrap();
        assert_eq!(decoded, Message::State(state));
    }

    #[test]
    fn return_roundtrip() {
        let outcome = MoveOutcome {
            valid: true,
            state: sample_state(),
        };
        let bytes = encode(&Message::Return(outcome.clone()));
        let decoded = decode(&bytes, MessageKind::Return).unwrap();
        assert_eq!(decoded, Message::Return(outcome));
    }

    #[test]
    fn free_choice_uses_sentinel() {
        let state = GameState::default();
        assert!(state.board.cur_cell.is_none());
        let wire_state = state_to_wire(&state);
        let cur = wire_state.board.unwrap().cur_cell.unwrap();
        assert_eq!((cur.row, cur.col), (FREE_CHOICE, FREE_CHOICE));

        let bytes = encode(&Message::State(state));
        let decoded = decode(&bytes, MessageKind::State).unwrap().into_state().unwrap();
        assert!(decoded.board.cur_cell.is_none());
    }

    #[test]
    fn missing_cur_cell_is_free_choice() {
        let mut msg = state_to_wire(&sample_state());
        msg.board.as_mut().unwrap().cur_cell = None;
        let state = decode(&msg.encode_to_vec(), MessageKind::State)
            .unwrap()
            .into_state()
            .unwrap();
        assert!(state.board.cur_cell.is_none());
    }

    #[test]
    fn missing_board_is_rejected() {
        let msg = wire::StateMessage {
            turn: 1,
            ..Default::default()
        };
        let err = decode(&msg.encode_to_vec(), MessageKind::State).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::MissingField { field: "board", .. }
        ));
    }

    #[test]
    fn empty_action_is_rejected() {
        let err = decode(&[], MessageKind::Action).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingField { field: "move", .. }));
    }

    #[test]
    fn empty_return_is_rejected() {
        let err = decode(&[], MessageKind::Return).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingField { field: "state", .. }));
    }

    #[test]
    fn truncated_bytes_fail_to_decode() {
        let bytes = encode(&Message::State(sample_state()));
        let err = decode(&bytes[..bytes.len() / 2], MessageKind::State).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Decode {
                kind: MessageKind::State,
                ..
            }
        ));
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = decode(&[0xff, 0xff, 0xff], MessageKind::Return).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode { .. }));
    }

    #[test]
    fn short_cellowners_is_rejected() {
        let mut msg = state_to_wire(&sample_state());
        msg.cellowners.truncate(4);
        let err = decode(&msg.encode_to_vec(), MessageKind::State).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::BadLength {
                field: "cellowners",
                expected: 9,
                got: 4,
                ..
            }
        ));
    }

    #[test]
    fn short_cell_is_rejected() {
        let mut msg = state_to_wire(&sample_state());
        msg.board.as_mut().unwrap().cells[5].spaces.pop();
        let err = decode(&msg.encode_to_vec(), MessageKind::State).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::BadLength {
                field: "board.cells.spaces",
                got: 8,
                ..
            }
        ));
    }

    #[test]
    fn unknown_owner_is_rejected() {
        let mut msg = state_to_wire(&sample_state());
        msg.winner = 7;
        let err = decode(&msg.encode_to_vec(), MessageKind::State).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnknownEnum {
                field: "winner",
                value: 7,
                ..
            }
        ));
    }

    #[test]
    fn turn_none_is_rejected() {
        let mut msg = state_to_wire(&sample_state());
        msg.turn = 0;
        let err = decode(&msg.encode_to_vec(), MessageKind::State).unwrap_err();
        assert!(matches!(err, ProtocolError::NoTurn { .. }));
    }

    #[test]
    fn nested_state_errors_report_return_kind() {
        let mut state = state_to_wire(&sample_state());
        state.cellowners.clear();
        let msg = wire::ReturnMessage {
            valid: true,
            state: Some(state),
        };
        let err = decode(&msg.encode_to_vec(), MessageKind::Return).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::BadLength {
                kind: MessageKind::Return,
                ..
            }
        ));
    }

    #[test]
    fn off_grid_move_is_rejected() {
        let msg = wire::ActionMessage {
            r#move: Some(wire::Move {
                large: Some(wire::Coord { row: 1, col: 3 }),
                small: Some(wire::Coord { row: 0, col: 0 }),
            }),
        };
        let err = decode(&msg.encode_to_vec(), MessageKind::Action).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::CoordOutOfRange {
                field: "move.large",
                row: 1,
                col: 3,
                ..
            }
        ));
    }

    #[test]
    fn unpacked_cellowners_decode() {
        // Writers may emit repeated enums unpacked; both encodings are legal.
        let mut buf = Vec::new();
        let state = state_to_wire(&GameState::default());
        let board = state.board.unwrap();
        prost::encoding::message::encode(1, &board, &mut buf);
        for _ in 0..CELLS {
            prost::encoding::int32::encode(2, &1, &mut buf);
        }
        prost::encoding::int32::encode(3, &1, &mut buf);
        let decoded = decode(&buf, MessageKind::State).unwrap().into_state().unwrap();
        assert_eq!(decoded.cells_owned_by(Owner::Player1), CELLS);
    }
}
