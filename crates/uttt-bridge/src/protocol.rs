//! Message kinds exchanged with the engine.
//!
//! The engine speaks three top-level messages, each on its own channel:
//!
//! 1. `StateMessage` (engine -> bridge) at the start of every turn
//! 2. `ActionMessage` (bridge -> engine) carrying the chosen move
//! 3. `ReturnMessage` (engine -> bridge) with the verdict and resulting state
//!
//! [`Message`] is the decoded form; the protobuf layout is in
//! [`codec`](crate::codec). Receivers always name the [`MessageKind`] they
//! expect, since the bytes carry no type tag.

use std::fmt;

use thiserror::Error;

use uttt_core::types::{GameState, Move, MoveOutcome};

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

/// Tag for the three top-level wire messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    State,
    Action,
    Return,
}

impl MessageKind {
    pub const ALL: [Self; 3] = [Self::State, Self::Action, Self::Return];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Action => "action",
            Self::Return => "return",
        }
    }

    /// File used for this kind by the polling-file transport.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::State => "statemessage.b",
            Self::Action => "action.b",
            Self::Return => "returnmessage.b",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A decoded top-level message.
///
/// # Example
///
/// ```
/// use uttt_bridge::protocol::{Message, MessageKind};
/// use uttt_core::types::Move;
///
/// let msg = Message::Action(Move::from_action(0).unwrap());
/// assert_eq!(msg.kind(), MessageKind::Action);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    State(GameState),
    Action(Move),
    Return(MoveOutcome),
}

impl Message {
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::State(_) => MessageKind::State,
            Self::Action(_) => MessageKind::Action,
            Self::Return(_) => MessageKind::Return,
        }
    }

    /// Unwrap a state message.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::UnexpectedKind`] for any other kind.
    pub fn into_state(self) -> Result<GameState, ProtocolError> {
        match self {
            Self::State(state) => Ok(state),
            other => Err(ProtocolError::unexpected(MessageKind::State, other.kind())),
        }
    }

    /// Unwrap an action message.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::UnexpectedKind`] for any other kind.
    pub fn into_action(self) -> Result<Move, ProtocolError> {
        match self {
            Self::Action(mv) => Ok(mv),
            other => Err(ProtocolError::unexpected(MessageKind::Action, other.kind())),
        }
    }

    /// Unwrap a return message.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::UnexpectedKind`] for any other kind.
    pub fn into_return(self) -> Result<MoveOutcome, ProtocolError> {
        match self {
            Self::Return(outcome) => Ok(outcome),
            other => Err(ProtocolError::unexpected(MessageKind::Return, other.kind())),
        }
    }
}

// ---------------------------------------------------------------------------
// ProtocolError
// ---------------------------------------------------------------------------

/// A message that could not be decoded or does not fit the schema.
///
/// Always fatal for the episode: the engine is authoritative, so a bad
/// message means the two sides are out of sync.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to decode {kind} message: {source}")]
    Decode {
        kind: MessageKind,
        #[source]
        source: prost::DecodeError,
    },

    #[error("{kind} message is missing `{field}`")]
    MissingField {
        kind: MessageKind,
        field: &'static str,
    },

    #[error("{kind} message field `{field}` has {got} entries, expected {expected}")]
    BadLength {
        kind: MessageKind,
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{kind} message field `{field}` has unknown value {value}")]
    UnknownEnum {
        kind: MessageKind,
        field: &'static str,
        value: i32,
    },

    #[error("{kind} message field `{field}` is ({row}, {col}), outside the 3x3 grid")]
    CoordOutOfRange {
        kind: MessageKind,
        field: &'static str,
        row: i32,
        col: i32,
    },

    #[error("{kind} message reports turn NONE")]
    NoTurn { kind: MessageKind },

    #[error("expected {expected} message, got {got}")]
    UnexpectedKind {
        expected: MessageKind,
        got: MessageKind,
    },

    #[error("{kind} message of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge {
        kind: MessageKind,
        size: usize,
        max: usize,
    },
}

impl ProtocolError {
    #[must_use]
    pub const fn unexpected(expected: MessageKind, got: MessageKind) -> Self {
        Self::UnexpectedKind { expected, got }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
