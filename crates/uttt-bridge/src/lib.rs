//! Environment bridge between a training agent and an external Ultimate
//! Tic-Tac-Toe engine process.
//!
//! The engine owns the rules; this crate owns everything between the agent
//! and the engine's message channels:
//!
//! - [`protocol`]: [`Message`] / [`MessageKind`] tagged union and
//!   [`ProtocolError`]
//! - [`codec`]: protobuf wire schema and `encode` / `decode`
//! - [`transport`]: [`Transport`] trait with TCP stream and polled-file
//!   strategies, plus the [`Connector`] that opens a fresh one per episode
//! - [`encoder`]: [`BoardEncoder`] producing the `[9, 9, D]` observation
//! - [`rewards`]: [`RewardShaper`] (exploration, cell capture, win/loss)
//! - [`state_machine`]: [`LifecycleMachine`] guarding reset/observe/step
//! - [`env`](mod@env): [`UtttEnv`], the `reset` / `observe` / `step` contract
//!
//! Every call blocks until the engine answers. There are no timeouts and no
//! retries: a malformed message or a dropped channel fails the episode and
//! the caller must `reset`.

pub mod codec;
pub mod encoder;
pub mod env;
pub mod error;
pub mod protocol;
pub mod rewards;
pub mod state_machine;
pub mod transport;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use encoder::BoardEncoder;
pub use env::{StepInfo, StepResult, UtttEnv};
pub use error::BridgeError;
pub use protocol::{Message, MessageKind, ProtocolError};
pub use rewards::{ExplorationModel, NoveltyTable, Perspective, RewardBreakdown, RewardShaper};
pub use state_machine::{EnvState, LifecycleMachine};
pub use transport::{Connector, FileTransport, StreamTransport, Transport};

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        BoardEncoder, BridgeError, Connector, EnvState, ExplorationModel, FileTransport,
        LifecycleMachine, Message, MessageKind, NoveltyTable, Perspective, ProtocolError,
        RewardBreakdown, RewardShaper, StepInfo, StepResult, StreamTransport, Transport, UtttEnv,
    };
    pub use uttt_core::prelude::*;
}
