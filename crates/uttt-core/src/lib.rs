// uttt-core: board types, errors and configuration for the Ultimate Tic-Tac-Toe bridge.

pub mod config;
pub mod error;
pub mod types;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        config::{
            BridgeConfig, EncoderConfig, ExplorationConfig, FileConfig, ObservationSource,
            RewardConfig, StreamConfig, TransportConfig,
        },
        error::{ConfigError, LifecycleError, ValidationError},
        types::{
            Board, CELLS, COLS, Coord, GameState, Move, MoveOutcome, NUM_ACTIONS, Owner, Player,
            ROWS,
        },
    };
}
