//! Lifecycle state machine guarding the environment API.
//!
//! [`LifecycleMachine`] tracks the current [`EnvState`] and rejects calls
//! that are not legal in it:
//!
//! | state           | `reset` | `observe` | `step`        |
//! |-----------------|---------|-----------|---------------|
//! | `Uninitialized` | yes     | `NotReset`| `NotReset`    |
//! | `Ready`         | yes     | yes       | yes           |
//! | `Done`          | yes     | yes       | `EpisodeDone` |
//! | `Failed`        | yes     | `NeedsReset` | `NeedsReset` |
//! | `Closed`        | `Closed`| `Closed`  | `Closed`      |

use uttt_core::error::LifecycleError;

/// Where the environment is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EnvState {
    /// Constructed, never reset.
    #[default]
    Uninitialized,
    /// Episode in progress; `step` is allowed.
    Ready,
    /// The engine reported the game over.
    Done,
    /// A transport or protocol error ended the episode.
    Failed,
    /// `close` was called. Terminal.
    Closed,
}

impl EnvState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for EnvState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks environment state and enforces valid transitions.
///
/// # Example
///
/// ```
/// use uttt_bridge::state_machine::{EnvState, LifecycleMachine};
///
/// let mut sm = LifecycleMachine::new();
/// assert!(sm.check_step().is_err());
/// sm.on_reset().unwrap();
/// assert_eq!(sm.state(), EnvState::Ready);
/// ```
#[derive(Debug, Default)]
pub struct LifecycleMachine {
    state: EnvState,
}

impl LifecycleMachine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: EnvState::Uninitialized,
        }
    }

    #[must_use]
    pub const fn state(&self) -> EnvState {
        self.state
    }

    /// Whether `step` is currently allowed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, EnvState::Ready)
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self.state, EnvState::Closed)
    }

    /// Validate a `step` call.
    pub const fn check_step(&self) -> Result<(), LifecycleError> {
        match self.state {
            EnvState::Ready => Ok(()),
            EnvState::Uninitialized => Err(LifecycleError::NotReset),
            EnvState::Done => Err(LifecycleError::EpisodeDone),
            EnvState::Failed => Err(LifecycleError::NeedsReset),
            EnvState::Closed => Err(LifecycleError::Closed),
        }
    }

    /// Validate an `observe` call. Allowed after the game ends so the final
    /// board can still be read.
    pub const fn check_observe(&self) -> Result<(), LifecycleError> {
        match self.state {
            EnvState::Ready | EnvState::Done => Ok(()),
            EnvState::Uninitialized => Err(LifecycleError::NotReset),
            EnvState::Failed => Err(LifecycleError::NeedsReset),
            EnvState::Closed => Err(LifecycleError::Closed),
        }
    }

    /// Start a new episode. Legal from every state except `Closed`.
    pub const fn on_reset(&mut self) -> Result<(), LifecycleError> {
        if self.is_closed() {
            return Err(LifecycleError::Closed);
        }
        self.state = EnvState::Ready;
        Ok(())
    }

    /// Record the outcome of a completed step.
    pub const fn on_step(&mut self, done: bool) {
        if done && self.is_ready() {
            self.state = EnvState::Done;
        }
    }

    /// Mark the episode failed. Ignored once closed.
    pub const fn enter_failed(&mut self) {
        if !self.is_closed() {
            self.state = EnvState::Failed;
        }
    }

    pub const fn on_close(&mut self) {
        self.state = EnvState::Closed;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
