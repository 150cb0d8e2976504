//! Episode controller exposing `reset` / `observe` / `step` over an engine.
//!
//! [`UtttEnv`] owns one transport per episode, the current [`GameState`]
//! snapshot and a [`RewardShaper`]. Each [`step`](UtttEnv::step) sends one
//! action, blocks on the engine's verdict, scores it and returns the next
//! observation.

use ndarray::Array3;
use tracing::{debug, info, warn};

use uttt_core::config::{BridgeConfig, ObservationSource, TransportConfig};
use uttt_core::error::LifecycleError;
use uttt_core::types::{GameState, Move, MoveOutcome, Player};

use crate::encoder::BoardEncoder;
use crate::error::BridgeError;
use crate::protocol::{Message, MessageKind};
use crate::rewards::{Perspective, RewardBreakdown, RewardShaper};
use crate::state_machine::{EnvState, LifecycleMachine};
use crate::transport::{Connector, Transport};

// ---------------------------------------------------------------------------
// StepResult
// ---------------------------------------------------------------------------

/// Diagnostics for one step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepInfo {
    /// Steps taken this episode, including this one.
    pub turn: u32,
    /// Side the engine reports as having moved.
    pub mover: Player,
    /// Whose perspective the reward was scored from.
    pub perspective: Perspective,
    pub breakdown: RewardBreakdown,
    pub won: bool,
    pub lost: bool,
    /// Sum of rewards since the last reset.
    pub episode_reward: f32,
}

/// Result of [`UtttEnv::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    pub observation: Array3<f32>,
    pub reward: f32,
    pub done: bool,
    /// Whether the engine accepted the move.
    pub valid: bool,
    pub info: StepInfo,
}

// ---------------------------------------------------------------------------
// UtttEnv
// ---------------------------------------------------------------------------

/// Environment wrapping an external engine process.
///
/// Every operation takes `&mut self` and blocks until the engine answers.
/// A transport or protocol error moves the environment to
/// [`EnvState::Failed`]; only [`reset`](Self::reset) recovers from it.
///
/// # Example
///
/// ```no_run
/// use uttt_bridge::env::UtttEnv;
/// use uttt_core::config::BridgeConfig;
///
/// let config = BridgeConfig::default();
/// let mut env = UtttEnv::from_config(&config);
/// let obs = env.reset()?;
/// let result = env.step(40)?;
/// println!("reward {} done {}", result.reward, result.done);
/// env.close()?;
/// # Ok::<(), uttt_bridge::BridgeError>(())
/// ```
pub struct UtttEnv<C: Connector> {
    connector: C,
    transport: Option<C::Transport>,
    encoder: BoardEncoder,
    shaper: RewardShaper,
    machine: LifecycleMachine,
    observation_source: ObservationSource,
    self_play: bool,
    perspective: Perspective,
    cur_state: GameState,
    turn_count: u32,
    episode_reward: f32,
}

impl UtttEnv<TransportConfig> {
    /// Environment using the transport described in `config`.
    #[must_use]
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.transport.clone(), config)
    }
}

impl<C: Connector> UtttEnv<C> {
    /// Create an environment. Nothing is connected until
    /// [`reset`](Self::reset).
    #[must_use]
    pub fn new(connector: C, config: &BridgeConfig) -> Self {
        Self {
            connector,
            transport: None,
            encoder: BoardEncoder::from_config(&config.encoder),
            shaper: RewardShaper::new(&config.reward),
            machine: LifecycleMachine::new(),
            observation_source: config.observation_source,
            self_play: config.self_play,
            perspective: Perspective::Agent,
            cur_state: GameState::default(),
            turn_count: 0,
            episode_reward: 0.0,
        }
    }

    /// Replace the reward shaper, e.g. with one sharing a novelty table.
    #[must_use]
    pub fn with_shaper(mut self, shaper: RewardShaper) -> Self {
        self.shaper = shaper;
        self
    }

    // -- accessors --

    #[must_use]
    pub const fn state(&self) -> EnvState {
        self.machine.state()
    }

    /// Last state reported by the engine.
    #[must_use]
    pub const fn cur_state(&self) -> &GameState {
        &self.cur_state
    }

    /// Side to move according to the last reported state.
    #[must_use]
    pub const fn turn(&self) -> Player {
        self.cur_state.turn
    }

    #[must_use]
    pub const fn turn_count(&self) -> u32 {
        self.turn_count
    }

    #[must_use]
    pub const fn episode_reward(&self) -> f32 {
        self.episode_reward
    }

    #[must_use]
    pub const fn perspective(&self) -> Perspective {
        self.perspective
    }

    #[must_use]
    pub const fn encoder(&self) -> &BoardEncoder {
        &self.encoder
    }

    #[must_use]
    pub const fn shaper(&self) -> &RewardShaper {
        &self.shaper
    }

    /// Observation shape, `[9, 9, D]`.
    #[must_use]
    pub const fn observation_shape(&self) -> [usize; 3] {
        self.encoder.shape()
    }

    #[must_use]
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    // -- lifecycle --

    /// Start a new episode.
    ///
    /// Releases any previous transport, opens a fresh one, clears the
    /// per-episode reward state and blocks for the engine's first state.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::Closed`] after [`close`](Self::close),
    /// [`BridgeError::TransportUnavailable`] if the engine cannot be
    /// reached, or any error from the first [`observe`](Self::observe).
    pub fn reset(&mut self) -> Result<Array3<f32>, BridgeError> {
        if self.machine.is_closed() {
            return Err(LifecycleError::Closed.into());
        }
        self.release_transport();

        let transport = match self.connector.connect() {
            Ok(transport) => transport,
            Err(e) => {
                self.machine.enter_failed();
                return Err(e);
            }
        };
        info!(transport = transport.name(), "episode reset");
        self.transport = Some(transport);

        self.shaper.reset();
        self.perspective = Perspective::Agent;
        self.cur_state = GameState::default();
        self.turn_count = 0;
        self.episode_reward = 0.0;
        self.machine.on_reset()?;

        self.observe()
    }

    /// Block for the engine's next state message and encode it.
    ///
    /// # Errors
    ///
    /// A [`LifecycleError`] outside `Ready`/`Done`, otherwise any transport
    /// or protocol error (which also fails the episode).
    pub fn observe(&mut self) -> Result<Array3<f32>, BridgeError> {
        self.machine.check_observe()?;
        let result = self.recv_state();
        self.fail_on_err(result)
    }

    /// Play flat action index `action` (`large * 9 + small`).
    ///
    /// A move the engine rejects is not an error: it comes back with
    /// `valid == false` and the exploration penalty, and the episode goes on.
    ///
    /// # Errors
    ///
    /// A [`LifecycleError`] unless `Ready`, a validation error for
    /// `action >= 81`, otherwise any transport or protocol error (which also
    /// fails the episode).
    pub fn step(&mut self, action: usize) -> Result<StepResult, BridgeError> {
        self.machine.check_step()?;
        let mv = Move::from_action(action)?;
        let result = self.exchange(action, mv);
        self.fail_on_err(result)
    }

    /// Release the transport. Further calls return
    /// [`LifecycleError::Closed`]; closing again is a no-op.
    ///
    /// # Errors
    ///
    /// The transport's own teardown error. The environment is closed
    /// regardless.
    pub fn close(&mut self) -> Result<(), BridgeError> {
        if self.machine.is_closed() {
            return Ok(());
        }
        self.machine.on_close();
        info!(turns = self.turn_count, "environment closed");
        match self.transport.take() {
            Some(mut transport) => transport.close(),
            None => Ok(()),
        }
    }

    // -- internals --

    fn exchange(&mut self, action: usize, mv: Move) -> Result<StepResult, BridgeError> {
        let transport = self.transport.as_mut().ok_or(LifecycleError::NotReset)?;
        transport.send(&Message::Action(mv))?;
        let outcome = transport.recv(MessageKind::Return)?.into_return()?;

        let perspective = self.perspective;
        let breakdown = self.shaper.score(action, &outcome, perspective);
        let reward = breakdown.total();
        self.turn_count += 1;
        self.episode_reward += reward;

        let MoveOutcome { valid, state } = outcome;
        let mover = state.turn;
        let done = state.done;
        if valid {
            if self.self_play {
                self.perspective = match perspective {
                    Perspective::Agent => Perspective::Opponent,
                    Perspective::Opponent => Perspective::Agent,
                };
            }
        } else {
            warn!(action, turn = self.turn_count, "engine rejected move");
        }

        let observation = if done || self.observation_source == ObservationSource::ReturnMessage {
            self.cur_state = state;
            self.encoder.encode(&self.cur_state)
        } else {
            self.recv_state()?
        };
        self.machine.on_step(done);

        let info = StepInfo {
            turn: self.turn_count,
            mover,
            perspective,
            breakdown,
            won: self.shaper.won(),
            lost: self.shaper.lost(),
            episode_reward: self.episode_reward,
        };
        if done {
            info!(
                turns = info.turn,
                winner = ?self.cur_state.winner,
                won = info.won,
                lost = info.lost,
                episode_reward = info.episode_reward,
                "episode done"
            );
        } else {
            debug!(action, valid, reward, turn = info.turn, "step");
        }

        Ok(StepResult {
            observation,
            reward,
            done,
            valid,
            info,
        })
    }

    fn recv_state(&mut self) -> Result<Array3<f32>, BridgeError> {
        let transport = self.transport.as_mut().ok_or(LifecycleError::NotReset)?;
        self.cur_state = transport.recv(MessageKind::State)?.into_state()?;
        Ok(self.encoder.encode(&self.cur_state))
    }

    fn fail_on_err<T>(&mut self, result: Result<T, BridgeError>) -> Result<T, BridgeError> {
        if let Err(e) = &result {
            warn!(error = %e, "episode failed");
            self.machine.enter_failed();
        }
        result
    }

    fn release_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close() {
                warn!(error = %e, "failed to close previous transport");
            }
        }
    }
}

impl<C: Connector> Drop for UtttEnv<C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close environment");
        }
    }
}

impl<C: Connector> std::fmt::Debug for UtttEnv<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UtttEnv")
            .field("state", &self.machine.state())
            .field("connected", &self.transport.is_some())
            .field("turn_count", &self.turn_count)
            .field("episode_reward", &self.episode_reward)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
