use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "localhost".into()
}
const fn default_state_port() -> u16 {
    8000
}
const fn default_action_port() -> u16 {
    8001
}
const fn default_return_port() -> u16 {
    8002
}
const fn default_max_message_size() -> usize {
    4096
}
fn default_dir() -> PathBuf {
    PathBuf::from(".")
}
const fn default_poll_interval_us() -> u64 {
    100
}
const fn default_true() -> bool {
    true
}
const fn default_valid_reward() -> f32 {
    0.1
}
const fn default_invalid_penalty() -> f32 {
    -1.0
}
const fn default_decay_rate() -> f32 {
    0.1
}
const fn default_cell_reward() -> f32 {
    1.0
}
const fn default_win_reward() -> f32 {
    10.0
}
const fn default_loss_penalty() -> f32 {
    10.0
}

// ---------------------------------------------------------------------------
// BridgeConfig
// ---------------------------------------------------------------------------

/// Top-level bridge configuration.
///
/// Every field has a default, so an empty TOML file is a valid config.
///
/// # Example
///
/// ```
/// use uttt_core::config::{BridgeConfig, TransportConfig};
///
/// let config = BridgeConfig::from_toml_str(r#"
///     [transport]
///     kind = "file"
///     dir = "/tmp/uttt"
/// "#).unwrap();
/// assert!(matches!(config.transport, TransportConfig::File(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Where the observation returned by a non-final `step` comes from.
    #[serde(default)]
    pub observation_source: ObservationSource,

    /// Score both sides of a self-play game driven through one bridge.
    #[serde(default)]
    pub self_play: bool,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub encoder: EncoderConfig,

    #[serde(default)]
    pub reward: RewardConfig,
}

impl BridgeConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.transport.validate()?;
        self.reward.validate()?;
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Render as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Source of the observation returned by a `step` that did not end the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationSource {
    /// Block on the next state message. The engine sends one at the start
    /// of every turn, so this keeps the state channel drained.
    #[default]
    StateChannel,
    /// Encode the state embedded in the return message. Saves a blocking
    /// read, for engines that do not push per-turn state messages.
    ReturnMessage,
}

// ---------------------------------------------------------------------------
// TransportConfig
// ---------------------------------------------------------------------------

/// Which inter-process channel to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportConfig {
    Stream(StreamConfig),
    File(FileConfig),
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Stream(StreamConfig::default())
    }
}

impl TransportConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Stream(stream) => stream.validate(),
            Self::File(file) => file.validate(),
        }
    }
}

/// Three TCP connections to the engine, one per message kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_state_port")]
    pub state_port: u16,

    #[serde(default = "default_action_port")]
    pub action_port: u16,

    #[serde(default = "default_return_port")]
    pub return_port: u16,

    /// Ceiling for a single read. One read must hold one whole message.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            state_port: default_state_port(),
            action_port: default_action_port(),
            return_port: default_return_port(),
            max_message_size: default_max_message_size(),
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "transport.host".into(),
                message: "must not be empty".into(),
            });
        }
        if self.max_message_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "transport.max_message_size".into(),
                message: "must be > 0".into(),
            });
        }
        let ports = [self.state_port, self.action_port, self.return_port];
        if ports[0] == ports[1] || ports[0] == ports[2] || ports[1] == ports[2] {
            return Err(ConfigError::Incompatible(format!(
                "state/action/return ports must differ, got {ports:?}"
            )));
        }
        Ok(())
    }

    /// `host:port` for the state channel.
    pub fn state_addr(&self) -> String {
        format!("{}:{}", self.host, self.state_port)
    }

    /// `host:port` for the action channel.
    pub fn action_addr(&self) -> String {
        format!("{}:{}", self.host, self.action_port)
    }

    /// `host:port` for the return channel.
    pub fn return_addr(&self) -> String {
        format!("{}:{}", self.host, self.return_port)
    }
}

/// Message files in a shared directory, polled for content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_poll_interval_us")]
    pub poll_interval_us: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            poll_interval_us: default_poll_interval_us(),
        }
    }
}

impl FileConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_us == 0 {
            return Err(ConfigError::InvalidValue {
                field: "transport.poll_interval_us".into(),
                message: "must be > 0".into(),
            });
        }
        Ok(())
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }
}

// ---------------------------------------------------------------------------
// EncoderConfig
// ---------------------------------------------------------------------------

/// Board tensor layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Append a fourth channel holding the turn value (1 or 2).
    #[serde(default = "default_true")]
    pub include_turn_channel: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            include_turn_channel: true,
        }
    }
}

// ---------------------------------------------------------------------------
// RewardConfig
// ---------------------------------------------------------------------------

/// Reward shaping constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Paid once whenever the mover's owned-cell count goes up.
    #[serde(default = "default_cell_reward")]
    pub cell_reward: f32,

    #[serde(default = "default_win_reward")]
    pub win_reward: f32,

    /// Subtracted when the opponent's move wins.
    #[serde(default = "default_loss_penalty")]
    pub loss_penalty: f32,

    #[serde(default)]
    pub exploration: ExplorationConfig,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            cell_reward: default_cell_reward(),
            win_reward: default_win_reward(),
            loss_penalty: default_loss_penalty(),
            exploration: ExplorationConfig::default(),
        }
    }
}

impl RewardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("reward.cell_reward", self.cell_reward),
            ("reward.win_reward", self.win_reward),
            ("reward.loss_penalty", self.loss_penalty),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    message: format!("must be finite, got {value}"),
                });
            }
        }
        self.exploration.validate()
    }
}

/// Exploration term model. The two are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ExplorationConfig {
    /// Fixed reward for accepted moves, fixed penalty for rejected ones.
    InvalidPenalty {
        #[serde(default = "default_valid_reward")]
        valid_reward: f32,
        #[serde(default = "default_invalid_penalty")]
        invalid_penalty: f32,
    },
    /// `exp(-decay_rate * n)` where `n` counts earlier valid plays of the
    /// same action. Counts persist across episodes.
    NoveltyDecay {
        #[serde(default = "default_decay_rate")]
        decay_rate: f32,
    },
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self::InvalidPenalty {
            valid_reward: default_valid_reward(),
            invalid_penalty: default_invalid_penalty(),
        }
    }
}

impl ExplorationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::InvalidPenalty {
                valid_reward,
                invalid_penalty,
            } => {
                if !valid_reward.is_finite() || !invalid_penalty.is_finite() {
                    return Err(ConfigError::InvalidValue {
                        field: "reward.exploration".into(),
                        message: "valid_reward and invalid_penalty must be finite".into(),
                    });
                }
            }
            Self::NoveltyDecay { decay_rate } => {
                if !(decay_rate.is_finite() && decay_rate > 0.0) {
                    return Err(ConfigError::InvalidValue {
                        field: "reward.exploration.decay_rate".into(),
                        message: format!("must be finite and > 0, got {decay_rate}"),
                    });
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
