use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Incompatible configuration: {0}")]
    Incompatible(String),
}

/// Environment API misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("environment has not been reset")]
    NotReset,

    #[error("episode is done; call reset before stepping again")]
    EpisodeDone,

    #[error("episode failed after a transport or protocol error; call reset")]
    NeedsReset,

    #[error("environment is closed")]
    Closed,
}

/// Action validation errors.
///
/// Copy + static messages for cheap propagation in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Action out of range: {value} >= {max}")]
    ActionOutOfRange { value: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::Io(_)));
    }

    #[test]
    fn config_error_display_messages() {
        assert_eq!(
            ConfigError::InvalidValue {
                field: "reward.exploration.decay_rate".into(),
                message: "must be > 0".into()
            }
            .to_string(),
            "Invalid value for reward.exploration.decay_rate: must be > 0"
        );
        assert_eq!(
            ConfigError::Incompatible("ports overlap".into()).to_string(),
            "Incompatible configuration: ports overlap"
        );
    }

    #[test]
    fn lifecycle_error_display_messages() {
        assert_eq!(
            LifecycleError::NotReset.to_string(),
            "environment has not been reset"
        );
        assert_eq!(
            LifecycleError::EpisodeDone.to_string(),
            "episode is done; call reset before stepping again"
        );
        assert_eq!(LifecycleError::Closed.to_string(), "environment is closed");
    }

    #[test]
    fn validation_error_is_copy() {
        let err = ValidationError::ActionOutOfRange { value: 90, max: 81 };
        let err2 = err;
        assert_eq!(err, err2);
        assert_eq!(err.to_string(), "Action out of range: 90 >= 81");
    }
}
