use thiserror::Error;

use uttt_core::error::{LifecycleError, ValidationError};

use crate::protocol::{MessageKind, ProtocolError};

/// Top-level error type for the bridge.
///
/// None of these are retried. Invalid *moves* are not errors; they come back
/// as `valid == false` in the step result.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport unavailable: {target}: {source}")]
    TransportUnavailable {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error on {channel} channel: {source}")]
    Io {
        channel: MessageKind,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine closed the {0} channel")]
    Disconnected(MessageKind),
}

impl BridgeError {
    pub(crate) fn unavailable(target: impl Into<String>, source: std::io::Error) -> Self {
        Self::TransportUnavailable {
            target: target.into(),
            source,
        }
    }

    pub(crate) fn io(channel: MessageKind, source: std::io::Error) -> Self {
        Self::Io { channel, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_error_from_protocol_error() {
        let err: BridgeError = ProtocolError::NoTurn {
            kind: MessageKind::State,
        }
        .into();
        assert!(matches!(err, BridgeError::Protocol(_)));
        assert!(err.to_string().contains("turn NONE"));
    }

    #[test]
    fn bridge_error_from_lifecycle_error() {
        let err: BridgeError = LifecycleError::NotReset.into();
        assert!(matches!(err, BridgeError::Lifecycle(LifecycleError::NotReset)));
    }

    #[test]
    fn bridge_error_from_validation_error() {
        let err: BridgeError = ValidationError::ActionOutOfRange { value: 81, max: 81 }.into();
        assert!(matches!(err, BridgeError::Validation(_)));
    }

    #[test]
    fn transport_unavailable_names_target() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = BridgeError::unavailable("state channel localhost:8000", io);
        assert_eq!(
            err.to_string(),
            "Transport unavailable: state channel localhost:8000: refused"
        );
    }

    #[test]
    fn disconnected_display() {
        assert_eq!(
            BridgeError::Disconnected(MessageKind::Return).to_string(),
            "Engine closed the return channel"
        );
    }
}
