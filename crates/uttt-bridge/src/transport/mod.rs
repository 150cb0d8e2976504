//! Channels between the bridge and the engine.
//!
//! A [`Transport`] delivers one encoded message and blocks until a message
//! of the requested kind arrives. Two strategies ship here:
//!
//! - [`StreamTransport`]: three TCP connections (state, action, return),
//!   one message per `read`
//! - [`FileTransport`]: one file per message kind, polled until non-empty
//!   and truncated after reading
//!
//! A [`Connector`] opens a fresh transport; the environment calls it on
//! every `reset`. The transport configs are themselves connectors.

mod file;
mod stream;

pub use file::FileTransport;
pub use stream::StreamTransport;

use uttt_core::config::{FileConfig, StreamConfig, TransportConfig};

use crate::error::BridgeError;
use crate::protocol::{Message, MessageKind};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Blocking message exchange with the engine.
///
/// Neither call has a timeout: a silent engine blocks the caller forever.
pub trait Transport: Send {
    /// Deliver `msg` on the channel for its kind.
    fn send(&mut self, msg: &Message) -> Result<(), BridgeError>;

    /// Block until a message of `kind` is available and decode it.
    fn recv(&mut self, kind: MessageKind) -> Result<Message, BridgeError>;

    /// Release every channel. Calling it again is a no-op.
    fn close(&mut self) -> Result<(), BridgeError>;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, msg: &Message) -> Result<(), BridgeError> {
        (**self).send(msg)
    }

    fn recv(&mut self, kind: MessageKind) -> Result<Message, BridgeError> {
        (**self).recv(kind)
    }

    fn close(&mut self) -> Result<(), BridgeError> {
        (**self).close()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

/// Opens a fresh [`Transport`] for each episode.
pub trait Connector {
    type Transport: Transport;

    /// Establish every channel.
    ///
    /// # Errors
    ///
    /// [`BridgeError::TransportUnavailable`] naming the channel that could
    /// not be opened.
    fn connect(&mut self) -> Result<Self::Transport, BridgeError>;
}

impl Connector for StreamConfig {
    type Transport = StreamTransport;

    fn connect(&mut self) -> Result<StreamTransport, BridgeError> {
        StreamTransport::connect(self)
    }
}

impl Connector for FileConfig {
    type Transport = FileTransport;

    fn connect(&mut self) -> Result<FileTransport, BridgeError> {
        FileTransport::open(self)
    }
}

impl Connector for TransportConfig {
    type Transport = Box<dyn Transport>;

    fn connect(&mut self) -> Result<Box<dyn Transport>, BridgeError> {
        Ok(match self {
            Self::Stream(stream) => Box::new(stream.connect()?),
            Self::File(file) => Box::new(file.connect()?),
        })
    }
}
