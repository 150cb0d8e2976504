use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};

use tracing::{debug, warn};

use uttt_core::config::StreamConfig;
use uttt_core::error::LifecycleError;

use crate::codec;
use crate::error::BridgeError;
use crate::protocol::{Message, MessageKind, ProtocolError};
use crate::transport::Transport;

/// Three persistent TCP connections, one per message kind.
///
/// There is no length prefix. Each `recv` is a single blocking `read` of up
/// to `max_message_size` bytes which must contain exactly one message. The
/// engine writes one message per turn per channel, so this holds as long as
/// the bridge drains each channel once per message the engine sends.
pub struct StreamTransport {
    state: TcpStream,
    action: TcpStream,
    ret: TcpStream,
    max_message_size: usize,
    buf: Vec<u8>,
    closed: bool,
}

impl StreamTransport {
    /// Connect the state, action and return channels, in that order.
    ///
    /// # Errors
    ///
    /// [`BridgeError::TransportUnavailable`] naming the first channel that
    /// refused.
    pub fn connect(config: &StreamConfig) -> Result<Self, BridgeError> {
        let open = |kind: MessageKind, addr: String| {
            debug!(channel = %kind, %addr, "connecting");
            TcpStream::connect(&addr)
                .map_err(|e| BridgeError::unavailable(format!("{kind} channel at {addr}"), e))
        };
        let state = open(MessageKind::State, config.state_addr())?;
        let action = open(MessageKind::Action, config.action_addr())?;
        let ret = open(MessageKind::Return, config.return_addr())?;
        action
            .set_nodelay(true)
            .map_err(|e| BridgeError::io(MessageKind::Action, e))?;
        Ok(Self::from_streams(state, action, ret, config.max_message_size))
    }

    /// Wrap already-connected streams.
    #[must_use]
    pub fn from_streams(
        state: TcpStream,
        action: TcpStream,
        ret: TcpStream,
        max_message_size: usize,
    ) -> Self {
        Self {
            state,
            action,
            ret,
            max_message_size,
            buf: vec![0; max_message_size],
            closed: false,
        }
    }

    fn channel(&mut self, kind: MessageKind) -> &mut TcpStream {
        match kind {
            MessageKind::State => &mut self.state,
            MessageKind::Action => &mut self.action,
            MessageKind::Return => &mut self.ret,
        }
    }
}

impl Transport for StreamTransport {
    fn send(&mut self, msg: &Message) -> Result<(), BridgeError> {
        if self.closed {
            return Err(LifecycleError::Closed.into());
        }
        let kind = msg.kind();
        let bytes = codec::encode(msg);
        if bytes.len() > self.max_message_size {
            return Err(ProtocolError::PayloadTooLarge {
                kind,
                size: bytes.len(),
                max: self.max_message_size,
            }
            .into());
        }
        let stream = self.channel(kind);
        stream
            .write_all(&bytes)
            .and_then(|()| stream.flush())
            .map_err(|e| BridgeError::io(kind, e))?;
        debug!(channel = %kind, bytes = bytes.len(), "sent");
        Ok(())
    }

    fn recv(&mut self, kind: MessageKind) -> Result<Message, BridgeError> {
        if self.closed {
            return Err(LifecycleError::Closed.into());
        }
        let mut buf = std::mem::take(&mut self.buf);
        let read = read_once(self.channel(kind), &mut buf);
        let result = match read {
            Ok(0) => Err(BridgeError::Disconnected(kind)),
            Ok(n) => {
                debug!(channel = %kind, bytes = n, "received");
                codec::decode(&buf[..n], kind).map_err(BridgeError::from)
            }
            Err(e) => Err(BridgeError::io(kind, e)),
        };
        self.buf = buf;
        result
    }

    fn close(&mut self) -> Result<(), BridgeError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mut first_err = None;
        for kind in MessageKind::ALL {
            match self.channel(kind).shutdown(Shutdown::Both) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotConnected => {}
                Err(e) => {
                    first_err.get_or_insert(BridgeError::io(kind, e));
                }
            }
        }
        debug!("stream transport closed");
        first_err.map_or(Ok(()), Err)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "StreamTransport"
    }
}

impl Drop for StreamTransport {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to shut down stream transport");
        }
    }
}

/// One `read`, retried while it is interrupted by a signal.
fn read_once<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            result => return result,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
