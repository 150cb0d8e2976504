//! Scripted in-memory transport for driving the environment without an
//! engine process.
//!
//! A [`Script`] holds queued replies per message kind plus a log of every
//! message the bridge sent. [`ScriptedConnector`] hands out transports that
//! share one script, so a test keeps a handle and inspects it after the
//! environment has run.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use uttt_bridge::codec;
use uttt_bridge::error::BridgeError;
use uttt_bridge::protocol::{Message, MessageKind};
use uttt_bridge::transport::{Connector, Transport};
use uttt_core::types::{GameState, MoveOutcome};

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// One queued reply.
#[derive(Clone, Debug)]
pub enum Reply {
    /// Delivered as-is.
    Message(Message),
    /// Run through the codec, for exercising malformed input.
    Raw(Vec<u8>),
    /// The engine hung up.
    Hangup,
}

#[derive(Debug, Default)]
struct ScriptInner {
    replies: HashMap<MessageKind, VecDeque<Reply>>,
    sent: Vec<Message>,
    connects: usize,
    closes: usize,
}

/// Shared, cloneable script.
#[derive(Clone, Debug, Default)]
pub struct Script {
    inner: Arc<Mutex<ScriptInner>>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptInner> {
        self.inner.lock().expect("script lock poisoned")
    }

    pub fn push(&self, kind: MessageKind, reply: Reply) -> &Self {
        self.lock().replies.entry(kind).or_default().push_back(reply);
        self
    }

    pub fn push_state(&self, state: GameState) -> &Self {
        self.push(MessageKind::State, Reply::Message(Message::State(state)))
    }

    pub fn push_return(&self, outcome: MoveOutcome) -> &Self {
        self.push(MessageKind::Return, Reply::Message(Message::Return(outcome)))
    }

    /// Every message the bridge sent, in order.
    pub fn sent(&self) -> Vec<Message> {
        self.lock().sent.clone()
    }

    /// Flat action indices the bridge sent, in order.
    pub fn sent_actions(&self) -> Vec<usize> {
        self.lock()
            .sent
            .iter()
            .filter_map(|m| match m {
                Message::Action(mv) => Some(mv.to_action()),
                _ => None,
            })
            .collect()
    }

    /// Replies of `kind` not yet consumed.
    pub fn remaining(&self, kind: MessageKind) -> usize {
        self.lock().replies.get(&kind).map_or(0, VecDeque::len)
    }

    pub fn connects(&self) -> usize {
        self.lock().connects
    }

    pub fn closes(&self) -> usize {
        self.lock().closes
    }
}

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

/// Transport replaying a [`Script`]. An exhausted queue reads as a hangup.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: Script,
    closed: bool,
}

impl ScriptedTransport {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            closed: false,
        }
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, msg: &Message) -> Result<(), BridgeError> {
        self.script.lock().sent.push(msg.clone());
        Ok(())
    }

    fn recv(&mut self, kind: MessageKind) -> Result<Message, BridgeError> {
        let reply = self
            .script
            .lock()
            .replies
            .get_mut(&kind)
            .and_then(VecDeque::pop_front);
        match reply {
            Some(Reply::Message(msg)) => Ok(msg),
            Some(Reply::Raw(bytes)) => Ok(codec::decode(&bytes, kind)?),
            Some(Reply::Hangup) | None => Err(BridgeError::Disconnected(kind)),
        }
    }

    fn close(&mut self) -> Result<(), BridgeError> {
        if !self.closed {
            self.closed = true;
            self.script.lock().closes += 1;
        }
        Ok(())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ScriptedTransport"
    }
}

// ---------------------------------------------------------------------------
// ScriptedConnector
// ---------------------------------------------------------------------------

/// Connector handing out [`ScriptedTransport`]s over one shared script.
#[derive(Clone, Debug, Default)]
pub struct ScriptedConnector {
    script: Script,
    refuse: bool,
}

impl ScriptedConnector {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            refuse: false,
        }
    }

    /// A connector whose every `connect` fails as if the engine were down.
    pub fn refusing() -> Self {
        Self {
            script: Script::new(),
            refuse: true,
        }
    }

    pub fn script(&self) -> &Script {
        &self.script
    }
}

impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    fn connect(&mut self) -> Result<ScriptedTransport, BridgeError> {
        if self.refuse {
            return Err(BridgeError::TransportUnavailable {
                target: "scripted engine".into(),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            });
        }
        self.script.lock().connects += 1;
        Ok(ScriptedTransport::new(self.script.clone()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use uttt_core::types::Move;

    use super::*;
    use crate::fixtures::{accepted, opening_state};

    #[test]
    fn replies_are_per_kind_fifo() {
        let script = Script::new();
        script
            .push_state(opening_state())
            .push_return(accepted(opening_state()));
        let mut transport = ScriptedTransport::new(script.clone());

        assert_eq!(
            transport.recv(MessageKind::Return).unwrap().kind(),
            MessageKind::Return
        );
        assert_eq!(
            transport.recv(MessageKind::State).unwrap().kind(),
            MessageKind::State
        );
        assert!(matches!(
            transport.recv(MessageKind::State),
            Err(BridgeError::Disconnected(MessageKind::State))
        ));
    }

    #[test]
    fn sent_messages_are_logged() {
        let script = Script::new();
        let mut transport = ScriptedTransport::new(script.clone());
        transport
            .send(&Message::Action(Move::from_action(12).unwrap()))
            .unwrap();
        assert_eq!(script.sent_actions(), vec![12]);
    }

    #[test]
    fn raw_replies_go_through_codec() {
        let script = Script::new();
        script.push(MessageKind::State, Reply::Raw(vec![0xff, 0xff]));
        let mut transport = ScriptedTransport::new(script);
        assert!(matches!(
            transport.recv(MessageKind::State),
            Err(BridgeError::Protocol(_))
        ));
    }

    #[test]
    fn refusing_connector_is_unavailable() {
        let err = ScriptedConnector::refusing().connect().unwrap_err();
        assert!(matches!(err, BridgeError::TransportUnavailable { .. }));
    }

    #[test]
    fn close_is_counted_once() {
        let mut connector = ScriptedConnector::new(Script::new());
        let mut transport = connector.connect().unwrap();
        transport.close().unwrap();
        transport.close().unwrap();
        assert_eq!(connector.script().connects(), 1);
        assert_eq!(connector.script().closes(), 1);
    }
}
