//! A stand-in engine process on real TCP sockets.
//!
//! [`FakeEngine`] binds the state, action and return listeners on ephemeral
//! ports, accepts one connection on each in that order, and then plays a
//! fixed list of [`EngineTurn`]s: push a state, read one action, answer
//! with the scripted verdict. It behaves like the real engine on the wire:
//! one message per write, a fresh state pushed at the start of every turn
//! (including after a rejected move), nothing after the game ends.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use uttt_bridge::codec;
use uttt_bridge::protocol::{Message, MessageKind};
use uttt_core::config::StreamConfig;
use uttt_core::types::{GameState, Move, MoveOutcome};

/// One scripted turn: the verdict to return for whatever action arrives,
/// and the state to push before the next turn.
#[derive(Clone, Debug)]
pub struct EngineTurn {
    pub outcome: MoveOutcome,
    /// Pushed after the return message unless the game is over.
    pub next_state: GameState,
}

impl EngineTurn {
    pub fn new(outcome: MoveOutcome, next_state: GameState) -> Self {
        Self {
            outcome,
            next_state,
        }
    }

    /// Final turn: no state follows.
    pub fn last(outcome: MoveOutcome) -> Self {
        let next_state = outcome.state.clone();
        Self {
            outcome,
            next_state,
        }
    }
}

/// Handle to a running fake engine.
pub struct FakeEngine {
    config: StreamConfig,
    handle: JoinHandle<Vec<Move>>,
}

impl FakeEngine {
    /// Listen on `127.0.0.1` and play `turns` after pushing `initial`.
    ///
    /// The engine thread exits once the script is exhausted or the bridge
    /// hangs up.
    pub fn spawn(initial: GameState, turns: Vec<EngineTurn>) -> Self {
        let listeners: Vec<TcpListener> = (0..3)
            .map(|_| TcpListener::bind("127.0.0.1:0").expect("bind listener"))
            .collect();
        let port = |i: usize| listeners[i].local_addr().expect("local addr").port();
        let config = StreamConfig {
            host: "127.0.0.1".into(),
            state_port: port(0),
            action_port: port(1),
            return_port: port(2),
            max_message_size: 4096,
        };

        let handle = thread::spawn(move || {
            let mut streams = listeners
                .iter()
                .map(|l| l.accept().map(|(stream, _)| stream))
                .collect::<Result<Vec<TcpStream>, _>>()
                .expect("accept bridge connections");
            let mut ret = streams.pop().expect("return stream");
            let mut action = streams.pop().expect("action stream");
            let mut state = streams.pop().expect("state stream");
            run(&mut state, &mut action, &mut ret, initial, turns)
        });

        Self { config, handle }
    }

    /// Connection settings pointing at this engine.
    pub fn config(&self) -> StreamConfig {
        self.config.clone()
    }

    /// Wait for the engine thread and return the moves it received.
    pub fn join(self) -> Vec<Move> {
        self.handle.join().expect("fake engine panicked")
    }
}

fn write(stream: &mut TcpStream, msg: &Message) -> bool {
    stream.write_all(&codec::encode(msg)).is_ok() && stream.flush().is_ok()
}

fn run(
    state: &mut TcpStream,
    action: &mut TcpStream,
    ret: &mut TcpStream,
    initial: GameState,
    turns: Vec<EngineTurn>,
) -> Vec<Move> {
    let mut received = Vec::new();
    let mut buf = vec![0u8; 4096];
    if !write(state, &Message::State(initial)) {
        return received;
    }
    for turn in turns {
        let n = match action.read(&mut buf) {
            Ok(0) | Err(_) => return received,
            Ok(n) => n,
        };
        let mv = codec::decode(&buf[..n], MessageKind::Action)
            .and_then(Message::into_action)
            .expect("bridge sent a well-formed action");
        received.push(mv);

        let done = turn.outcome.state.done;
        if !write(ret, &Message::Return(turn.outcome)) {
            return received;
        }
        if done {
            break;
        }
        if !write(state, &Message::State(turn.next_state)) {
            return received;
        }
    }
    received
}
