//! Full episodes against a fake engine over real TCP sockets.

use approx::assert_relative_eq;

use uttt_bridge::prelude::*;
use uttt_test_utils::{EngineTurn, FakeEngine, GameBuilder, accepted, opening_state, rejected};

fn config_for(engine: &FakeEngine) -> BridgeConfig {
    BridgeConfig {
        transport: TransportConfig::Stream(engine.config()),
        ..Default::default()
    }
}

#[test]
fn plays_to_a_win_over_tcp() {
    let mut game = GameBuilder::new();
    let start = game.state();

    let first = game.play(40);
    let after_first = game.state();
    let second = game.play(36);
    let after_second = game.state();
    game.finish(Owner::Player1);
    let third = game.play(8);

    let engine = FakeEngine::spawn(
        start,
        vec![
            EngineTurn::new(accepted(first), after_first),
            EngineTurn::new(accepted(second), after_second),
            EngineTurn::last(accepted(third)),
        ],
    );
    let config = config_for(&engine);
    let mut env = UtttEnv::from_config(&config);

    let obs = env.reset().unwrap();
    assert_eq!(obs.shape(), &[9, 9, 4]);

    let r1 = env.step(40).unwrap();
    assert!(r1.valid && !r1.done);
    assert_eq!(env.turn(), Player::Player2);

    let r2 = env.step(36).unwrap();
    assert!(!r2.done);
    assert_eq!(env.turn(), Player::Player1);

    let r3 = env.step(8).unwrap();
    assert!(r3.done);
    assert!(r3.info.won);
    assert_relative_eq!(r3.reward, 0.1 + 10.0);
    assert_eq!(env.state(), EnvState::Done);

    env.close().unwrap();
    let received: Vec<usize> = engine.join().iter().map(|mv| mv.to_action()).collect();
    assert_eq!(received, vec![40, 36, 8]);
}

#[test]
fn rejected_move_then_retry_over_tcp() {
    let mut game = GameBuilder::new();
    let start = opening_state();
    let reported = game.play(40);

    let engine = FakeEngine::spawn(
        start.clone(),
        vec![
            EngineTurn::new(rejected(start.clone()), start),
            EngineTurn::new(accepted(reported), game.state()),
        ],
    );
    let mut env = UtttEnv::from_config(&config_for(&engine));
    env.reset().unwrap();

    // Sub-board 0 is outside the centre constraint.
    let r1 = env.step(0).unwrap();
    assert!(!r1.valid);
    assert_relative_eq!(r1.reward, -1.0);
    assert_eq!(env.turn(), Player::Player1);

    let r2 = env.step(40).unwrap();
    assert!(r2.valid);
    assert_relative_eq!(r2.reward, 0.1);

    env.close().unwrap();
    let received: Vec<usize> = engine.join().iter().map(|mv| mv.to_action()).collect();
    assert_eq!(received, vec![0, 40]);
}

#[test]
fn engine_exit_mid_episode_is_disconnect() {
    let engine = FakeEngine::spawn(opening_state(), Vec::new());
    let mut env = UtttEnv::from_config(&config_for(&engine));
    env.reset().unwrap();

    // The engine thread has nothing scripted and hangs up.
    assert!(engine.join().is_empty());
    let err = env.step(40).unwrap_err();
    assert!(
        matches!(err, BridgeError::Disconnected(_) | BridgeError::Io { .. }),
        "unexpected error: {err:?}"
    );
    assert_eq!(env.state(), EnvState::Failed);
}

#[test]
fn no_engine_is_transport_unavailable() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config = BridgeConfig {
        transport: TransportConfig::Stream(StreamConfig {
            host: "127.0.0.1".into(),
            state_port: port,
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut env = UtttEnv::from_config(&config);
    assert!(matches!(
        env.reset().unwrap_err(),
        BridgeError::TransportUnavailable { .. }
    ));
}
