//! Shared test fixtures and utilities for the bridge crates.
//!
//! Provides game-state builders, a scripted in-memory transport, a fake
//! engine listening on real TCP sockets, and deterministic RNG setup.

pub mod engine;
pub mod fixtures;
pub mod mocks;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use engine::{EngineTurn, FakeEngine};
pub use fixtures::{GameBuilder, accepted, opening_state, rejected};
pub use mocks::{Reply, Script, ScriptedConnector, ScriptedTransport};
pub use rng::{deterministic_logits, seeded_rng};
