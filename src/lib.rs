//! Chainforge - deterministic rules engine for a two-player card battler
//!
//! Every mutation flows through serializable commands, every observable
//! change is appended to an event log, and per-viewer snapshot deltas
//! let a client rebuild the exact same game from the command history.

pub mod blueprint;
pub mod board;
pub mod core;
pub mod error;
pub mod game;
pub mod loader;
pub mod simulate;

pub use error::{EngineError, Result};
