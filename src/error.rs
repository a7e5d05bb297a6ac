//! Error types for the chainforge engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Command from wrong player (expected player {expected}, got {got})")]
    WrongPlayer { expected: u32, got: u32 },

    #[error("Player {0} does not hold priority")]
    NoPriority(u32),

    #[error("Not enough choices: need at least {min}, got {got}")]
    NotEnoughChoices { min: usize, got: usize },

    #[error("Too many choices: allowed at most {max}, got {got}")]
    TooManyChoices { max: usize, got: usize },

    #[error("Choice index {index} out of range (limit {limit})")]
    OutOfRangeChoice { index: usize, limit: usize },

    #[error("No interaction is awaiting input")]
    NoOpenInteraction,

    #[error("Rule violation: {0}")]
    Rule(String),

    #[error("Invalid deck format: {0}")]
    InvalidDeckFormat(String),

    #[error("Illegal phase transition: {from} -> {to}")]
    WrongPhaseTransition { from: String, to: String },

    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("Corrupt game state: {0}")]
    CorruptState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Fatal errors halt the game instance. Everything else is a
    /// validation or domain error: the engine clears its command queue,
    /// resyncs clients, and keeps running.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::WrongPhaseTransition { .. }
                | EngineError::EntityNotFound(_)
                | EngineError::CorruptState(_)
                | EngineError::Io(_)
                | EngineError::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
