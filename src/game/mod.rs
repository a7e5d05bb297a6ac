//! Game state, rules, and the command pipeline

pub mod agent;
pub mod chain;
pub mod combat;
pub mod command;
pub mod diff;
pub mod interaction;
pub mod logger;
pub mod patch_path;
pub mod phase;
pub mod processor;
pub mod runner;
pub mod snapshot;
pub mod state;
pub mod state_hash;
pub mod view;

pub use agent::{Agent, RandomAgent, ScriptedAgent};
pub use chain::{Chain, ChainEffect, ChainState};
pub use combat::{CombatState, CombatStep};
pub use command::{Command, CommandAction};
pub use interaction::{InteractionAnswer, InteractionContext};
pub use logger::{GameLogger, VerbosityLevel};
pub use phase::{PhaseContext, PhaseKind, TurnStructure};
pub use processor::CommandProcessor;
pub use runner::{MatchOutcome, MatchRunner};
pub use snapshot::{apply_state_delta, DebugDump, SnapshotService, SnapshotUpdate, UpdateKind};
pub use state::{Game, GameConfig, SuspendReason, Suspension};
pub use state_hash::{compute_state_hash, format_hash};
pub use view::{deciding_player, GameView};
