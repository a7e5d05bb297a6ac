//! Command processing pipeline
//!
//! One processor exclusively owns one game. Commands go into a FIFO
//! queue and execute one at a time to completion; a command that opens
//! an interaction or a chain priority window leaves the game suspended,
//! and while suspended only the awaited kinds of command are accepted.
//! Anything else is a validation failure: the queue is cleared, a
//! `CommandRejected` event goes out, and every viewer gets a full resync
//! snapshot so nobody acts on a stale view.
//!
//! Every successfully executed command is appended to an immutable
//! history. The same starting game (config, seed, decks) plus that
//! history replays to an identical final state; [`CommandProcessor::initialize`]
//! does exactly that and refuses to continue if the replay diverges.
//!
//! Fatal errors mean the engine itself is corrupt. The processor halts
//! the instance, captures a debug dump of the full state plus the
//! offending command, and sends a one-shot error notice to all viewers.

use std::collections::VecDeque;
use std::path::PathBuf;

use serde_json::Value;

use crate::core::{EntityId, GameEvent, PlayerId};
use crate::game::command::{Command, CommandAction};
use crate::game::snapshot::{DebugDump, SnapshotService, SnapshotUpdate};
use crate::game::state::{Game, SuspendReason};
use crate::game::state_hash::{compute_state_hash, format_hash};
use crate::{EngineError, Result};

#[derive(Debug)]
pub struct CommandProcessor {
    game: Game,
    queue: VecDeque<Command>,
    history: Vec<Command>,
    snapshots: SnapshotService,
    /// Where fatal-error dumps land; in-memory only when unset
    dump_dir: Option<PathBuf>,
    last_dump: Option<DebugDump>,
}

impl CommandProcessor {
    /// Wrap a started game. The processor assumes exclusive ownership;
    /// nothing else may mutate the game from here on.
    pub fn new(game: Game) -> Self {
        let snapshots = SnapshotService::new(game.player_ids());
        CommandProcessor {
            game,
            queue: VecDeque::new(),
            history: Vec::new(),
            snapshots,
            dump_dir: None,
            last_dump: None,
        }
    }

    pub fn with_dump_dir(mut self, dir: PathBuf) -> Self {
        self.dump_dir = Some(dir);
        self
    }

    /// Rebuild a processor by replaying a command history against a
    /// freshly started game. The game must be constructed exactly as the
    /// original was before its first command; any command that fails to
    /// execute during replay means the two have diverged.
    pub fn initialize(game: Game, history: Vec<Command>) -> Result<CommandProcessor> {
        let mut processor = CommandProcessor::new(game);
        for command in history {
            let executed = processor.history.len();
            processor.submit(command.clone())?;
            if processor.history.len() != executed + 1 {
                return Err(EngineError::CorruptState(format!(
                    "replay diverged: {} from player {} did not execute",
                    command.action.kind(),
                    command.player
                )));
            }
        }
        Ok(processor)
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn history(&self) -> &[Command] {
        &self.history
    }

    pub fn snapshots(&self) -> &SnapshotService {
        &self.snapshots
    }

    pub fn last_dump(&self) -> Option<&DebugDump> {
        self.last_dump.as_ref()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_halted(&self) -> bool {
        self.game.halted
    }

    pub fn is_suspended(&self) -> bool {
        self.game.suspension.is_some()
    }

    /// First contact for the viewers, or a manual resync: capture the
    /// current state without executing anything.
    pub fn sync(&mut self) -> Result<Vec<SnapshotUpdate>> {
        self.snapshots.take_snapshot(&self.game)
    }

    /// Queue a command without executing it. [`CommandProcessor::pump`]
    /// drains the queue in submission order.
    pub fn enqueue(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    /// Queue one command and drain. The common path: transports feed
    /// commands in one at a time.
    pub fn submit(&mut self, command: Command) -> Result<Vec<SnapshotUpdate>> {
        self.enqueue(command);
        self.pump()
    }

    /// Decode a wire command and submit it. Unknown command types are
    /// dropped without error.
    pub fn submit_wire(&mut self, value: &Value) -> Result<Vec<SnapshotUpdate>> {
        match Command::decode(value) {
            Ok(Some(command)) => self.submit(command),
            Ok(None) => {
                let kind = value
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("<missing>");
                self.game
                    .logger
                    .verbose(&format!("ignoring unknown command type {:?}", kind));
                Ok(Vec::new())
            }
            Err(err) => {
                // A known type with a bad payload still earns the sender
                // a rejection and a resync, if we can tell who sent it.
                let player = value
                    .get("player")
                    .and_then(Value::as_u64)
                    .map(|p| EntityId::new(p as u32));
                match player {
                    Some(player) => self.reject(player, err),
                    None => {
                        self.game
                            .logger
                            .verbose(&format!("dropping unattributable command: {}", err));
                        Ok(Vec::new())
                    }
                }
            }
        }
    }

    /// Execute queued commands in order until the queue is empty or the
    /// instance halts. Returns every snapshot update produced.
    pub fn pump(&mut self) -> Result<Vec<SnapshotUpdate>> {
        let mut updates = Vec::new();
        while let Some(command) = self.queue.pop_front() {
            if self.game.halted {
                self.game.logger.minimal(&format!(
                    "instance halted; dropping {} from player {}",
                    command.action.kind(),
                    command.player
                ));
                self.queue.clear();
                break;
            }
            match self.execute(&command) {
                Ok(()) => {
                    self.history.push(command);
                    if self.game.logger.debug_trace_enabled() {
                        eprintln!(
                            "  [{}] {}",
                            self.history.len(),
                            format_hash(compute_state_hash(&self.game))
                        );
                    }
                    updates.extend(self.snapshots.take_snapshot(&self.game)?);
                }
                Err(err) if err.is_fatal() => {
                    updates.extend(self.halt(&command, &err)?);
                    break;
                }
                Err(err) => {
                    self.game.logger.normal(&format!(
                        "rejected {} from player {}: {}",
                        command.action.kind(),
                        command.player,
                        err
                    ));
                    updates.extend(self.reject(command.player, err)?);
                }
            }
        }
        Ok(updates)
    }

    /// Commit the open interaction with its fallback answer. The host's
    /// watchdog calls this on decision timeout; the synthesized commit
    /// goes through the normal pipeline so it lands in history and
    /// replays like any other command.
    pub fn timeout_open_interaction(&mut self) -> Result<Vec<SnapshotUpdate>> {
        let (player, answer) = match (
            self.game.interaction.player(),
            self.game.interaction.fallback(),
        ) {
            (Some(player), Some(answer)) => (player, answer),
            _ => return Err(EngineError::NoOpenInteraction),
        };
        self.submit(Command::new(
            player,
            CommandAction::InteractionCommit { answer },
        ))
    }

    /// Pass on behalf of the player holding chain priority. The watchdog
    /// path for an unresponsive player during a response window.
    pub fn timeout_chain_priority(&mut self) -> Result<Vec<SnapshotUpdate>> {
        let holder = self
            .game
            .chain
            .as_ref()
            .filter(|chain| chain.is_building())
            .map(|chain| chain.priority())
            .ok_or_else(|| {
                EngineError::InvalidCommand("no chain priority window is open".to_string())
            })?;
        self.submit(Command::new(holder, CommandAction::PassChain))
    }

    fn execute(&mut self, command: &Command) -> Result<()> {
        if self.game.is_over() {
            return Err(EngineError::Rule("the game is over".to_string()));
        }
        if let Some(suspension) = &self.game.suspension {
            let allowed = match suspension.reason {
                SuspendReason::AwaitingInteraction => matches!(
                    command.action,
                    CommandAction::InteractionSelect { .. }
                        | CommandAction::InteractionCommit { .. }
                        | CommandAction::Concede
                ),
                SuspendReason::ChainPriority => matches!(
                    command.action,
                    CommandAction::AddResponse { .. }
                        | CommandAction::PassChain
                        | CommandAction::DeclareAttackTarget { .. }
                        | CommandAction::Concede
                ),
            };
            if !allowed {
                let awaiting = match suspension.reason {
                    SuspendReason::AwaitingInteraction => "an interaction commit",
                    SuspendReason::ChainPriority => "a chain response or pass",
                };
                return Err(EngineError::InvalidCommand(format!(
                    "engine is awaiting {awaiting}; {} is not valid now",
                    command.action.kind()
                )));
            }
        }

        match &command.action {
            CommandAction::PlayCard {
                card,
                slot,
                targets,
            } => self
                .game
                .begin_play_card(command.player, *card, *slot, targets.clone()),
            CommandAction::AddResponse { card, targets } => {
                self.game.add_response(command.player, *card, targets.clone())
            }
            CommandAction::PassChain => self.game.pass_chain(command.player),
            CommandAction::DeclareAttacker { attacker } => {
                self.game.declare_attacker(command.player, *attacker)
            }
            CommandAction::DeclareAttackTarget { target } => {
                self.game.declare_attack_target(command.player, *target)
            }
            CommandAction::CancelAttack => self.game.cancel_attack(command.player),
            CommandAction::InteractionSelect { target } => {
                self.game.interaction_select(command.player, *target)
            }
            CommandAction::InteractionCommit { answer } => {
                self.game.commit_interaction(command.player, answer.clone())
            }
            CommandAction::EndTurn => self.game.end_turn(command.player),
            CommandAction::Concede => self.game.concede(command.player),
        }
    }

    /// Validation failure: clear the queue, acknowledge, resync everyone
    fn reject(&mut self, player: PlayerId, err: EngineError) -> Result<Vec<SnapshotUpdate>> {
        self.queue.clear();
        self.game.emit(GameEvent::CommandRejected {
            player,
            reason: err.to_string(),
        });
        self.snapshots.force_full();
        self.snapshots.take_snapshot(&self.game)
    }

    /// Fatal failure: the instance is done. Dump state for forensics and
    /// tell every viewer, without leaking internals to them.
    fn halt(&mut self, command: &Command, err: &EngineError) -> Result<Vec<SnapshotUpdate>> {
        self.game.logger.minimal(&format!(
            "fatal error executing {} from player {}: {}",
            command.action.kind(),
            command.player,
            err
        ));
        self.queue.clear();
        self.game.halted = true;

        let dump = DebugDump::capture(&self.game, Some(command), &err.to_string())?;
        if let Some(dir) = &self.dump_dir {
            let path = dir.join(format!("dump_{}.json", self.snapshots.last_id() + 1));
            if let Err(write_err) = dump.save_to_file(&path) {
                self.game
                    .logger
                    .minimal(&format!("failed to write debug dump: {}", write_err));
            }
        }
        self.last_dump = Some(dump);

        Ok(self.snapshots.emit_error("internal engine error"))
    }
}
