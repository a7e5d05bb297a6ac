//! Drives two agents against one processor until the game ends
//!
//! The runner is the synchronous stand-in for a transport layer: it asks
//! the view whose decision is pending, lets that player's agent pick a
//! command, and submits it. A command budget bounds runaway matches
//! (random agents can stall each other indefinitely in theory), and a
//! rejected command simply comes back around to the same player.

use crate::core::PlayerId;
use crate::game::agent::Agent;
use crate::game::command::{Command, CommandAction};
use crate::game::phase::PhaseKind;
use crate::game::processor::CommandProcessor;
use crate::game::state::{Game, SuspendReason};
use crate::game::view::{deciding_player, GameView};
use crate::{EngineError, Result};

const DEFAULT_COMMAND_BUDGET: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub winner: Option<PlayerId>,
    pub turns: u32,
    pub commands: usize,
    /// False when the command budget ran out or the engine halted
    pub completed: bool,
}

pub struct MatchRunner {
    processor: CommandProcessor,
    agents: [Box<dyn Agent>; 2],
    max_commands: usize,
}

impl MatchRunner {
    /// Agents are in player order: `agents[0]` plays the starting player.
    pub fn new(processor: CommandProcessor, agents: [Box<dyn Agent>; 2]) -> Self {
        MatchRunner {
            processor,
            agents,
            max_commands: DEFAULT_COMMAND_BUDGET,
        }
    }

    pub fn with_command_budget(mut self, max_commands: usize) -> Self {
        self.max_commands = max_commands;
        self
    }

    pub fn processor(&self) -> &CommandProcessor {
        &self.processor
    }

    pub fn into_processor(self) -> CommandProcessor {
        self.processor
    }

    pub fn run(&mut self) -> Result<MatchOutcome> {
        self.processor.sync()?;
        let ids = self.processor.game().player_ids();

        let mut commands = 0;
        while commands < self.max_commands {
            if self.processor.game().is_over() || self.processor.is_halted() {
                break;
            }
            let Some(player) = deciding_player(self.processor.game()) else {
                return Err(EngineError::CorruptState(
                    "live game with no deciding player".to_string(),
                ));
            };

            let index = (player == ids[1]) as usize;
            let action = {
                let view = GameView::new(self.processor.game(), player);
                let available = view.available_commands();
                self.agents[index]
                    .choose(&view, &available)
                    .unwrap_or_else(|| default_action(self.processor.game()))
            };
            self.processor.game().logger.agent_choice(
                self.agents[index].name(),
                &format!("{} -> {}", player, action.kind()),
            );
            self.processor.submit(Command::new(player, action))?;
            commands += 1;
        }

        let winner = self.processor.game().winner();
        let completed = self.processor.game().is_over();
        for (index, agent) in self.agents.iter_mut().enumerate() {
            let view = GameView::new(self.processor.game(), ids[index]);
            agent.on_game_end(&view, winner == Some(ids[index]));
        }

        Ok(MatchOutcome {
            winner,
            turns: self.processor.game().turn.turn_number,
            commands,
            completed,
        })
    }
}

/// The neutral command for the current situation. Always valid, always
/// makes progress.
fn default_action(game: &Game) -> CommandAction {
    if let Some(suspension) = &game.suspension {
        return match suspension.reason {
            SuspendReason::AwaitingInteraction => match game.interaction.fallback() {
                Some(answer) => CommandAction::InteractionCommit { answer },
                None => CommandAction::Concede,
            },
            SuspendReason::ChainPriority => CommandAction::PassChain,
        };
    }
    match game.phase.kind() {
        PhaseKind::Main => CommandAction::EndTurn,
        PhaseKind::Attack => CommandAction::CancelAttack,
        _ => CommandAction::Concede,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BlueprintId, PlayerName};
    use crate::game::agent::{RandomAgent, ScriptedAgent};
    use crate::game::state::GameConfig;

    fn started_game(seed: u64) -> Game {
        let mut game = Game::new(
            GameConfig {
                seed,
                ..GameConfig::default()
            },
            [PlayerName::new("ada"), PlayerName::new("brom")],
            [
                BlueprintId::new("pyre_warden"),
                BlueprintId::new("tide_caller"),
            ],
        )
        .unwrap();
        let [p0, p1] = game.player_ids();
        for _ in 0..15 {
            game.add_deck_card(p0, &BlueprintId::new("ember_whelp"))
                .unwrap();
            game.add_deck_card(p1, &BlueprintId::new("stone_bulwark"))
                .unwrap();
        }
        game.start().unwrap();
        game
    }

    #[test]
    fn test_scripted_concession_ends_match() {
        let processor = CommandProcessor::new(started_game(3));
        let [_, p1] = processor.game().player_ids();

        let mut runner = MatchRunner::new(
            processor,
            [
                Box::new(ScriptedAgent::new("quitter", vec![CommandAction::Concede])),
                Box::new(ScriptedAgent::new("bystander", vec![])),
            ],
        );
        let outcome = runner.run().unwrap();
        assert!(outcome.completed);
        assert_eq!(outcome.winner, Some(p1));
        assert_eq!(outcome.commands, 1);
    }

    #[test]
    fn test_empty_scripts_cycle_turns_until_budget() {
        let processor = CommandProcessor::new(started_game(3));
        let mut runner = MatchRunner::new(
            processor,
            [
                Box::new(ScriptedAgent::new("idle-a", vec![])),
                Box::new(ScriptedAgent::new("idle-b", vec![])),
            ],
        )
        .with_command_budget(10);

        let outcome = runner.run().unwrap();
        assert!(!outcome.completed);
        assert_eq!(outcome.commands, 10);
        // Five end-turns per player means the turn counter moved.
        assert!(outcome.turns > 1);
        assert!(!runner.processor().is_halted());
    }

    #[test]
    fn test_random_match_is_reproducible() {
        let run = |seed| {
            let processor = CommandProcessor::new(started_game(11));
            let mut runner = MatchRunner::new(
                processor,
                [
                    Box::new(RandomAgent::with_seed(seed)),
                    Box::new(RandomAgent::with_seed(seed + 1)),
                ],
            )
            .with_command_budget(400);
            runner.run().unwrap();
            runner.into_processor().history().to_vec()
        };

        assert_eq!(run(5), run(5));
    }
}
