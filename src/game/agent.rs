//! Decision agents
//!
//! An agent stands in for one player: given a view and the commands
//! available, it picks one or declines. Declining is always safe; the
//! runner falls back to the neutral action for the situation (pass,
//! fallback commit, end turn), so agents never stall a match.

use std::collections::VecDeque;

use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::command::CommandAction;
use crate::game::view::GameView;

pub trait Agent {
    fn name(&self) -> &str;

    /// Pick one of the available commands, or None to take the default
    fn choose(
        &mut self,
        view: &GameView<'_>,
        available: &[CommandAction],
    ) -> Option<CommandAction>;

    /// Called once when the match ends
    fn on_game_end(&mut self, view: &GameView<'_>, won: bool) {
        let _ = (view, won);
    }
}

/// Replays a fixed list of commands, then declines forever. Used by
/// tests and the CLI to drive exact scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedAgent {
    name: String,
    script: VecDeque<CommandAction>,
}

impl ScriptedAgent {
    pub fn new(name: impl Into<String>, script: Vec<CommandAction>) -> Self {
        ScriptedAgent {
            name: name.into(),
            script: script.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose(
        &mut self,
        _view: &GameView<'_>,
        _available: &[CommandAction],
    ) -> Option<CommandAction> {
        self.script.pop_front()
    }
}

/// Picks uniformly from the available commands. Seeded, so a given seed
/// pair replays the same match.
pub struct RandomAgent {
    name: String,
    rng: Box<dyn RngCore + Send>,
}

impl RandomAgent {
    pub fn with_seed(seed: u64) -> Self {
        RandomAgent {
            name: format!("random-{seed}"),
            rng: Box::new(rand::rngs::StdRng::seed_from_u64(seed)),
        }
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose(
        &mut self,
        _view: &GameView<'_>,
        available: &[CommandAction],
    ) -> Option<CommandAction> {
        if available.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..available.len());
        Some(available[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BlueprintId, PlayerName};
    use crate::game::state::{Game, GameConfig};
    use crate::game::view::GameView;

    fn minimal_game() -> Game {
        let mut game = Game::new(
            GameConfig::default(),
            [PlayerName::new("ada"), PlayerName::new("brom")],
            [
                BlueprintId::new("pyre_warden"),
                BlueprintId::new("tide_caller"),
            ],
        )
        .unwrap();
        let [p0, p1] = game.player_ids();
        for _ in 0..6 {
            game.add_deck_card(p0, &BlueprintId::new("ember_whelp"))
                .unwrap();
            game.add_deck_card(p1, &BlueprintId::new("ember_whelp"))
                .unwrap();
        }
        game.start().unwrap();
        game
    }

    #[test]
    fn test_scripted_agent_plays_in_order_then_declines() {
        let game = minimal_game();
        let [p0, _] = game.player_ids();
        let view = GameView::new(&game, p0);

        let mut agent = ScriptedAgent::new(
            "script",
            vec![CommandAction::EndTurn, CommandAction::Concede],
        );
        assert_eq!(agent.choose(&view, &[]), Some(CommandAction::EndTurn));
        assert_eq!(agent.choose(&view, &[]), Some(CommandAction::Concede));
        assert_eq!(agent.choose(&view, &[]), None);
    }

    #[test]
    fn test_random_agent_is_deterministic_per_seed() {
        let game = minimal_game();
        let [p0, _] = game.player_ids();
        let view = GameView::new(&game, p0);
        let options: Vec<CommandAction> = (0..8)
            .map(|_| CommandAction::EndTurn)
            .chain([CommandAction::Concede, CommandAction::PassChain])
            .collect();

        let picks: Vec<_> = (0..5)
            .map(|_| RandomAgent::with_seed(99).choose(&view, &options))
            .collect();
        assert!(picks.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_random_agent_declines_with_no_options() {
        let game = minimal_game();
        let [p0, _] = game.player_ids();
        let view = GameView::new(&game, p0);
        assert_eq!(RandomAgent::with_seed(1).choose(&view, &[]), None);
    }
}
