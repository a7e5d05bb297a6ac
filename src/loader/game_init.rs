//! Building playable games from deck lists

use crate::core::{BlueprintId, PlayerName};
use crate::game::command::Command;
use crate::game::state::{Game, GameConfig};
use crate::loader::deck::DeckList;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One player's half of a match setup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSetup {
    pub name: PlayerName,
    pub hero: BlueprintId,
    pub deck: DeckList,
}

impl PlayerSetup {
    pub fn new(name: impl Into<String>, hero: impl Into<String>, deck: DeckList) -> Self {
        PlayerSetup {
            name: PlayerName::new(name),
            hero: BlueprintId::new(hero),
            deck,
        }
    }
}

/// Build a started game: decks validated and instantiated, shuffled with
/// the config seed, opening hands drawn, first draw phase run.
pub fn init_game(config: GameConfig, setups: [PlayerSetup; 2]) -> Result<Game> {
    for setup in &setups {
        setup.deck.validate()?;
    }

    let [a, b] = setups;
    let mut game = Game::new(config, [a.name, b.name], [a.hero, b.hero])?;
    let [p0, p1] = game.player_ids();

    for (player, deck) in [(p0, &a.deck), (p1, &b.deck)] {
        for entry in &deck.entries {
            for _ in 0..entry.count {
                game.add_deck_card(player, &entry.blueprint)?;
            }
        }
        game.shuffle_deck(player)?;
    }

    game.start()?;
    Ok(game)
}

/// Everything needed to reproduce a match: the setup plus the full
/// command history. This is the on-disk replay format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub config: GameConfig,
    pub players: [PlayerSetup; 2],
    pub commands: Vec<Command>,
}

impl MatchRecord {
    /// Rebuild the game this record started from. Deterministic, so
    /// replaying `commands` on the result reproduces the match.
    pub fn rebuild(&self) -> Result<Game> {
        init_game(self.config.clone(), self.players.clone())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<MatchRecord> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
