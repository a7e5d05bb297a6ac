//! Deck lists and game setup

pub mod deck;
pub mod game_init;

pub use deck::{DeckEntry, DeckList, DeckLoader};
pub use game_init::{init_game, MatchRecord, PlayerSetup};
