//! Deterministic state hashing for replay verification
//!
//! Serializes the game to JSON, strips fields that do not affect play,
//! and hashes the canonical string. Two games that would behave
//! identically from here on hash equal, which is how replays and
//! simulation cross-checks detect divergence.

use crate::game::state::Game;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Fields excluded from the hash.
///
/// - logger: presentation only, varies with verbosity settings
/// - events: append-only narration; the positional state already
///   captures everything the events describe
/// - next_resume_token: bookkeeping counter for interaction wakeups
const EXCLUDED_FIELDS: &[&str] = &["logger", "events", "next_resume_token"];

/// Compute a deterministic hash of game state.
///
/// Serialization failures are reported on stderr and hash to 0 rather
/// than aborting whatever diagnostic loop asked for the hash.
pub fn compute_state_hash(game: &Game) -> u64 {
    let json_value = match serde_json::to_value(game) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Warning: failed to serialize game state for hashing: {}", e);
            return 0;
        }
    };

    let cleaned = strip_ephemeral(json_value);

    let canonical = match serde_json::to_string(&cleaned) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Warning: failed to canonicalize cleaned state: {}", e);
            return 0;
        }
    };

    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    hasher.finish()
}

/// Recursively strip excluded fields from a JSON value
fn strip_ephemeral(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(mut map) => {
            for field in EXCLUDED_FIELDS {
                map.remove(*field);
            }
            for (_, v) in map.iter_mut() {
                *v = strip_ephemeral(v.clone());
            }
            serde_json::Value::Object(map)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(strip_ephemeral).collect())
        }
        other => other,
    }
}

/// Format a hash for display (first 8 hex digits)
pub fn format_hash(hash: u64) -> String {
    format!("{:08x}", (hash >> 32) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BlueprintId, PlayerName};
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
        for _ in 0..10 {
            game.add_deck_card(p0, &BlueprintId::new("ember_whelp"))
                .unwrap();
            game.add_deck_card(p1, &BlueprintId::new("stone_bulwark"))
                .unwrap();
        }
        game.start().unwrap();
        game
    }

    #[test]
    fn test_strip_ephemeral() {
        let json = serde_json::json!({
            "turn": 5,
            "logger": {"verbosity": "verbose"},
            "events": [{"type": "turn_started"}],
            "next_resume_token": 3,
            "board": {
                "minions": [7, 9]
            }
        });

        let cleaned = strip_ephemeral(json);

        assert_eq!(
            cleaned,
            serde_json::json!({
                "turn": 5,
                "board": {
                    "minions": [7, 9]
                }
            })
        );
    }

    #[test]
    fn test_same_seed_hashes_equal() {
        let a = started_game(42);
        let b = started_game(42);
        assert_eq!(compute_state_hash(&a), compute_state_hash(&b));
    }

    #[test]
    fn test_gameplay_change_alters_hash() {
        let a = started_game(42);
        let mut b = started_game(42);
        let [p0, _] = b.player_ids();
        b.draw_card(p0).unwrap();
        assert_ne!(compute_state_hash(&a), compute_state_hash(&b));
    }

    #[test]
    fn test_event_log_does_not_affect_hash() {
        let a = started_game(42);
        let mut b = started_game(42);
        b.events.push(crate::core::GameEvent::ChainOpened);
        assert_eq!(compute_state_hash(&a), compute_state_hash(&b));
    }
}
