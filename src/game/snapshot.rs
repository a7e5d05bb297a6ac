//! Per-viewer state sync
//!
//! After every quiescent point the processor asks this service to look at
//! the game and produce updates for each connected viewer. A viewer's
//! first update carries the full redacted state; later updates carry only
//! patches against whatever that viewer was last sent. Hidden zones are
//! redacted per viewer: an opponent-owned card in deck or hand is omitted
//! from the entity dictionary until an event legitimately reveals it, and
//! once revealed it stays visible for the rest of the game even if it
//! goes back into hiding.
//!
//! Updates are never produced mid-command. The processor calls
//! [`SnapshotService::take_snapshot`] only once the queue has drained or
//! the game has suspended, so the service always reads settled state.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::core::{Card, CardId, GameEvent, PlayerId};
use crate::game::command::Command;
use crate::game::diff::{self, Patch};
use crate::game::state::Game;
use crate::{EngineError, Result};

/// State fields sent whole-value in a delta when they change
const TOP_LEVEL_FIELDS: [&str; 7] = [
    "config",
    "turn_count",
    "current_player",
    "phase",
    "interaction",
    "board",
    "effect_chain",
];

/// Opponent-owned card ids a viewer has legitimately observed. Grows for
/// the life of the game and never shrinks, so a revealed card that
/// returns to a hidden zone stays identified.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisibilitySet {
    seen: BTreeSet<CardId>,
}

impl VisibilitySet {
    pub fn new() -> Self {
        VisibilitySet::default()
    }

    pub fn observe(&mut self, card: CardId) {
        self.seen.insert(card);
    }

    pub fn contains(&self, card: CardId) -> bool {
        self.seen.contains(&card)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    State,
    Error,
}

/// One message to one viewer. `state` is the full redacted state on the
/// viewer's first update and a delta object afterwards; an empty delta
/// with events means nothing structural changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotUpdate {
    pub id: u64,
    pub kind: UpdateKind,
    pub viewer: PlayerId,
    pub events: Vec<GameEvent>,
    pub state: Value,
}

/// What the service remembers about one viewer between snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ViewerChannel {
    viewer: PlayerId,
    visibility: VisibilitySet,
    /// Redacted state as of the last update sent; diff base for the next
    last_state: Option<Value>,
    /// How far into the game's event log this viewer has been brought
    event_cursor: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotService {
    next_id: u64,
    channels: Vec<ViewerChannel>,
}

impl SnapshotService {
    pub fn new(viewers: [PlayerId; 2]) -> Self {
        SnapshotService {
            next_id: 1,
            channels: viewers
                .into_iter()
                .map(|viewer| ViewerChannel {
                    viewer,
                    visibility: VisibilitySet::new(),
                    last_state: None,
                    event_cursor: 0,
                })
                .collect(),
        }
    }

    /// Id of the most recently emitted snapshot; 0 before the first
    pub fn last_id(&self) -> u64 {
        self.next_id - 1
    }

    pub fn visibility(&self, viewer: PlayerId) -> Option<&VisibilitySet> {
        self.channels
            .iter()
            .find(|c| c.viewer == viewer)
            .map(|c| &c.visibility)
    }

    /// Capture the game at a quiescent point. Returns one update per
    /// viewer whose view changed or who has undelivered events; all
    /// updates from one capture share a snapshot id.
    pub fn take_snapshot(&mut self, game: &Game) -> Result<Vec<SnapshotUpdate>> {
        // Visibility first: reveals in this batch of events decide what
        // the views built below may contain.
        let mut staged_events: Vec<Vec<GameEvent>> = Vec::with_capacity(self.channels.len());
        for channel in &mut self.channels {
            let mut delivered = Vec::new();
            for event in &game.events[channel.event_cursor..] {
                if let Some(card) = event.reveals_to(channel.viewer) {
                    let opponent_owned = game
                        .cards
                        .get(card)
                        .map(|c| c.owner != channel.viewer)
                        .unwrap_or(false);
                    if opponent_owned {
                        channel.visibility.observe(card);
                    }
                }
                if let Some(redacted) = event.redacted_for(channel.viewer) {
                    delivered.push(redacted);
                }
            }
            channel.event_cursor = game.events.len();
            staged_events.push(delivered);
        }

        let id = self.next_id;
        let mut updates = Vec::new();
        for (channel, events) in self.channels.iter_mut().zip(staged_events) {
            let view = build_view(game, channel.viewer, &channel.visibility)?;
            let unchanged = channel.last_state.as_ref() == Some(&view);
            if unchanged && events.is_empty() {
                continue;
            }
            let state = match &channel.last_state {
                None => view.clone(),
                Some(prev) => build_delta(prev, &view)?,
            };
            channel.last_state = Some(view);
            updates.push(SnapshotUpdate {
                id,
                kind: UpdateKind::State,
                viewer: channel.viewer,
                events,
                state,
            });
        }
        if !updates.is_empty() {
            self.next_id += 1;
        }
        Ok(updates)
    }

    /// Drop every viewer's diff base so the next capture goes out in
    /// full. Called after a rejected command so clients resync from
    /// scratch instead of trusting a possibly stale base.
    pub fn force_full(&mut self) {
        for channel in &mut self.channels {
            channel.last_state = None;
        }
    }

    /// One-shot failure notice to every viewer. The game instance is not
    /// expected to continue after this.
    pub fn emit_error(&mut self, message: &str) -> Vec<SnapshotUpdate> {
        let id = self.next_id;
        self.next_id += 1;
        self.channels
            .iter()
            .map(|channel| SnapshotUpdate {
                id,
                kind: UpdateKind::Error,
                viewer: channel.viewer,
                events: Vec::new(),
                state: json!({ "message": message }),
            })
            .collect()
    }
}

/// Serialize the game as one viewer is allowed to see it
fn build_view(game: &Game, viewer: PlayerId, visibility: &VisibilitySet) -> Result<Value> {
    let mut entities = Map::new();
    for player in &game.players {
        entities.insert(player.id.to_string(), serde_json::to_value(player)?);
    }
    for card_id in game.cards.ids_sorted() {
        let card = game.cards.get(card_id)?;
        if card_visible(game, viewer, visibility, card) {
            entities.insert(card_id.to_string(), serde_json::to_value(card)?);
        }
    }
    for modifier_id in game.modifiers.ids_sorted() {
        let modifier = game.modifiers.get(modifier_id)?;
        let host_visible = game
            .cards
            .get(modifier.host)
            .map(|host| card_visible(game, viewer, visibility, host))
            .unwrap_or(false);
        if host_visible {
            entities.insert(modifier_id.to_string(), serde_json::to_value(modifier)?);
        }
    }

    Ok(json!({
        "config": game.config,
        "turn_count": game.turn.turn_number,
        "current_player": game.turn.active_player,
        "phase": game.phase,
        "interaction": game.interaction,
        "board": game.board,
        "effect_chain": game.chain,
        "entities": entities,
    }))
}

/// Own cards are always visible. Opponent cards are visible on the
/// board and in the discard and banish piles, or once observed.
fn card_visible(game: &Game, viewer: PlayerId, visibility: &VisibilitySet, card: &Card) -> bool {
    if card.owner == viewer {
        return true;
    }
    match game.zone_of(card.id) {
        Some((_, zone)) if zone.is_public() => true,
        _ => visibility.contains(card.id),
    }
}

/// Delta between two consecutive views for the same viewer. Top-level
/// fields go whole-value; the entity dictionary gets per-entity patch
/// lists, full bodies for newly observed entities, and explicit removal
/// ids for entities that left the view.
fn build_delta(prev: &Value, next: &Value) -> Result<Value> {
    let prev = state_object(prev)?;
    let next = state_object(next)?;

    let mut state = Map::new();
    for key in TOP_LEVEL_FIELDS {
        if prev.get(key) != next.get(key) {
            state.insert(
                key.to_string(),
                next.get(key).cloned().unwrap_or(Value::Null),
            );
        }
    }

    let prev_entities = entity_map(prev)?;
    let next_entities = entity_map(next)?;
    let mut changes = Map::new();
    let mut added: Vec<String> = Vec::new();
    let mut removed: Vec<String> = Vec::new();

    for (id, next_entity) in next_entities {
        match prev_entities.get(id) {
            None => {
                added.push(id.clone());
                changes.insert(id.clone(), next_entity.clone());
            }
            Some(prev_entity) if prev_entity == next_entity => {}
            Some(prev_entity) => {
                let patches = diff::diff_entity(prev_entity, next_entity);
                changes.insert(id.clone(), serde_json::to_value(&patches)?);
            }
        }
    }
    for id in prev_entities.keys() {
        if !next_entities.contains_key(id) {
            removed.push(id.clone());
        }
    }

    if !changes.is_empty() {
        state.insert("entities".to_string(), Value::Object(changes));
    }
    if !added.is_empty() {
        state.insert("added_entities".to_string(), json!(added));
    }
    if !removed.is_empty() {
        state.insert("removed_entities".to_string(), json!(removed));
    }
    Ok(Value::Object(state))
}

/// Client-side application of a delta update onto the previously held
/// full state. The tests and the replay viewer use this to prove that
/// diffs reconstruct exactly what a fresh full snapshot would contain.
pub fn apply_state_delta(full: &mut Value, delta: &Value) -> Result<()> {
    let delta = delta
        .as_object()
        .ok_or_else(|| EngineError::CorruptState("delta is not an object".to_string()))?;
    let full = full
        .as_object_mut()
        .ok_or_else(|| EngineError::CorruptState("state is not an object".to_string()))?;

    for key in TOP_LEVEL_FIELDS {
        if let Some(value) = delta.get(key) {
            full.insert(key.to_string(), value.clone());
        }
    }

    let entities = full
        .get_mut("entities")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| EngineError::CorruptState("state has no entity dictionary".to_string()))?;

    if let Some(removed) = delta.get("removed_entities").and_then(Value::as_array) {
        for id in removed {
            let id = id
                .as_str()
                .ok_or_else(|| EngineError::CorruptState("non-string entity id".to_string()))?;
            if entities.remove(id).is_none() {
                return Err(EngineError::CorruptState(format!(
                    "removal of unknown entity {id}"
                )));
            }
        }
    }

    if let Some(changes) = delta.get("entities").and_then(Value::as_object) {
        for (id, change) in changes {
            match change {
                Value::Array(_) => {
                    let patches: Vec<Patch> = serde_json::from_value(change.clone())?;
                    let entity = entities.get_mut(id).ok_or_else(|| {
                        EngineError::CorruptState(format!("patches for unknown entity {id}"))
                    })?;
                    diff::apply_patches(entity, &patches)?;
                }
                _ => {
                    entities.insert(id.clone(), change.clone());
                }
            }
        }
    }
    Ok(())
}

fn state_object(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| EngineError::CorruptState("state is not an object".to_string()))
}

fn entity_map(state: &Map<String, Value>) -> Result<&Map<String, Value>> {
    state
        .get("entities")
        .and_then(Value::as_object)
        .ok_or_else(|| EngineError::CorruptState("state has no entity dictionary".to_string()))
}

/// Everything needed to debug a dead game instance offline: the full
/// unredacted state, the command that was executing, and what went wrong.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugDump {
    pub message: String,
    pub pending_command: Option<Command>,
    pub game: Value,
}

impl DebugDump {
    pub fn capture(game: &Game, pending: Option<&Command>, message: &str) -> Result<Self> {
        Ok(DebugDump {
            message: message.to_string(),
            pending_command: pending.cloned(),
            game: serde_json::to_value(game)?,
        })
    }

    /// Save this dump to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Load a dump from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BlueprintId, PlayerName};
    use crate::game::state::GameConfig;

    fn demo_game() -> Game {
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
        for _ in 0..8 {
            game.add_deck_card(p0, &BlueprintId::new("ember_whelp"))
                .unwrap();
            game.add_deck_card(p1, &BlueprintId::new("stone_bulwark"))
                .unwrap();
        }
        game.start().unwrap();
        game
    }

    #[test]
    fn test_first_update_is_full_state() {
        let game = demo_game();
        let mut service = SnapshotService::new(game.player_ids());

        let updates = service.take_snapshot(&game).unwrap();
        assert_eq!(updates.len(), 2);
        for update in &updates {
            assert_eq!(update.id, 1);
            assert_eq!(update.kind, UpdateKind::State);
            assert!(update.state.get("entities").is_some());
            assert!(update.state.get("config").is_some());
            assert!(!update.events.is_empty());
        }
    }

    #[test]
    fn test_unchanged_state_is_skipped() {
        let game = demo_game();
        let mut service = SnapshotService::new(game.player_ids());

        service.take_snapshot(&game).unwrap();
        let again = service.take_snapshot(&game).unwrap();
        assert!(again.is_empty());
        assert_eq!(service.last_id(), 1);
    }

    #[test]
    fn test_snapshot_ids_are_monotonic() {
        let mut game = demo_game();
        let mut service = SnapshotService::new(game.player_ids());
        let [p0, _] = game.player_ids();

        let first = service.take_snapshot(&game).unwrap();
        game.draw_card(p0).unwrap();
        let second = service.take_snapshot(&game).unwrap();

        assert_eq!(first[0].id, 1);
        assert!(!second.is_empty());
        assert_eq!(second[0].id, 2);
    }

    #[test]
    fn test_opponent_deck_is_redacted() {
        let game = demo_game();
        let mut service = SnapshotService::new(game.player_ids());
        let [p0, p1] = game.player_ids();

        let updates = service.take_snapshot(&game).unwrap();
        let view_of_p0 = updates.iter().find(|u| u.viewer == p0).unwrap();
        let entities = view_of_p0.state["entities"].as_object().unwrap();

        let deck_card = game.board.side(p1).unwrap().deck.peek_top(1)[0];
        assert!(
            !entities.contains_key(&deck_card.to_string()),
            "opponent deck card should be redacted"
        );
        let own_hand_card = game.board.side(p0).unwrap().hand.peek_top(1)[0];
        assert!(entities.contains_key(&own_hand_card.to_string()));
        // Both heroes sit on the board, which is public.
        assert!(entities.contains_key(&game.player(p1).unwrap().hero.to_string()));
    }

    #[test]
    fn test_delta_applies_onto_previous_state() {
        let mut game = demo_game();
        let mut service = SnapshotService::new(game.player_ids());
        let [p0, _] = game.player_ids();

        let first = service.take_snapshot(&game).unwrap();
        let mut held: Value = first.iter().find(|u| u.viewer == p0).unwrap().state.clone();

        game.draw_card(p0).unwrap();
        let second = service.take_snapshot(&game).unwrap();
        let delta = &second.iter().find(|u| u.viewer == p0).unwrap().state;

        apply_state_delta(&mut held, delta).unwrap();
        let fresh = super::build_view(&game, p0, service.visibility(p0).unwrap()).unwrap();
        assert_eq!(held, fresh);
    }

    #[test]
    fn test_resync_after_force_full() {
        let game = demo_game();
        let mut service = SnapshotService::new(game.player_ids());

        service.take_snapshot(&game).unwrap();
        service.force_full();
        let resync = service.take_snapshot(&game).unwrap();
        assert_eq!(resync.len(), 2);
        for update in &resync {
            assert!(update.state.get("config").is_some(), "resync should be full");
            assert!(update.events.is_empty(), "events were already delivered");
        }
    }

    #[test]
    fn test_error_update_shape() {
        let game = demo_game();
        let mut service = SnapshotService::new(game.player_ids());

        let updates = service.emit_error("engine corrupted");
        assert_eq!(updates.len(), 2);
        for update in updates {
            assert_eq!(update.kind, UpdateKind::Error);
            assert_eq!(update.state["message"], "engine corrupted");
        }
    }

    #[test]
    fn test_debug_dump_round_trips_through_disk() {
        let game = demo_game();
        let dump = DebugDump::capture(&game, None, "boom").unwrap();

        let dir = std::env::temp_dir().join("chainforge_dump_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dump.json");
        dump.save_to_file(&path).unwrap();
        let loaded = DebugDump::load_from_file(&path).unwrap();
        assert_eq!(loaded.message, "boom");
        assert_eq!(loaded.game, dump.game);
        std::fs::remove_file(&path).ok();
    }
}
