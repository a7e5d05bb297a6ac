//! Snapshot stream integrity
//!
//! A client that applies every delta it receives onto the full state it
//! was first sent must end up holding exactly what a fresh full snapshot
//! would give it. These tests play real games through the processor and
//! keep such a client state per viewer the whole way.

use serde_json::Value;
use similar_asserts::assert_eq;

use chainforge::core::{BlueprintId, GameEvent, PlayerId, PlayerName};
use chainforge::game::{
    apply_state_delta, Command, CommandAction, CommandProcessor, Game, GameConfig,
    InteractionAnswer, SnapshotService, SnapshotUpdate, UpdateKind, VerbosityLevel,
};

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
    game.logger.set_verbosity(VerbosityLevel::Silent);
    let [p0, p1] = game.player_ids();
    for _ in 0..12 {
        game.add_deck_card(p0, &BlueprintId::new("ember_whelp"))
            .unwrap();
        game.add_deck_card(p1, &BlueprintId::new("stone_bulwark"))
            .unwrap();
    }
    game.start().unwrap();
    game
}

/// Fold a batch of updates into per-viewer client state. Full states
/// (recognizable by the always-present `config` field) replace what the
/// client holds; anything else is a delta applied in place.
fn absorb(ids: [PlayerId; 2], held: &mut [Value; 2], updates: &[SnapshotUpdate]) {
    for update in updates {
        assert_eq!(update.kind, UpdateKind::State);
        let idx = (update.viewer == ids[1]) as usize;
        if update.state.get("config").is_some() {
            held[idx] = update.state.clone();
        } else {
            apply_state_delta(&mut held[idx], &update.state).unwrap();
        }
    }
}

/// Submit one command, assert it executed, and fold its updates in.
fn drive(processor: &mut CommandProcessor, held: &mut [Value; 2], command: Command) {
    let ids = processor.game().player_ids();
    let before = processor.history().len();
    let updates = processor.submit(command).unwrap();
    assert_eq!(
        processor.history().len(),
        before + 1,
        "command was rejected"
    );
    absorb(ids, held, &updates);
}

fn entities(state: &Value) -> &serde_json::Map<String, Value> {
    state["entities"].as_object().unwrap()
}

#[test]
fn test_client_state_tracks_a_full_scripted_game() {
    let mut processor = CommandProcessor::new(started_game(50));
    let ids = processor.game().player_ids();
    let [p0, p1] = ids;
    let mut held: [Value; 2] = [Value::Null, Value::Null];

    absorb(ids, &mut held, &processor.sync().unwrap());
    assert!(held[0].get("config").is_some());
    assert!(held[1].get("config").is_some());

    // Ramp to two mana.
    drive(&mut processor, &mut held, Command::new(p0, CommandAction::EndTurn));
    drive(&mut processor, &mut held, Command::new(p1, CommandAction::EndTurn));

    // Summon into a chosen slot, passing the chain through.
    let first_minion = processor.game().board.side(p0).unwrap().hand.peek_top(1)[0];
    drive(
        &mut processor,
        &mut held,
        Command::new(
            p0,
            CommandAction::PlayCard {
                card: first_minion,
                slot: Some(0),
                targets: Vec::new(),
            },
        ),
    );
    drive(&mut processor, &mut held, Command::new(p1, CommandAction::PassChain));
    drive(&mut processor, &mut held, Command::new(p0, CommandAction::PassChain));
    assert_eq!(
        processor.game().board.side(p0).unwrap().slots[0],
        Some(first_minion)
    );

    // Attack the enemy hero through the response window.
    let enemy_hero = processor.game().player(p1).unwrap().hero;
    drive(
        &mut processor,
        &mut held,
        Command::new(p0, CommandAction::DeclareAttacker { attacker: first_minion }),
    );
    drive(
        &mut processor,
        &mut held,
        Command::new(p0, CommandAction::DeclareAttackTarget { target: enemy_hero }),
    );
    drive(&mut processor, &mut held, Command::new(p1, CommandAction::PassChain));
    drive(&mut processor, &mut held, Command::new(p0, CommandAction::PassChain));

    // Another turn cycle, then a play that pauses on slot selection.
    drive(&mut processor, &mut held, Command::new(p0, CommandAction::EndTurn));
    drive(&mut processor, &mut held, Command::new(p1, CommandAction::EndTurn));
    let second_minion = processor.game().board.side(p0).unwrap().hand.peek_top(1)[0];
    drive(
        &mut processor,
        &mut held,
        Command::new(
            p0,
            CommandAction::PlayCard {
                card: second_minion,
                slot: None,
                targets: Vec::new(),
            },
        ),
    );
    assert!(processor.is_suspended());
    drive(
        &mut processor,
        &mut held,
        Command::new(
            p0,
            CommandAction::InteractionCommit {
                answer: InteractionAnswer::Slot { slot: 4 },
            },
        ),
    );
    drive(&mut processor, &mut held, Command::new(p1, CommandAction::PassChain));
    drive(&mut processor, &mut held, Command::new(p0, CommandAction::PassChain));
    assert_eq!(
        processor.game().board.side(p0).unwrap().slots[4],
        Some(second_minion)
    );

    // Every viewer's accumulated state equals a from-scratch snapshot.
    let mut fresh = SnapshotService::new(ids);
    let full = fresh.take_snapshot(processor.game()).unwrap();
    assert_eq!(full.len(), 2);
    for update in &full {
        let idx = (update.viewer == ids[1]) as usize;
        assert_eq!(held[idx], update.state);
    }
}

#[test]
fn test_rejection_resync_keeps_the_client_consistent() {
    let mut processor = CommandProcessor::new(started_game(51));
    let ids = processor.game().player_ids();
    let [p0, p1] = ids;
    let mut held: [Value; 2] = [Value::Null, Value::Null];

    absorb(ids, &mut held, &processor.sync().unwrap());
    drive(&mut processor, &mut held, Command::new(p0, CommandAction::EndTurn));

    // Out-of-turn command: rejected, every viewer is resynced in full.
    let updates = processor
        .submit(Command::new(p0, CommandAction::EndTurn))
        .unwrap();
    assert_eq!(processor.history().len(), 1);
    assert!(updates.iter().all(|u| u.state.get("config").is_some()));
    assert!(updates
        .iter()
        .flat_map(|u| &u.events)
        .any(|e| matches!(e, GameEvent::CommandRejected { .. })));
    absorb(ids, &mut held, &updates);

    // Play continues and the client stays in lockstep.
    drive(&mut processor, &mut held, Command::new(p1, CommandAction::EndTurn));
    let mut fresh = SnapshotService::new(ids);
    for update in &fresh.take_snapshot(processor.game()).unwrap() {
        let idx = (update.viewer == ids[1]) as usize;
        assert_eq!(held[idx], update.state);
    }
}

#[test]
fn test_opponent_hand_stays_redacted_while_own_hand_is_not() {
    let mut processor = CommandProcessor::new(started_game(52));
    let ids = processor.game().player_ids();
    let [p0, p1] = ids;
    let mut held: [Value; 2] = [Value::Null, Value::Null];
    absorb(ids, &mut held, &processor.sync().unwrap());

    let own_hand = processor.game().board.side(p0).unwrap().hand.peek_top(1)[0];
    let their_hand = processor.game().board.side(p1).unwrap().hand.peek_top(1)[0];

    assert!(entities(&held[0]).contains_key(&own_hand.to_string()));
    assert!(!entities(&held[0]).contains_key(&their_hand.to_string()));
    // The other seat sees the mirror image.
    assert!(entities(&held[1]).contains_key(&their_hand.to_string()));
    assert!(!entities(&held[1]).contains_key(&own_hand.to_string()));
}

#[test]
fn test_a_revealed_card_stays_visible_after_rehiding() {
    let mut game = started_game(53);
    let ids = game.player_ids();
    let [p0, p1] = ids;
    let mut service = SnapshotService::new(ids);

    let first = service.take_snapshot(&game).unwrap();
    let mut held = first.iter().find(|u| u.viewer == p0).unwrap().state.clone();

    // A card deep in the opponent's deck is nowhere in p0's view.
    let hidden = game.board.side(p1).unwrap().deck.peek_top(1)[0];
    assert!(!entities(&held).contains_key(&hidden.to_string()));

    // An effect shows it to p0. Only p0's channel has anything new.
    game.events.push(GameEvent::CardRevealed {
        card: hidden,
        to: p0,
    });
    let updates = service.take_snapshot(&game).unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].viewer, p0);
    apply_state_delta(&mut held, &updates[0].state).unwrap();
    assert!(entities(&held).contains_key(&hidden.to_string()));

    // The card is still sitting in the opponent's deck, a hidden zone,
    // yet later updates keep it in view: visibility never shrinks.
    game.draw_card(p0).unwrap();
    for update in &service.take_snapshot(&game).unwrap() {
        if update.viewer == p0 {
            apply_state_delta(&mut held, &update.state).unwrap();
        }
    }
    assert!(game.board.side(p1).unwrap().deck.contains(hidden));
    assert!(entities(&held).contains_key(&hidden.to_string()));
}
