//! Combat scenarios
//!
//! Attacks travel through the same chain as spells: declare, lock a
//! target, give both players a response window, then trade damage when
//! the chain empties.

use chainforge::core::{BlueprintId, CardId, CardKind, GameEvent, PlayerId, PlayerName, TargetRef};
use chainforge::game::{Game, GameConfig, PhaseKind, VerbosityLevel};

fn game_with(seed: u64, hero_hp: i32) -> Game {
    let mut game = Game::new(
        GameConfig {
            seed,
            hero_hp,
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

fn new_game(seed: u64) -> Game {
    game_with(seed, GameConfig::default().hero_hp)
}

/// Instantiate `blueprint` straight onto `player`'s board in `slot`
fn put_on_board(game: &mut Game, player: PlayerId, blueprint: &str, slot: u8) -> CardId {
    let id = game
        .add_deck_card(player, &BlueprintId::new(blueprint))
        .unwrap();
    let side = game.board.side_mut(player).unwrap();
    side.deck.remove(id);
    side.place_minion(slot, id).unwrap();
    id
}

fn put_in_hand(game: &mut Game, player: PlayerId, blueprint: &str) -> CardId {
    let id = game
        .add_deck_card(player, &BlueprintId::new(blueprint))
        .unwrap();
    let side = game.board.side_mut(player).unwrap();
    side.deck.remove(id);
    side.hand.push_top(id);
    id
}

fn give_mana(game: &mut Game, player: PlayerId, mana: u8) {
    game.player_mut(player).unwrap().mana = mana;
}

fn hp_of(game: &Game, card: CardId) -> i32 {
    match game.cards.get(card).unwrap().kind {
        CardKind::Minion { hp, .. } | CardKind::Hero { hp, .. } => hp,
        _ => unreachable!("card has no hit points"),
    }
}

#[test]
fn test_attack_on_hero_resolves_through_the_chain() {
    let mut game = game_with(11, 10);
    let [p0, p1] = game.player_ids();
    let whelp = put_on_board(&mut game, p0, "ember_whelp", 0);
    let enemy_hero = game.player(p1).unwrap().hero;
    assert_eq!(hp_of(&game, enemy_hero), 10);

    game.declare_attacker(p0, whelp).unwrap();
    assert_eq!(game.phase.kind(), PhaseKind::Attack);

    game.declare_attack_target(p0, enemy_hero).unwrap();
    assert!(game.cards.get(whelp).unwrap().exhausted);

    // The defender gets the response window first.
    let chain = game.chain.as_ref().unwrap();
    assert_eq!(chain.priority(), p1);
    assert_eq!(hp_of(&game, enemy_hero), 10);

    game.pass_chain(p1).unwrap();
    game.pass_chain(p0).unwrap();

    assert_eq!(hp_of(&game, enemy_hero), 8);
    // Heroes have no power; the attacker walks away untouched.
    assert_eq!(hp_of(&game, whelp), 2);
    assert_eq!(game.phase.kind(), PhaseKind::Main);
    assert!(game.chain.is_none());
}

#[test]
fn test_retaliation_trades_damage_both_ways() {
    let mut game = new_game(12);
    let [p0, p1] = game.player_ids();
    let whelp = put_on_board(&mut game, p0, "ember_whelp", 0);
    let bulwark = put_on_board(&mut game, p1, "stone_bulwark", 0);

    game.declare_attacker(p0, whelp).unwrap();
    game.declare_attack_target(p0, bulwark).unwrap();
    game.pass_chain(p1).unwrap();
    game.pass_chain(p0).unwrap();

    // 2 power into a 5-hp wall, 1 power back.
    assert_eq!(hp_of(&game, bulwark), 3);
    assert_eq!(hp_of(&game, whelp), 1);
    assert!(game.board.side(p0).unwrap().slots[0] == Some(whelp));
    assert!(game.board.side(p1).unwrap().slots[0] == Some(bulwark));
}

#[test]
fn test_preemptive_defender_strikes_first() {
    let mut game = new_game(13);
    let [p0, p1] = game.player_ids();
    let attacker = put_on_board(&mut game, p0, "ember_whelp", 0);
    let defender = put_on_board(&mut game, p1, "ember_whelp", 0);
    let stance = put_in_hand(&mut game, p1, "counter_stance");
    give_mana(&mut game, p1, 1);

    game.declare_attacker(p0, attacker).unwrap();
    game.declare_attack_target(p0, defender).unwrap();

    // Maneuvers are legal responses while the attack chain builds.
    game.add_response(p1, stance, vec![]).unwrap();
    game.pass_chain(p0).unwrap();
    game.pass_chain(p1).unwrap();

    // The stance resolves before combat: the defender strikes first,
    // kills the 2-hp attacker, and takes nothing back.
    assert!(game.board.side(p0).unwrap().discard.contains(attacker));
    assert_eq!(hp_of(&game, defender), 2);
    assert!(game.board.side(p1).unwrap().slots[0] == Some(defender));
}

#[test]
fn test_flanking_strike_boosts_the_blow_then_expires() {
    let mut game = new_game(14);
    let [p0, p1] = game.player_ids();
    let whelp = put_on_board(&mut game, p0, "ember_whelp", 0);
    let strike = put_in_hand(&mut game, p0, "flanking_strike");
    give_mana(&mut game, p0, 1);
    let enemy_hero = game.player(p1).unwrap().hero;
    let hp_before = hp_of(&game, enemy_hero);

    game.declare_attacker(p0, whelp).unwrap();
    game.declare_attack_target(p0, enemy_hero).unwrap();
    game.pass_chain(p1).unwrap();

    game.add_response(p0, strike, vec![]).unwrap();
    game.pass_chain(p1).unwrap();
    game.pass_chain(p0).unwrap();

    assert_eq!(hp_of(&game, enemy_hero), hp_before - 4);
    // The +2 lasted until end of combat only.
    assert_eq!(game.effective_power(whelp).unwrap(), 2);
    assert!(game.board.side(p0).unwrap().discard.contains(strike));
}

#[test]
fn test_maneuver_is_not_a_main_phase_play() {
    let mut game = new_game(15);
    let [p0, _p1] = game.player_ids();
    let strike = put_in_hand(&mut game, p0, "flanking_strike");
    give_mana(&mut game, p0, 1);

    let err = game.begin_play_card(p0, strike, None, vec![]).unwrap_err();
    assert!(err.to_string().contains("responses to combat"));
}

#[test]
fn test_cancel_attack_leaves_no_trace() {
    let mut game = new_game(16);
    let [p0, p1] = game.player_ids();
    let whelp = put_on_board(&mut game, p0, "ember_whelp", 0);
    let enemy_hero = game.player(p1).unwrap().hero;
    let hp_before = hp_of(&game, enemy_hero);

    game.declare_attacker(p0, whelp).unwrap();
    game.cancel_attack(p0).unwrap();

    assert_eq!(game.phase.kind(), PhaseKind::Main);
    assert_eq!(hp_of(&game, enemy_hero), hp_before);
    // No target was locked, so the attacker never exhausted.
    assert!(!game.cards.get(whelp).unwrap().exhausted);
    assert!(game
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::AttackCancelled)));

    // The attack can be redeclared cleanly.
    game.declare_attacker(p0, whelp).unwrap();
    assert_eq!(game.phase.kind(), PhaseKind::Attack);
}

#[test]
fn test_exhausted_attacker_is_rejected() {
    let mut game = new_game(17);
    let [p0, p1] = game.player_ids();
    let tired = put_on_board(&mut game, p0, "ember_whelp", 0);
    let fresh = put_on_board(&mut game, p0, "ember_whelp", 1);
    game.cards.get_mut(tired).unwrap().exhaust();

    let err = game.declare_attacker(p0, tired).unwrap_err();
    assert!(err.to_string().contains("exhausted"));

    // The failed declaration already entered the attack phase; a fresh
    // minion can still step up, or the attack can be cancelled.
    assert_eq!(game.phase.kind(), PhaseKind::Attack);
    game.declare_attacker(p0, fresh).unwrap();
    let enemy_hero = game.player(p1).unwrap().hero;
    game.declare_attack_target(p0, enemy_hero).unwrap();
}

#[test]
fn test_own_cards_are_not_attack_targets() {
    let mut game = new_game(18);
    let [p0, _p1] = game.player_ids();
    let whelp = put_on_board(&mut game, p0, "ember_whelp", 0);
    let own_bulwark = put_on_board(&mut game, p0, "stone_bulwark", 1);

    game.declare_attacker(p0, whelp).unwrap();
    let err = game.declare_attack_target(p0, own_bulwark).unwrap_err();
    assert!(err.to_string().contains("your own"));
}

#[test]
fn test_warding_sigil_weakens_the_attacker() {
    let mut game = new_game(19);
    let [p0, p1] = game.player_ids();
    let whelp = put_on_board(&mut game, p0, "ember_whelp", 0);

    // A sigil sits in p1's support row, watching for enemy attacks.
    let sigil = game
        .add_deck_card(p1, &BlueprintId::new("warding_sigil"))
        .unwrap();
    let side = game.board.side_mut(p1).unwrap();
    side.deck.remove(sigil);
    side.support.push(sigil);

    game.declare_attacker(p0, whelp).unwrap();

    // The sigil reaction opened its own chain before a target is picked.
    assert!(game.chain.is_some());
    game.pass_chain(p0).unwrap();
    game.pass_chain(p1).unwrap();
    assert!(game.chain.is_none());
    assert_eq!(game.effective_power(whelp).unwrap(), 1);

    let enemy_hero = game.player(p1).unwrap().hero;
    let hp_before = hp_of(&game, enemy_hero);
    game.declare_attack_target(p0, enemy_hero).unwrap();
    game.pass_chain(p1).unwrap();
    game.pass_chain(p0).unwrap();

    assert_eq!(hp_of(&game, enemy_hero), hp_before - 1);
    // The penalty expired with the combat.
    assert_eq!(game.effective_power(whelp).unwrap(), 2);
}

#[test]
fn test_combat_fizzles_when_the_defender_dies_on_the_chain() {
    let mut game = new_game(20);
    let [p0, p1] = game.player_ids();
    let attacker = put_on_board(&mut game, p0, "ember_whelp", 0);
    let defender = put_on_board(&mut game, p1, "ember_whelp", 0);
    let bolt = put_in_hand(&mut game, p0, "bolt_of_cinders");
    give_mana(&mut game, p0, 2);

    game.declare_attacker(p0, attacker).unwrap();
    game.declare_attack_target(p0, defender).unwrap();
    game.pass_chain(p1).unwrap();

    // Burn the defender out from under the attack.
    game.add_response(p0, bolt, vec![TargetRef::card(defender)])
        .unwrap();
    game.pass_chain(p1).unwrap();
    game.pass_chain(p0).unwrap();

    assert!(game.board.side(p1).unwrap().discard.contains(defender));
    // No combat damage landed; the attack was called off.
    assert_eq!(hp_of(&game, attacker), 2);
    assert!(game
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::AttackCancelled)));
    assert_eq!(game.phase.kind(), PhaseKind::Main);
}

#[test]
fn test_lethal_attack_ends_the_game() {
    let mut game = game_with(21, 2);
    let [p0, p1] = game.player_ids();
    let whelp = put_on_board(&mut game, p0, "ember_whelp", 0);
    let enemy_hero = game.player(p1).unwrap().hero;

    game.declare_attacker(p0, whelp).unwrap();
    game.declare_attack_target(p0, enemy_hero).unwrap();
    game.pass_chain(p1).unwrap();
    game.pass_chain(p0).unwrap();

    assert!(game.is_over());
    assert_eq!(game.winner(), Some(p0));
    assert!(game
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::HeroDied { player } if *player == p1)));
    assert_eq!(game.phase.kind(), PhaseKind::GameEnd);
}
