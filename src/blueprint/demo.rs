//! The built-in card set
//!
//! A small set exercising every engine mechanism: vanilla minions, targeted
//! and staged spells, a yes/no bargain, a reactive sigil, combat maneuvers,
//! a counterspell and a persistent artifact. Deck files reference these by
//! blueprint ID.

use crate::blueprint::{Blueprint, BlueprintRegistry, EffectContext, Flow};
use crate::core::{
    Affinity, BlueprintId, Card, CardKind, Expiry, GameEvent, ModifierEffect, PlayerId, TargetFilter,
    TargetRef, TargetSpec,
};
use crate::game::interaction::{
    ChoosingAffinity, ChoosingCards, InteractionAnswer, InteractionContext, Question,
    RearrangingCards,
};
use crate::game::state::Game;
use crate::{EngineError, Result};
use smallvec::{smallvec, SmallVec};

pub fn register_all(registry: &mut BlueprintRegistry) {
    registry.register(Box::new(Hero {
        id: "pyre_warden",
        name: "Pyre Warden",
        affinity: Affinity::Ember,
    }));
    registry.register(Box::new(Hero {
        id: "tide_caller",
        name: "Tide Caller",
        affinity: Affinity::Tide,
    }));
    registry.register(Box::new(Minion {
        id: "ember_whelp",
        name: "Ember Whelp",
        affinity: Affinity::Ember,
        cost: 2,
        power: 2,
        hp: 2,
    }));
    registry.register(Box::new(Minion {
        id: "stone_bulwark",
        name: "Stone Bulwark",
        affinity: Affinity::Stone,
        cost: 3,
        power: 1,
        hp: 5,
    }));
    registry.register(Box::new(BoltOfCinders));
    registry.register(Box::new(ScryTheDepths));
    registry.register(Box::new(RiteOfAttunement));
    registry.register(Box::new(VoidBargain));
    registry.register(Box::new(WardingSigil));
    registry.register(Box::new(FlankingStrike));
    registry.register(Box::new(CounterStance));
    registry.register(Box::new(Dissipate));
    registry.register(Box::new(PhantomEdge));
}

fn wrong_stage(name: &str, stage: u8) -> EngineError {
    EngineError::CorruptState(format!("{} has no stage {}", name, stage))
}

fn expect_bool(ctx: &EffectContext) -> Result<bool> {
    match ctx.answer {
        Some(InteractionAnswer::Bool { value }) => Ok(value),
        _ => Err(EngineError::CorruptState(
            "expected a yes/no answer".to_string(),
        )),
    }
}

fn expect_affinity(ctx: &EffectContext) -> Result<Affinity> {
    match ctx.answer {
        Some(InteractionAnswer::Affinity { affinity }) => Ok(affinity),
        _ => Err(EngineError::CorruptState(
            "expected an affinity answer".to_string(),
        )),
    }
}

fn expect_indices(ctx: &EffectContext) -> Result<&[usize]> {
    match &ctx.answer {
        Some(InteractionAnswer::CardIndices { indices }) => Ok(indices),
        _ => Err(EngineError::CorruptState(
            "expected card indices".to_string(),
        )),
    }
}

fn expect_order(ctx: &EffectContext) -> Result<&[usize]> {
    match &ctx.answer {
        Some(InteractionAnswer::Arrangement { order }) => Ok(order),
        _ => Err(EngineError::CorruptState(
            "expected an arrangement".to_string(),
        )),
    }
}

// ----------------------------------------------------------------------
// Heroes and vanilla minions
// ----------------------------------------------------------------------

struct Hero {
    id: &'static str,
    name: &'static str,
    affinity: Affinity,
}

impl Blueprint for Hero {
    fn id(&self) -> BlueprintId {
        BlueprintId::new(self.id)
    }

    fn display_name(&self) -> &str {
        self.name
    }

    fn cost(&self) -> u8 {
        0
    }

    fn affinity(&self) -> Affinity {
        self.affinity
    }

    fn kind(&self) -> CardKind {
        // Starting hit points get overridden by the game config
        CardKind::Hero {
            power: 0,
            hp: 25,
            max_hp: 25,
        }
    }

    fn can_play(&self, _game: &Game, _player: PlayerId) -> Result<()> {
        Err(EngineError::Rule("heroes cannot be played".to_string()))
    }
}

struct Minion {
    id: &'static str,
    name: &'static str,
    affinity: Affinity,
    cost: u8,
    power: i32,
    hp: i32,
}

impl Blueprint for Minion {
    fn id(&self) -> BlueprintId {
        BlueprintId::new(self.id)
    }

    fn display_name(&self) -> &str {
        self.name
    }

    fn cost(&self) -> u8 {
        self.cost
    }

    fn affinity(&self) -> Affinity {
        self.affinity
    }

    fn kind(&self) -> CardKind {
        CardKind::Minion {
            power: self.power,
            hp: self.hp,
            max_hp: self.hp,
        }
    }
}

// ----------------------------------------------------------------------
// Spells
// ----------------------------------------------------------------------

/// Fast spell: deal 2 damage to any minion or hero
struct BoltOfCinders;

impl Blueprint for BoltOfCinders {
    fn id(&self) -> BlueprintId {
        BlueprintId::new("bolt_of_cinders")
    }

    fn display_name(&self) -> &str {
        "Bolt of Cinders"
    }

    fn cost(&self) -> u8 {
        2
    }

    fn affinity(&self) -> Affinity {
        Affinity::Ember
    }

    fn kind(&self) -> CardKind {
        CardKind::Spell { fast: true }
    }

    fn pre_response_targets(&self) -> TargetSpec {
        TargetSpec::single(TargetFilter::Any)
    }

    fn on_play(&self, game: &mut Game, ctx: &EffectContext) -> Result<Flow> {
        // Target may have left the board while responses resolved; the
        // bolt fizzles rather than erroring
        if let Some(target) = ctx.target_card() {
            if game.is_on_board(target) {
                game.deal_damage(ctx.effect.source, target, 2)?;
            }
        }
        Ok(Flow::Continue)
    }
}

/// Look at the top three cards of your deck. Put one into your hand and
/// the rest on the bottom in any order.
struct ScryTheDepths;

impl ScryTheDepths {
    const LOOK_AT: usize = 3;
}

impl Blueprint for ScryTheDepths {
    fn id(&self) -> BlueprintId {
        BlueprintId::new("scry_the_depths")
    }

    fn display_name(&self) -> &str {
        "Scry the Depths"
    }

    fn cost(&self) -> u8 {
        2
    }

    fn affinity(&self) -> Affinity {
        Affinity::Tide
    }

    fn kind(&self) -> CardKind {
        CardKind::Spell { fast: false }
    }

    fn on_play(&self, game: &mut Game, ctx: &EffectContext) -> Result<Flow> {
        let player = ctx.effect.controller;
        match ctx.stage {
            0 => {
                let shown = game.board.side(player)?.deck.peek_top(Self::LOOK_AT);
                if shown.is_empty() {
                    return Ok(Flow::Continue);
                }
                game.request_decision(InteractionContext::ChoosingCards(ChoosingCards {
                    player,
                    prompt: "Put one card into your hand".to_string(),
                    options: shown,
                    min: 1,
                    max: 1,
                    fallback: InteractionAnswer::CardIndices { indices: vec![0] },
                }))?;
                Ok(Flow::Suspend { next_stage: 1 })
            }
            1 => {
                // The deck is untouched while the game waits, so the top
                // of the deck is still the option list the player saw
                let shown = game.board.side(player)?.deck.peek_top(Self::LOOK_AT);
                let index = *expect_indices(ctx)?.first().ok_or_else(|| {
                    EngineError::CorruptState("card choice committed empty".to_string())
                })?;
                let chosen = *shown.get(index).ok_or_else(|| {
                    EngineError::CorruptState("card choice index out of range".to_string())
                })?;
                game.board.side_mut(player)?.deck.remove(chosen);
                game.board.side_mut(player)?.hand.push_top(chosen);
                game.emit(GameEvent::CardDrawn {
                    player,
                    card: Some(chosen),
                });

                let rest = game.board.side(player)?.deck.peek_top(Self::LOOK_AT - 1);
                match rest.len() {
                    0 => Ok(Flow::Continue),
                    1 => {
                        game.board.side_mut(player)?.deck.remove(rest[0]);
                        game.board.side_mut(player)?.deck.push_bottom(rest[0]);
                        Ok(Flow::Continue)
                    }
                    n => {
                        game.request_decision(InteractionContext::RearrangingCards(
                            RearrangingCards {
                                player,
                                prompt: "Put the rest on the bottom of your deck".to_string(),
                                cards: rest,
                                fallback: InteractionAnswer::Arrangement {
                                    order: (0..n).collect(),
                                },
                            },
                        ))?;
                        Ok(Flow::Suspend { next_stage: 2 })
                    }
                }
            }
            2 => {
                let shown = game.board.side(player)?.deck.peek_top(Self::LOOK_AT - 1);
                // The last card listed ends up bottom-most
                for &index in expect_order(ctx)? {
                    let card = *shown.get(index).ok_or_else(|| {
                        EngineError::CorruptState("arrangement index out of range".to_string())
                    })?;
                    game.board.side_mut(player)?.deck.remove(card);
                    game.board.side_mut(player)?.deck.push_bottom(card);
                }
                Ok(Flow::Continue)
            }
            stage => Err(wrong_stage("Scry the Depths", stage)),
        }
    }
}

/// Choose an affinity; the rite resolves differently for each
struct RiteOfAttunement;

impl Blueprint for RiteOfAttunement {
    fn id(&self) -> BlueprintId {
        BlueprintId::new("rite_of_attunement")
    }

    fn display_name(&self) -> &str {
        "Rite of Attunement"
    }

    fn cost(&self) -> u8 {
        1
    }

    fn affinity(&self) -> Affinity {
        Affinity::Void
    }

    fn kind(&self) -> CardKind {
        CardKind::Spell { fast: false }
    }

    fn on_play(&self, game: &mut Game, ctx: &EffectContext) -> Result<Flow> {
        let player = ctx.effect.controller;
        let source = ctx.effect.source;
        match ctx.stage {
            0 => {
                game.request_decision(InteractionContext::ChoosingAffinity(ChoosingAffinity {
                    player,
                    prompt: "Attune to an affinity".to_string(),
                    options: Affinity::ALL.to_vec(),
                    fallback: InteractionAnswer::Affinity {
                        affinity: Affinity::Ember,
                    },
                }))?;
                Ok(Flow::Suspend { next_stage: 1 })
            }
            1 => {
                match expect_affinity(ctx)? {
                    Affinity::Ember => {
                        let enemy_hero = game.player(game.opponent_of(player))?.hero;
                        game.deal_damage(source, enemy_hero, 1)?;
                    }
                    Affinity::Tide => {
                        game.draw_card(player)?;
                    }
                    Affinity::Stone => {
                        let hero = game.player(player)?.hero;
                        game.heal(source, hero, 2)?;
                    }
                    Affinity::Gale => {
                        let hero = game.player(player)?.hero;
                        game.attach_modifier(
                            hero,
                            source,
                            "attuned",
                            ModifierEffect::AddPower { amount: 1 },
                            Expiry::EndOfTurn,
                        )?;
                    }
                    Affinity::Void => {
                        let opponent = game.opponent_of(player);
                        let top = game.board.side(opponent)?.deck.peek_top(1);
                        if let Some(&card) = top.first() {
                            game.move_to_banish(card)?;
                        }
                    }
                }
                Ok(Flow::Continue)
            }
            stage => Err(wrong_stage("Rite of Attunement", stage)),
        }
    }
}

/// Pay 2 life to draw a card, or don't
struct VoidBargain;

impl Blueprint for VoidBargain {
    fn id(&self) -> BlueprintId {
        BlueprintId::new("void_bargain")
    }

    fn display_name(&self) -> &str {
        "Void Bargain"
    }

    fn cost(&self) -> u8 {
        0
    }

    fn affinity(&self) -> Affinity {
        Affinity::Void
    }

    fn kind(&self) -> CardKind {
        CardKind::Spell { fast: false }
    }

    fn on_play(&self, game: &mut Game, ctx: &EffectContext) -> Result<Flow> {
        let player = ctx.effect.controller;
        match ctx.stage {
            0 => {
                game.request_decision(InteractionContext::Question(Question {
                    player,
                    prompt: "Pay 2 life to draw a card?".to_string(),
                    fallback: InteractionAnswer::Bool { value: false },
                }))?;
                Ok(Flow::Suspend { next_stage: 1 })
            }
            1 => {
                if expect_bool(ctx)? {
                    let hero = game.player(player)?.hero;
                    game.deal_damage(ctx.effect.source, hero, 2)?;
                    game.draw_card(player)?;
                }
                Ok(Flow::Continue)
            }
            stage => Err(wrong_stage("Void Bargain", stage)),
        }
    }
}

/// Fast spell: negate the effect on top of the chain
struct Dissipate;

impl Blueprint for Dissipate {
    fn id(&self) -> BlueprintId {
        BlueprintId::new("dissipate")
    }

    fn display_name(&self) -> &str {
        "Dissipate"
    }

    fn cost(&self) -> u8 {
        2
    }

    fn affinity(&self) -> Affinity {
        Affinity::Gale
    }

    fn kind(&self) -> CardKind {
        CardKind::Spell { fast: true }
    }

    fn on_play(&self, game: &mut Game, _ctx: &EffectContext) -> Result<Flow> {
        // Fizzles when nothing is left below it to negate
        game.negate_top_of_chain()?;
        Ok(Flow::Continue)
    }
}

// ----------------------------------------------------------------------
// Sigils, maneuvers, artifacts
// ----------------------------------------------------------------------

/// Whenever an enemy card declares an attack, it gets -1 power until end
/// of combat
struct WardingSigil;

impl Blueprint for WardingSigil {
    fn id(&self) -> BlueprintId {
        BlueprintId::new("warding_sigil")
    }

    fn display_name(&self) -> &str {
        "Warding Sigil"
    }

    fn cost(&self) -> u8 {
        1
    }

    fn affinity(&self) -> Affinity {
        Affinity::Stone
    }

    fn kind(&self) -> CardKind {
        CardKind::Sigil
    }

    fn trigger_targets(
        &self,
        game: &Game,
        sigil: &Card,
        event: &GameEvent,
    ) -> Option<SmallVec<[TargetRef; 2]>> {
        match event {
            GameEvent::AttackDeclared { attacker } => {
                let card = game.cards.get(*attacker).ok()?;
                (card.controller != sigil.controller)
                    .then(|| smallvec![TargetRef::card(*attacker)])
            }
            _ => None,
        }
    }

    fn on_trigger(&self, game: &mut Game, ctx: &EffectContext) -> Result<Flow> {
        if let Some(attacker) = ctx.target_card() {
            if game.is_on_board(attacker) {
                game.attach_modifier(
                    attacker,
                    ctx.effect.source,
                    "warded",
                    ModifierEffect::AddPower { amount: -1 },
                    Expiry::EndOfCombat,
                )?;
            }
        }
        Ok(Flow::Continue)
    }
}

/// Combat maneuver: the attacking card gets +2 power until end of combat
struct FlankingStrike;

impl Blueprint for FlankingStrike {
    fn id(&self) -> BlueprintId {
        BlueprintId::new("flanking_strike")
    }

    fn display_name(&self) -> &str {
        "Flanking Strike"
    }

    fn cost(&self) -> u8 {
        1
    }

    fn affinity(&self) -> Affinity {
        Affinity::Ember
    }

    fn kind(&self) -> CardKind {
        CardKind::Attack
    }

    fn on_play(&self, game: &mut Game, ctx: &EffectContext) -> Result<Flow> {
        let attacker = game.phase.combat().and_then(|c| c.attacker());
        if let Some(attacker) = attacker {
            if game.is_on_board(attacker) {
                game.attach_modifier(
                    attacker,
                    ctx.effect.source,
                    "flanking",
                    ModifierEffect::AddPower { amount: 2 },
                    Expiry::EndOfCombat,
                )?;
            }
        }
        Ok(Flow::Continue)
    }
}

/// Combat maneuver: the attacked card strikes first this combat
struct CounterStance;

impl Blueprint for CounterStance {
    fn id(&self) -> BlueprintId {
        BlueprintId::new("counter_stance")
    }

    fn display_name(&self) -> &str {
        "Counter Stance"
    }

    fn cost(&self) -> u8 {
        1
    }

    fn affinity(&self) -> Affinity {
        Affinity::Gale
    }

    fn kind(&self) -> CardKind {
        CardKind::Attack
    }

    fn on_play(&self, game: &mut Game, ctx: &EffectContext) -> Result<Flow> {
        let target = game.phase.combat().and_then(|c| c.target());
        if let Some(target) = target {
            if game.is_on_board(target) {
                game.attach_modifier(
                    target,
                    ctx.effect.source,
                    "counter stance",
                    ModifierEffect::Preemptive,
                    Expiry::EndOfCombat,
                )?;
            }
        }
        Ok(Flow::Continue)
    }
}

/// Artifact: your hero gets +1 power while this remains in play
struct PhantomEdge;

impl Blueprint for PhantomEdge {
    fn id(&self) -> BlueprintId {
        BlueprintId::new("phantom_edge")
    }

    fn display_name(&self) -> &str {
        "Phantom Edge"
    }

    fn cost(&self) -> u8 {
        2
    }

    fn affinity(&self) -> Affinity {
        Affinity::Void
    }

    fn kind(&self) -> CardKind {
        CardKind::Artifact { durability: 3 }
    }

    fn on_play(&self, game: &mut Game, ctx: &EffectContext) -> Result<Flow> {
        let hero = game.player(ctx.effect.controller)?.hero;
        game.attach_modifier(
            hero,
            ctx.effect.source,
            "phantom edge",
            ModifierEffect::AddPower { amount: 1 },
            Expiry::Permanent,
        )?;
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::registry;
    use crate::core::EntityId;

    #[test]
    fn test_demo_set_covers_every_card_kind() {
        let registry = registry();
        let kinds: Vec<CardKind> = registry
            .ids()
            .iter()
            .map(|id| registry.get(id).unwrap().kind())
            .collect();

        assert!(kinds.iter().any(|k| matches!(k, CardKind::Minion { .. })));
        assert!(kinds.iter().any(|k| matches!(k, CardKind::Hero { .. })));
        assert!(kinds.iter().any(|k| matches!(k, CardKind::Spell { fast: true })));
        assert!(kinds.iter().any(|k| matches!(k, CardKind::Spell { fast: false })));
        assert!(kinds.iter().any(|k| matches!(k, CardKind::Artifact { .. })));
        assert!(kinds.iter().any(|k| matches!(k, CardKind::Sigil)));
        assert!(kinds.iter().any(|k| matches!(k, CardKind::Attack)));
    }

    #[test]
    fn test_hero_instantiates_with_zero_power() {
        let registry = registry();
        let hero = registry.get(&BlueprintId::new("pyre_warden")).unwrap();
        let card = hero.instantiate(EntityId::new(1), EntityId::new(0));
        assert!(card.is_hero());
        assert_eq!(card.power(), Some(0));
    }

    #[test]
    fn test_bolt_asks_for_one_target() {
        let bolt = registry().get(&BlueprintId::new("bolt_of_cinders")).unwrap();
        match bolt.pre_response_targets() {
            TargetSpec::Entities { min, max, .. } => {
                assert_eq!((min, max), (1, 1));
            }
            other => panic!("unexpected target spec: {:?}", other),
        }
    }
}
