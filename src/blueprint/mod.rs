//! Card behavior definitions
//!
//! A blueprint is the static side of a card: printed stats plus the code
//! that runs when the card resolves. Card instances reference their
//! blueprint by ID; the registry maps IDs to behavior. Registration
//! happens once per process, so a deserialized game finds the same
//! handlers the original did.

pub mod demo;

use crate::core::{
    Affinity, BlueprintId, Card, CardId, CardKind, GameEvent, PlayerId, TargetRef, TargetSpec,
};
use crate::game::chain::ChainEffect;
use crate::game::interaction::InteractionAnswer;
use crate::game::state::Game;
use crate::{EngineError, Result};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::OnceLock;

/// What an effect handler was invoked with
///
/// `stage` starts at 0 and advances each time the handler suspends on a
/// decision; `answer` carries the committed decision on re-entry.
#[derive(Debug, Clone)]
pub struct EffectContext {
    pub effect: ChainEffect,
    pub stage: u8,
    pub answer: Option<InteractionAnswer>,
}

impl EffectContext {
    /// First target of the effect, when it is a card
    pub fn target_card(&self) -> Option<CardId> {
        self.effect.targets.first().and_then(|t| t.as_card())
    }
}

/// What an effect handler wants next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Handler is done; the engine finalizes the effect
    Continue,
    /// Handler opened an interaction; re-enter at `next_stage` once the
    /// answer is committed
    Suspend { next_stage: u8 },
}

/// Static definition and behavior of one card
///
/// Only `id`, `display_name`, `cost`, `affinity` and `kind` are
/// mandatory; the behavior hooks default to "vanilla card".
pub trait Blueprint: Send + Sync {
    fn id(&self) -> BlueprintId;
    fn display_name(&self) -> &str;
    fn cost(&self) -> u8;
    fn affinity(&self) -> Affinity;

    /// Printed kind and stats
    fn kind(&self) -> CardKind;

    /// Build a fresh card instance of this blueprint
    fn instantiate(&self, id: CardId, owner: PlayerId) -> Card {
        Card::new(
            id,
            self.id(),
            self.display_name(),
            owner,
            self.cost(),
            self.affinity(),
            self.kind(),
        )
    }

    /// Domain validation, checked before the play mutates anything.
    /// Errors here are ordinary rule rejections, not engine faults.
    fn can_play(&self, game: &Game, player: PlayerId) -> Result<()> {
        let _ = (game, player);
        Ok(())
    }

    /// Targets the player must pick before the effect goes on the chain
    fn pre_response_targets(&self) -> TargetSpec {
        TargetSpec::None
    }

    /// Resolution handler for a played card. Minion summoning, support
    /// placement and spell disposal happen in the engine afterwards;
    /// this hook is for the card's own effect.
    fn on_play(&self, game: &mut Game, ctx: &EffectContext) -> Result<Flow> {
        let _ = (game, ctx);
        Ok(Flow::Continue)
    }

    /// Resolution handler for a sigil trigger
    fn on_trigger(&self, game: &mut Game, ctx: &EffectContext) -> Result<Flow> {
        let _ = (game, ctx);
        Ok(Flow::Continue)
    }

    /// Does this sigil react to `event`? Returns the targets the trigger
    /// carries onto the chain. Non-sigils never get asked.
    fn trigger_targets(
        &self,
        game: &Game,
        sigil: &Card,
        event: &GameEvent,
    ) -> Option<SmallVec<[TargetRef; 2]>> {
        let _ = (game, sigil, event);
        None
    }
}

/// Lookup table from blueprint ID to behavior
pub struct BlueprintRegistry {
    blueprints: FxHashMap<BlueprintId, Box<dyn Blueprint>>,
}

impl BlueprintRegistry {
    fn new() -> Self {
        BlueprintRegistry {
            blueprints: FxHashMap::default(),
        }
    }

    fn register(&mut self, blueprint: Box<dyn Blueprint>) {
        self.blueprints.insert(blueprint.id(), blueprint);
    }

    pub fn get(&self, id: &BlueprintId) -> Result<&dyn Blueprint> {
        self.blueprints
            .get(id)
            .map(|b| b.as_ref())
            .ok_or_else(|| EngineError::Rule(format!("unknown blueprint: {}", id)))
    }

    pub fn contains(&self, id: &BlueprintId) -> bool {
        self.blueprints.contains_key(id)
    }

    /// All registered IDs, sorted for deterministic listings
    pub fn ids(&self) -> Vec<BlueprintId> {
        let mut ids: Vec<_> = self.blueprints.keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}

/// The process-wide registry, populated with the built-in set on first
/// access
pub fn registry() -> &'static BlueprintRegistry {
    static REGISTRY: OnceLock<BlueprintRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = BlueprintRegistry::new();
        demo::register_all(&mut registry);
        registry
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;

    #[test]
    fn test_registry_has_demo_set() {
        let registry = registry();
        assert!(!registry.is_empty());
        for id in ["ember_whelp", "bolt_of_cinders", "warding_sigil"] {
            assert!(registry.contains(&BlueprintId::new(id)), "missing {id}");
        }
        assert!(registry.get(&BlueprintId::new("no_such_card")).is_err());
    }

    #[test]
    fn test_ids_are_sorted() {
        let ids = registry().ids();
        let mut sorted = ids.clone();
        sorted.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_instantiate_copies_printed_stats() {
        let registry = registry();
        let bp = registry.get(&BlueprintId::new("ember_whelp")).unwrap();
        let card = bp.instantiate(EntityId::new(7), EntityId::new(0));

        assert_eq!(card.blueprint, BlueprintId::new("ember_whelp"));
        assert_eq!(card.name, bp.display_name());
        assert_eq!(card.cost, bp.cost());
        assert!(card.is_minion());
        assert_eq!(card.power(), Some(2));
    }
}
