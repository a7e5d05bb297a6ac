//! Stat modifiers attached to cards
//!
//! Modifiers are pure data; derived stats are computed by folding a card's
//! modifier list in registration order. Contradictory modifiers therefore
//! resolve deterministically: last registered wins whatever it touches.

use crate::core::card::CardId;
use crate::core::entity::{EntityId, GameEntity};
use serde::{Deserialize, Serialize};

pub type ModifierId = EntityId<Modifier>;

/// What a modifier does to its host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ModifierEffect {
    /// Adds to the host's power
    AddPower { amount: i32 },
    /// Adds to the host's maximum hit points
    AddMaxHp { amount: i32 },
    /// Host's combat damage lands before the opposing side's
    Preemptive,
    /// Host deals no counter-damage when attacked
    NoRetaliation,
}

/// When a modifier falls off its host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiry {
    Permanent,
    EndOfTurn,
    EndOfCombat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Modifier {
    pub id: ModifierId,
    pub name: String,

    /// Card the modifier is attached to
    pub host: CardId,

    /// Card that created the modifier
    pub source: CardId,

    pub effect: ModifierEffect,
    pub expiry: Expiry,
}

impl Modifier {
    pub fn new(
        id: ModifierId,
        name: impl Into<String>,
        host: CardId,
        source: CardId,
        effect: ModifierEffect,
        expiry: Expiry,
    ) -> Self {
        Modifier {
            id,
            name: name.into(),
            host,
            source,
            effect,
            expiry,
        }
    }
}

impl GameEntity for Modifier {
    fn id(&self) -> ModifierId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fold power modifiers over a base value, in registration order
pub fn effective_power<'a>(base: i32, mods: impl Iterator<Item = &'a Modifier>) -> i32 {
    mods.fold(base, |power, m| match m.effect {
        ModifierEffect::AddPower { amount } => power + amount,
        _ => power,
    })
}

pub fn is_preemptive<'a>(mut mods: impl Iterator<Item = &'a Modifier>) -> bool {
    mods.any(|m| m.effect == ModifierEffect::Preemptive)
}

pub fn retaliation_disabled<'a>(mut mods: impl Iterator<Item = &'a Modifier>) -> bool {
    mods.any(|m| m.effect == ModifierEffect::NoRetaliation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modifier(id: u32, effect: ModifierEffect) -> Modifier {
        Modifier::new(
            EntityId::new(id),
            "test",
            EntityId::new(1),
            EntityId::new(2),
            effect,
            Expiry::Permanent,
        )
    }

    #[test]
    fn test_power_fold_stacks() {
        let mods = vec![
            modifier(10, ModifierEffect::AddPower { amount: 2 }),
            modifier(11, ModifierEffect::Preemptive),
            modifier(12, ModifierEffect::AddPower { amount: -1 }),
        ];
        assert_eq!(effective_power(3, mods.iter()), 4);
        assert!(is_preemptive(mods.iter()));
        assert!(!retaliation_disabled(mods.iter()));
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let mods: Vec<Modifier> = Vec::new();
        assert_eq!(effective_power(2, mods.iter()), 2);
        assert!(!is_preemptive(mods.iter()));
    }
}
