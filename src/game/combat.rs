//! The combat sub-machine inside the attack phase
//!
//! Combat walks a fixed ladder: declare an attacker, declare its target,
//! let the response chain build, then resolve damage. Damage math lives
//! on the game state (it needs the modifier pipeline); this module owns
//! the step bookkeeping and its guards.

use crate::core::{CardId, PlayerId};
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatStep {
    DeclareAttacker,
    DeclareTarget,
    BuildingChain,
    Resolving,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatState {
    step: CombatStep,

    /// Player who entered the attack phase
    pub attacking_player: PlayerId,

    attacker: Option<CardId>,
    target: Option<CardId>,
}

impl CombatState {
    pub fn new(attacking_player: PlayerId) -> Self {
        CombatState {
            step: CombatStep::DeclareAttacker,
            attacking_player,
            attacker: None,
            target: None,
        }
    }

    pub fn step(&self) -> CombatStep {
        self.step
    }

    pub fn can(&self, step: CombatStep) -> bool {
        self.step == step
    }

    pub fn attacker(&self) -> Option<CardId> {
        self.attacker
    }

    pub fn target(&self) -> Option<CardId> {
        self.target
    }

    /// Record the attacker and move to target declaration
    pub fn declare_attacker(&mut self, attacker: CardId) -> Result<()> {
        if !self.can(CombatStep::DeclareAttacker) {
            return Err(EngineError::Rule(format!(
                "cannot declare an attacker during the {:?} step",
                self.step
            )));
        }
        self.attacker = Some(attacker);
        self.step = CombatStep::DeclareTarget;
        Ok(())
    }

    /// Record the target and move to the response window
    pub fn declare_target(&mut self, target: CardId) -> Result<()> {
        if !self.can(CombatStep::DeclareTarget) {
            return Err(EngineError::Rule(format!(
                "cannot declare an attack target during the {:?} step",
                self.step
            )));
        }
        self.target = Some(target);
        self.step = CombatStep::BuildingChain;
        Ok(())
    }

    /// The response chain has emptied; damage is next
    pub fn begin_resolution(&mut self) -> Result<()> {
        if !self.can(CombatStep::BuildingChain) {
            return Err(EngineError::CorruptState(format!(
                "combat resolution requested during the {:?} step",
                self.step
            )));
        }
        self.step = CombatStep::Resolving;
        Ok(())
    }

    /// Both combatants, once declared
    pub fn pairing(&self) -> Option<(CardId, CardId)> {
        match (self.attacker, self.target) {
            (Some(a), Some(t)) => Some((a, t)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;

    #[test]
    fn test_step_ladder() {
        let mut combat = CombatState::new(EntityId::new(0));
        assert!(combat.can(CombatStep::DeclareAttacker));

        combat.declare_attacker(EntityId::new(5)).unwrap();
        assert!(combat.can(CombatStep::DeclareTarget));
        assert_eq!(combat.attacker(), Some(EntityId::new(5)));

        combat.declare_target(EntityId::new(6)).unwrap();
        assert!(combat.can(CombatStep::BuildingChain));
        assert_eq!(combat.pairing(), Some((EntityId::new(5), EntityId::new(6))));

        combat.begin_resolution().unwrap();
        assert!(combat.can(CombatStep::Resolving));
    }

    #[test]
    fn test_out_of_step_declarations_rejected() {
        let mut combat = CombatState::new(EntityId::new(0));

        // No target before an attacker
        assert!(combat.declare_target(EntityId::new(6)).is_err());

        combat.declare_attacker(EntityId::new(5)).unwrap();
        // No second attacker
        assert!(combat.declare_attacker(EntityId::new(7)).is_err());
        assert_eq!(combat.attacker(), Some(EntityId::new(5)));

        // Resolution only after the response window opens
        let mut fresh = CombatState::new(EntityId::new(0));
        assert!(fresh.begin_resolution().is_err());
    }
}
