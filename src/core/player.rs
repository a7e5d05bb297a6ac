//! Player entities

use crate::core::card::CardId;
use crate::core::entity::{EntityId, GameEntity};
use crate::core::types::PlayerName;
use serde::{Deserialize, Serialize};

use crate::{EngineError, Result};

pub type PlayerId = EntityId<Player>;

/// A player in the game
///
/// The hero avatar is an ordinary card entity on the board; the player
/// record holds the resource pool and loss flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: PlayerName,

    /// The player's hero card. When it dies the player loses.
    pub hero: CardId,

    /// Mana available right now
    pub mana: u8,

    /// Value mana refills to at the start of this player's turn; grows by
    /// one each turn up to the configured cap
    pub mana_ramp: u8,

    pub has_lost: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: PlayerName, hero: CardId) -> Self {
        Player {
            id,
            name,
            hero,
            mana: 0,
            mana_ramp: 0,
            has_lost: false,
        }
    }

    pub fn can_pay(&self, cost: u8) -> bool {
        self.mana >= cost
    }

    pub fn pay(&mut self, cost: u8) -> Result<()> {
        if self.mana < cost {
            return Err(EngineError::Rule(format!(
                "{} cannot pay {} mana (has {})",
                self.name, cost, self.mana
            )));
        }
        self.mana -= cost;
        Ok(())
    }

    /// Grow the ramp by one (up to `cap`) and refill mana to it
    pub fn ramp_and_refill(&mut self, cap: u8) {
        if self.mana_ramp < cap {
            self.mana_ramp += 1;
        }
        self.mana = self.mana_ramp;
    }
}

impl GameEntity for Player {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(
            EntityId::new(0),
            PlayerName::new("Alice"),
            EntityId::new(1),
        )
    }

    #[test]
    fn test_mana_ramp() {
        let mut p = player();
        p.ramp_and_refill(10);
        assert_eq!(p.mana, 1);
        for _ in 0..15 {
            p.ramp_and_refill(10);
        }
        assert_eq!(p.mana_ramp, 10);
        assert_eq!(p.mana, 10);
    }

    #[test]
    fn test_pay_rejects_overdraft() {
        let mut p = player();
        p.ramp_and_refill(10);
        assert!(p.can_pay(1));
        assert!(!p.can_pay(2));
        assert!(p.pay(2).is_err());
        assert_eq!(p.mana, 1);
        p.pay(1).unwrap();
        assert_eq!(p.mana, 0);
    }
}
