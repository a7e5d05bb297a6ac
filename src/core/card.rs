//! Card instances and the card kind taxonomy

use crate::core::entity::{EntityId, GameEntity};
use crate::core::modifier::ModifierId;
use crate::core::player::PlayerId;
use crate::core::types::{Affinity, BlueprintId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub type CardId = EntityId<Card>;

/// Kind-specific card data
///
/// Flattened into the card's JSON object so stat fields diff under plain
/// paths like `power` and `hp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardKind {
    /// Board unit occupying a slot
    Minion { power: i32, hp: i32, max_hp: i32 },
    /// A player's avatar; its death ends the game
    Hero { power: i32, hp: i32, max_hp: i32 },
    /// One-shot effect resolved off the chain
    Spell {
        /// Fast spells may be chained as responses
        fast: bool,
    },
    /// Persistent hero attachment that wears out over turns
    Artifact { durability: u8 },
    /// Passive trigger that reacts to game events while on the board
    Sigil,
    /// Combat maneuver, playable only while an attack chain is building
    Attack,
}

/// Cosmetic card fields
///
/// Mutable alongside gameplay state (effects may re-tint a card), so they
/// ride along in snapshots as a nested object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardArt {
    pub frame: String,
    pub tint: String,
}

impl CardArt {
    pub fn plain() -> Self {
        CardArt {
            frame: "standard".to_string(),
            tint: "none".to_string(),
        }
    }
}

/// Represents a card instance during gameplay
///
/// Cards have a unique ID but many cards share the same blueprint. Mutable
/// stats live here; static definition data stays in the blueprint registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Unique ID for this card instance
    pub id: CardId,

    /// Blueprint this card was instantiated from
    pub blueprint: BlueprintId,

    /// Display name (copied from the blueprint)
    pub name: String,

    /// Player who owns this card
    pub owner: PlayerId,

    /// Current controller (can differ from owner)
    pub controller: PlayerId,

    /// Mana cost to play
    pub cost: u8,

    pub affinity: Affinity,

    #[serde(flatten)]
    pub kind: CardKind,

    /// Exhausted cards cannot attack until they ready
    pub exhausted: bool,

    /// Attached modifiers, in registration order
    pub modifiers: SmallVec<[ModifierId; 2]>,

    pub art: CardArt,
}

impl Card {
    pub fn new(
        id: CardId,
        blueprint: BlueprintId,
        name: impl Into<String>,
        owner: PlayerId,
        cost: u8,
        affinity: Affinity,
        kind: CardKind,
    ) -> Self {
        Card {
            id,
            blueprint,
            name: name.into(),
            owner,
            controller: owner,
            cost,
            affinity,
            kind,
            exhausted: false,
            modifiers: SmallVec::new(),
            art: CardArt::plain(),
        }
    }

    pub fn is_minion(&self) -> bool {
        matches!(self.kind, CardKind::Minion { .. })
    }

    pub fn is_hero(&self) -> bool {
        matches!(self.kind, CardKind::Hero { .. })
    }

    pub fn is_spell(&self) -> bool {
        matches!(self.kind, CardKind::Spell { .. })
    }

    pub fn is_fast_spell(&self) -> bool {
        matches!(self.kind, CardKind::Spell { fast: true })
    }

    pub fn is_artifact(&self) -> bool {
        matches!(self.kind, CardKind::Artifact { .. })
    }

    pub fn is_sigil(&self) -> bool {
        matches!(self.kind, CardKind::Sigil)
    }

    pub fn is_attack_card(&self) -> bool {
        matches!(self.kind, CardKind::Attack)
    }

    /// Base printed power, before modifiers
    pub fn power(&self) -> Option<i32> {
        match self.kind {
            CardKind::Minion { power, .. } | CardKind::Hero { power, .. } => Some(power),
            _ => None,
        }
    }

    pub fn hp(&self) -> Option<i32> {
        match self.kind {
            CardKind::Minion { hp, .. } | CardKind::Hero { hp, .. } => Some(hp),
            _ => None,
        }
    }

    pub fn max_hp(&self) -> Option<i32> {
        match self.kind {
            CardKind::Minion { max_hp, .. } | CardKind::Hero { max_hp, .. } => Some(max_hp),
            _ => None,
        }
    }

    /// Apply damage, clamping at zero. Returns the amount actually dealt.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        match &mut self.kind {
            CardKind::Minion { hp, .. } | CardKind::Hero { hp, .. } => {
                let dealt = amount.min(*hp).max(0);
                *hp -= dealt;
                dealt
            }
            _ => 0,
        }
    }

    /// Restore hit points, clamping at max. Returns the amount restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        match &mut self.kind {
            CardKind::Minion { hp, max_hp, .. } | CardKind::Hero { hp, max_hp, .. } => {
                let restored = amount.min(*max_hp - *hp).max(0);
                *hp += restored;
                restored
            }
            _ => 0,
        }
    }

    pub fn is_dead(&self) -> bool {
        match self.kind {
            CardKind::Minion { hp, .. } | CardKind::Hero { hp, .. } => hp <= 0,
            CardKind::Artifact { durability } => durability == 0,
            _ => false,
        }
    }

    pub fn exhaust(&mut self) {
        self.exhausted = true;
    }

    pub fn ready(&mut self) {
        self.exhausted = false;
    }
}

impl GameEntity for Card {
    fn id(&self) -> CardId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
