//! Targeting primitives shared by blueprints, the chain, and interactions

use crate::core::card::{Card, CardId};
use crate::core::player::PlayerId;
use serde::{Deserialize, Serialize};

/// Reference to a targetable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ref", rename_all = "snake_case")]
pub enum TargetRef {
    Card { id: CardId },
    Player { id: PlayerId },
}

impl TargetRef {
    pub fn card(id: CardId) -> Self {
        TargetRef::Card { id }
    }

    pub fn player(id: PlayerId) -> Self {
        TargetRef::Player { id }
    }

    pub fn as_card(&self) -> Option<CardId> {
        match self {
            TargetRef::Card { id } => Some(*id),
            TargetRef::Player { .. } => None,
        }
    }
}

/// Board-card filter for target selection, evaluated relative to the
/// acting player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFilter {
    /// Any minion or hero on the board
    Any,
    Minion,
    AlliedMinion,
    EnemyMinion,
    Hero,
}

impl TargetFilter {
    pub fn card_matches(&self, card: &Card, actor: PlayerId) -> bool {
        match self {
            TargetFilter::Any => card.is_minion() || card.is_hero(),
            TargetFilter::Minion => card.is_minion(),
            TargetFilter::AlliedMinion => card.is_minion() && card.controller == actor,
            TargetFilter::EnemyMinion => card.is_minion() && card.controller != actor,
            TargetFilter::Hero => card.is_hero(),
        }
    }
}

/// What a blueprint asks the player to pick before its effect is chained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "spec", rename_all = "snake_case")]
pub enum TargetSpec {
    /// Effect needs no targets
    None,
    /// Pick between `min` and `max` board entities matching the filter
    Entities {
        min: usize,
        max: usize,
        filter: TargetFilter,
    },
}

impl TargetSpec {
    pub fn single(filter: TargetFilter) -> Self {
        TargetSpec::Entities {
            min: 1,
            max: 1,
            filter,
        }
    }
}
