//! Typed game events
//!
//! Everything observable that happens in a game is appended to the event
//! log as one of these variants. Snapshot updates carry the slice of
//! events since the viewer's previous update, redacted per viewer; sigils
//! react to events through the blueprint trigger hook.

use crate::core::card::CardId;
use crate::core::modifier::ModifierId;
use crate::core::player::PlayerId;
use crate::game::phase::PhaseKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    TurnStarted {
        player: PlayerId,
        turn: u32,
    },
    PhaseEntered {
        phase: PhaseKind,
    },
    PhaseExited {
        phase: PhaseKind,
    },
    /// `card` is None in copies redacted for the non-drawing player
    CardDrawn {
        player: PlayerId,
        card: Option<CardId>,
    },
    /// Draw attempted on an empty deck; nothing moves
    DeckEmpty {
        player: PlayerId,
    },
    CardPlayed {
        player: PlayerId,
        card: CardId,
    },
    MinionSummoned {
        card: CardId,
        slot: u8,
    },
    CardDiscarded {
        card: CardId,
    },
    CardBanished {
        card: CardId,
    },
    /// A hidden card was shown to one player only (scry effects)
    CardRevealed {
        card: CardId,
        to: PlayerId,
    },
    ChainOpened,
    EffectChained {
        index: usize,
        source: CardId,
    },
    ChainPassed {
        player: PlayerId,
    },
    EffectResolving {
        index: usize,
        source: CardId,
    },
    EffectResolved {
        index: usize,
        source: CardId,
    },
    EffectNegated {
        index: usize,
        source: CardId,
    },
    ChainFinished,
    AttackDeclared {
        attacker: CardId,
    },
    AttackTargetChosen {
        attacker: CardId,
        target: CardId,
    },
    AttackCancelled,
    DamageDealt {
        source: CardId,
        target: CardId,
        amount: i32,
    },
    Healed {
        source: CardId,
        target: CardId,
        amount: i32,
    },
    CardDied {
        card: CardId,
    },
    ModifierAttached {
        modifier: ModifierId,
        host: CardId,
    },
    ModifierExpired {
        modifier: ModifierId,
        host: CardId,
    },
    InteractionOpened {
        player: PlayerId,
    },
    InteractionCommitted {
        player: PlayerId,
    },
    /// A command failed validation; clients should resync
    CommandRejected {
        player: PlayerId,
        reason: String,
    },
    HeroDied {
        player: PlayerId,
    },
    GameEnded {
        winner: Option<PlayerId>,
    },
}

impl GameEvent {
    /// The copy of this event a given viewer is allowed to see.
    /// None drops the event from that viewer's update entirely.
    pub fn redacted_for(&self, viewer: PlayerId) -> Option<GameEvent> {
        match self {
            GameEvent::CardDrawn { player, .. } if *player != viewer => {
                Some(GameEvent::CardDrawn {
                    player: *player,
                    card: None,
                })
            }
            GameEvent::CardRevealed { to, .. } if *to != viewer => None,
            other => Some(other.clone()),
        }
    }

    /// Card IDs this event legitimately exposes to a viewer. Feeds the
    /// viewer's visibility set, which only ever grows.
    pub fn reveals_to(&self, viewer: PlayerId) -> Option<CardId> {
        match self {
            GameEvent::CardDrawn {
                player,
                card: Some(card),
            } if *player == viewer => Some(*card),
            GameEvent::CardRevealed { card, to } if *to == viewer => Some(*card),
            GameEvent::CardPlayed { card, .. }
            | GameEvent::MinionSummoned { card, .. }
            | GameEvent::CardDiscarded { card }
            | GameEvent::CardBanished { card } => Some(*card),
            _ => None,
        }
    }
}
