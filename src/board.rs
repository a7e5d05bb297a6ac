//! Zones and the minion slot row
//!
//! Each player owns an ordered deck, a hand, a discard pile, a banish pile
//! and a fixed row of minion slots. Piles keep insertion order on removal
//! so that identical command histories touch cards in identical order.

use crate::core::{CardId, PlayerId};
use crate::{EngineError, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The zones a card can sit in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Deck,
    Hand,
    Board,
    Discard,
    Banish,
}

impl ZoneKind {
    /// Public zones are visible to both players at all times
    pub fn is_public(&self) -> bool {
        matches!(self, ZoneKind::Board | ZoneKind::Discard | ZoneKind::Banish)
    }
}

/// Ordered pile of cards. The end of the vec is the top.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pile {
    cards: Vec<CardId>,
}

impl Pile {
    pub fn new() -> Self {
        Pile { cards: Vec::new() }
    }

    pub fn push_top(&mut self, card: CardId) {
        self.cards.push(card);
    }

    pub fn push_bottom(&mut self, card: CardId) {
        self.cards.insert(0, card);
    }

    pub fn draw_top(&mut self) -> Option<CardId> {
        self.cards.pop()
    }

    /// Top `n` cards, topmost first
    pub fn peek_top(&self, n: usize) -> Vec<CardId> {
        self.cards.iter().rev().take(n).copied().collect()
    }

    /// Remove the top `n` cards, topmost first
    pub fn take_top(&mut self, n: usize) -> Vec<CardId> {
        let mut taken = Vec::with_capacity(n);
        for _ in 0..n {
            match self.cards.pop() {
                Some(card) => taken.push(card),
                None => break,
            }
        }
        taken
    }

    /// Remove a specific card, preserving the order of the rest
    pub fn remove(&mut self, card: CardId) -> bool {
        match self.cards.iter().position(|c| *c == card) {
            Some(idx) => {
                self.cards.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, card: CardId) -> bool {
        self.cards.contains(&card)
    }

    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.cards.shuffle(rng);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CardId> {
        self.cards.iter()
    }
}

/// One player's side of the table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSide {
    pub deck: Pile,
    pub hand: Pile,
    pub discard: Pile,
    pub banish: Pile,

    /// Minion slots, fixed width. Slot order is board order.
    pub slots: Vec<Option<CardId>>,

    /// Sigils and artifacts in play, in play order. They sit beside the
    /// slot row rather than in it, so they never block minion placement.
    pub support: Vec<CardId>,
}

impl PlayerSide {
    pub fn new(slot_count: usize) -> Self {
        PlayerSide {
            deck: Pile::new(),
            hand: Pile::new(),
            discard: Pile::new(),
            banish: Pile::new(),
            slots: vec![None; slot_count],
            support: Vec::new(),
        }
    }

    pub fn first_free_slot(&self) -> Option<u8> {
        self.slots.iter().position(|s| s.is_none()).map(|i| i as u8)
    }

    pub fn slot_is_free(&self, slot: u8) -> bool {
        self.slots
            .get(slot as usize)
            .map(|s| s.is_none())
            .unwrap_or(false)
    }

    pub fn place_minion(&mut self, slot: u8, card: CardId) -> Result<()> {
        match self.slots.get_mut(slot as usize) {
            Some(s @ None) => {
                *s = Some(card);
                Ok(())
            }
            Some(Some(occupant)) => Err(EngineError::Rule(format!(
                "slot {} is occupied by card {}",
                slot, occupant
            ))),
            None => Err(EngineError::Rule(format!("no such slot: {}", slot))),
        }
    }

    /// Minions in slot order (board order is deterministic)
    pub fn minions(&self) -> Vec<CardId> {
        self.slots.iter().filter_map(|s| *s).collect()
    }

    /// Clear a card out of whatever slot holds it
    pub fn remove_from_slots(&mut self, card: CardId) -> bool {
        for s in self.slots.iter_mut() {
            if *s == Some(card) {
                *s = None;
                return true;
            }
        }
        false
    }
}

/// Both players' zones, keyed by player for deterministic serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    sides: BTreeMap<PlayerId, PlayerSide>,
}

impl Board {
    pub fn new(players: &[PlayerId], slot_count: usize) -> Self {
        let sides = players
            .iter()
            .map(|p| (*p, PlayerSide::new(slot_count)))
            .collect();
        Board { sides }
    }

    pub fn side(&self, player: PlayerId) -> Result<&PlayerSide> {
        self.sides
            .get(&player)
            .ok_or(EngineError::EntityNotFound(player.as_u32()))
    }

    pub fn side_mut(&mut self, player: PlayerId) -> Result<&mut PlayerSide> {
        self.sides
            .get_mut(&player)
            .ok_or(EngineError::EntityNotFound(player.as_u32()))
    }

    pub fn sides(&self) -> impl Iterator<Item = (&PlayerId, &PlayerSide)> {
        self.sides.iter()
    }

    /// Which zone holds this card, if any. Heroes are tracked by the game
    /// state, not by the board, and report Board from there.
    pub fn zone_of(&self, card: CardId) -> Option<(PlayerId, ZoneKind)> {
        for (player, side) in &self.sides {
            if side.deck.contains(card) {
                return Some((*player, ZoneKind::Deck));
            }
            if side.hand.contains(card) {
                return Some((*player, ZoneKind::Hand));
            }
            if side.discard.contains(card) {
                return Some((*player, ZoneKind::Discard));
            }
            if side.banish.contains(card) {
                return Some((*player, ZoneKind::Banish));
            }
            if side.slots.iter().any(|s| *s == Some(card)) || side.support.contains(&card) {
                return Some((*player, ZoneKind::Board));
            }
        }
        None
    }

    /// Detach a card from whatever zone currently holds it
    pub fn detach(&mut self, card: CardId) -> bool {
        for side in self.sides.values_mut() {
            if side.deck.remove(card)
                || side.hand.remove(card)
                || side.discard.remove(card)
                || side.banish.remove(card)
                || side.remove_from_slots(card)
            {
                return true;
            }
            if let Some(idx) = side.support.iter().position(|c| *c == card) {
                side.support.remove(idx);
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;

    fn card(raw: u32) -> CardId {
        EntityId::new(raw)
    }

    #[test]
    fn test_pile_order_preserved_on_remove() {
        let mut pile = Pile::new();
        for raw in 0..5 {
            pile.push_top(card(raw));
        }
        assert!(pile.remove(card(2)));
        let order: Vec<u32> = pile.iter().map(|c| c.as_u32()).collect();
        assert_eq!(order, vec![0, 1, 3, 4]);
        assert_eq!(pile.draw_top(), Some(card(4)));
    }

    #[test]
    fn test_peek_and_take_top_are_top_first() {
        let mut pile = Pile::new();
        for raw in 0..4 {
            pile.push_top(card(raw));
        }
        assert_eq!(pile.peek_top(2), vec![card(3), card(2)]);
        assert_eq!(pile.take_top(2), vec![card(3), card(2)]);
        assert_eq!(pile.len(), 2);
    }

    #[test]
    fn test_slot_placement() {
        let mut side = PlayerSide::new(3);
        assert_eq!(side.first_free_slot(), Some(0));
        side.place_minion(1, card(7)).unwrap();
        assert_eq!(side.first_free_slot(), Some(0));
        assert!(side.place_minion(1, card(8)).is_err());
        assert!(side.place_minion(9, card(8)).is_err());
        assert_eq!(side.minions(), vec![card(7)]);
        assert!(side.remove_from_slots(card(7)));
        assert_eq!(side.minions(), Vec::<CardId>::new());
    }

    #[test]
    fn test_board_zone_tracking() {
        let players: Vec<PlayerId> = vec![EntityId::new(0), EntityId::new(1)];
        let mut board = Board::new(&players, 3);

        board.side_mut(players[0]).unwrap().hand.push_top(card(10));
        assert_eq!(
            board.zone_of(card(10)),
            Some((players[0], ZoneKind::Hand))
        );

        assert!(board.detach(card(10)));
        assert_eq!(board.zone_of(card(10)), None);

        board
            .side_mut(players[1])
            .unwrap()
            .place_minion(0, card(11))
            .unwrap();
        assert_eq!(
            board.zone_of(card(11)),
            Some((players[1], ZoneKind::Board))
        );
    }
}
