//! Turn phases and the transition table

use crate::core::PlayerId;
use crate::game::combat::CombatState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The phases of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Draw,
    Main,
    Attack,
    End,
    GameEnd,
}

impl PhaseKind {
    /// The fixed transition table. Anything outside it is a sequencing
    /// bug in the engine, not a player mistake.
    pub fn can_transition_to(&self, to: PhaseKind) -> bool {
        if to == PhaseKind::GameEnd {
            return true;
        }
        matches!(
            (self, to),
            (PhaseKind::Draw, PhaseKind::Main)
                | (PhaseKind::Main, PhaseKind::Attack)
                | (PhaseKind::Attack, PhaseKind::Main)
                | (PhaseKind::Main, PhaseKind::End)
                | (PhaseKind::End, PhaseKind::Draw)
        )
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PhaseKind::Draw => "draw",
            PhaseKind::Main => "main",
            PhaseKind::Attack => "attack",
            PhaseKind::End => "end",
            PhaseKind::GameEnd => "game_end",
        };
        write!(f, "{}", s)
    }
}

/// The single live phase context
///
/// Exactly one exists at a time; the attack phase carries the combat
/// sub-machine, game end carries the outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PhaseContext {
    Draw,
    Main,
    Attack { combat: CombatState },
    End,
    GameEnd { winner: Option<PlayerId> },
}

impl PhaseContext {
    pub fn kind(&self) -> PhaseKind {
        match self {
            PhaseContext::Draw => PhaseKind::Draw,
            PhaseContext::Main => PhaseKind::Main,
            PhaseContext::Attack { .. } => PhaseKind::Attack,
            PhaseContext::End => PhaseKind::End,
            PhaseContext::GameEnd { .. } => PhaseKind::GameEnd,
        }
    }

    pub fn combat(&self) -> Option<&CombatState> {
        match self {
            PhaseContext::Attack { combat } => Some(combat),
            _ => None,
        }
    }

    pub fn combat_mut(&mut self) -> Option<&mut CombatState> {
        match self {
            PhaseContext::Attack { combat } => Some(combat),
            _ => None,
        }
    }
}

/// Turn pointers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnStructure {
    /// Current turn number (starts at 1)
    pub turn_number: u32,

    /// Active player (whose turn it is)
    pub active_player: PlayerId,

    /// Player who took the first turn. The turn counter ticks when the
    /// end-of-turn wrap hands the draw phase back to them.
    pub starting_player: PlayerId,
}

impl TurnStructure {
    pub fn new(starting_player: PlayerId) -> Self {
        TurnStructure {
            turn_number: 1,
            active_player: starting_player,
            starting_player,
        }
    }

    /// Hand the turn to the next player; counts a full round when the
    /// wrap returns to the starting player.
    pub fn wrap_to(&mut self, next_active: PlayerId) {
        self.active_player = next_active;
        if next_active == self.starting_player {
            self.turn_number += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;

    #[test]
    fn test_transition_table() {
        use PhaseKind::*;
        let legal = [
            (Draw, Main),
            (Main, Attack),
            (Attack, Main),
            (Main, End),
            (End, Draw),
        ];
        for (from, to) in legal {
            assert!(from.can_transition_to(to), "{from} -> {to} should be legal");
        }

        // Everything reaches game end
        for from in [Draw, Main, Attack, End, GameEnd] {
            assert!(from.can_transition_to(GameEnd));
        }

        let illegal = [
            (Draw, Attack),
            (Draw, End),
            (Attack, End),
            (Attack, Draw),
            (End, Main),
            (End, Attack),
            (Main, Draw),
            (GameEnd, Draw),
        ];
        for (from, to) in illegal {
            assert!(
                !from.can_transition_to(to),
                "{from} -> {to} should be illegal"
            );
        }
    }

    #[test]
    fn test_turn_counts_full_rounds() {
        let p0: PlayerId = EntityId::new(0);
        let p1: PlayerId = EntityId::new(1);
        let mut turn = TurnStructure::new(p0);
        assert_eq!(turn.turn_number, 1);

        // p0's turn ends, p1 takes over: same round
        turn.wrap_to(p1);
        assert_eq!(turn.turn_number, 1);

        // back to the starting player: new round
        turn.wrap_to(p0);
        assert_eq!(turn.turn_number, 2);
    }
}
