//! The effect chain
//!
//! A chain opens whenever an effect wants to enter play, collects responses
//! while both players hold priority in turn, then resolves last-in
//! first-out. A chain object is single-use: BUILDING -> RESOLVING ->
//! FINISHED, never backwards, never reused.

use crate::core::{CardId, PlayerId, TargetRef};
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainState {
    Building,
    Resolving,
    Finished,
}

/// Why an entry is on the chain; selects the blueprint hook that runs
/// when it resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectKind {
    /// A card played from hand. Minions carry their reserved slot.
    Play { slot: Option<u8> },
    /// A sigil reacting to a game event
    SigilTrigger,
}

/// One entry on the chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEffect {
    /// Position in registration order, stable for logging even after
    /// entries above it resolve
    pub index: usize,

    pub kind: EffectKind,

    /// Card whose blueprint supplies the resolution handler
    pub source: CardId,

    pub controller: PlayerId,

    pub targets: SmallVec<[TargetRef; 2]>,

    /// Negated entries are popped without running their handler
    pub negated: bool,
}

/// Work to run when the chain finishes, stored as data so the whole
/// chain serializes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainCallback {
    /// Resolve the combat that opened (or deferred into) this chain
    ResolveCombat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    state: ChainState,
    entries: Vec<ChainEffect>,

    /// Both players, for priority hand-off
    players: [PlayerId; 2],

    /// Who may act on the chain right now
    priority: PlayerId,

    consecutive_passes: u8,

    /// Finish callbacks in registration order; they run reversed
    callbacks: Vec<ChainCallback>,

    /// Total entries ever added (entries shrink during resolution)
    next_index: usize,
}

impl Chain {
    /// Open a chain with `first` holding priority
    pub fn new(players: [PlayerId; 2], first: PlayerId) -> Self {
        Chain {
            state: ChainState::Building,
            entries: Vec::new(),
            players,
            priority: first,
            consecutive_passes: 0,
            callbacks: Vec::new(),
            next_index: 0,
        }
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn priority(&self) -> PlayerId {
        self.priority
    }

    pub fn is_building(&self) -> bool {
        self.state == ChainState::Building
    }

    pub fn entries(&self) -> &[ChainEffect] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn other(&self, player: PlayerId) -> PlayerId {
        if player == self.players[0] {
            self.players[1]
        } else {
            self.players[0]
        }
    }

    /// Push an effect. Only legal while building and only for the
    /// priority holder; resets the pass counter and hands priority to
    /// the opponent.
    pub fn add_effect(
        &mut self,
        player: PlayerId,
        kind: EffectKind,
        source: CardId,
        targets: SmallVec<[TargetRef; 2]>,
    ) -> Result<usize> {
        if self.state != ChainState::Building {
            return Err(EngineError::Rule(
                "chain is no longer accepting effects".to_string(),
            ));
        }
        if player != self.priority {
            return Err(EngineError::NoPriority(player.as_u32()));
        }
        let index = self.next_index;
        self.next_index += 1;
        self.entries.push(ChainEffect {
            index,
            kind,
            source,
            controller: player,
            targets,
            negated: false,
        });
        self.consecutive_passes = 0;
        self.priority = self.other(player);
        Ok(index)
    }

    /// Pass priority. Two consecutive passes close the building window
    /// and flip the chain to resolving; returns true when that happens.
    pub fn pass(&mut self, player: PlayerId) -> Result<bool> {
        if self.state != ChainState::Building {
            return Err(EngineError::Rule(
                "chain is not in its building window".to_string(),
            ));
        }
        if player != self.priority {
            return Err(EngineError::NoPriority(player.as_u32()));
        }
        self.consecutive_passes += 1;
        if self.consecutive_passes >= 2 {
            self.state = ChainState::Resolving;
            Ok(true)
        } else {
            self.priority = self.other(player);
            Ok(false)
        }
    }

    /// Pop the next entry to resolve (last in, first out)
    pub fn pop_next(&mut self) -> Option<ChainEffect> {
        debug_assert_eq!(self.state, ChainState::Resolving);
        self.entries.pop()
    }

    /// Mark the topmost pending entry negated. Returns its index and
    /// source if there was one.
    pub fn negate_top(&mut self) -> Option<(usize, CardId)> {
        self.entries.iter_mut().rev().find(|e| !e.negated).map(|e| {
            e.negated = true;
            (e.index, e.source)
        })
    }

    pub fn on_finished(&mut self, callback: ChainCallback) {
        self.callbacks.push(callback);
    }

    pub fn has_callback(&self, callback: ChainCallback) -> bool {
        self.callbacks.contains(&callback)
    }

    /// Close the chain and hand back its callbacks in reverse
    /// registration order.
    pub fn finish(&mut self) -> Vec<ChainCallback> {
        self.state = ChainState::Finished;
        let mut callbacks = std::mem::take(&mut self.callbacks);
        callbacks.reverse();
        callbacks
    }
}
