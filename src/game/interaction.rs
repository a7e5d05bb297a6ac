//! Player interactions
//!
//! When an effect needs a decision mid-execution, the engine opens one of
//! these contexts, suspends, and waits for a commit command carrying the
//! answer. Exactly one context exists at a time (possibly Idle). Commits
//! from the wrong player, with the wrong cardinality, or with out-of-range
//! indices are rejected without disturbing the open context.

use crate::core::{Affinity, CardId, PlayerId, TargetRef};
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// A committed decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "answer", rename_all = "snake_case")]
pub enum InteractionAnswer {
    Targets { targets: Vec<TargetRef> },
    /// Indices into the presented card options
    CardIndices { indices: Vec<usize> },
    Affinity { affinity: Affinity },
    Slot { slot: u8 },
    Bool { value: bool },
    /// A permutation of the presented cards, new order first-to-last
    Arrangement { order: Vec<usize> },
}

/// Pick N entities from a precomputed option list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectingEntities {
    pub player: PlayerId,
    pub prompt: String,
    pub options: Vec<TargetRef>,
    pub min: usize,
    pub max: usize,
    /// Partial selection built up one pick at a time
    pub selected: Vec<TargetRef>,
    pub fallback: InteractionAnswer,
}

/// Pick N of a set of revealed cards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoosingCards {
    pub player: PlayerId,
    pub prompt: String,
    pub options: Vec<CardId>,
    pub min: usize,
    pub max: usize,
    pub fallback: InteractionAnswer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoosingAffinity {
    pub player: PlayerId,
    pub prompt: String,
    pub options: Vec<Affinity>,
    pub fallback: InteractionAnswer,
}

/// Pick a free minion slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectingSlot {
    pub player: PlayerId,
    pub prompt: String,
    pub options: Vec<u8>,
    pub fallback: InteractionAnswer,
}

/// Yes/no prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub player: PlayerId,
    pub prompt: String,
    pub fallback: InteractionAnswer,
}

/// Put a revealed set of cards in an order of the player's choosing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RearrangingCards {
    pub player: PlayerId,
    pub prompt: String,
    pub cards: Vec<CardId>,
    pub fallback: InteractionAnswer,
}

/// The one live interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "interaction", rename_all = "snake_case")]
pub enum InteractionContext {
    Idle,
    SelectingEntities(SelectingEntities),
    ChoosingCards(ChoosingCards),
    ChoosingAffinity(ChoosingAffinity),
    SelectingSlot(SelectingSlot),
    Question(Question),
    RearrangingCards(RearrangingCards),
}

/// Outcome of a partial selection
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    /// Selection changed; more picks (or an explicit commit) still needed
    Pending,
    /// Selection now satisfies the request; commit with this answer
    AutoCommit(InteractionAnswer),
}

impl InteractionContext {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionContext::Idle)
    }

    /// Player whose decision is awaited
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            InteractionContext::Idle => None,
            InteractionContext::SelectingEntities(c) => Some(c.player),
            InteractionContext::ChoosingCards(c) => Some(c.player),
            InteractionContext::ChoosingAffinity(c) => Some(c.player),
            InteractionContext::SelectingSlot(c) => Some(c.player),
            InteractionContext::Question(c) => Some(c.player),
            InteractionContext::RearrangingCards(c) => Some(c.player),
        }
    }

    /// The caller-supplied answer a watchdog commits on timeout
    pub fn fallback(&self) -> Option<InteractionAnswer> {
        match self {
            InteractionContext::Idle => None,
            InteractionContext::SelectingEntities(c) => Some(c.fallback.clone()),
            InteractionContext::ChoosingCards(c) => Some(c.fallback.clone()),
            InteractionContext::ChoosingAffinity(c) => Some(c.fallback.clone()),
            InteractionContext::SelectingSlot(c) => Some(c.fallback.clone()),
            InteractionContext::Question(c) => Some(c.fallback.clone()),
            InteractionContext::RearrangingCards(c) => Some(c.fallback.clone()),
        }
    }

    fn check_player(awaited: PlayerId, got: PlayerId) -> Result<()> {
        if awaited != got {
            return Err(EngineError::WrongPlayer {
                expected: awaited.as_u32(),
                got: got.as_u32(),
            });
        }
        Ok(())
    }

    fn check_cardinality(min: usize, max: usize, got: usize) -> Result<()> {
        if got < min {
            return Err(EngineError::NotEnoughChoices { min, got });
        }
        if got > max {
            return Err(EngineError::TooManyChoices { max, got });
        }
        Ok(())
    }

    /// Validate an answer against the open context without mutating it.
    /// The processor only tears the context down after this succeeds, so
    /// a bad answer leaves the interaction open for another try.
    pub fn validate_commit(&self, player: PlayerId, answer: &InteractionAnswer) -> Result<()> {
        match self {
            InteractionContext::Idle => Err(EngineError::NoOpenInteraction),

            InteractionContext::SelectingEntities(c) => {
                Self::check_player(c.player, player)?;
                let targets = match answer {
                    InteractionAnswer::Targets { targets } => targets,
                    _ => {
                        return Err(EngineError::InvalidCommand(
                            "entity selection expects a target list".to_string(),
                        ))
                    }
                };
                Self::check_cardinality(c.min, c.max, targets.len())?;
                for t in targets {
                    if !c.options.contains(t) {
                        return Err(EngineError::OutOfRangeChoice {
                            index: targets.iter().position(|x| x == t).unwrap_or(0),
                            limit: c.options.len(),
                        });
                    }
                }
                Ok(())
            }

            InteractionContext::ChoosingCards(c) => {
                Self::check_player(c.player, player)?;
                let indices = match answer {
                    InteractionAnswer::CardIndices { indices } => indices,
                    _ => {
                        return Err(EngineError::InvalidCommand(
                            "card choice expects a list of indices".to_string(),
                        ))
                    }
                };
                Self::check_cardinality(c.min, c.max, indices.len())?;
                for &idx in indices {
                    if idx >= c.options.len() {
                        return Err(EngineError::OutOfRangeChoice {
                            index: idx,
                            limit: c.options.len(),
                        });
                    }
                }
                if has_duplicates(indices) {
                    return Err(EngineError::InvalidCommand(
                        "card choice indices must be distinct".to_string(),
                    ));
                }
                Ok(())
            }

            InteractionContext::ChoosingAffinity(c) => {
                Self::check_player(c.player, player)?;
                match answer {
                    InteractionAnswer::Affinity { affinity } => {
                        if !c.options.contains(affinity) {
                            return Err(EngineError::InvalidCommand(format!(
                                "{} is not one of the offered affinities",
                                affinity
                            )));
                        }
                        Ok(())
                    }
                    _ => Err(EngineError::InvalidCommand(
                        "affinity choice expects an affinity".to_string(),
                    )),
                }
            }

            InteractionContext::SelectingSlot(c) => {
                Self::check_player(c.player, player)?;
                match answer {
                    InteractionAnswer::Slot { slot } => {
                        if !c.options.contains(slot) {
                            return Err(EngineError::OutOfRangeChoice {
                                index: *slot as usize,
                                limit: c.options.len(),
                            });
                        }
                        Ok(())
                    }
                    _ => Err(EngineError::InvalidCommand(
                        "slot selection expects a slot".to_string(),
                    )),
                }
            }

            InteractionContext::Question(c) => {
                Self::check_player(c.player, player)?;
                match answer {
                    InteractionAnswer::Bool { .. } => Ok(()),
                    _ => Err(EngineError::InvalidCommand(
                        "question expects a yes/no answer".to_string(),
                    )),
                }
            }

            InteractionContext::RearrangingCards(c) => {
                Self::check_player(c.player, player)?;
                let order = match answer {
                    InteractionAnswer::Arrangement { order } => order,
                    _ => {
                        return Err(EngineError::InvalidCommand(
                            "rearrangement expects an ordering".to_string(),
                        ))
                    }
                };
                if order.len() != c.cards.len() || has_duplicates(order) {
                    return Err(EngineError::InvalidCommand(
                        "ordering must be a permutation of the shown cards".to_string(),
                    ));
                }
                for &idx in order {
                    if idx >= c.cards.len() {
                        return Err(EngineError::OutOfRangeChoice {
                            index: idx,
                            limit: c.cards.len(),
                        });
                    }
                }
                Ok(())
            }
        }
    }

    /// Toggle one entity in a partial selection. Auto-commits once the
    /// selection reaches the requested maximum.
    pub fn select(&mut self, player: PlayerId, target: TargetRef) -> Result<SelectOutcome> {
        let c = match self {
            InteractionContext::SelectingEntities(c) => c,
            InteractionContext::Idle => return Err(EngineError::NoOpenInteraction),
            _ => {
                return Err(EngineError::InvalidCommand(
                    "the open interaction does not take entity picks".to_string(),
                ))
            }
        };
        Self::check_player(c.player, player)?;
        if !c.options.contains(&target) {
            return Err(EngineError::OutOfRangeChoice {
                index: 0,
                limit: c.options.len(),
            });
        }
        if let Some(pos) = c.selected.iter().position(|t| *t == target) {
            c.selected.remove(pos);
            return Ok(SelectOutcome::Pending);
        }
        if c.selected.len() >= c.max {
            return Err(EngineError::TooManyChoices {
                max: c.max,
                got: c.selected.len() + 1,
            });
        }
        c.selected.push(target);
        if c.selected.len() == c.max {
            Ok(SelectOutcome::AutoCommit(InteractionAnswer::Targets {
                targets: c.selected.clone(),
            }))
        } else {
            Ok(SelectOutcome::Pending)
        }
    }
}

fn has_duplicates(indices: &[usize]) -> bool {
    let mut seen = indices.to_vec();
    seen.sort_unstable();
    seen.windows(2).any(|w| w[0] == w[1])
}
