//! Read-only game access for decision agents
//!
//! Agents never touch the game directly. They get a [`GameView`] scoped
//! to one player plus the list of commands that player could submit
//! right now, and hand back at most one of them. The enumeration is
//! deterministic (same state, same order) so seeded agents replay.

use crate::core::{CardId, PlayerId};
use crate::game::command::CommandAction;
use crate::game::combat::CombatStep;
use crate::game::interaction::{InteractionAnswer, InteractionContext};
use crate::game::phase::PhaseKind;
use crate::game::state::{Game, SuspendReason};

/// Whose decision the engine is waiting on, if anyone's.
///
/// Transient phases (draw, end) advance on their own and game-end waits
/// on nobody.
pub fn deciding_player(game: &Game) -> Option<PlayerId> {
    if game.is_over() || game.halted {
        return None;
    }
    if let Some(suspension) = &game.suspension {
        return match suspension.reason {
            SuspendReason::AwaitingInteraction => game.interaction.player(),
            SuspendReason::ChainPriority => game.chain.as_ref().map(|chain| chain.priority()),
        };
    }
    match game.phase.kind() {
        PhaseKind::Main => Some(game.active_player()),
        PhaseKind::Attack => game.phase.combat().map(|combat| combat.attacking_player),
        _ => None,
    }
}

/// One player's window onto the game
pub struct GameView<'a> {
    game: &'a Game,
    player: PlayerId,
}

impl<'a> GameView<'a> {
    pub fn new(game: &'a Game, player: PlayerId) -> Self {
        GameView { game, player }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn hand(&self) -> Vec<CardId> {
        self.game
            .board
            .side(self.player)
            .map(|side| side.hand.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn mana(&self) -> u8 {
        self.game.player(self.player).map(|p| p.mana).unwrap_or(0)
    }

    pub fn turn_number(&self) -> u32 {
        self.game.turn.turn_number
    }

    /// Every command this player could submit right now. Empty when the
    /// decision belongs to someone else.
    pub fn available_commands(&self) -> Vec<CommandAction> {
        let game = self.game;
        if deciding_player(game) != Some(self.player) {
            return Vec::new();
        }

        if let Some(suspension) = &game.suspension {
            return match suspension.reason {
                SuspendReason::AwaitingInteraction => self.interaction_commands(),
                SuspendReason::ChainPriority => self.chain_commands(),
            };
        }

        match game.phase.kind() {
            PhaseKind::Main => self.main_phase_commands(),
            PhaseKind::Attack => self.attack_phase_commands(),
            _ => Vec::new(),
        }
    }

    /// Answers worth offering for the open interaction: every single
    /// choice where singles are legal, plus the fallback so there is
    /// always a way forward.
    fn interaction_commands(&self) -> Vec<CommandAction> {
        let mut out = Vec::new();
        match &self.game.interaction {
            InteractionContext::Idle => {}
            InteractionContext::SelectingEntities(ctx) => {
                for option in &ctx.options {
                    if !ctx.selected.contains(option) {
                        out.push(CommandAction::InteractionSelect { target: *option });
                    }
                }
                let picked = ctx.selected.len();
                if picked >= ctx.min && picked <= ctx.max {
                    out.push(CommandAction::InteractionCommit {
                        answer: InteractionAnswer::Targets {
                            targets: ctx.selected.clone(),
                        },
                    });
                }
                out.push(CommandAction::InteractionCommit {
                    answer: ctx.fallback.clone(),
                });
            }
            InteractionContext::ChoosingCards(ctx) => {
                if ctx.min <= 1 && ctx.max >= 1 {
                    for index in 0..ctx.options.len() {
                        out.push(CommandAction::InteractionCommit {
                            answer: InteractionAnswer::CardIndices {
                                indices: vec![index],
                            },
                        });
                    }
                }
                out.push(CommandAction::InteractionCommit {
                    answer: ctx.fallback.clone(),
                });
            }
            InteractionContext::ChoosingAffinity(ctx) => {
                for affinity in &ctx.options {
                    out.push(CommandAction::InteractionCommit {
                        answer: InteractionAnswer::Affinity {
                            affinity: *affinity,
                        },
                    });
                }
            }
            InteractionContext::SelectingSlot(ctx) => {
                for slot in &ctx.options {
                    out.push(CommandAction::InteractionCommit {
                        answer: InteractionAnswer::Slot { slot: *slot },
                    });
                }
            }
            InteractionContext::Question(_) => {
                for value in [true, false] {
                    out.push(CommandAction::InteractionCommit {
                        answer: InteractionAnswer::Bool { value },
                    });
                }
            }
            InteractionContext::RearrangingCards(ctx) => {
                let identity: Vec<usize> = (0..ctx.cards.len()).collect();
                let reversed: Vec<usize> = identity.iter().rev().copied().collect();
                out.push(CommandAction::InteractionCommit {
                    answer: InteractionAnswer::Arrangement { order: identity },
                });
                if ctx.cards.len() > 1 {
                    out.push(CommandAction::InteractionCommit {
                        answer: InteractionAnswer::Arrangement { order: reversed },
                    });
                }
            }
        }
        out
    }

    /// Passing is always on the table; responses need a fast card (or an
    /// attack card mid-combat) the player can pay for. The attacking
    /// player can also lock in a combat target through an open trigger
    /// chain.
    fn chain_commands(&self) -> Vec<CommandAction> {
        let game = self.game;
        let mut out = Vec::new();

        let combat_open = game.phase.kind() == PhaseKind::Attack;
        for card_id in self.hand() {
            let Ok(card) = game.cards.get(card_id) else {
                continue;
            };
            let playable = card.is_fast_spell() || (card.is_attack_card() && combat_open);
            if playable && self.can_afford(card.cost) {
                out.push(CommandAction::AddResponse {
                    card: card_id,
                    targets: Vec::new(),
                });
            }
        }

        if let Some(combat) = game.phase.combat() {
            if combat.step() == CombatStep::DeclareTarget
                && combat.attacking_player == self.player
            {
                out.extend(self.target_declarations(combat.attacker()));
            }
        }

        out.push(CommandAction::PassChain);
        out
    }

    fn main_phase_commands(&self) -> Vec<CommandAction> {
        let game = self.game;
        let mut out = Vec::new();

        for card_id in self.hand() {
            let Ok(card) = game.cards.get(card_id) else {
                continue;
            };
            if card.is_attack_card() || !self.can_afford(card.cost) {
                continue;
            }
            // Slot and targets left open; the engine asks via an
            // interaction when the play needs them.
            out.push(CommandAction::PlayCard {
                card: card_id,
                slot: None,
                targets: Vec::new(),
            });
        }

        for attacker in self.ready_attackers() {
            out.push(CommandAction::DeclareAttacker { attacker });
        }

        out.push(CommandAction::EndTurn);
        out
    }

    fn attack_phase_commands(&self) -> Vec<CommandAction> {
        let game = self.game;
        let mut out = Vec::new();
        if let Some(combat) = game.phase.combat() {
            if combat.step() == CombatStep::DeclareTarget {
                out.extend(self.target_declarations(combat.attacker()));
            }
        }
        out.push(CommandAction::CancelAttack);
        out
    }

    /// Enemy minions and the enemy hero still on the board
    fn target_declarations(&self, attacker: Option<CardId>) -> Vec<CommandAction> {
        let game = self.game;
        let Some(attacker) = attacker else {
            return Vec::new();
        };
        let Ok(attacker_card) = game.cards.get(attacker) else {
            return Vec::new();
        };
        let enemy = game.opponent_of(attacker_card.controller);

        let mut out = Vec::new();
        if let Ok(player) = game.player(enemy) {
            if game.is_on_board(player.hero) {
                out.push(CommandAction::DeclareAttackTarget {
                    target: player.hero,
                });
            }
        }
        if let Ok(side) = game.board.side(enemy) {
            for minion in side.minions() {
                out.push(CommandAction::DeclareAttackTarget { target: minion });
            }
        }
        out
    }

    /// Board cards of this player that could open combat right now
    fn ready_attackers(&self) -> Vec<CardId> {
        let game = self.game;
        let mut candidates = Vec::new();
        if let Ok(player) = game.player(self.player) {
            candidates.push(player.hero);
        }
        if let Ok(side) = game.board.side(self.player) {
            candidates.extend(side.minions());
        }
        candidates
            .into_iter()
            .filter(|id| {
                let Ok(card) = game.cards.get(*id) else {
                    return false;
                };
                !card.exhausted
                    && game.is_on_board(*id)
                    && game.effective_power(*id).map(|p| p > 0).unwrap_or(false)
            })
            .collect()
    }

    fn can_afford(&self, cost: u8) -> bool {
        self.mana() >= cost
    }
}
