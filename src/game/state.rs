//! Main game state structure and the execution core
//!
//! `Game` owns every entity store plus the live phase, chain, interaction
//! and suspension contexts. Commands call into the verbs here; after any
//! verb runs, `run_until_quiescent` drives auto-advancing phases, pending
//! sigil triggers and chain resolution until the game either settles at a
//! point where it needs player input or ends.

/// Conditional logging that avoids allocation when the feature is disabled
///
/// With verbose-logging off this is a no-op at compile time, eliminating
/// the format! allocations on the hot replay path.
macro_rules! log_if_verbose {
    ($self:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $self.logger.verbose(&format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$self; // Suppress unused variable warning
        }
    };
}

use crate::blueprint::{registry, EffectContext, Flow};
use crate::board::{Board, ZoneKind};
use crate::core::{
    modifier, BlueprintId, Card, CardId, CardKind, EntityStore, Expiry, GameEvent, IdGenerator,
    Modifier, ModifierEffect, ModifierId, Player, PlayerId, PlayerName, TargetFilter, TargetRef,
    TargetSpec,
};
use crate::game::chain::{Chain, ChainCallback, ChainEffect, ChainState, EffectKind};
use crate::game::combat::{CombatState, CombatStep};
use crate::game::interaction::{
    InteractionAnswer, InteractionContext, SelectOutcome, SelectingEntities, SelectingSlot,
};
use crate::game::logger::GameLogger;
use crate::game::phase::{PhaseContext, PhaseKind, TurnStructure};
use crate::{EngineError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::collections::VecDeque;

/// Fixed parameters of a game instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Seed for the game RNG; same seed + same commands = same game
    pub seed: u64,

    /// Minion slots per player
    pub slots_per_player: u8,

    /// Mana ramp ceiling
    pub mana_cap: u8,

    /// Cards drawn before the first turn
    pub opening_hand: u8,

    /// Hero starting hit points
    pub hero_hp: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            seed: 0,
            slots_per_player: 6,
            mana_cap: 10,
            opening_hand: 4,
            hero_hp: 25,
        }
    }
}

/// Why execution stopped at a quiescent point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspendReason {
    /// An interaction awaits a commit
    AwaitingInteraction,
    /// The chain's building window awaits a response or a pass
    ChainPriority,
}

/// Where execution picks back up once the awaited input arrives
///
/// Pure data: a suspended game serializes and reloads cleanly, with no
/// captured closures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "resume", rename_all = "snake_case")]
pub enum ResumePoint {
    /// A card play is waiting on a slot choice
    PlayCardSlot {
        player: PlayerId,
        card: CardId,
        targets: Vec<TargetRef>,
    },
    /// A card play is waiting on target selection
    PlayCardTargets {
        player: PlayerId,
        card: CardId,
        slot: Option<u8>,
    },
    /// An effect handler parked mid-resolution; `stage` is its next step
    EffectStage { effect: ChainEffect, stage: u8 },
}

/// The explicit "paused awaiting input" state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suspension {
    pub reason: SuspendReason,

    /// Monotonic token; a commit resumes the suspension it was issued for
    pub token: u64,

    /// Present for interaction suspensions; chain-priority suspensions
    /// resume through chain commands instead
    pub resume: Option<ResumePoint>,
}

/// A sigil reaction waiting for a chain to carry it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTrigger {
    pub sigil: CardId,
    pub controller: PlayerId,
    pub targets: SmallVec<[TargetRef; 2]>,
}

/// Complete game state
///
/// The central structure holding all game information, designed to be
/// serializable end to end for snapshots and replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub config: GameConfig,

    /// All card instances in the game
    pub cards: EntityStore<Card>,

    /// Both players, in seat order
    pub players: Vec<Player>,

    /// All modifiers, attached or recently expired entries removed
    pub modifiers: EntityStore<Modifier>,

    pub board: Board,

    pub turn: TurnStructure,

    /// The single live phase context
    pub phase: PhaseContext,

    /// The live chain, while one is open
    pub chain: Option<Chain>,

    /// The single live interaction context
    pub interaction: InteractionContext,

    pub suspension: Option<Suspension>,

    next_resume_token: u64,

    /// Append-only event log; snapshot updates carry slices of it
    pub events: Vec<GameEvent>,

    /// Sigil reactions queued for the next free chain
    pending_triggers: VecDeque<PendingTrigger>,

    /// Unified entity ID generator (shared across all entity types)
    ids: IdGenerator,

    /// Game RNG, serialized with its current position so a loaded game
    /// continues exactly where the original left off. RefCell so
    /// read-only views can still draw random numbers through it.
    pub rng: RefCell<ChaCha12Rng>,

    pub logger: GameLogger,

    /// Latched by a fatal error; a halted game rejects everything
    pub halted: bool,
}

impl Game {
    /// Create a two-player game with heroes on the board and empty zones.
    /// Decks and opening hands are the initializer's job.
    pub fn new(
        config: GameConfig,
        names: [PlayerName; 2],
        hero_blueprints: [BlueprintId; 2],
    ) -> Result<Self> {
        let mut ids = IdGenerator::new();
        let seed = config.seed;

        let p0: PlayerId = ids.next();
        let p1: PlayerId = ids.next();

        let mut cards = EntityStore::new();
        let mut players = Vec::with_capacity(2);
        for (player_id, (name, hero_bp)) in [p0, p1]
            .into_iter()
            .zip(names.into_iter().zip(hero_blueprints.into_iter()))
        {
            let bp = registry().get(&hero_bp)?;
            let hero_id: CardId = ids.next();
            let mut hero = bp.instantiate(hero_id, player_id);
            if let CardKind::Hero { hp, max_hp, .. } = &mut hero.kind {
                *hp = config.hero_hp;
                *max_hp = config.hero_hp;
            } else {
                return Err(EngineError::InvalidCommand(format!(
                    "{} is not a hero blueprint",
                    hero_bp
                )));
            }
            cards.insert(hero_id, hero);
            players.push(Player::new(player_id, name, hero_id));
        }

        let board = Board::new(&[p0, p1], config.slots_per_player as usize);

        Ok(Game {
            config,
            cards,
            players,
            modifiers: EntityStore::new(),
            board,
            turn: TurnStructure::new(p0),
            phase: PhaseContext::Draw,
            chain: None,
            interaction: InteractionContext::Idle,
            suspension: None,
            next_resume_token: 0,
            events: Vec::new(),
            pending_triggers: VecDeque::new(),
            ids,
            rng: RefCell::new(ChaCha12Rng::seed_from_u64(seed)),
            logger: GameLogger::new(),
            halted: false,
        })
    }

    // ------------------------------------------------------------------
    // Lookup helpers
    // ------------------------------------------------------------------

    pub fn player_ids(&self) -> [PlayerId; 2] {
        [self.players[0].id, self.players[1].id]
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .ok_or(EngineError::EntityNotFound(id.as_u32()))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(EngineError::EntityNotFound(id.as_u32()))
    }

    pub fn opponent_of(&self, id: PlayerId) -> PlayerId {
        let [a, b] = self.player_ids();
        if id == a {
            b
        } else {
            a
        }
    }

    pub fn active_player(&self) -> PlayerId {
        self.turn.active_player
    }

    /// Which zone holds a card. Heroes count as board cards while alive.
    pub fn zone_of(&self, card: CardId) -> Option<(PlayerId, ZoneKind)> {
        for p in &self.players {
            if p.hero == card {
                return Some((p.id, ZoneKind::Board));
            }
        }
        self.board.zone_of(card)
    }

    pub fn is_on_board(&self, card: CardId) -> bool {
        matches!(self.zone_of(card), Some((_, ZoneKind::Board)))
    }

    pub fn next_card_id(&mut self) -> CardId {
        self.ids.next()
    }

    pub fn next_modifier_id(&mut self) -> ModifierId {
        self.ids.next()
    }

    /// Instantiate a blueprint into the owner's deck
    pub fn add_deck_card(&mut self, owner: PlayerId, blueprint: &BlueprintId) -> Result<CardId> {
        let bp = registry().get(blueprint)?;
        let id = self.next_card_id();
        let card = bp.instantiate(id, owner);
        self.cards.insert(id, card);
        self.board.side_mut(owner)?.deck.push_top(id);
        Ok(id)
    }

    pub fn shuffle_deck(&mut self, player: PlayerId) -> Result<()> {
        let rng = &mut *self.rng.borrow_mut();
        self.board.side_mut(player)?.deck.shuffle(rng);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Derived stats (the modifier pipeline)
    // ------------------------------------------------------------------

    fn modifiers_of(&self, card: &Card) -> Vec<&Modifier> {
        card.modifiers
            .iter()
            .filter_map(|m| self.modifiers.get(*m).ok())
            .collect()
    }

    pub fn effective_power(&self, card_id: CardId) -> Result<i32> {
        let card = self.cards.get(card_id)?;
        let base = card.power().unwrap_or(0);
        Ok(modifier::effective_power(
            base,
            self.modifiers_of(card).into_iter(),
        ))
    }

    pub fn is_preemptive(&self, card_id: CardId) -> Result<bool> {
        let card = self.cards.get(card_id)?;
        Ok(modifier::is_preemptive(self.modifiers_of(card).into_iter()))
    }

    pub fn retaliation_disabled(&self, card_id: CardId) -> Result<bool> {
        let card = self.cards.get(card_id)?;
        Ok(modifier::retaliation_disabled(
            self.modifiers_of(card).into_iter(),
        ))
    }

    // ------------------------------------------------------------------
    // Events and triggers
    // ------------------------------------------------------------------

    /// Append an event to the log, narrate it, and let board sigils react
    pub fn emit(&mut self, event: GameEvent) {
        self.narrate(&event);

        let mut fired: Vec<PendingTrigger> = Vec::new();
        for (_player, side) in self.board.sides() {
            for &card_id in &side.support {
                let card = match self.cards.get(card_id) {
                    Ok(c) => c,
                    Err(_) => continue,
                };
                if !card.is_sigil() {
                    continue;
                }
                let bp = match registry().get(&card.blueprint) {
                    Ok(bp) => bp,
                    Err(_) => continue,
                };
                if let Some(targets) = bp.trigger_targets(self, card, &event) {
                    fired.push(PendingTrigger {
                        sigil: card_id,
                        controller: card.controller,
                        targets,
                    });
                }
            }
        }
        self.pending_triggers.extend(fired);
        self.events.push(event);
    }

    fn narrate(&self, event: &GameEvent) {
        match event {
            GameEvent::TurnStarted { player, turn } => {
                let name = self
                    .player(*player)
                    .map(|p| p.name.to_string())
                    .unwrap_or_default();
                self.logger
                    .normal(&format!("=== Turn {} ({}) ===", turn, name));
            }
            GameEvent::GameEnded { winner } => match winner {
                Some(w) => {
                    let name = self
                        .player(*w)
                        .map(|p| p.name.to_string())
                        .unwrap_or_default();
                    self.logger.minimal(&format!("Game over: {} wins", name));
                }
                None => self.logger.minimal("Game over: draw"),
            },
            GameEvent::CardPlayed { card, .. } => {
                if let Ok(c) = self.cards.get(*card) {
                    self.logger.normal(&format!("{} is played", c.name));
                }
            }
            GameEvent::DamageDealt {
                source,
                target,
                amount,
            } => {
                log_if_verbose!(
                    self,
                    "card {} deals {} damage to card {}",
                    source,
                    amount,
                    target
                );
            }
            other => {
                log_if_verbose!(self, "event: {:?}", other);
            }
        }
    }

    // ------------------------------------------------------------------
    // Phase machine
    // ------------------------------------------------------------------

    /// Validated phase transition with exit and entry hooks.
    /// Illegal transitions are engine bugs and come back fatal.
    pub fn send_transition(&mut self, to: PhaseKind) -> Result<()> {
        let from = self.phase.kind();
        if !from.can_transition_to(to) {
            return Err(EngineError::WrongPhaseTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        self.exit_phase(from)?;
        self.emit(GameEvent::PhaseExited { phase: from });

        // The end-of-turn wrap hands the next turn to the opponent
        if from == PhaseKind::End && to == PhaseKind::Draw {
            let next = self.opponent_of(self.turn.active_player);
            self.turn.wrap_to(next);
            self.emit(GameEvent::TurnStarted {
                player: next,
                turn: self.turn.turn_number,
            });
        }

        self.phase = match to {
            PhaseKind::Draw => PhaseContext::Draw,
            PhaseKind::Main => PhaseContext::Main,
            PhaseKind::Attack => PhaseContext::Attack {
                combat: CombatState::new(self.turn.active_player),
            },
            PhaseKind::End => PhaseContext::End,
            PhaseKind::GameEnd => {
                return Err(EngineError::CorruptState(
                    "game end must go through end_game".to_string(),
                ))
            }
        };

        self.emit(GameEvent::PhaseEntered { phase: to });
        self.enter_phase(to)?;
        Ok(())
    }

    fn exit_phase(&mut self, from: PhaseKind) -> Result<()> {
        if from == PhaseKind::Attack {
            self.expire_modifiers(|m| m.expiry == Expiry::EndOfCombat)?;
        }
        Ok(())
    }

    fn enter_phase(&mut self, to: PhaseKind) -> Result<()> {
        match to {
            PhaseKind::Draw => {
                let active = self.turn.active_player;
                let mana_cap = self.config.mana_cap;
                self.player_mut(active)?.ramp_and_refill(mana_cap);
                self.ready_cards_of(active)?;
                self.draw_card(active)?;
            }
            PhaseKind::End => {
                self.expire_modifiers(|m| m.expiry == Expiry::EndOfTurn)?;
                self.tick_artifacts(self.turn.active_player)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn ready_cards_of(&mut self, player: PlayerId) -> Result<()> {
        let mut to_ready: Vec<CardId> = self.board.side(player)?.minions();
        to_ready.push(self.player(player)?.hero);
        for card_id in to_ready {
            self.cards.get_mut(card_id)?.ready();
        }
        Ok(())
    }

    pub fn draw_card(&mut self, player: PlayerId) -> Result<Option<CardId>> {
        let drawn = self.board.side_mut(player)?.deck.draw_top();
        match drawn {
            Some(card) => {
                self.board.side_mut(player)?.hand.push_top(card);
                self.emit(GameEvent::CardDrawn {
                    player,
                    card: Some(card),
                });
                Ok(Some(card))
            }
            None => {
                self.emit(GameEvent::DeckEmpty { player });
                Ok(None)
            }
        }
    }

    /// End the game. Always a legal transition; tears down any open
    /// chain, interaction or suspension.
    pub fn end_game(&mut self, winner: Option<PlayerId>) {
        if self.phase.kind() == PhaseKind::GameEnd {
            return;
        }
        self.phase = PhaseContext::GameEnd { winner };
        self.chain = None;
        self.interaction = InteractionContext::Idle;
        self.suspension = None;
        self.pending_triggers.clear();
        self.emit(GameEvent::PhaseEntered {
            phase: PhaseKind::GameEnd,
        });
        self.emit(GameEvent::GameEnded { winner });
    }

    pub fn is_over(&self) -> bool {
        self.phase.kind() == PhaseKind::GameEnd
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match &self.phase {
            PhaseContext::GameEnd { winner } => *winner,
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Modifiers
    // ------------------------------------------------------------------

    pub fn attach_modifier(
        &mut self,
        host: CardId,
        source: CardId,
        name: &str,
        effect: ModifierEffect,
        expiry: Expiry,
    ) -> Result<ModifierId> {
        let id = self.next_modifier_id();
        let m = Modifier::new(id, name, host, source, effect, expiry);
        self.modifiers.insert(id, m);
        self.cards.get_mut(host)?.modifiers.push(id);
        if let ModifierEffect::AddMaxHp { amount } = effect {
            self.adjust_max_hp(host, amount)?;
        }
        self.emit(GameEvent::ModifierAttached { modifier: id, host });
        Ok(id)
    }

    fn adjust_max_hp(&mut self, card_id: CardId, amount: i32) -> Result<()> {
        let card = self.cards.get_mut(card_id)?;
        if let CardKind::Minion { hp, max_hp, .. } | CardKind::Hero { hp, max_hp, .. } =
            &mut card.kind
        {
            *max_hp += amount;
            if amount > 0 {
                *hp += amount;
            }
            if *hp > *max_hp {
                *hp = *max_hp;
            }
        }
        Ok(())
    }

    fn expire_modifiers(&mut self, predicate: impl Fn(&Modifier) -> bool) -> Result<()> {
        let expired: Vec<(ModifierId, CardId, ModifierEffect)> = self
            .modifiers
            .ids_sorted()
            .into_iter()
            .filter_map(|id| {
                let m = self.modifiers.get(id).ok()?;
                predicate(m).then(|| (id, m.host, m.effect))
            })
            .collect();

        for (id, host, effect) in expired {
            self.modifiers.remove(id);
            if let Ok(card) = self.cards.get_mut(host) {
                card.modifiers.retain(|m| *m != id);
            }
            if let ModifierEffect::AddMaxHp { amount } = effect {
                self.adjust_max_hp(host, -amount)?;
            }
            self.emit(GameEvent::ModifierExpired { modifier: id, host });
        }
        Ok(())
    }

    /// Drop every modifier attached to a card that left the board.
    /// Support cards also take the modifiers they granted with them.
    fn strip_modifiers(&mut self, card_id: CardId) -> Result<()> {
        let is_support = self
            .cards
            .get(card_id)
            .map(|c| c.is_artifact() || c.is_sigil())
            .unwrap_or(false);
        self.expire_modifiers(move |m| m.host == card_id || (is_support && m.source == card_id))
    }

    /// End-of-turn wear on the active player's artifacts
    fn tick_artifacts(&mut self, player: PlayerId) -> Result<()> {
        let artifacts: Vec<CardId> = self
            .board
            .side(player)?
            .support
            .iter()
            .copied()
            .filter(|id| {
                self.cards
                    .get(*id)
                    .map(|c| c.is_artifact())
                    .unwrap_or(false)
            })
            .collect();

        for id in artifacts {
            let broke = {
                let card = self.cards.get_mut(id)?;
                if let CardKind::Artifact { durability } = &mut card.kind {
                    *durability = durability.saturating_sub(1);
                    *durability == 0
                } else {
                    false
                }
            };
            if broke {
                self.move_to_discard(id)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Zone movement
    // ------------------------------------------------------------------

    pub fn move_to_discard(&mut self, card_id: CardId) -> Result<()> {
        self.strip_modifiers(card_id)?;
        self.board.detach(card_id);
        let owner = self.cards.get(card_id)?.owner;
        self.board.side_mut(owner)?.discard.push_top(card_id);
        self.emit(GameEvent::CardDiscarded { card: card_id });
        Ok(())
    }

    pub fn move_to_banish(&mut self, card_id: CardId) -> Result<()> {
        self.strip_modifiers(card_id)?;
        self.board.detach(card_id);
        let owner = self.cards.get(card_id)?.owner;
        self.board.side_mut(owner)?.banish.push_top(card_id);
        self.emit(GameEvent::CardBanished { card: card_id });
        Ok(())
    }

    /// Deal damage from one card to another and log it
    pub fn deal_damage(&mut self, source: CardId, target: CardId, amount: i32) -> Result<()> {
        if amount <= 0 {
            return Ok(());
        }
        let dealt = self.cards.get_mut(target)?.take_damage(amount);
        self.emit(GameEvent::DamageDealt {
            source,
            target,
            amount: dealt,
        });
        Ok(())
    }

    pub fn heal(&mut self, source: CardId, target: CardId, amount: i32) -> Result<()> {
        let restored = self.cards.get_mut(target)?.heal(amount);
        if restored > 0 {
            self.emit(GameEvent::Healed {
                source,
                target,
                amount: restored,
            });
        }
        Ok(())
    }

    /// Sweep dead minions to discard and check hero deaths. Ends the game
    /// when a hero dies.
    pub fn check_state_based(&mut self) -> Result<()> {
        // Dead minions leave the board in slot order
        let mut dead: Vec<CardId> = Vec::new();
        for (_player, side) in self.board.sides() {
            for card_id in side.minions() {
                if self.cards.get(card_id)?.is_dead() {
                    dead.push(card_id);
                }
            }
        }
        for card_id in dead {
            self.emit(GameEvent::CardDied { card: card_id });
            self.move_to_discard(card_id)?;
        }

        let mut losers: Vec<PlayerId> = Vec::new();
        for p in &self.players {
            let hero = self.cards.get(p.hero)?;
            if hero.is_dead() && !p.has_lost {
                losers.push(p.id);
            }
        }
        for id in &losers {
            self.player_mut(*id)?.has_lost = true;
            self.emit(GameEvent::HeroDied { player: *id });
        }
        if !losers.is_empty() {
            let survivors: Vec<PlayerId> = self
                .players
                .iter()
                .filter(|p| !p.has_lost)
                .map(|p| p.id)
                .collect();
            let winner = match survivors.as_slice() {
                [one] => Some(*one),
                _ => None,
            };
            self.end_game(winner);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Suspension and interactions
    // ------------------------------------------------------------------

    fn issue_token(&mut self) -> u64 {
        let token = self.next_resume_token;
        self.next_resume_token += 1;
        token
    }

    fn open_interaction(
        &mut self,
        context: InteractionContext,
        resume: Option<ResumePoint>,
    ) -> Result<()> {
        if !self.interaction.is_idle() {
            return Err(EngineError::CorruptState(
                "an interaction is already open".to_string(),
            ));
        }
        let player = context.player().ok_or_else(|| {
            EngineError::CorruptState("cannot open an idle interaction".to_string())
        })?;

        // Cards shown by choice/rearrange contexts are revealed to the
        // deciding player
        let shown: Vec<CardId> = match &context {
            InteractionContext::ChoosingCards(c) => c.options.clone(),
            InteractionContext::RearrangingCards(c) => c.cards.clone(),
            _ => Vec::new(),
        };
        for card in shown {
            self.emit(GameEvent::CardRevealed { card, to: player });
        }

        self.interaction = context;
        let token = self.issue_token();
        self.suspension = Some(Suspension {
            reason: SuspendReason::AwaitingInteraction,
            token,
            resume,
        });
        self.emit(GameEvent::InteractionOpened { player });
        Ok(())
    }

    /// Effect handlers call this to park on a decision, then return
    /// `Flow::Suspend`; the chain driver points the resume at the stage
    /// the handler asked for.
    pub fn request_decision(&mut self, context: InteractionContext) -> Result<()> {
        self.open_interaction(context, None)
    }

    /// Partial entity pick; commits automatically when the selection
    /// satisfies the request.
    pub fn interaction_select(&mut self, player: PlayerId, target: TargetRef) -> Result<()> {
        match self.interaction.select(player, target)? {
            SelectOutcome::Pending => Ok(()),
            SelectOutcome::AutoCommit(answer) => self.commit_interaction(player, answer),
        }
    }

    /// Validate an answer against the open interaction, tear it down and
    /// resume the parked execution.
    pub fn commit_interaction(
        &mut self,
        player: PlayerId,
        answer: InteractionAnswer,
    ) -> Result<()> {
        self.interaction.validate_commit(player, &answer)?;

        let suspension = self.suspension.take().ok_or_else(|| {
            EngineError::CorruptState("interaction open without a suspension".to_string())
        })?;
        let resume = suspension.resume.ok_or_else(|| {
            EngineError::CorruptState("interaction suspension without a resume point".to_string())
        })?;

        self.interaction = InteractionContext::Idle;
        self.emit(GameEvent::InteractionCommitted { player });
        self.resume(resume, answer)?;
        self.run_until_quiescent()
    }

    /// Timeout path: commit the open interaction with its fallback answer
    pub fn commit_fallback(&mut self) -> Result<()> {
        let (player, answer) = match (self.interaction.player(), self.interaction.fallback()) {
            (Some(p), Some(a)) => (p, a),
            _ => return Err(EngineError::NoOpenInteraction),
        };
        self.commit_interaction(player, answer)
    }

    fn resume(&mut self, resume: ResumePoint, answer: InteractionAnswer) -> Result<()> {
        match resume {
            ResumePoint::PlayCardSlot {
                player,
                card,
                targets,
            } => {
                let slot = match answer {
                    InteractionAnswer::Slot { slot } => slot,
                    _ => {
                        return Err(EngineError::CorruptState(
                            "slot resume got a non-slot answer".to_string(),
                        ))
                    }
                };
                self.continue_play(player, card, Some(slot), targets)
            }
            ResumePoint::PlayCardTargets { player, card, slot } => {
                let targets = match answer {
                    InteractionAnswer::Targets { targets } => targets,
                    _ => {
                        return Err(EngineError::CorruptState(
                            "target resume got a non-target answer".to_string(),
                        ))
                    }
                };
                self.launch_play(player, card, slot, targets)
            }
            ResumePoint::EffectStage { effect, stage } => {
                self.run_effect(effect, stage, Some(answer))
            }
        }
    }

    // ------------------------------------------------------------------
    // Playing cards
    // ------------------------------------------------------------------

    /// Entry point for the play-card command (main phase, no open chain)
    pub fn begin_play_card(
        &mut self,
        player: PlayerId,
        card_id: CardId,
        slot: Option<u8>,
        targets: Vec<TargetRef>,
    ) -> Result<()> {
        if self.phase.kind() != PhaseKind::Main {
            return Err(EngineError::Rule(format!(
                "cards are played in the main phase, not {}",
                self.phase.kind()
            )));
        }
        if self.chain.is_some() {
            return Err(EngineError::Rule(
                "a chain is open; respond or pass instead".to_string(),
            ));
        }
        if player != self.turn.active_player {
            return Err(EngineError::WrongPlayer {
                expected: self.turn.active_player.as_u32(),
                got: player.as_u32(),
            });
        }
        self.validate_in_hand(player, card_id)?;
        {
            let card = self.cards.get(card_id)?;
            if card.is_attack_card() {
                return Err(EngineError::Rule(
                    "attack cards are responses to combat, not main-phase plays".to_string(),
                ));
            }
        }
        self.check_play_cost_and_rules(player, card_id)?;
        self.continue_play(player, card_id, slot, targets)?;
        self.run_until_quiescent()
    }

    /// Entry point for chaining a response onto the open chain
    pub fn add_response(
        &mut self,
        player: PlayerId,
        card_id: CardId,
        targets: Vec<TargetRef>,
    ) -> Result<()> {
        let chain = self.chain.as_ref().ok_or_else(|| {
            EngineError::Rule("no chain is open to respond to".to_string())
        })?;
        if !chain.is_building() {
            return Err(EngineError::Rule(
                "the response window has closed".to_string(),
            ));
        }
        if chain.priority() != player {
            return Err(EngineError::NoPriority(player.as_u32()));
        }
        self.validate_in_hand(player, card_id)?;
        {
            let card = self.cards.get(card_id)?;
            let combat_open = matches!(self.phase, PhaseContext::Attack { .. });
            let playable = card.is_fast_spell() || (card.is_attack_card() && combat_open);
            if !playable {
                return Err(EngineError::Rule(format!(
                    "{} cannot be played as a response",
                    card.name
                )));
            }
        }
        self.check_play_cost_and_rules(player, card_id)?;
        self.continue_play(player, card_id, None, targets)?;
        self.run_until_quiescent()
    }

    fn validate_in_hand(&self, player: PlayerId, card_id: CardId) -> Result<()> {
        let card = self.cards.get(card_id)?;
        if card.owner != player {
            return Err(EngineError::WrongPlayer {
                expected: card.owner.as_u32(),
                got: player.as_u32(),
            });
        }
        if !self.board.side(player)?.hand.contains(card_id) {
            return Err(EngineError::Rule(format!("{} is not in hand", card.name)));
        }
        Ok(())
    }

    fn check_play_cost_and_rules(&self, player: PlayerId, card_id: CardId) -> Result<()> {
        let card = self.cards.get(card_id)?;
        if !self.player(player)?.can_pay(card.cost) {
            return Err(EngineError::Rule(format!(
                "not enough mana for {} (cost {})",
                card.name, card.cost
            )));
        }
        // Blueprint domain validation happens before any mutation
        registry().get(&card.blueprint)?.can_play(self, player)
    }

    /// Resolve missing slot/target decisions, suspending where needed,
    /// then hand over to launch_play.
    fn continue_play(
        &mut self,
        player: PlayerId,
        card_id: CardId,
        slot: Option<u8>,
        targets: Vec<TargetRef>,
    ) -> Result<()> {
        let (is_minion, blueprint) = {
            let card = self.cards.get(card_id)?;
            (card.is_minion(), card.blueprint.clone())
        };

        // Minions need a slot; ask when the command didn't carry one
        let slot = if is_minion {
            match slot {
                Some(s) => {
                    if !self.board.side(player)?.slot_is_free(s) {
                        return Err(EngineError::Rule(format!("slot {} is not free", s)));
                    }
                    Some(s)
                }
                None => {
                    let free: Vec<u8> = self.free_slots(player)?;
                    match free.as_slice() {
                        [] => {
                            return Err(EngineError::Rule(
                                "no free minion slots".to_string(),
                            ))
                        }
                        [only] => Some(*only),
                        _ => {
                            let fallback = InteractionAnswer::Slot { slot: free[0] };
                            let context = InteractionContext::SelectingSlot(SelectingSlot {
                                player,
                                prompt: "Choose a slot".to_string(),
                                options: free,
                                fallback,
                            });
                            return self.open_interaction(
                                context,
                                Some(ResumePoint::PlayCardSlot {
                                    player,
                                    card: card_id,
                                    targets,
                                }),
                            );
                        }
                    }
                }
            }
        } else {
            None
        };

        // Pre-response targets come from the blueprint's target spec
        let spec = registry().get(&blueprint)?.pre_response_targets();
        match spec {
            TargetSpec::None => self.launch_play(player, card_id, slot, targets),
            TargetSpec::Entities { min, max, filter } => {
                let options = self.legal_targets(player, filter);
                if options.len() < min {
                    return Err(EngineError::Rule(
                        "no legal targets for that card".to_string(),
                    ));
                }
                if !targets.is_empty() {
                    // Inline targets (agents and replays) validate against
                    // the same option list the interaction would offer
                    if targets.len() < min {
                        return Err(EngineError::NotEnoughChoices {
                            min,
                            got: targets.len(),
                        });
                    }
                    if targets.len() > max {
                        return Err(EngineError::TooManyChoices {
                            max,
                            got: targets.len(),
                        });
                    }
                    for t in &targets {
                        if !options.contains(t) {
                            return Err(EngineError::Rule(
                                "illegal target for that card".to_string(),
                            ));
                        }
                    }
                    return self.launch_play(player, card_id, slot, targets);
                }
                let fallback = InteractionAnswer::Targets {
                    targets: options.iter().take(min).copied().collect(),
                };
                let prompt = {
                    let card = self.cards.get(card_id)?;
                    format!("Choose targets for {}", card.name)
                };
                let context = InteractionContext::SelectingEntities(SelectingEntities {
                    player,
                    prompt,
                    options,
                    min,
                    max,
                    selected: Vec::new(),
                    fallback,
                });
                self.open_interaction(
                    context,
                    Some(ResumePoint::PlayCardTargets {
                        player,
                        card: card_id,
                        slot,
                    }),
                )
            }
        }
    }

    pub fn free_slots(&self, player: PlayerId) -> Result<Vec<u8>> {
        let side = self.board.side(player)?;
        Ok((0..side.slots.len() as u8)
            .filter(|s| side.slot_is_free(*s))
            .collect())
    }

    /// Board entities matching a filter, in deterministic order: each
    /// player's hero then slots, lower player id first.
    pub fn legal_targets(&self, actor: PlayerId, filter: TargetFilter) -> Vec<TargetRef> {
        let mut out = Vec::new();
        for p in &self.players {
            let mut candidates = vec![p.hero];
            if let Ok(side) = self.board.side(p.id) {
                candidates.extend(side.minions());
            }
            for card_id in candidates {
                if let Ok(card) = self.cards.get(card_id) {
                    if !card.is_dead() && filter.card_matches(card, actor) {
                        out.push(TargetRef::card(card_id));
                    }
                }
            }
        }
        out
    }

    /// The single mutation point of a card play: pay, leave hand, chain
    /// the effect.
    fn launch_play(
        &mut self,
        player: PlayerId,
        card_id: CardId,
        slot: Option<u8>,
        targets: Vec<TargetRef>,
    ) -> Result<()> {
        let cost = self.cards.get(card_id)?.cost;
        self.player_mut(player)?.pay(cost)?;

        // The card sits on the chain, outside any zone, until it resolves
        self.board.detach(card_id);
        self.emit(GameEvent::CardPlayed {
            player,
            card: card_id,
        });

        let opened = if self.chain.is_none() {
            self.chain = Some(Chain::new(self.player_ids(), player));
            true
        } else {
            false
        };
        if opened {
            self.emit(GameEvent::ChainOpened);
        }

        let chain = self
            .chain
            .as_mut()
            .ok_or_else(|| EngineError::CorruptState("chain vanished during play".to_string()))?;
        let index = chain.add_effect(
            player,
            EffectKind::Play { slot },
            card_id,
            targets.into_iter().collect(),
        )?;
        self.emit(GameEvent::EffectChained {
            index,
            source: card_id,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Chain driving
    // ------------------------------------------------------------------

    /// Pass priority on the open chain
    pub fn pass_chain(&mut self, player: PlayerId) -> Result<()> {
        let chain = self
            .chain
            .as_mut()
            .ok_or_else(|| EngineError::Rule("no chain is open".to_string()))?;
        let resolving = chain.pass(player)?;
        self.emit(GameEvent::ChainPassed { player });
        if resolving {
            // Building window over; the suspension it caused is void
            self.suspension = None;
        }
        self.run_until_quiescent()
    }

    fn run_effect(
        &mut self,
        effect: ChainEffect,
        stage: u8,
        answer: Option<InteractionAnswer>,
    ) -> Result<()> {
        let blueprint = self.cards.get(effect.source)?.blueprint.clone();
        let bp = registry().get(&blueprint)?;
        let ctx = EffectContext {
            effect: effect.clone(),
            stage,
            answer,
        };
        let flow = match effect.kind {
            EffectKind::Play { .. } => bp.on_play(self, &ctx)?,
            EffectKind::SigilTrigger => bp.on_trigger(self, &ctx)?,
        };
        match flow {
            Flow::Continue => {
                self.emit(GameEvent::EffectResolved {
                    index: effect.index,
                    source: effect.source,
                });
                self.finalize_effect(&effect)?;
                self.check_state_based()
            }
            Flow::Suspend { next_stage } => {
                // The handler opened an interaction; repoint its resume at
                // the stage it asked for
                let suspension = self.suspension.as_mut().ok_or_else(|| {
                    EngineError::CorruptState(
                        "effect suspended without opening an interaction".to_string(),
                    )
                })?;
                suspension.resume = Some(ResumePoint::EffectStage {
                    effect,
                    stage: next_stage,
                });
                Ok(())
            }
        }
    }

    /// Put a resolved play's card where it belongs
    fn finalize_effect(&mut self, effect: &ChainEffect) -> Result<()> {
        match effect.kind {
            EffectKind::SigilTrigger => Ok(()),
            EffectKind::Play { slot } => {
                let card_id = effect.source;
                let (kind_minion, kind_support, controller, dead) = {
                    let card = self.cards.get(card_id)?;
                    (
                        card.is_minion(),
                        card.is_artifact() || card.is_sigil(),
                        card.controller,
                        card.is_dead(),
                    )
                };
                if kind_minion && !dead {
                    // Fall back to any free slot if the reserved one got
                    // occupied while the play waited on the chain
                    let side = self.board.side(controller)?;
                    let final_slot = match slot {
                        Some(s) if side.slot_is_free(s) => Some(s),
                        _ => side.first_free_slot(),
                    };
                    match final_slot {
                        Some(s) => {
                            self.board.side_mut(controller)?.place_minion(s, card_id)?;
                            self.emit(GameEvent::MinionSummoned {
                                card: card_id,
                                slot: s,
                            });
                        }
                        None => {
                            // Board filled up: the play fizzles
                            self.move_to_discard(card_id)?;
                        }
                    }
                    Ok(())
                } else if kind_support {
                    self.board.side_mut(controller)?.support.push(card_id);
                    Ok(())
                } else {
                    // Spells and maneuvers are spent
                    self.move_to_discard(card_id)
                }
            }
        }
    }

    /// Negate the topmost pending chain entry (counterplay effects)
    pub fn negate_top_of_chain(&mut self) -> Result<bool> {
        let negated = self.chain.as_mut().and_then(|c| c.negate_top());
        match negated {
            Some((index, source)) => {
                self.emit(GameEvent::EffectNegated { index, source });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ------------------------------------------------------------------
    // Combat verbs
    // ------------------------------------------------------------------

    /// Declare an attacker. Legal from the main phase (enters the attack
    /// phase) or from an attack phase still waiting on its attacker.
    pub fn declare_attacker(&mut self, player: PlayerId, attacker: CardId) -> Result<()> {
        if player != self.turn.active_player {
            return Err(EngineError::WrongPlayer {
                expected: self.turn.active_player.as_u32(),
                got: player.as_u32(),
            });
        }
        if self.chain.is_some() {
            return Err(EngineError::Rule(
                "cannot start an attack while a chain is open".to_string(),
            ));
        }
        match self.phase.kind() {
            PhaseKind::Main => self.send_transition(PhaseKind::Attack)?,
            PhaseKind::Attack => {}
            other => {
                return Err(EngineError::Rule(format!(
                    "cannot attack from the {} phase",
                    other
                )))
            }
        }

        {
            let card = self.cards.get(attacker)?;
            if card.controller != player {
                return Err(EngineError::Rule(format!(
                    "{} is not under your control",
                    card.name
                )));
            }
            if card.exhausted {
                return Err(EngineError::Rule(format!("{} is exhausted", card.name)));
            }
            if !(card.is_minion() || card.is_hero()) {
                return Err(EngineError::Rule(format!("{} cannot attack", card.name)));
            }
        }
        if !self.is_on_board(attacker) {
            return Err(EngineError::Rule("attacker is not on the board".to_string()));
        }
        if self.effective_power(attacker)? <= 0 {
            return Err(EngineError::Rule(
                "attacker has no power to attack with".to_string(),
            ));
        }

        let combat = self.phase.combat_mut().ok_or_else(|| {
            EngineError::CorruptState("attack phase without combat".to_string())
        })?;
        combat.declare_attacker(attacker)?;
        self.emit(GameEvent::AttackDeclared { attacker });
        self.run_until_quiescent()
    }

    /// Declare the attack target; exhausts the attacker and opens (or
    /// defers into) the response chain.
    pub fn declare_attack_target(&mut self, player: PlayerId, target: CardId) -> Result<()> {
        if player != self.turn.active_player {
            return Err(EngineError::WrongPlayer {
                expected: self.turn.active_player.as_u32(),
                got: player.as_u32(),
            });
        }
        let attacker = {
            let combat = self
                .phase
                .combat()
                .ok_or_else(|| EngineError::Rule("no attack is underway".to_string()))?;
            if !combat.can(CombatStep::DeclareTarget) {
                return Err(EngineError::Rule(
                    "combat is not waiting on a target".to_string(),
                ));
            }
            combat.attacker().ok_or_else(|| {
                EngineError::CorruptState("target step with no attacker".to_string())
            })?
        };

        {
            let card = self.cards.get(target)?;
            if card.controller == player {
                return Err(EngineError::Rule("cannot attack your own cards".to_string()));
            }
            if !(card.is_minion() || card.is_hero()) {
                return Err(EngineError::Rule(format!(
                    "{} is not a legal attack target",
                    card.name
                )));
            }
            if card.is_dead() || !self.is_on_board(target) {
                return Err(EngineError::Rule("target is not on the board".to_string()));
            }
        }

        self.phase
            .combat_mut()
            .ok_or_else(|| EngineError::CorruptState("attack phase without combat".to_string()))?
            .declare_target(target)?;
        self.cards.get_mut(attacker)?.exhaust();
        self.emit(GameEvent::AttackTargetChosen { attacker, target });

        // Combat resolves when its chain empties. A chain opened by a
        // triggered response absorbs the combat instead of a fresh one.
        let defender = self.opponent_of(player);
        match self.chain.as_mut() {
            Some(chain) => chain.on_finished(ChainCallback::ResolveCombat),
            None => {
                let mut chain = Chain::new(self.player_ids(), defender);
                chain.on_finished(ChainCallback::ResolveCombat);
                self.chain = Some(chain);
                self.emit(GameEvent::ChainOpened);
            }
        }
        self.run_until_quiescent()
    }

    /// Back out of an attack before its target is locked in
    pub fn cancel_attack(&mut self, player: PlayerId) -> Result<()> {
        if player != self.turn.active_player {
            return Err(EngineError::WrongPlayer {
                expected: self.turn.active_player.as_u32(),
                got: player.as_u32(),
            });
        }
        let combat = self
            .phase
            .combat()
            .ok_or_else(|| EngineError::Rule("no attack is underway".to_string()))?;
        if !(combat.can(CombatStep::DeclareAttacker) || combat.can(CombatStep::DeclareTarget)) {
            return Err(EngineError::Rule(
                "the attack can no longer be cancelled".to_string(),
            ));
        }
        self.abort_combat()?;
        self.run_until_quiescent()
    }

    /// Shared cancel path: no damage, straight back to the main phase
    fn abort_combat(&mut self) -> Result<()> {
        self.emit(GameEvent::AttackCancelled);
        self.send_transition(PhaseKind::Main)
    }

    /// Chain-finished callback: apply combat damage. Attacker strikes
    /// first unless the defender alone is preemptive; the defender
    /// retaliates only while alive and allowed to.
    fn resolve_combat(&mut self) -> Result<()> {
        let (attacker, target) = {
            let combat = self.phase.combat_mut().ok_or_else(|| {
                EngineError::CorruptState("combat callback outside the attack phase".to_string())
            })?;
            combat.begin_resolution()?;
            combat.pairing().ok_or_else(|| {
                EngineError::CorruptState("combat resolving without a pairing".to_string())
            })?
        };

        // Either combatant may have left the board while responses
        // resolved; the attack fizzles rather than hitting a ghost
        let attacker_gone =
            !self.is_on_board(attacker) || self.cards.get(attacker)?.is_dead();
        let target_gone = !self.is_on_board(target) || self.cards.get(target)?.is_dead();
        if attacker_gone || target_gone {
            return self.abort_combat();
        }

        let attack_power = self.effective_power(attacker)?;
        let retaliation = if self.retaliation_disabled(target)? {
            0
        } else {
            self.effective_power(target)?.max(0)
        };
        let defender_first = self.is_preemptive(target)? && !self.is_preemptive(attacker)?;

        if defender_first {
            if retaliation > 0 {
                self.deal_damage(target, attacker, retaliation)?;
            }
            if !self.cards.get(attacker)?.is_dead() {
                self.deal_damage(attacker, target, attack_power)?;
            }
        } else {
            self.deal_damage(attacker, target, attack_power)?;
            if retaliation > 0 && !self.cards.get(target)?.is_dead() {
                self.deal_damage(target, attacker, retaliation)?;
            }
        }

        self.check_state_based()?;
        if !self.is_over() {
            self.send_transition(PhaseKind::Main)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Turn commands
    // ------------------------------------------------------------------

    pub fn end_turn(&mut self, player: PlayerId) -> Result<()> {
        if player != self.turn.active_player {
            return Err(EngineError::WrongPlayer {
                expected: self.turn.active_player.as_u32(),
                got: player.as_u32(),
            });
        }
        if self.phase.kind() != PhaseKind::Main {
            return Err(EngineError::Rule(format!(
                "turns end from the main phase, not {}",
                self.phase.kind()
            )));
        }
        if self.chain.is_some() {
            return Err(EngineError::Rule(
                "finish the open chain before ending the turn".to_string(),
            ));
        }
        self.send_transition(PhaseKind::End)?;
        self.run_until_quiescent()
    }

    pub fn concede(&mut self, player: PlayerId) -> Result<()> {
        self.player_mut(player)?.has_lost = true;
        let winner = self.opponent_of(player);
        self.end_game(Some(winner));
        Ok(())
    }

    /// Kick off the game: opening hands, then the first draw phase
    pub fn start(&mut self) -> Result<()> {
        for p in self.player_ids() {
            for _ in 0..self.config.opening_hand {
                self.draw_card(p)?;
            }
        }
        self.emit(GameEvent::TurnStarted {
            player: self.turn.active_player,
            turn: self.turn.turn_number,
        });
        self.emit(GameEvent::PhaseEntered {
            phase: PhaseKind::Draw,
        });
        self.enter_phase(PhaseKind::Draw)?;
        self.run_until_quiescent()
    }

    // ------------------------------------------------------------------
    // The trampoline
    // ------------------------------------------------------------------

    /// Drive pending triggers, chain resolution and auto-advancing phases
    /// until the game needs player input, settles in a command-driven
    /// phase, or ends.
    pub fn run_until_quiescent(&mut self) -> Result<()> {
        loop {
            if self.is_over() || self.suspension.is_some() {
                return Ok(());
            }

            if let Some(chain) = &self.chain {
                match chain.state() {
                    ChainState::Building => {
                        let priority = chain.priority();
                        let token = self.issue_token();
                        self.suspension = Some(Suspension {
                            reason: SuspendReason::ChainPriority,
                            token,
                            resume: None,
                        });
                        log_if_verbose!(self, "chain holds for player {}", priority);
                        return Ok(());
                    }
                    ChainState::Resolving => {
                        let next = self
                            .chain
                            .as_mut()
                            .and_then(|c| c.pop_next());
                        match next {
                            Some(effect) => {
                                if effect.negated {
                                    // Popped without running. A negated
                                    // play's card is spent; a sigil stays
                                    // where it is.
                                    if matches!(effect.kind, EffectKind::Play { .. }) {
                                        self.move_to_discard(effect.source)?;
                                    }
                                } else {
                                    self.emit(GameEvent::EffectResolving {
                                        index: effect.index,
                                        source: effect.source,
                                    });
                                    self.run_effect(effect, 0, None)?;
                                }
                                continue;
                            }
                            None => {
                                // Chain is empty: finish and run callbacks
                                let callbacks = self
                                    .chain
                                    .as_mut()
                                    .map(|c| c.finish())
                                    .unwrap_or_default();
                                self.chain = None;
                                self.emit(GameEvent::ChainFinished);
                                for cb in callbacks {
                                    match cb {
                                        ChainCallback::ResolveCombat => self.resolve_combat()?,
                                    }
                                }
                                continue;
                            }
                        }
                    }
                    ChainState::Finished => {
                        return Err(EngineError::CorruptState(
                            "a finished chain is still installed".to_string(),
                        ))
                    }
                }
            }

            // No chain open: queued sigil reactions get their window
            if let Some(trigger) = self.pending_triggers.pop_front() {
                let mut chain = Chain::new(self.player_ids(), trigger.controller);
                let index = chain.add_effect(
                    trigger.controller,
                    EffectKind::SigilTrigger,
                    trigger.sigil,
                    trigger.targets,
                )?;
                self.chain = Some(chain);
                self.emit(GameEvent::ChainOpened);
                self.emit(GameEvent::EffectChained {
                    index,
                    source: trigger.sigil,
                });
                continue;
            }

            // Phase auto-advance
            match self.phase.kind() {
                PhaseKind::Draw => {
                    self.send_transition(PhaseKind::Main)?;
                    continue;
                }
                PhaseKind::End => {
                    self.send_transition(PhaseKind::Draw)?;
                    continue;
                }
                // Main and the pre-chain attack steps wait for commands
                PhaseKind::Main | PhaseKind::Attack | PhaseKind::GameEnd => return Ok(()),
            }
        }
    }
}
