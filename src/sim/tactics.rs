//! Turn-based grid mode
//!
//! Same building blocks as the real-time mode (phase machine, entity store,
//! ledger) on an integer grid. The player spends action points; when they run
//! out the game enters [`GamePhase::EnemyTurn`] and the next
//! [`TacticsState::advance`] resolves every enemy at once. Animation cues
//! are queued for display and never gate the logic.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::behavior::grid_step;
use super::collision::Aabb;
use super::entity::{Category, EnemyKind, EntityId, EntityKind, EntitySpec};
use super::event::{GameEvent, Rejection};
use super::ledger::{Resource, ResourceLedger};
use super::phase::{self, GamePhase};
use super::store::{DamageOutcome, EntityStore};
use super::wave::{LevelDescriptor, generate_level};
use crate::tuning::Tuning;

/// One player command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TacticsAction {
    /// Step one cell orthogonally
    Move(IVec2),
    /// Hit an adjacent enemy
    Attack,
    /// Give up the remaining action points
    EndTurn,
    Pause,
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CueKind {
    Move { from: IVec2, to: IVec2 },
    Attack { target: IVec2 },
}

/// Display-only record of an enemy action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationCue {
    pub unit: EntityId,
    pub kind: CueKind,
    /// Seconds until the presentation layer should play this cue
    pub delay: f32,
}

fn cell_of(pos: Vec2) -> IVec2 {
    pos.round().as_ivec2()
}

fn manhattan(a: IVec2, b: IVec2) -> i32 {
    (a - b).abs().element_sum()
}

#[derive(Debug, Clone)]
pub struct TacticsState {
    pub seed: u64,
    pub tuning: Tuning,
    pub phase: GamePhase,
    /// Levels cleared so far; seeds the next layout
    pub depth: u32,
    /// Completed player turns in the current level
    pub turn: u32,
    pub level: Option<LevelDescriptor>,
    pub store: EntityStore,
    pub ledger: ResourceLedger,
    pub player: Option<EntityId>,
    pub cues: Vec<AnimationCue>,
    pub events: Vec<GameEvent>,
}

impl TacticsState {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        if let Err(e) = tuning.validate() {
            log::warn!("Starting with unvalidated tuning: {}", e);
        }
        Self {
            seed,
            store: EntityStore::new(Aabb::from_size(0.0, 0.0), tuning.limits),
            ledger: ResourceLedger::new(),
            tuning,
            phase: GamePhase::Menu,
            depth: 0,
            turn: 0,
            level: None,
            player: None,
            cues: Vec::new(),
            events: Vec::new(),
        }
    }

    fn set_phase(&mut self, next: GamePhase) -> bool {
        match phase::transition(&mut self.phase, next) {
            Some(from) => {
                self.events.push(GameEvent::PhaseChanged { from, to: next });
                true
            }
            None => false,
        }
    }

    fn reject(&mut self, rejection: Rejection) -> Result<(), Rejection> {
        log::debug!("Tactics action rejected: {}", rejection);
        self.events.push(GameEvent::Rejected(rejection));
        Err(rejection)
    }

    /// Generate a level and populate the store
    fn start_level(&mut self) {
        let t = &self.tuning.tactics;
        let level = generate_level(self.seed, self.depth, t);

        let max = Vec2::new((level.width - 1) as f32, (level.height - 1) as f32);
        self.store = EntityStore::new(Aabb::new(Vec2::ZERO, max), self.tuning.limits);
        self.ledger = ResourceLedger::new();
        self.ledger
            .define(Resource::Health, t.player_health, Some(t.player_health))
            .define(Resource::ActionPoints, t.max_ap, Some(t.max_ap))
            .define(Resource::Currency, 0.0, None);

        self.player = self
            .store
            .spawn(EntitySpec::player(level.player_start.as_vec2(), 0.5, 1.0))
            .ok();
        for cell in &level.enemies {
            let mut spec = EntitySpec::enemy(EnemyKind::Grunt, cell.as_vec2(), 1.0);
            spec.radius = 0.5;
            spec.health = level.enemy_health;
            spec.attrs.damage = t.enemy_damage;
            if let Err(r) = self.store.spawn(spec) {
                log::debug!("Level enemy at {} refused: {}", cell, r);
            }
        }

        log::info!(
            "Level {} ready: {}x{}, {} enemies",
            self.depth,
            level.width,
            level.height,
            level.enemies.len()
        );
        self.level = Some(level);
        self.turn = 0;
        self.cues.clear();
        self.set_phase(GamePhase::Playing);
    }

    pub fn player_cell(&self) -> Option<IVec2> {
        self.player
            .and_then(|id| self.store.get(id))
            .map(|e| cell_of(e.pos))
    }

    fn enemy_at(&self, cell: IVec2) -> Option<EntityId> {
        let mut found = None;
        self.store.for_each_of_kind(Category::Enemy, |e| {
            if found.is_none() && cell_of(e.pos) == cell {
                found = Some(e.id);
            }
        });
        found
    }

    pub fn enemies_remaining(&self) -> usize {
        self.store.active_count(Category::Enemy)
    }

    /// Apply one player command.
    ///
    /// Rejections leave the state (including action points) untouched.
    pub fn act(&mut self, action: TacticsAction) -> Result<(), Rejection> {
        match (self.phase, action) {
            (GamePhase::Menu, TacticsAction::Confirm) => {
                self.start_level();
                Ok(())
            }
            (GamePhase::Paused, TacticsAction::Pause) => {
                self.set_phase(GamePhase::Playing);
                Ok(())
            }
            (GamePhase::GameOver | GamePhase::Victory, TacticsAction::Confirm) => {
                self.set_phase(GamePhase::Menu);
                Ok(())
            }
            (GamePhase::Playing, TacticsAction::Pause) => {
                self.set_phase(GamePhase::Paused);
                Ok(())
            }
            (GamePhase::Playing, TacticsAction::Move(dir)) => self.player_move(dir),
            (GamePhase::Playing, TacticsAction::Attack) => self.player_attack(),
            (GamePhase::Playing, TacticsAction::EndTurn) => {
                self.ledger.set(Resource::ActionPoints, 0.0);
                self.set_phase(GamePhase::EnemyTurn);
                Ok(())
            }
            (phase, action) => {
                log::debug!("{:?} ignored in {:?}", action, phase);
                Ok(())
            }
        }
    }

    fn player_move(&mut self, dir: IVec2) -> Result<(), Rejection> {
        if manhattan(dir, IVec2::ZERO) != 1 {
            return self.reject(Rejection::Blocked);
        }
        let (Some(from), Some(level)) = (self.player_cell(), self.level.as_ref()) else {
            return self.reject(Rejection::NothingSelected);
        };
        let to = from + dir;
        if !level.is_floor(to) || self.enemy_at(to).is_some() {
            return self.reject(Rejection::Blocked);
        }
        if let Err(r) = self.ledger.try_spend(Resource::ActionPoints, 1.0) {
            return self.reject(r);
        }

        if let Some(player) = self.player.and_then(|id| self.store.get_mut(id)) {
            player.pos = to.as_vec2();
        }

        if !self.reached_exit() {
            self.end_turn_if_spent();
        }
        Ok(())
    }

    /// Standing on the exit with the level cleared wins it
    fn reached_exit(&mut self) -> bool {
        let on_exit = self
            .level
            .as_ref()
            .is_some_and(|level| self.player_cell() == Some(level.exit));
        if !on_exit || self.enemies_remaining() > 0 {
            return false;
        }
        if self.set_phase(GamePhase::Victory) {
            self.depth += 1;
        }
        true
    }

    fn player_attack(&mut self) -> Result<(), Rejection> {
        let Some(from) = self.player_cell() else {
            return self.reject(Rejection::NothingSelected);
        };
        let mut target = None;
        self.store.for_each_of_kind(Category::Enemy, |e| {
            if target.is_none() && manhattan(cell_of(e.pos), from) == 1 {
                target = Some(e.id);
            }
        });
        let Some(target) = target else {
            return self.reject(Rejection::OutOfRange);
        };
        if let Err(r) = self.ledger.try_spend(Resource::ActionPoints, 1.0) {
            return self.reject(r);
        }

        let damage = self.tuning.tactics.attack_damage;
        match self.store.apply_damage(target, damage) {
            DamageOutcome::Killed => {
                let reward = self.store.get(target).map(|e| e.attrs.value).unwrap_or(0.0);
                self.ledger.add(Resource::Currency, reward);
                self.events.push(GameEvent::EnemyKilled {
                    id: target,
                    kind: EnemyKind::Grunt,
                    reward,
                });
                self.store.purge();
                if self.reached_exit() {
                    return Ok(());
                }
            }
            DamageOutcome::Hurt { .. } => self.events.push(GameEvent::EnemyHit {
                id: target,
                amount: damage,
                crit: false,
            }),
            DamageOutcome::Ignored => {}
        }
        self.end_turn_if_spent();
        Ok(())
    }

    fn end_turn_if_spent(&mut self) {
        if self.ledger.is_depleted(Resource::ActionPoints) {
            self.set_phase(GamePhase::EnemyTurn);
        }
    }

    /// Resolve the enemy turn.
    ///
    /// Every enemy acts in id order: attack when adjacent to the player,
    /// otherwise take one greedy step. Does nothing outside EnemyTurn.
    pub fn advance(&mut self) {
        if self.phase != GamePhase::EnemyTurn {
            return;
        }
        let Some(level) = self.level.clone() else {
            return;
        };
        let delay_step = self.tuning.tactics.action_delay_secs;
        let mut delay = self.cues.last().map(|c| c.delay).unwrap_or(0.0);

        for id in self.store.ids_of(Category::Enemy) {
            let Some(player_cell) = self.player_cell() else {
                break;
            };
            let Some((cell, damage)) = self.store.get(id).map(|e| (cell_of(e.pos), e.attrs.damage))
            else {
                continue;
            };

            let kind = if manhattan(cell, player_cell) == 1 {
                let taken = -self.ledger.sub(Resource::Health, damage);
                if taken > 0.0 {
                    self.events.push(GameEvent::PlayerDamaged { amount: taken });
                }
                CueKind::Attack {
                    target: player_cell,
                }
            } else {
                let next = grid_step(cell, player_cell, |c| {
                    !level.is_floor(c) || c == player_cell || self.enemy_at(c).is_some()
                });
                if next == cell {
                    continue;
                }
                if let Some(e) = self.store.get_mut(id) {
                    e.pos = next.as_vec2();
                }
                CueKind::Move {
                    from: cell,
                    to: next,
                }
            };

            delay += delay_step;
            self.cues.push(AnimationCue {
                unit: id,
                kind,
                delay,
            });

            if self.ledger.is_depleted(Resource::Health) {
                break;
            }
        }

        if self.ledger.is_depleted(Resource::Health) {
            self.set_phase(GamePhase::GameOver);
            return;
        }
        self.ledger.refill(Resource::ActionPoints);
        self.turn += 1;
        self.set_phase(GamePhase::Playing);
    }

    /// Count cue delays down; returns the cues due for playback
    pub fn advance_animations(&mut self, dt: f32) -> Vec<AnimationCue> {
        for cue in &mut self.cues {
            cue.delay -= dt;
        }
        let (due, pending): (Vec<_>, Vec<_>) = self.cues.drain(..).partition(|c| c.delay <= 0.0);
        self.cues = pending;
        due
    }

    pub fn is_animating(&self) -> bool {
        !self.cues.is_empty()
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Kind lookup for snapshots
    pub fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        self.store.get(id).map(|e| e.kind)
    }
}
