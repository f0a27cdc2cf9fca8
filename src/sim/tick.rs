//! Fixed timestep simulation tick for the real-time mode
//!
//! One call advances the game by `dt` seconds in a fixed order:
//! phase gate -> player input -> AI step -> movement and lifetimes ->
//! collisions -> ledger drains and thresholds -> wave clear -> purge.

use glam::Vec2;

use super::behavior::{next_behavior, ready_to_fire, roll_damage, steer, tick_cooldowns};
use super::collision::{contacts, nearest_enemy, projectile_hits, within_radius};
use super::entity::{Category, EnemyParams, EntityId, EntityKind, EntitySpec, Faction};
use super::event::{GameEvent, Rejection};
use super::ledger::Resource;
use super::phase::GamePhase;
use super::state::{EndReason, GameState, ShopItem};
use super::store::DamageOutcome;
use crate::direction_to;

/// Abstract input for a single tick.
///
/// Hosts map raw keyboard/mouse/touch to these fields. One-shot flags
/// (`pause`, `confirm`, `select`) should be cleared after each tick.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Desired movement direction (length is capped at 1)
    pub move_dir: Vec2,
    /// World-space aim point; `None` auto-targets the nearest enemy
    pub aim: Option<Vec2>,
    /// Fire light weapon / buy selected shop item
    pub primary: bool,
    /// Fire heavy weapon
    pub secondary: bool,
    /// Pause toggle
    pub pause: bool,
    /// Start / continue / return to menu
    pub confirm: bool,
    /// Shop slot selection
    pub select: Option<usize>,
}

/// Discrete input events, for hosts that prefer an event stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Move { dx: f32, dy: f32 },
    Aim(Vec2),
    PrimaryAction,
    SecondaryAction,
    Pause,
    Confirm,
    Select(usize),
}

impl TickInput {
    /// Fold a batch of events into one tick's input
    pub fn from_events(events: &[InputEvent]) -> Self {
        let mut input = TickInput::default();
        for event in events {
            input.apply(*event);
        }
        input
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Move { dx, dy } => self.move_dir = Vec2::new(dx, dy),
            InputEvent::Aim(at) => self.aim = Some(at),
            InputEvent::PrimaryAction => self.primary = true,
            InputEvent::SecondaryAction => self.secondary = true,
            InputEvent::Pause => self.pause = true,
            InputEvent::Confirm => self.confirm = true,
            InputEvent::Select(slot) => self.select = Some(slot),
        }
    }

    /// Clear one-shot inputs after they have been processed
    pub fn clear_one_shots(&mut self) {
        self.pause = false;
        self.confirm = false;
        self.select = None;
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    match state.phase {
        GamePhase::Menu => {
            if input.confirm {
                state.start_run();
            }
            return;
        }
        GamePhase::Paused => {
            if input.pause {
                state.set_phase(GamePhase::Playing);
            }
            return;
        }
        GamePhase::Shop => {
            shop_input(state, input);
            return;
        }
        GamePhase::GameOver | GamePhase::Victory => {
            if input.confirm {
                state.return_to_menu();
            }
            return;
        }
        // Turn-based only; the real-time mode never enters it
        GamePhase::EnemyTurn => return,
        GamePhase::Playing => {}
    }

    if input.pause {
        state.set_phase(GamePhase::Paused);
        return;
    }

    state.time_ticks += 1;

    player_step(state, input, dt);
    ai_step(state, dt);
    integrate(state, dt);
    resolve_collisions(state);

    if state.phase == GamePhase::Playing {
        update_ledger(state, dt);
    }
    if state.phase == GamePhase::Playing {
        check_wave_clear(state);
    }

    state.store.purge();
}

fn shop_input(state: &mut GameState, input: &TickInput) {
    if let Some(slot) = input.select {
        if slot < ShopItem::ALL.len() {
            state.shop_selection = slot;
        } else {
            state.reject(Rejection::NothingSelected);
        }
    }
    if input.primary {
        let item = ShopItem::ALL[state.shop_selection.min(ShopItem::ALL.len() - 1)];
        if let Err(r) = state.purchase(item) {
            state.reject(r);
        }
    }
    if input.confirm {
        let next = state.wave_index + 1;
        if state.set_phase(GamePhase::Playing) {
            state.arm_wave(next);
        }
    }
}

/// Movement and weapons
fn player_step(state: &mut GameState, input: &TickInput, dt: f32) {
    let Some(player_id) = state.player else {
        return;
    };
    let speed = state.stats.speed;
    let bounds = state.store.bounds();
    let Some(player) = state.store.get_mut(player_id) else {
        return;
    };

    let step = input.move_dir.clamp_length_max(1.0) * speed * dt;
    player.vel = step / dt.max(f32::EPSILON);
    player.pos = bounds.inset(player.radius).clamp_point(player.pos + step);
    player.cooldown = (player.cooldown - dt).max(0.0);
    let ready = player.cooldown <= 0.0;

    if !ready {
        return;
    }
    if input.primary {
        fire(state, input.aim, Resource::AmmoLight, 1.0);
    } else if input.secondary {
        let multiplier = state.tuning.player.heavy_multiplier;
        fire(state, input.aim, Resource::AmmoHeavy, multiplier);
    }
}

/// Spend one round of `ammo` and launch a projectile.
///
/// Rejected without spending when there is no direction to fire in or the
/// ammo counter is empty.
fn fire(state: &mut GameState, aim: Option<Vec2>, ammo: Resource, multiplier: f32) {
    let Some(origin) = state.player_pos() else {
        return;
    };
    let dir = match aim {
        Some(at) => direction_to(origin, at),
        None => nearest_enemy(&state.store, origin)
            .and_then(|(id, _)| state.store.get(id))
            .map(|e| direction_to(origin, e.pos))
            .unwrap_or(Vec2::ZERO),
    };
    if dir == Vec2::ZERO {
        state.reject(Rejection::OutOfRange);
        return;
    }
    if let Err(r) = state.ledger.try_spend(ammo, 1.0) {
        state.reject(r);
        return;
    }

    let p = &state.tuning.player;
    let start = state
        .store
        .bounds()
        .clamp_point(origin + dir * (state.player_radius() + 4.0));
    let spec = EntitySpec::projectile(
        Faction::Player,
        start,
        dir * p.projectile_speed,
        state.stats.damage * multiplier,
        p.projectile_ttl,
    );
    match state.store.spawn(spec) {
        Ok(_) => {
            let cooldown = state.stats.fire_cooldown;
            if let Some(player) = state.player.and_then(|id| state.store.get_mut(id)) {
                player.cooldown = cooldown;
            }
        }
        Err(r) => {
            state.ledger.add(ammo, 1.0);
            state.reject(r);
        }
    }
}

/// Behavior update for every enemy, then hostile fire
fn ai_step(state: &mut GameState, dt: f32) {
    let Some(player_pos) = state.player_pos() else {
        return;
    };

    let mut shots: Vec<(Vec2, Vec2, f32)> = Vec::new();
    let rng = &mut state.rng;
    state.store.for_each_of_kind_mut(Category::Enemy, |e| {
        let Some(p) = e.enemy_params() else {
            return;
        };
        tick_cooldowns(e, dt);
        let distance = e.pos.distance(player_pos);
        e.behavior = next_behavior(e.behavior, distance, &p);
        steer(e, player_pos, dt, &mut *rng);

        if ready_to_fire(e) {
            e.cooldown = p.fire_cooldown;
            let dir = direction_to(e.pos, player_pos);
            shots.push((e.pos, dir * p.projectile_speed, p.projectile_damage));
        }
    });

    let ttl = state.tuning.combat.hostile_projectile_ttl;
    for (pos, vel, damage) in shots {
        let spec = EntitySpec::projectile(Faction::Hostile, pos, vel, damage, ttl);
        if let Err(r) = state.store.spawn(spec) {
            log::debug!("Hostile shot refused: {}", r);
        }
    }
}

/// Move enemies and projectiles, expire lifetimes
fn integrate(state: &mut GameState, dt: f32) {
    let bounds = state.store.bounds();

    state.store.for_each_of_kind_mut(Category::Enemy, |e| {
        e.pos = bounds.inset(e.radius).clamp_point(e.pos + e.vel * dt);
    });

    state.store.for_each_of_kind_mut(Category::Projectile, |e| {
        e.pos += e.vel * dt;
        if let Some(ttl) = e.ttl.as_mut() {
            *ttl -= dt;
        }
        if e.ttl.is_some_and(|t| t <= 0.0) || !bounds.contains(e.pos) {
            e.active = false;
        }
    });

    state.store.for_each_of_kind_mut(Category::Pickup, |e| {
        if let Some(ttl) = e.ttl.as_mut() {
            *ttl -= dt;
            if *ttl <= 0.0 {
                e.active = false;
            }
        }
    });
}

/// Bullets vs enemies, bullets vs player, enemy contact, pickups.
///
/// Stops as soon as a hit or contact ends the run; a terminal phase takes
/// no further damage and collects nothing.
fn resolve_collisions(state: &mut GameState) {
    let combat = state.tuning.combat.clone();

    for hit in projectile_hits(&state.store, Faction::Player) {
        if !state.store.despawn(hit.projectile) {
            continue;
        }
        let (amount, crit) = roll_damage(
            hit.damage,
            combat.crit_chance,
            combat.crit_multiplier,
            &mut state.rng,
        );
        match state.store.apply_damage(hit.target, amount) {
            DamageOutcome::Killed => on_enemy_killed(state, hit.target, true),
            DamageOutcome::Hurt { .. } => state.events.push(GameEvent::EnemyHit {
                id: hit.target,
                amount,
                crit,
            }),
            DamageOutcome::Ignored => {}
        }
        if state.phase != GamePhase::Playing {
            return;
        }
    }

    for hit in projectile_hits(&state.store, Faction::Hostile) {
        if state.store.despawn(hit.projectile) {
            state.damage_player(hit.damage);
        }
        if state.phase != GamePhase::Playing {
            return;
        }
    }

    let Some(player_id) = state.player else {
        return;
    };

    for enemy_id in contacts(&state.store, player_id, Category::Enemy) {
        let Some(enemy) = state.store.get_mut(enemy_id) else {
            continue;
        };
        if enemy.contact_cooldown > 0.0 {
            continue;
        }
        if enemy.attrs.caps.explodes {
            // Bombers detonate on contact; no kill credit
            let health = enemy.health;
            if state.store.apply_damage(enemy_id, health) == DamageOutcome::Killed {
                on_enemy_killed(state, enemy_id, false);
            }
        } else {
            enemy.contact_cooldown = combat.contact_cooldown;
            let damage = enemy.attrs.damage;
            state.damage_player(damage);
        }
        if state.phase != GamePhase::Playing {
            return;
        }
    }

    for pickup_id in contacts(&state.store, player_id, Category::Pickup) {
        state.collect_pickup(pickup_id);
    }
}

/// Kill effects. Called exactly once per death, right after the killing blow.
fn on_enemy_killed(state: &mut GameState, id: EntityId, credit: bool) {
    let Some((kind, pos, reward, radius)) = state.store.get(id).and_then(|e| match e.kind {
        EntityKind::Enemy(kind) => Some((kind, e.pos, e.attrs.value, e.radius)),
        _ => None,
    }) else {
        return;
    };
    let params = EnemyParams::of(kind);
    log::debug!("{:?} {:?} died (credit={})", kind, id, credit);

    if credit {
        state.kills += 1;
        state.ledger.add(Resource::Currency, reward);
        state.events.push(GameEvent::EnemyKilled { id, kind, reward });
    }

    if params.caps.explodes {
        state.events.push(GameEvent::Exploded { id });
        if let Some(player_id) = state.player {
            let caught = within_radius(&state.store, pos, params.blast_radius, Category::Player);
            if caught.contains(&player_id) {
                state.damage_player(params.contact_damage);
            }
        }
    }

    if params.caps.splits {
        state.split_at(pos, radius);
    }

    if credit {
        state.maybe_drop_pickup(pos);
    }

    let final_wave = state.wave.as_ref().is_some_and(|w| w.final_wave);
    if params.caps.boss && final_wave {
        state.end_run(EndReason::BossDefeated);
    }
}

/// Passive drains, countdown, and fail thresholds
fn update_ledger(state: &mut GameState, dt: f32) {
    for resource in state.ledger.drain(dt) {
        log::debug!("{:?} depleted", resource);
    }

    if let Some(remaining) = state.time_remaining.as_mut() {
        *remaining = (*remaining - dt).max(0.0);
        if *remaining <= 0.0 {
            state.end_run(EndReason::TimeExpired);
            return;
        }
    }

    if state.ledger.is_depleted(Resource::Health) {
        state.end_run(EndReason::Killed);
    } else if state.ledger.is_depleted(Resource::Oxygen) {
        state.end_run(EndReason::Suffocated);
    }
}

/// No enemies left: shop, or victory after the final wave
fn check_wave_clear(state: &mut GameState) {
    if state.enemies_remaining() > 0 {
        return;
    }
    let index = state.wave_index;
    state.events.push(GameEvent::WaveCleared(index));
    log::info!("Wave {} cleared", index);

    if state.wave.as_ref().is_some_and(|w| w.final_wave) {
        state.end_run(EndReason::WavesCleared);
        return;
    }

    for id in state.store.ids_of(Category::Projectile) {
        state.store.despawn(id);
    }
    state.set_phase(GamePhase::Shop);
}
