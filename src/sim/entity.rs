//! Entity records and per-kind parameter tables
//!
//! Every game object is a flat [`Entity`] with a fixed attribute schema. What an
//! enemy can do (shoot, explode, split) is resolved once at spawn from
//! [`EnemyParams::of`] and never changes afterwards.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable entity handle (monotonic per store, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Coarse grouping used for iteration and capacity limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Player,
    Enemy,
    Projectile,
    Pickup,
}

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Hostile,
}

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Slow melee chaser
    Grunt,
    /// Fast, fragile melee chaser
    Runner,
    /// Ranged kiter
    Spitter,
    /// Detonates on death
    Bomber,
    /// Breaks into two mites on death
    Splitter,
    /// Splitter offspring
    Mite,
    /// Ranged boss, killing it on the final wave wins the run
    Boss,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 7] = [
        EnemyKind::Grunt,
        EnemyKind::Runner,
        EnemyKind::Spitter,
        EnemyKind::Bomber,
        EnemyKind::Splitter,
        EnemyKind::Mite,
        EnemyKind::Boss,
    ];
}

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Health,
    Ammo,
    Oxygen,
    Coin,
}

/// Tagged entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Enemy(EnemyKind),
    Projectile(Faction),
    Pickup(PickupKind),
}

impl EntityKind {
    pub fn category(&self) -> Category {
        match self {
            EntityKind::Player => Category::Player,
            EntityKind::Enemy(_) => Category::Enemy,
            EntityKind::Projectile(_) => Category::Projectile,
            EntityKind::Pickup(_) => Category::Pickup,
        }
    }
}

/// AI state tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BehaviorState {
    #[default]
    Idle,
    Patrol,
    Chase,
    Attack,
    Flee,
}

/// Capability flags resolved from the per-kind table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub ranged: bool,
    pub explodes: bool,
    pub splits: bool,
    pub boss: bool,
}

/// Fixed attribute schema shared by every kind
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Attributes {
    /// Contact damage (enemies) or hit damage (projectiles)
    pub damage: f32,
    /// Movement speed in units/sec
    pub speed: f32,
    /// Currency reward (enemies) or amount granted (pickups)
    pub value: f32,
    pub caps: Capabilities,
}

/// Static per-kind enemy parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyParams {
    pub max_health: f32,
    pub speed: f32,
    pub radius: f32,
    pub contact_damage: f32,
    pub reward: f32,
    /// Enter Chase at or below this distance
    pub alert_radius: f32,
    /// Drop back to Patrol only beyond this distance
    pub lose_radius: f32,
    /// Enter Attack at or below this distance
    pub attack_range: f32,
    /// Ranged kinds back off inside this distance (0 = never)
    pub flee_radius: f32,
    pub fire_cooldown: f32,
    pub projectile_speed: f32,
    pub projectile_damage: f32,
    /// Blast radius when `caps.explodes`
    pub blast_radius: f32,
    pub caps: Capabilities,
}

const MELEE: Capabilities = Capabilities {
    ranged: false,
    explodes: false,
    splits: false,
    boss: false,
};

impl EnemyParams {
    /// Parameter table lookup
    pub const fn of(kind: EnemyKind) -> EnemyParams {
        match kind {
            EnemyKind::Grunt => EnemyParams {
                max_health: 30.0,
                speed: 70.0,
                radius: 14.0,
                contact_damage: 10.0,
                reward: 5.0,
                alert_radius: 260.0,
                lose_radius: 360.0,
                attack_range: 28.0,
                flee_radius: 0.0,
                fire_cooldown: 0.0,
                projectile_speed: 0.0,
                projectile_damage: 0.0,
                blast_radius: 0.0,
                caps: MELEE,
            },
            EnemyKind::Runner => EnemyParams {
                max_health: 18.0,
                speed: 140.0,
                radius: 10.0,
                contact_damage: 6.0,
                reward: 6.0,
                alert_radius: 320.0,
                lose_radius: 420.0,
                attack_range: 22.0,
                flee_radius: 0.0,
                fire_cooldown: 0.0,
                projectile_speed: 0.0,
                projectile_damage: 0.0,
                blast_radius: 0.0,
                caps: MELEE,
            },
            EnemyKind::Spitter => EnemyParams {
                max_health: 24.0,
                speed: 60.0,
                radius: 12.0,
                contact_damage: 4.0,
                reward: 8.0,
                alert_radius: 340.0,
                lose_radius: 460.0,
                attack_range: 260.0,
                flee_radius: 120.0,
                fire_cooldown: 1.6,
                projectile_speed: 220.0,
                projectile_damage: 8.0,
                blast_radius: 0.0,
                caps: Capabilities {
                    ranged: true,
                    ..MELEE
                },
            },
            EnemyKind::Bomber => EnemyParams {
                max_health: 20.0,
                speed: 90.0,
                radius: 13.0,
                contact_damage: 25.0,
                reward: 7.0,
                alert_radius: 260.0,
                lose_radius: 360.0,
                attack_range: 22.0,
                flee_radius: 0.0,
                fire_cooldown: 0.0,
                projectile_speed: 0.0,
                projectile_damage: 0.0,
                blast_radius: 70.0,
                caps: Capabilities {
                    explodes: true,
                    ..MELEE
                },
            },
            EnemyKind::Splitter => EnemyParams {
                max_health: 40.0,
                speed: 60.0,
                radius: 18.0,
                contact_damage: 10.0,
                reward: 10.0,
                alert_radius: 240.0,
                lose_radius: 340.0,
                attack_range: 32.0,
                flee_radius: 0.0,
                fire_cooldown: 0.0,
                projectile_speed: 0.0,
                projectile_damage: 0.0,
                blast_radius: 0.0,
                caps: Capabilities {
                    splits: true,
                    ..MELEE
                },
            },
            EnemyKind::Mite => EnemyParams {
                max_health: 8.0,
                speed: 120.0,
                radius: 8.0,
                contact_damage: 4.0,
                reward: 1.0,
                alert_radius: 300.0,
                lose_radius: 400.0,
                attack_range: 16.0,
                flee_radius: 0.0,
                fire_cooldown: 0.0,
                projectile_speed: 0.0,
                projectile_damage: 0.0,
                blast_radius: 0.0,
                caps: MELEE,
            },
            EnemyKind::Boss => EnemyParams {
                max_health: 400.0,
                speed: 50.0,
                radius: 36.0,
                contact_damage: 20.0,
                reward: 100.0,
                alert_radius: 600.0,
                lose_radius: 900.0,
                attack_range: 320.0,
                flee_radius: 0.0,
                fire_cooldown: 0.9,
                projectile_speed: 260.0,
                projectile_damage: 12.0,
                blast_radius: 0.0,
                caps: Capabilities {
                    ranged: true,
                    boss: true,
                    ..MELEE
                },
            },
        }
    }
}

/// A game object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    /// Cleared on death; the store purges inactive entities at tick end
    pub active: bool,
    pub behavior: BehaviorState,
    pub attrs: Attributes,
    /// Remaining lifetime in seconds (projectiles, pickups)
    #[serde(default)]
    pub ttl: Option<f32>,
    /// Fire cooldown (seconds)
    #[serde(default)]
    pub cooldown: f32,
    /// Contact-damage cooldown (seconds)
    #[serde(default)]
    pub contact_cooldown: f32,
    /// Patrol anchor
    #[serde(default)]
    pub home: Vec2,
    /// Seconds until the next patrol heading change
    #[serde(default)]
    pub behavior_timer: f32,
}

impl Entity {
    pub fn category(&self) -> Category {
        self.kind.category()
    }

    /// Enemy parameters, if this is an enemy
    pub fn enemy_params(&self) -> Option<EnemyParams> {
        match self.kind {
            EntityKind::Enemy(kind) => Some(EnemyParams::of(kind)),
            _ => None,
        }
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }
}

/// Everything needed to create an entity; ids are assigned by the store
#[derive(Debug, Clone)]
pub struct EntitySpec {
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub health: f32,
    pub attrs: Attributes,
    pub ttl: Option<f32>,
}

impl EntitySpec {
    pub fn player(pos: Vec2, radius: f32, speed: f32) -> Self {
        Self {
            kind: EntityKind::Player,
            pos,
            vel: Vec2::ZERO,
            radius,
            health: 1.0,
            attrs: Attributes {
                speed,
                ..Default::default()
            },
            ttl: None,
        }
    }

    /// Enemy with health scaled for the current wave
    pub fn enemy(kind: EnemyKind, pos: Vec2, health_scale: f32) -> Self {
        let p = EnemyParams::of(kind);
        Self {
            kind: EntityKind::Enemy(kind),
            pos,
            vel: Vec2::ZERO,
            radius: p.radius,
            health: p.max_health * health_scale.max(0.1),
            attrs: Attributes {
                damage: p.contact_damage,
                speed: p.speed,
                value: p.reward,
                caps: p.caps,
            },
            ttl: None,
        }
    }

    pub fn projectile(faction: Faction, pos: Vec2, vel: Vec2, damage: f32, ttl: f32) -> Self {
        Self {
            kind: EntityKind::Projectile(faction),
            pos,
            vel,
            radius: 4.0,
            health: 1.0,
            attrs: Attributes {
                damage,
                speed: vel.length(),
                ..Default::default()
            },
            ttl: Some(ttl),
        }
    }

    pub fn pickup(kind: PickupKind, pos: Vec2, value: f32, ttl: f32) -> Self {
        Self {
            kind: EntityKind::Pickup(kind),
            pos,
            vel: Vec2::ZERO,
            radius: 8.0,
            health: 1.0,
            attrs: Attributes {
                value,
                ..Default::default()
            },
            ttl: Some(ttl),
        }
    }
}
