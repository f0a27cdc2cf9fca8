//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod behavior;
pub mod collision;
pub mod driver;
pub mod entity;
pub mod event;
pub mod ledger;
pub mod phase;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod tactics;
pub mod tick;
pub mod wave;

pub use collision::Aabb;
pub use driver::FixedStep;
pub use entity::{
    BehaviorState, Capabilities, Category, EnemyKind, EnemyParams, Entity, EntityId, EntityKind,
    EntitySpec, Faction, PickupKind,
};
pub use event::{GameEvent, Rejection};
pub use ledger::{Counter, Resource, ResourceLedger};
pub use phase::GamePhase;
pub use snapshot::{EntityView, Snapshot};
pub use state::{EndReason, GameState, PlayerStats, ShopItem};
pub use store::{DamageOutcome, EntityStore, StoreLimits};
pub use tactics::{AnimationCue, CueKind, TacticsAction, TacticsState};
pub use tick::{InputEvent, TickInput, tick};
pub use wave::{LevelDescriptor, SpawnGroup, WaveDescriptor, generate_level, generate_wave};
