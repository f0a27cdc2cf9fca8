//! Gameplay events and action rejections
//!
//! Events are queued on the game state for the presentation layer and drained
//! once per frame. A [`Rejection`] is the standard answer to any action the
//! rules refuse; the state is left untouched and the player may retry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entity::{EnemyKind, EntityId, PickupKind};
use super::ledger::Resource;
use super::phase::GamePhase;
use super::state::{EndReason, ShopItem};

/// Why an attempted action was refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Rejection {
    #[error("out of ammo")]
    OutOfAmmo,
    #[error("not enough currency")]
    InsufficientFunds,
    #[error("not enough {0:?}")]
    Insufficient(Resource),
    #[error("already full")]
    AlreadyFull,
    #[error("too many entities")]
    CapacityReached,
    #[error("position out of bounds")]
    OutOfBounds,
    #[error("no target in range")]
    OutOfRange,
    #[error("path blocked")]
    Blocked,
    #[error("nothing to select")]
    NothingSelected,
}

/// Something the presentation layer may want to react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    WaveStarted(u32),
    WaveCleared(u32),
    Rejected(Rejection),
    EnemyHit { id: EntityId, amount: f32, crit: bool },
    EnemyKilled { id: EntityId, kind: EnemyKind, reward: f32 },
    PlayerDamaged { amount: f32 },
    PickupCollected(PickupKind),
    Purchased(ShopItem),
    Exploded { id: EntityId },
    RunEnded(EndReason),
}
