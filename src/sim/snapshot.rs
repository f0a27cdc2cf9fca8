//! Read-only render snapshot
//!
//! Hosts read one [`Snapshot`] per frame and draw it however they like. Only
//! plain data goes in here; no engine types.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{BehaviorState, EntityId, EntityKind};
use super::ledger::{Counter, Resource};
use super::phase::GamePhase;
use super::state::GameState;
use super::store::EntityStore;
use super::tactics::TacticsState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// 0..=1
    pub health: f32,
    pub behavior: BehaviorState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Simulation tick (real-time) or turn number (tactics)
    pub tick: u64,
    pub phase: GamePhase,
    /// Wave index (real-time) or level depth (tactics)
    pub wave: u32,
    pub entities: Vec<EntityView>,
    pub ledger: Vec<Counter>,
}

impl Snapshot {
    /// Ledger value by resource, 0 when undefined
    pub fn counter(&self, resource: Resource) -> f32 {
        self.ledger
            .iter()
            .find(|c| c.resource == resource)
            .map(|c| c.value)
            .unwrap_or(0.0)
    }
}

/// Active entities only. The player's health bar comes from the ledger.
fn views(store: &EntityStore, player_health: f32) -> Vec<EntityView> {
    store
        .iter()
        .filter(|e| e.active)
        .map(|e| EntityView {
            id: e.id,
            kind: e.kind,
            pos: e.pos,
            vel: e.vel,
            radius: e.radius,
            health: match e.kind {
                EntityKind::Player => player_health,
                _ => e.health_fraction(),
            },
            behavior: e.behavior,
        })
        .collect()
}

fn health_fraction(counters: &[Counter]) -> f32 {
    counters
        .iter()
        .find(|c| c.resource == Resource::Health)
        .and_then(|c| c.max.filter(|m| *m > 0.0).map(|m| (c.value / m).clamp(0.0, 1.0)))
        .unwrap_or(0.0)
}

impl From<&GameState> for Snapshot {
    fn from(state: &GameState) -> Self {
        let ledger = state.ledger.counters().to_vec();
        Snapshot {
            tick: state.time_ticks,
            phase: state.phase,
            wave: state.wave_index,
            entities: views(&state.store, health_fraction(&ledger)),
            ledger,
        }
    }
}

impl From<&TacticsState> for Snapshot {
    fn from(state: &TacticsState) -> Self {
        let ledger = state.ledger.counters().to_vec();
        Snapshot {
            tick: state.turn as u64,
            phase: state.phase,
            wave: state.depth,
            entities: views(&state.store, health_fraction(&ledger)),
            ledger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Category;
    use crate::sim::tactics::TacticsAction;
    use crate::tuning::Tuning;

    #[test]
    fn test_snapshot_reads_player_health_from_ledger() {
        let mut state = GameState::new(1, Tuning::default());
        state.start_run();
        state.damage_player(25.0);

        let snap = Snapshot::from(&state);
        assert_eq!(snap.phase, GamePhase::Playing);
        assert_eq!(snap.counter(Resource::Health), 75.0);
        let player = snap
            .entities
            .iter()
            .find(|v| v.kind == EntityKind::Player)
            .unwrap();
        assert!((player.health - 0.75).abs() < 1e-6);
        assert_eq!(
            snap.entities.len(),
            1 + state.store.active_count(Category::Enemy)
        );
    }

    #[test]
    fn test_snapshot_skips_dead_entities() {
        let mut state = GameState::new(2, Tuning::default());
        state.start_run();
        let victim = state.store.ids_of(Category::Enemy)[0];
        state.store.despawn(victim);
        let snap = Snapshot::from(&state);
        assert!(snap.entities.iter().all(|v| v.id != victim));
    }

    #[test]
    fn test_tactics_snapshot_serializes() {
        let mut state = TacticsState::new(3, Tuning::default());
        state.act(TacticsAction::Confirm).unwrap();
        let snap = Snapshot::from(&state);
        assert_eq!(snap.counter(Resource::ActionPoints), 2.0);

        let json = serde_json::to_string(&snap).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
