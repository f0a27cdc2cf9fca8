//! Save/load for the real-time mode
//!
//! A [`SaveGame`] is a plain record of everything needed to resume a run:
//! seed, wave, ledger, upgraded stats, live entities and the RNG stream. It is
//! wrapped in a versioned envelope and written through a [`SaveStore`].
//!
//! Loading never fails the caller: missing, corrupt or foreign-version data
//! is logged and treated as "no save".

pub mod envelope;
pub mod store;

use serde::{Deserialize, Serialize};

use rand_pcg::Pcg32;

use crate::error::PersistError;
use crate::sim::entity::{Entity, EntityId, EntityKind};
use crate::sim::ledger::ResourceLedger;
use crate::sim::phase::GamePhase;
use crate::sim::state::{GameState, PlayerStats};
use crate::sim::wave::generate_wave;
use crate::tuning::Tuning;

pub use envelope::{decode, encode};
pub use store::{MemoryStore, SaveStore};

#[cfg(not(target_arch = "wasm32"))]
pub use store::FileStore;

#[cfg(target_arch = "wasm32")]
pub use store::LocalStorageStore;

/// Serializable run state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveGame {
    pub seed: u64,
    pub wave_index: u32,
    pub time_ticks: u64,
    pub ledger: ResourceLedger,
    pub stats: PlayerStats,
    pub entities: Vec<Entity>,
    /// Id counter of the entity store
    #[serde(default)]
    pub next_id: u32,
    pub rng: Pcg32,
    #[serde(default)]
    pub player: Option<EntityId>,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub time_remaining: Option<f32>,
    /// Saved between waves; resumes in the shop
    #[serde(default)]
    pub in_shop: bool,
}

impl SaveGame {
    /// Record a run in progress. Dead entities awaiting purge are left out.
    pub fn capture(state: &GameState) -> Self {
        Self {
            seed: state.seed,
            wave_index: state.wave_index,
            time_ticks: state.time_ticks,
            ledger: state.ledger.clone(),
            stats: state.stats,
            entities: state.store.iter().filter(|e| e.active).cloned().collect(),
            next_id: state.store.next_id(),
            rng: state.rng.clone(),
            player: state.player,
            kills: state.kills,
            time_remaining: state.time_remaining,
            in_shop: state.phase == GamePhase::Shop,
        }
    }

    /// Check the invariants a live run always holds: counters within
    /// `[0, max]`, finite entity state, and a player id naming the player.
    pub fn validate(&self) -> Result<(), PersistError> {
        if let Some(resource) = self.ledger.out_of_range() {
            return Err(PersistError::Invalid(format!(
                "counter {:?} outside its range",
                resource
            )));
        }
        let stats = &self.stats;
        let stats_ok = [stats.damage, stats.armor, stats.speed, stats.fire_cooldown]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0);
        if !stats_ok {
            return Err(PersistError::Invalid("player stats out of range".to_string()));
        }
        if let Some(e) = self.entities.iter().find(|e| {
            !e.pos.is_finite() || !e.vel.is_finite() || !e.health.is_finite() || e.radius < 0.0
        }) {
            return Err(PersistError::Invalid(format!("entity {:?} is not finite", e.id)));
        }
        if let Some(id) = self.player {
            let is_player = self
                .entities
                .iter()
                .any(|e| e.id == id && e.kind == EntityKind::Player);
            if !is_player {
                return Err(PersistError::Invalid(format!("{:?} is not the player", id)));
            }
        }
        Ok(())
    }
}

impl GameState {
    /// Rebuild a run from a save. Resumes in Playing (or Shop if saved there).
    ///
    /// Entities are clamped into the arena of `tuning`, which may be smaller
    /// than the one the save was made in.
    pub fn restore(mut save: SaveGame, tuning: Tuning) -> Self {
        let mut state = GameState::new(save.seed, tuning);
        let bounds = state.store.bounds();
        for e in &mut save.entities {
            e.pos = bounds.clamp_point(e.pos);
        }
        state.wave = Some(generate_wave(save.wave_index, save.seed, &state.tuning.waves));
        state.wave_index = save.wave_index;
        state.time_ticks = save.time_ticks;
        state.ledger = save.ledger;
        state.stats = save.stats;
        state.rng = save.rng;
        state.kills = save.kills;
        state.time_remaining = save.time_remaining;
        state.store.restore(save.entities, save.next_id);
        state.player = save.player.filter(|id| state.store.get(*id).is_some());

        // Loading is not a gameplay transition; Menu has no edge to Shop
        state.phase = if save.in_shop {
            GamePhase::Shop
        } else {
            GamePhase::Playing
        };
        log::info!(
            "Restored run at wave {} tick {} ({:?})",
            state.wave_index,
            state.time_ticks,
            state.phase
        );
        state
    }
}

/// Encode and write the current run under `key`
pub fn save<S: SaveStore + ?Sized>(
    store: &mut S,
    key: &str,
    state: &GameState,
) -> Result<(), PersistError> {
    let blob = encode(&SaveGame::capture(state))?;
    store.write(key, &blob)?;
    log::info!("Saved run to {:?} ({} bytes)", key, blob.len());
    Ok(())
}

/// Read and decode the save under `key`.
pub fn load<S: SaveStore + ?Sized>(store: &S, key: &str) -> Result<Option<SaveGame>, PersistError> {
    match store.read(key)? {
        Some(blob) => decode(&blob).map(Some),
        None => Ok(None),
    }
}

/// Like [`load`], but any failure counts as "no save"
pub fn load_or_none<S: SaveStore + ?Sized>(store: &S, key: &str) -> Option<SaveGame> {
    match load(store, key) {
        Ok(save) => save,
        Err(e) => {
            log::warn!("Ignoring save {:?}: {}", key, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::entity::Category;
    use crate::sim::ledger::Resource;
    use crate::sim::tick::{TickInput, tick};

    fn running(seed: u64, ticks: usize) -> GameState {
        let mut state = GameState::new(seed, Tuning::default());
        state.start_run();
        let input = TickInput {
            move_dir: glam::Vec2::new(0.5, -0.5),
            primary: true,
            ..Default::default()
        };
        for _ in 0..ticks {
            tick(&mut state, &input, SIM_DT);
        }
        state
    }

    #[test]
    fn test_missing_and_corrupt_saves_are_none() {
        let mut store = MemoryStore::new();
        assert!(load_or_none(&store, "slot").is_none());

        store.write("slot", "{ definitely not a save").unwrap();
        assert!(load_or_none(&store, "slot").is_none());
        assert!(matches!(load(&store, "slot"), Err(PersistError::Malformed(_))));

        store
            .write("slot", r#"{"version":2,"payload":{}}"#)
            .unwrap();
        assert!(load_or_none(&store, "slot").is_none());
    }

    #[test]
    fn test_out_of_range_save_is_no_save() {
        let state = running(17, 10);
        let mut save = SaveGame::capture(&state);
        let mut value = serde_json::to_value(&save).unwrap();
        for counter in value["ledger"]["counters"].as_array_mut().unwrap() {
            match counter["resource"].as_str() {
                Some("Health") => counter["value"] = serde_json::json!(-50.0),
                Some("AmmoLight") => counter["value"] = serde_json::json!(99999.0),
                _ => {}
            }
        }
        save = serde_json::from_value(value).unwrap();
        assert!(matches!(save.validate(), Err(PersistError::Invalid(_))));

        let mut store = MemoryStore::new();
        store.write("slot", &encode(&save).unwrap()).unwrap();
        assert!(matches!(load(&store, "slot"), Err(PersistError::Invalid(_))));
        assert!(load_or_none(&store, "slot").is_none());
    }

    #[test]
    fn test_player_id_must_name_the_player() {
        let state = running(17, 10);
        let mut save = SaveGame::capture(&state);
        save.player = state.store.ids_of(Category::Enemy).first().copied();
        assert!(matches!(
            decode(&encode(&save).unwrap()),
            Err(PersistError::Invalid(_))
        ));
    }

    #[test]
    fn test_restore_clamps_entities_into_arena() {
        let state = running(17, 10);
        let mut save = SaveGame::capture(&state);
        for e in &mut save.entities {
            e.pos += glam::Vec2::splat(1.0e6);
        }
        let resumed = GameState::restore(save, Tuning::default());
        let bounds = resumed.store.bounds();
        assert!(resumed.store.iter().all(|e| bounds.contains(e.pos)));
    }

    #[test]
    fn test_restore_resumes_identically() {
        let mut original = running(2024, 90);
        let mut store = MemoryStore::new();
        save(&mut store, "slot", &original).unwrap();

        let loaded = load_or_none(&store, "slot").unwrap();
        let mut resumed = GameState::restore(loaded, Tuning::default());
        assert_eq!(resumed.phase, GamePhase::Playing);
        assert_eq!(resumed.time_ticks, original.time_ticks);
        assert_eq!(
            resumed.ledger.get(Resource::AmmoLight),
            original.ledger.get(Resource::AmmoLight)
        );
        assert_eq!(
            resumed.store.active_count(Category::Enemy),
            original.store.active_count(Category::Enemy)
        );

        // Same RNG stream and entities: the two runs stay in lockstep
        let input = TickInput {
            move_dir: glam::Vec2::new(-1.0, 0.0),
            ..Default::default()
        };
        for _ in 0..120 {
            tick(&mut original, &input, SIM_DT);
            tick(&mut resumed, &input, SIM_DT);
        }
        let a: Vec<_> = original.store.iter().map(|e| (e.id, e.pos)).collect();
        let b: Vec<_> = resumed.store.iter().map(|e| (e.id, e.pos)).collect();
        assert_eq!(a, b);
        assert_eq!(original.phase, resumed.phase);
    }

    #[test]
    fn test_shop_save_resumes_in_shop() {
        let mut state = running(8, 1);
        for id in state.store.ids_of(Category::Enemy) {
            state.store.despawn(id);
        }
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, GamePhase::Shop);

        let blob = encode(&SaveGame::capture(&state)).unwrap();
        let resumed = GameState::restore(decode(&blob).unwrap(), Tuning::default());
        assert_eq!(resumed.phase, GamePhase::Shop);
        assert!(resumed.player_pos().is_some());
    }
}
