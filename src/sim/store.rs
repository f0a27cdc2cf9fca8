//! Entity store
//!
//! Owns every mutable game object for the current level. Entities are kept in
//! a `Vec` sorted by id (ids are allocated monotonically, so pushes keep the
//! order) which gives stable, deterministic iteration.
//!
//! Deaths are two-phase: [`EntityStore::despawn`] only clears the `active`
//! flag, and [`EntityStore::purge`] removes inactive entities at tick end.
//! Iteration never observes a collection being resized underneath it.

use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::entity::{Category, Entity, EntityId, EntitySpec};
use super::event::Rejection;

/// Per-category capacity ceilings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreLimits {
    /// Hard-rejected beyond this count
    pub enemies: usize,
    /// Oldest evicted beyond this count
    pub projectiles: usize,
    /// Oldest evicted beyond this count
    pub pickups: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            enemies: 128,
            projectiles: 256,
            pickups: 48,
        }
    }
}

impl StoreLimits {
    fn ceiling(&self, category: Category) -> usize {
        match category {
            Category::Player => 1,
            Category::Enemy => self.enemies,
            Category::Projectile => self.projectiles,
            Category::Pickup => self.pickups,
        }
    }
}

/// What [`EntityStore::apply_damage`] did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Target missing or already dead
    Ignored,
    /// Damage applied, target still alive
    Hurt { remaining: f32 },
    /// This hit killed the target (reported exactly once)
    Killed,
}

/// Flat id -> entity storage with deferred removal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStore {
    entities: Vec<Entity>,
    bounds: Aabb,
    limits: StoreLimits,
    next_id: u32,
}

impl EntityStore {
    pub fn new(bounds: Aabb, limits: StoreLimits) -> Self {
        Self {
            entities: Vec::new(),
            bounds,
            limits,
            next_id: 1,
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Aabb) {
        self.bounds = bounds;
    }

    /// Insert a new entity.
    ///
    /// Fails with [`Rejection::OutOfBounds`] outside the store bounds. At the
    /// category ceiling, projectiles and pickups evict their oldest active
    /// member while enemies and the player are refused with
    /// [`Rejection::CapacityReached`].
    pub fn spawn(&mut self, spec: EntitySpec) -> Result<EntityId, Rejection> {
        if !self.bounds.contains(spec.pos) {
            return Err(Rejection::OutOfBounds);
        }

        let category = spec.kind.category();
        if self.active_count(category) >= self.limits.ceiling(category) {
            match category {
                Category::Projectile | Category::Pickup => {
                    if let Some(oldest) = self.ids_of(category).first().copied() {
                        log::debug!("{:?} ceiling reached, evicting {:?}", category, oldest);
                        self.despawn(oldest);
                    }
                }
                Category::Enemy | Category::Player => return Err(Rejection::CapacityReached),
            }
        }

        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.push(Entity {
            id,
            kind: spec.kind,
            pos: spec.pos,
            vel: spec.vel,
            radius: spec.radius,
            health: spec.health,
            max_health: spec.health,
            active: true,
            behavior: Default::default(),
            attrs: spec.attrs,
            ttl: spec.ttl,
            cooldown: 0.0,
            contact_cooldown: 0.0,
            home: spec.pos,
            behavior_timer: 0.0,
        });
        Ok(id)
    }

    /// Mark an entity dead. Returns `true` only on the first call for a live entity.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        match self.get_mut(id) {
            Some(e) if e.active => {
                e.active = false;
                true
            }
            _ => false,
        }
    }

    /// The single damage path for store-owned health
    pub fn apply_damage(&mut self, id: EntityId, amount: f32) -> DamageOutcome {
        let Some(e) = self.get_mut(id).filter(|e| e.active) else {
            return DamageOutcome::Ignored;
        };
        e.health = (e.health - amount.max(0.0)).max(0.0);
        if e.health <= 0.0 {
            e.active = false;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Hurt {
                remaining: e.health,
            }
        }
    }

    /// Drop inactive entities; returns how many were removed
    pub fn purge(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(|e| e.active);
        before - self.entities.len()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index_of(id).map(move |i| &mut self.entities[i])
    }

    /// Visit active entities of a category in id order
    pub fn for_each_of_kind<F: FnMut(&Entity)>(&self, category: Category, mut f: F) {
        for e in &self.entities {
            if e.active && e.category() == category {
                f(e);
            }
        }
    }

    /// Mutable variant; entities marked inactive during the pass are skipped
    /// from that point on
    pub fn for_each_of_kind_mut<F: FnMut(&mut Entity)>(&mut self, category: Category, mut f: F) {
        for e in &mut self.entities {
            if e.active && e.category() == category {
                f(e);
            }
        }
    }

    /// Ids of active entities in a category, oldest first
    pub fn ids_of(&self, category: Category) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|e| e.active && e.category() == category)
            .map(|e| e.id)
            .collect()
    }

    pub fn active_count(&self, category: Category) -> usize {
        self.entities
            .iter()
            .filter(|e| e.active && e.category() == category)
            .count()
    }

    /// All stored entities, including ones awaiting purge
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Id the next spawn will receive
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Re-insert entities restored from a save. Ids are kept; the id counter
    /// resumes at `next_id` but never at or below a restored id.
    pub fn restore(&mut self, mut entities: Vec<Entity>, next_id: u32) {
        entities.sort_by_key(|e| e.id);
        entities.dedup_by_key(|e| e.id);
        let after_last = entities.last().map(|e| e.id.0 + 1).unwrap_or(1);
        self.next_id = next_id.max(after_last);
        self.entities = entities;
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.binary_search_by_key(&id, |e| e.id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{EnemyKind, Faction, PickupKind};
    use glam::Vec2;
    use proptest::prelude::*;

    fn store_with(limits: StoreLimits) -> EntityStore {
        EntityStore::new(Aabb::from_size(500.0, 500.0), limits)
    }

    fn grunt(x: f32) -> EntitySpec {
        EntitySpec::enemy(EnemyKind::Grunt, Vec2::new(x, 10.0), 1.0)
    }

    #[test]
    fn test_spawn_rejects_out_of_bounds() {
        let mut s = store_with(StoreLimits::default());
        assert_eq!(s.spawn(grunt(-1.0)), Err(Rejection::OutOfBounds));
        assert!(s.is_empty());
    }

    #[test]
    fn test_despawn_is_idempotent() {
        let mut s = store_with(StoreLimits::default());
        let id = s.spawn(grunt(10.0)).unwrap();
        assert!(s.despawn(id));
        assert!(!s.despawn(id));
        assert_eq!(s.active_count(Category::Enemy), 0);
        assert_eq!(s.purge(), 1);
        assert!(!s.despawn(id));
    }

    #[test]
    fn test_kill_reported_once() {
        let mut s = store_with(StoreLimits::default());
        let id = s.spawn(grunt(10.0)).unwrap();
        assert_eq!(s.apply_damage(id, 10.0), DamageOutcome::Hurt { remaining: 20.0 });
        assert_eq!(s.apply_damage(id, 25.0), DamageOutcome::Killed);
        assert_eq!(s.apply_damage(id, 25.0), DamageOutcome::Ignored);
        assert_eq!(s.get(id).map(|e| e.health), Some(0.0));
    }

    #[test]
    fn test_enemy_ceiling_rejects() {
        let mut s = store_with(StoreLimits {
            enemies: 2,
            ..Default::default()
        });
        s.spawn(grunt(10.0)).unwrap();
        s.spawn(grunt(20.0)).unwrap();
        assert_eq!(s.spawn(grunt(30.0)), Err(Rejection::CapacityReached));
    }

    #[test]
    fn test_projectile_ceiling_evicts_oldest() {
        let mut s = store_with(StoreLimits {
            projectiles: 2,
            ..Default::default()
        });
        let shot = |x: f32| {
            EntitySpec::projectile(Faction::Player, Vec2::new(x, 1.0), Vec2::X, 1.0, 1.0)
        };
        let first = s.spawn(shot(1.0)).unwrap();
        let second = s.spawn(shot(2.0)).unwrap();
        let third = s.spawn(shot(3.0)).unwrap();
        assert_eq!(s.ids_of(Category::Projectile), vec![second, third]);
        assert!(!s.get(first).unwrap().active);
    }

    #[test]
    fn test_mark_during_iteration() {
        let mut s = store_with(StoreLimits::default());
        for x in [10.0, 20.0, 30.0] {
            s.spawn(grunt(x)).unwrap();
        }
        s.spawn(EntitySpec::pickup(PickupKind::Coin, Vec2::new(5.0, 5.0), 1.0, 5.0))
            .unwrap();

        let mut visited = 0;
        s.for_each_of_kind_mut(Category::Enemy, |e| {
            visited += 1;
            e.active = false;
        });
        assert_eq!(visited, 3);
        assert_eq!(s.len(), 4);
        assert_eq!(s.purge(), 3);
        assert_eq!(s.active_count(Category::Pickup), 1);
    }

    #[test]
    fn test_restore_advances_id_counter() {
        let mut s = store_with(StoreLimits::default());
        let a = s.spawn(grunt(10.0)).unwrap();
        let saved: Vec<Entity> = s.iter().cloned().collect();

        let mut fresh = store_with(StoreLimits::default());
        fresh.restore(saved, 0);
        let b = fresh.spawn(grunt(20.0)).unwrap();
        assert!(b > a);
        assert!(fresh.get(a).is_some());
    }

    proptest! {
        #[test]
        fn prop_damage_kills_at_most_once(hits in proptest::collection::vec(0.0f32..40.0, 1..32)) {
            let mut s = store_with(StoreLimits::default());
            let id = s.spawn(grunt(10.0)).unwrap();
            let kills = hits
                .iter()
                .filter(|&&h| s.apply_damage(id, h) == DamageOutcome::Killed)
                .count();
            prop_assert!(kills <= 1);
            let total: f32 = hits.iter().sum();
            if total >= 30.5 {
                prop_assert_eq!(kills, 1);
            }
        }

        #[test]
        fn prop_ceiling_never_exceeded(n in 1usize..64, cap in 1usize..16) {
            let mut s = store_with(StoreLimits { projectiles: cap, ..Default::default() });
            for i in 0..n {
                let spec = EntitySpec::projectile(
                    Faction::Hostile,
                    Vec2::new((i % 400) as f32, 1.0),
                    Vec2::Y,
                    1.0,
                    1.0,
                );
                prop_assert!(s.spawn(spec).is_ok());
                prop_assert!(s.active_count(Category::Projectile) <= cap);
            }
        }
    }
}
