//! Collision and proximity checks
//!
//! Everything here is brute force: each group pair is tested O(n*m) once per
//! tick. Entity counts are in the dozens, so there is no spatial partitioning.
//!
//! Projectile policy: a projectile hits at most one target per pass (the first
//! overlapping target in id order). Several projectiles may still hit the same
//! target in the same pass.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Category, EntityId, EntityKind, Faction};
use super::store::EntityStore;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Rectangle from origin with the given size
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width, height))
    }

    pub fn centered(center: Vec2, half_extents: Vec2) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Edges are inclusive
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Touching edges count as overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }

    /// Shrink by `margin` on every side (never inverts)
    pub fn inset(&self, margin: f32) -> Aabb {
        let m = Vec2::splat(margin).min(self.size() * 0.5);
        Aabb::new(self.min + m, self.max - m)
    }
}

/// Circle-circle overlap (touching counts)
#[inline]
pub fn circles_overlap(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> bool {
    let r = a_radius + b_radius;
    a_pos.distance_squared(b_pos) <= r * r
}

/// Nearest candidate to `from`.
///
/// Ties keep the first candidate found at the minimum distance.
pub fn nearest<I>(from: Vec2, candidates: I) -> Option<(EntityId, f32)>
where
    I: IntoIterator<Item = (EntityId, Vec2)>,
{
    let mut best: Option<(EntityId, f32)> = None;
    for (id, pos) in candidates {
        let d = from.distance_squared(pos);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((id, d)),
        }
    }
    best.map(|(id, d)| (id, d.sqrt()))
}

/// Nearest active enemy to `from`
pub fn nearest_enemy(store: &EntityStore, from: Vec2) -> Option<(EntityId, f32)> {
    let mut candidates = Vec::new();
    store.for_each_of_kind(Category::Enemy, |e| candidates.push((e.id, e.pos)));
    nearest(from, candidates)
}

/// A projectile overlapping a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub projectile: EntityId,
    pub target: EntityId,
    pub damage: f32,
}

/// Projectiles of `faction` against their opposing category.
///
/// Player projectiles test enemies, hostile projectiles test the player.
/// First match only per projectile.
pub fn projectile_hits(store: &EntityStore, faction: Faction) -> Vec<Hit> {
    let target_category = match faction {
        Faction::Player => Category::Enemy,
        Faction::Hostile => Category::Player,
    };

    let mut targets = Vec::new();
    store.for_each_of_kind(target_category, |t| targets.push((t.id, t.pos, t.radius)));

    let mut hits = Vec::new();
    store.for_each_of_kind(Category::Projectile, |p| {
        if p.kind != EntityKind::Projectile(faction) {
            return;
        }
        if let Some(&(target, _, _)) = targets
            .iter()
            .find(|(_, pos, r)| circles_overlap(p.pos, p.radius, *pos, *r))
        {
            hits.push(Hit {
                projectile: p.id,
                target,
                damage: p.attrs.damage,
            });
        }
    });
    hits
}

/// All active entities of `category` overlapping entity `id`
pub fn contacts(store: &EntityStore, id: EntityId, category: Category) -> Vec<EntityId> {
    let Some(subject) = store.get(id).filter(|e| e.active) else {
        return Vec::new();
    };
    let (pos, radius) = (subject.pos, subject.radius);
    let mut found = Vec::new();
    store.for_each_of_kind(category, |e| {
        if e.id != id && circles_overlap(pos, radius, e.pos, e.radius) {
            found.push(e.id);
        }
    });
    found
}

/// Active entities of `category` whose centre lies within `radius` of `center`
pub fn within_radius(
    store: &EntityStore,
    center: Vec2,
    radius: f32,
    category: Category,
) -> Vec<EntityId> {
    let mut found = Vec::new();
    store.for_each_of_kind(category, |e| {
        if circles_overlap(center, radius, e.pos, e.radius) {
            found.push(e.id);
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{EnemyKind, EntitySpec};
    use crate::sim::store::StoreLimits;

    fn store() -> EntityStore {
        EntityStore::new(Aabb::from_size(1000.0, 1000.0), StoreLimits::default())
    }

    #[test]
    fn test_circles_touching_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 5.0, Vec2::new(10.0, 0.0), 5.0));
        assert!(!circles_overlap(Vec2::ZERO, 5.0, Vec2::new(10.1, 0.0), 5.0));
    }

    #[test]
    fn test_aabb_overlap_and_contains() {
        let a = Aabb::from_size(10.0, 10.0);
        let b = Aabb::new(Vec2::new(10.0, 5.0), Vec2::new(20.0, 20.0));
        let c = Aabb::new(Vec2::new(11.0, 0.0), Vec2::new(20.0, 20.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(a.contains(Vec2::new(10.0, 10.0)));
        assert!(!a.contains(Vec2::new(10.5, 10.0)));
        assert_eq!(a.clamp_point(Vec2::new(-3.0, 50.0)), Vec2::new(0.0, 10.0));
    }

    #[test]
    fn test_nearest_tie_keeps_first() {
        let candidates = vec![
            (EntityId(7), Vec2::new(10.0, 0.0)),
            (EntityId(3), Vec2::new(-10.0, 0.0)),
            (EntityId(9), Vec2::new(50.0, 0.0)),
        ];
        let (id, d) = nearest(Vec2::ZERO, candidates).unwrap();
        assert_eq!(id, EntityId(7));
        assert!((d - 10.0).abs() < 1e-5);
        assert!(nearest(Vec2::ZERO, Vec::new()).is_none());
    }

    #[test]
    fn test_projectile_hits_first_match_only() {
        let mut s = store();
        let a = s
            .spawn(EntitySpec::enemy(EnemyKind::Grunt, Vec2::new(100.0, 100.0), 1.0))
            .unwrap();
        let _b = s
            .spawn(EntitySpec::enemy(EnemyKind::Grunt, Vec2::new(104.0, 100.0), 1.0))
            .unwrap();
        let p = s
            .spawn(EntitySpec::projectile(
                Faction::Player,
                Vec2::new(102.0, 100.0),
                Vec2::X,
                5.0,
                1.0,
            ))
            .unwrap();

        let hits = projectile_hits(&s, Faction::Player);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].projectile, p);
        assert_eq!(hits[0].target, a);

        // Hostile projectiles ignore enemies
        assert!(projectile_hits(&s, Faction::Hostile).is_empty());
    }

    #[test]
    fn test_contacts_skip_inactive() {
        let mut s = store();
        let player = s
            .spawn(EntitySpec::player(Vec2::new(50.0, 50.0), 10.0, 100.0))
            .unwrap();
        let e = s
            .spawn(EntitySpec::enemy(EnemyKind::Runner, Vec2::new(60.0, 50.0), 1.0))
            .unwrap();
        assert_eq!(contacts(&s, player, Category::Enemy), vec![e]);
        s.despawn(e);
        assert!(contacts(&s, player, Category::Enemy).is_empty());
    }
}
