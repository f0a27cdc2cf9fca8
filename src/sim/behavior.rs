//! Enemy AI step and damage math
//!
//! Each enemy carries a small [`BehaviorState`] tag driven by its distance to
//! the player. Engage and disengage thresholds differ (`lose_radius >
//! alert_radius`) so an enemy hovering near one threshold never flickers.

use glam::{IVec2, Vec2};
use rand::Rng;

use super::entity::{BehaviorState, EnemyParams, Entity};
use crate::consts::{ATTACK_EXIT_FACTOR, FLEE_EXIT_FACTOR, PATROL_LEASH, PATROL_RETARGET_SECS};
use crate::{direction_to, heading};

/// Next behavior state for an enemy at `distance` from the player
pub fn next_behavior(current: BehaviorState, distance: f32, p: &EnemyParams) -> BehaviorState {
    use BehaviorState::*;

    let fleeing_kind = p.flee_radius > 0.0;
    match current {
        Idle | Patrol => {
            if distance <= p.alert_radius {
                Chase
            } else {
                Patrol
            }
        }
        Chase => {
            if distance > p.lose_radius {
                Patrol
            } else if distance <= p.attack_range {
                Attack
            } else {
                Chase
            }
        }
        Attack => {
            if distance > p.lose_radius {
                Patrol
            } else if fleeing_kind && distance < p.flee_radius {
                Flee
            } else if distance > p.attack_range * ATTACK_EXIT_FACTOR {
                Chase
            } else {
                Attack
            }
        }
        Flee => {
            if distance > p.lose_radius {
                Patrol
            } else if distance > p.flee_radius * FLEE_EXIT_FACTOR {
                Attack
            } else {
                Flee
            }
        }
    }
}

/// Set an enemy's velocity for this tick from its behavior state
pub fn steer<R: Rng + ?Sized>(e: &mut Entity, player_pos: Vec2, dt: f32, rng: &mut R) {
    let speed = e.attrs.speed;
    let toward = direction_to(e.pos, player_pos);

    e.vel = match e.behavior {
        BehaviorState::Idle => Vec2::ZERO,
        BehaviorState::Patrol => {
            e.behavior_timer -= dt;
            if e.behavior_timer <= 0.0 || e.vel == Vec2::ZERO {
                e.behavior_timer = PATROL_RETARGET_SECS;
                let dir = if e.pos.distance(e.home) > PATROL_LEASH {
                    direction_to(e.pos, e.home)
                } else {
                    heading(rng.random_range(0.0..std::f32::consts::TAU))
                };
                dir * speed * 0.5
            } else {
                e.vel
            }
        }
        BehaviorState::Chase => toward * speed,
        BehaviorState::Attack if e.attrs.caps.ranged => Vec2::ZERO,
        BehaviorState::Attack => toward * speed,
        BehaviorState::Flee => -toward * speed,
    };
}

/// Count down fire and contact cooldowns
pub fn tick_cooldowns(e: &mut Entity, dt: f32) {
    e.cooldown = (e.cooldown - dt).max(0.0);
    e.contact_cooldown = (e.contact_cooldown - dt).max(0.0);
}

/// Ranged enemy in Attack with its fire cooldown elapsed
pub fn ready_to_fire(e: &Entity) -> bool {
    e.attrs.caps.ranged && e.behavior == BehaviorState::Attack && e.cooldown <= 0.0
}

/// Base damage with an optional critical multiplier
pub fn roll_damage<R: Rng + ?Sized>(
    base: f32,
    crit_chance: f32,
    crit_multiplier: f32,
    rng: &mut R,
) -> (f32, bool) {
    let crit = crit_chance > 0.0 && rng.random::<f32>() < crit_chance;
    if crit {
        (base * crit_multiplier, true)
    } else {
        (base, false)
    }
}

/// Diminishing-returns armor: `damage * (1 - armor / (armor + k))`
#[inline]
pub fn mitigate(damage: f32, armor: f32, k: f32) -> f32 {
    if armor <= 0.0 || k <= 0.0 {
        return damage;
    }
    damage * (1.0 - armor / (armor + k))
}

/// One greedy Manhattan step from `from` toward `target`.
///
/// Tries the axis with the larger gap first and the other axis once; stays put
/// when both are blocked.
pub fn grid_step<F>(from: IVec2, target: IVec2, blocked: F) -> IVec2
where
    F: Fn(IVec2) -> bool,
{
    let delta = target - from;
    let step_x = IVec2::new(delta.x.signum(), 0);
    let step_y = IVec2::new(0, delta.y.signum());
    let (primary, secondary) = if delta.x.abs() >= delta.y.abs() {
        (step_x, step_y)
    } else {
        (step_y, step_x)
    };

    [primary, secondary]
        .into_iter()
        .filter(|s| *s != IVec2::ZERO)
        .map(|s| from + s)
        .find(|next| !blocked(*next))
        .unwrap_or(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::EnemyKind;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn grunt() -> EnemyParams {
        EnemyParams::of(EnemyKind::Grunt)
    }

    #[test]
    fn test_patrol_to_chase_at_alert_radius() {
        let p = grunt();
        assert_eq!(next_behavior(BehaviorState::Patrol, p.alert_radius, &p), BehaviorState::Chase);
        assert_eq!(
            next_behavior(BehaviorState::Patrol, p.alert_radius + 1.0, &p),
            BehaviorState::Patrol
        );
    }

    #[test]
    fn test_chase_holds_inside_band() {
        let p = grunt();
        let mid = (p.alert_radius + p.lose_radius) / 2.0;
        assert_eq!(next_behavior(BehaviorState::Chase, mid, &p), BehaviorState::Chase);
        assert_eq!(next_behavior(BehaviorState::Chase, p.lose_radius, &p), BehaviorState::Chase);
        assert_eq!(
            next_behavior(BehaviorState::Chase, p.lose_radius + 0.1, &p),
            BehaviorState::Patrol
        );
    }

    #[test]
    fn test_ranged_kiter_flees_and_returns() {
        let p = EnemyParams::of(EnemyKind::Spitter);
        let s = next_behavior(BehaviorState::Attack, p.flee_radius - 1.0, &p);
        assert_eq!(s, BehaviorState::Flee);
        let s = next_behavior(s, p.flee_radius * 1.2, &p);
        assert_eq!(s, BehaviorState::Flee);
        let s = next_behavior(s, p.flee_radius * FLEE_EXIT_FACTOR + 1.0, &p);
        assert_eq!(s, BehaviorState::Attack);
    }

    #[test]
    fn test_mitigate_formula() {
        assert_eq!(mitigate(10.0, 0.0, 100.0), 10.0);
        assert!((mitigate(100.0, 100.0, 100.0) - 50.0).abs() < 1e-4);
        assert!((mitigate(100.0, 300.0, 100.0) - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_roll_damage_extremes() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(roll_damage(10.0, 0.0, 2.0, &mut rng), (10.0, false));
        assert_eq!(roll_damage(10.0, 1.0, 2.0, &mut rng), (20.0, true));
    }

    #[test]
    fn test_grid_step_prefers_long_axis_then_swaps() {
        let from = IVec2::new(0, 0);
        let target = IVec2::new(3, 1);
        assert_eq!(grid_step(from, target, |_| false), IVec2::new(1, 0));

        let wall = IVec2::new(1, 0);
        assert_eq!(grid_step(from, target, |c| c == wall), IVec2::new(0, 1));

        assert_eq!(grid_step(from, target, |_| true), from);
        assert_eq!(grid_step(from, from, |_| false), from);
    }

    #[test]
    fn test_ranged_attack_holds_position() {
        use crate::sim::entity::EntitySpec;
        use crate::sim::store::{EntityStore, StoreLimits};
        use crate::sim::collision::Aabb;

        let mut store = EntityStore::new(Aabb::from_size(500.0, 500.0), StoreLimits::default());
        let id = store
            .spawn(EntitySpec::enemy(EnemyKind::Spitter, Vec2::new(100.0, 100.0), 1.0))
            .unwrap();
        let mut rng = Pcg32::seed_from_u64(3);
        let e = store.get_mut(id).unwrap();
        e.behavior = BehaviorState::Attack;
        steer(e, Vec2::new(300.0, 100.0), 0.1, &mut rng);
        assert_eq!(e.vel, Vec2::ZERO);
        assert!(ready_to_fire(e));

        e.behavior = BehaviorState::Flee;
        steer(e, Vec2::new(300.0, 100.0), 0.1, &mut rng);
        assert!(e.vel.x < 0.0);
    }

    fn engaged(s: BehaviorState) -> bool {
        matches!(s, BehaviorState::Chase | BehaviorState::Attack | BehaviorState::Flee)
    }

    proptest! {
        #[test]
        fn prop_hysteresis_never_flickers(distances in proptest::collection::vec(0.0f32..1000.0, 1..128)) {
            for kind in EnemyKind::ALL {
                let p = EnemyParams::of(kind);
                let mut state = BehaviorState::Idle;
                for &d in &distances {
                    let next = next_behavior(state, d, &p);
                    if engaged(state) && next == BehaviorState::Patrol {
                        prop_assert!(d > p.lose_radius);
                    }
                    if !engaged(state) && engaged(next) {
                        prop_assert!(d <= p.alert_radius);
                    }
                    state = next;
                }
            }
        }

        #[test]
        fn prop_band_is_stable(d in 0.0f32..1.0) {
            let p = grunt();
            let inside = p.alert_radius + (p.lose_radius - p.alert_radius) * d;
            let mut state = BehaviorState::Chase;
            for _ in 0..8 {
                state = next_behavior(state, inside, &p);
                prop_assert_eq!(state, BehaviorState::Chase);
            }
            let mut state = BehaviorState::Patrol;
            if inside > p.alert_radius {
                for _ in 0..8 {
                    state = next_behavior(state, inside, &p);
                    prop_assert_eq!(state, BehaviorState::Patrol);
                }
            }
        }
    }
}
