//! Data-driven game balance
//!
//! Every number a designer might want to change lives here. Missing fields in
//! a tuning file fall back to the defaults, so a file only needs to list what
//! it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TuningError;
use crate::sim::entity::{EnemyKind, EnemyParams};
use crate::sim::store::StoreLimits;

/// Arena dimensions (origin at the top-left corner)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    pub width: f32,
    pub height: f32,
    /// Enemies spawn this far inside the arena edge
    pub spawn_margin: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 640.0,
            spawn_margin: 24.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub max_health: f32,
    pub speed: f32,
    pub radius: f32,
    pub armor: f32,
    pub fire_cooldown: f32,
    pub projectile_speed: f32,
    pub projectile_damage: f32,
    /// Heavy shots multiply projectile damage by this
    pub heavy_multiplier: f32,
    pub projectile_ttl: f32,
    pub start_ammo: f32,
    pub max_ammo: f32,
    pub start_heavy_ammo: f32,
    pub max_heavy_ammo: f32,
    pub max_oxygen: f32,
    pub oxygen_drain_per_sec: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            speed: 180.0,
            radius: 12.0,
            armor: 0.0,
            fire_cooldown: 0.2,
            projectile_speed: 480.0,
            projectile_damage: 10.0,
            heavy_multiplier: 3.0,
            projectile_ttl: 1.5,
            start_ammo: 120.0,
            max_ammo: 200.0,
            start_heavy_ammo: 5.0,
            max_heavy_ammo: 10.0,
            max_oxygen: 180.0,
            oxygen_drain_per_sec: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    /// K in `damage * (1 - armor / (armor + K))`
    pub armor_k: f32,
    /// Seconds between contact hits from the same enemy
    pub contact_cooldown: f32,
    pub hostile_projectile_ttl: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            crit_chance: 0.1,
            crit_multiplier: 2.0,
            armor_k: 100.0,
            contact_cooldown: 0.75,
            hostile_projectile_ttl: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyTuning {
    pub heal_cost: f32,
    pub heal_amount: f32,
    pub max_health_cost: f32,
    pub max_health_step: f32,
    pub armor_cost: f32,
    pub armor_step: f32,
    pub damage_cost: f32,
    pub damage_step: f32,
    pub ammo_cost: f32,
    pub ammo_amount: f32,
    /// Chance a killed enemy drops a pickup
    pub drop_chance: f32,
    pub pickup_ttl: f32,
    pub pickup_health: f32,
    pub pickup_ammo: f32,
    pub pickup_oxygen: f32,
}

impl Default for EconomyTuning {
    fn default() -> Self {
        Self {
            heal_cost: 20.0,
            heal_amount: 40.0,
            max_health_cost: 40.0,
            max_health_step: 20.0,
            armor_cost: 35.0,
            armor_step: 15.0,
            damage_cost: 45.0,
            damage_step: 4.0,
            ammo_cost: 10.0,
            ammo_amount: 60.0,
            drop_chance: 0.2,
            pickup_ttl: 10.0,
            pickup_health: 15.0,
            pickup_ammo: 20.0,
            pickup_oxygen: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    /// Clearing this many waves (the last one holds a boss) wins the run
    pub waves_to_win: u32,
    /// A boss joins every Nth wave
    pub boss_every: u32,
    pub base_enemies: u32,
    pub enemies_per_wave: u32,
    /// Enemy health multiplier added per wave
    pub health_scale_per_wave: f32,
    /// Whole-run countdown in seconds; `None` disables it
    pub time_limit_secs: Option<f32>,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            waves_to_win: 10,
            boss_every: 5,
            base_enemies: 6,
            enemies_per_wave: 2,
            health_scale_per_wave: 0.12,
            time_limit_secs: None,
        }
    }
}

/// Grid-based turn mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticsTuning {
    pub width: i32,
    pub height: i32,
    pub max_ap: f32,
    pub player_health: f32,
    pub attack_damage: f32,
    pub enemy_health: f32,
    pub enemy_damage: f32,
    pub enemy_count: u32,
    /// Fraction of free cells turned into walls
    pub wall_density: f32,
    /// Display-only delay between enemy actions
    pub action_delay_secs: f32,
}

impl Default for TacticsTuning {
    fn default() -> Self {
        Self {
            width: 12,
            height: 9,
            max_ap: 2.0,
            player_health: 30.0,
            attack_damage: 6.0,
            enemy_health: 10.0,
            enemy_damage: 4.0,
            enemy_count: 4,
            wall_density: 0.12,
            action_delay_secs: 0.35,
        }
    }
}

/// Complete balance configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub arena: ArenaTuning,
    pub player: PlayerTuning,
    pub combat: CombatTuning,
    pub economy: EconomyTuning,
    pub waves: WaveTuning,
    pub limits: StoreLimits,
    pub tactics: TacticsTuning,
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate a JSON tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn to_json_pretty(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the simulation cannot run sensibly
    pub fn validate(&self) -> Result<(), TuningError> {
        fn invalid(msg: impl Into<String>) -> Result<(), TuningError> {
            Err(TuningError::Invalid(msg.into()))
        }

        if self.arena.width <= 0.0 || self.arena.height <= 0.0 {
            return invalid("arena must have positive size");
        }
        if self.arena.spawn_margin * 2.0 >= self.arena.width.min(self.arena.height) {
            return invalid("spawn margin leaves no room inside the arena");
        }
        if self.player.max_health <= 0.0 {
            return invalid("player max_health must be positive");
        }
        if !(0.0..=1.0).contains(&self.combat.crit_chance) {
            return invalid("crit_chance must be within [0, 1]");
        }
        if self.combat.armor_k <= 0.0 {
            return invalid("armor_k must be positive");
        }
        if !(0.0..=1.0).contains(&self.economy.drop_chance) {
            return invalid("drop_chance must be within [0, 1]");
        }
        if self.waves.waves_to_win == 0 || self.waves.boss_every == 0 {
            return invalid("waves_to_win and boss_every must be at least 1");
        }
        if self.limits.enemies == 0 || self.limits.projectiles == 0 || self.limits.pickups == 0 {
            return invalid("entity limits must be at least 1");
        }
        if self.tactics.max_ap < 1.0 {
            return invalid("tactics max_ap must be at least 1");
        }
        if self.tactics.width < 3 || self.tactics.height < 3 {
            return invalid("tactics grid must be at least 3x3");
        }
        for kind in EnemyKind::ALL {
            let p = EnemyParams::of(kind);
            if p.lose_radius <= p.alert_radius {
                return invalid(format!("{kind:?} lose_radius must exceed alert_radius"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let t = Tuning::from_json_str(r#"{ "player": { "max_health": 250 } }"#).unwrap();
        assert_eq!(t.player.max_health, 250.0);
        assert_eq!(t.player.speed, PlayerTuning::default().speed);
        assert_eq!(t.waves.waves_to_win, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Tuning::from_json_str(r#"{ "combat": { "crit_chance": 1.5 } }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));

        let err = Tuning::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_round_trip_pretty_json() {
        let json = Tuning::default().to_json_pretty().unwrap();
        let back = Tuning::from_json_str(&json).unwrap();
        assert_eq!(back.tactics.max_ap, 2.0);
    }
}
