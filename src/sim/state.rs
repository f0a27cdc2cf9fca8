//! Game state for the real-time wave-survival mode
//!
//! All run state lives in one [`GameState`] value passed by reference into
//! every update function; there are no globals.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::behavior::mitigate;
use super::collision::Aabb;
use super::entity::{Category, EnemyKind, EntityId, EntityKind, EntitySpec, PickupKind};
use super::event::{GameEvent, Rejection};
use super::ledger::{Resource, ResourceLedger};
use super::phase::{self, GamePhase};
use super::store::EntityStore;
use super::wave::{WaveDescriptor, generate_wave};
use crate::tuning::Tuning;

/// Items offered between waves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShopItem {
    Heal,
    MaxHealth,
    Armor,
    Damage,
    Ammo,
}

impl ShopItem {
    /// Shop slot order
    pub const ALL: [ShopItem; 5] = [
        ShopItem::Heal,
        ShopItem::MaxHealth,
        ShopItem::Armor,
        ShopItem::Damage,
        ShopItem::Ammo,
    ];

    pub fn cost(&self, tuning: &Tuning) -> f32 {
        let e = &tuning.economy;
        match self {
            ShopItem::Heal => e.heal_cost,
            ShopItem::MaxHealth => e.max_health_cost,
            ShopItem::Armor => e.armor_cost,
            ShopItem::Damage => e.damage_cost,
            ShopItem::Ammo => e.ammo_cost,
        }
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Health reached zero
    Killed,
    /// Oxygen reached zero
    Suffocated,
    /// Run countdown reached zero
    TimeExpired,
    /// Final boss destroyed
    BossDefeated,
    /// Final wave cleared
    WavesCleared,
}

impl EndReason {
    pub fn is_victory(&self) -> bool {
        matches!(self, EndReason::BossDefeated | EndReason::WavesCleared)
    }
}

/// Upgradable player combat stats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub damage: f32,
    pub armor: f32,
    pub speed: f32,
    pub fire_cooldown: f32,
}

impl PlayerStats {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            damage: tuning.player.projectile_damage,
            armor: tuning.player.armor,
            speed: tuning.player.speed,
            fire_cooldown: tuning.player.fire_cooldown,
        }
    }
}

/// Build the run ledger from tuning
pub fn initial_ledger(tuning: &Tuning) -> ResourceLedger {
    let p = &tuning.player;
    let mut ledger = ResourceLedger::new();
    ledger
        .define(Resource::Health, p.max_health, Some(p.max_health))
        .define(Resource::Oxygen, p.max_oxygen, Some(p.max_oxygen))
        .with_drain(Resource::Oxygen, p.oxygen_drain_per_sec)
        .define(Resource::AmmoLight, p.start_ammo, Some(p.max_ammo))
        .define(Resource::AmmoHeavy, p.start_heavy_ammo, Some(p.max_heavy_ammo))
        .define(Resource::Currency, 0.0, None);
    ledger
}

/// Complete run state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub phase: GamePhase,
    /// Current wave index (0-based)
    pub wave_index: u32,
    pub wave: Option<WaveDescriptor>,
    pub store: EntityStore,
    pub ledger: ResourceLedger,
    pub stats: PlayerStats,
    pub player: Option<EntityId>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Run countdown (seconds), when enabled
    pub time_remaining: Option<f32>,
    pub shop_selection: usize,
    pub outcome: Option<EndReason>,
    pub kills: u32,
    /// Pending events for the presentation layer
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game in the Menu phase.
    ///
    /// Invalid tuning is logged, not refused; generators tolerate it.
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        if let Err(e) = tuning.validate() {
            log::warn!("Starting with unvalidated tuning: {}", e);
        }
        let bounds = Aabb::from_size(tuning.arena.width, tuning.arena.height);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            store: EntityStore::new(bounds, tuning.limits),
            ledger: initial_ledger(&tuning),
            stats: PlayerStats::from_tuning(&tuning),
            tuning,
            phase: GamePhase::Menu,
            wave_index: 0,
            wave: None,
            player: None,
            time_ticks: 0,
            time_remaining: None,
            shop_selection: 0,
            outcome: None,
            kills: 0,
            events: Vec::new(),
        }
    }

    /// Move to `next` if legal, recording a PhaseChanged event
    pub fn set_phase(&mut self, next: GamePhase) -> bool {
        match phase::transition(&mut self.phase, next) {
            Some(from) => {
                self.events.push(GameEvent::PhaseChanged { from, to: next });
                true
            }
            None => false,
        }
    }

    /// Menu -> Playing: reset every counter and arm the first wave
    pub fn start_run(&mut self) {
        if self.phase != GamePhase::Menu {
            return;
        }
        self.ledger = initial_ledger(&self.tuning);
        self.stats = PlayerStats::from_tuning(&self.tuning);
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.store.clear();
        self.wave_index = 0;
        self.kills = 0;
        self.outcome = None;
        self.shop_selection = 0;
        self.time_ticks = 0;
        self.time_remaining = self.tuning.waves.time_limit_secs;

        let center = self.store.bounds().center();
        let p = &self.tuning.player;
        self.player = self
            .store
            .spawn(EntitySpec::player(center, p.radius, p.speed))
            .ok();

        self.set_phase(GamePhase::Playing);
        self.arm_wave(0);
        log::info!("Run started (seed {})", self.seed);
    }

    /// Generate wave `index` and spawn its enemies along the arena edge
    pub fn arm_wave(&mut self, index: u32) {
        let wave = generate_wave(index, self.seed, &self.tuning.waves);
        let area = self.store.bounds().inset(self.tuning.arena.spawn_margin);

        for group in &wave.groups {
            for _ in 0..group.count {
                let pos = perimeter_point(&area, &mut self.rng);
                if let Err(r) = self
                    .store
                    .spawn(EntitySpec::enemy(group.kind, pos, wave.health_scale))
                {
                    log::debug!("Wave {} spawn of {:?} refused: {}", index, group.kind, r);
                }
            }
        }

        self.wave_index = index;
        self.wave = Some(wave);
        self.events.push(GameEvent::WaveStarted(index));
    }

    /// Terminal -> Menu. Clears the level.
    pub fn return_to_menu(&mut self) {
        if self.set_phase(GamePhase::Menu) {
            self.store.clear();
            self.player = None;
            self.wave = None;
        }
    }

    /// End the run; only takes effect from a phase that may end
    pub fn end_run(&mut self, reason: EndReason) {
        let target = if reason.is_victory() {
            GamePhase::Victory
        } else {
            GamePhase::GameOver
        };
        if self.set_phase(target) {
            log::info!("Run ended: {:?} at wave {}", reason, self.wave_index);
            self.outcome = Some(reason);
            self.events.push(GameEvent::RunEnded(reason));
        }
    }

    pub fn player_pos(&self) -> Option<Vec2> {
        self.player
            .and_then(|id| self.store.get(id))
            .filter(|e| e.active)
            .map(|e| e.pos)
    }

    pub fn player_radius(&self) -> f32 {
        self.player
            .and_then(|id| self.store.get(id))
            .map(|e| e.radius)
            .unwrap_or(self.tuning.player.radius)
    }

    /// The single damage path for the player: armor-mitigated, applied to
    /// the Health counter. Returns the damage actually taken.
    ///
    /// Depleting Health ends the run on the spot, so nothing later in the
    /// same tick can heal a dead player.
    pub fn damage_player(&mut self, base: f32) -> f32 {
        let amount = mitigate(base, self.stats.armor, self.tuning.combat.armor_k);
        let taken = -self.ledger.sub(Resource::Health, amount);
        if taken > 0.0 {
            self.events.push(GameEvent::PlayerDamaged { amount: taken });
        }
        if self.phase == GamePhase::Playing && self.ledger.is_depleted(Resource::Health) {
            self.end_run(EndReason::Killed);
        }
        taken
    }

    /// Record a refused action
    pub fn reject(&mut self, rejection: Rejection) {
        log::debug!("Rejected: {}", rejection);
        self.events.push(GameEvent::Rejected(rejection));
    }

    /// Buy a shop item. Nothing changes on rejection.
    pub fn purchase(&mut self, item: ShopItem) -> Result<(), Rejection> {
        let cost = item.cost(&self.tuning);
        let e = self.tuning.economy.clone();

        let already_full = match item {
            ShopItem::Heal => self.ledger.is_full(Resource::Health),
            ShopItem::Ammo => self.ledger.is_full(Resource::AmmoLight),
            _ => false,
        };
        if already_full {
            return Err(Rejection::AlreadyFull);
        }
        self.ledger.try_spend(Resource::Currency, cost)?;

        match item {
            ShopItem::Heal => {
                self.ledger.add(Resource::Health, e.heal_amount);
            }
            ShopItem::MaxHealth => {
                let max = self.ledger.max(Resource::Health).unwrap_or(0.0);
                self.ledger
                    .set_max(Resource::Health, Some(max + e.max_health_step));
                self.ledger.add(Resource::Health, e.max_health_step);
            }
            ShopItem::Armor => self.stats.armor += e.armor_step,
            ShopItem::Damage => self.stats.damage += e.damage_step,
            ShopItem::Ammo => {
                self.ledger.add(Resource::AmmoLight, e.ammo_amount);
            }
        }
        log::info!("Purchased {:?} for {}", item, cost);
        self.events.push(GameEvent::Purchased(item));
        Ok(())
    }

    /// Roll a pickup drop at `pos`
    pub fn maybe_drop_pickup(&mut self, pos: Vec2) {
        let e = &self.tuning.economy;
        if self.rng.random::<f32>() >= e.drop_chance {
            return;
        }
        let (kind, value) = match self.rng.random_range(0..4) {
            0 => (PickupKind::Health, e.pickup_health),
            1 => (PickupKind::Ammo, e.pickup_ammo),
            2 => (PickupKind::Oxygen, e.pickup_oxygen),
            _ => (PickupKind::Coin, 5.0),
        };
        let spec = EntitySpec::pickup(kind, pos, value, e.pickup_ttl);
        if let Err(r) = self.store.spawn(spec) {
            log::debug!("Pickup drop refused: {}", r);
        }
    }

    /// Spawn two mites around a dead splitter
    pub fn split_at(&mut self, pos: Vec2, spread: f32) {
        let scale = self.wave.as_ref().map(|w| w.health_scale).unwrap_or(1.0);
        let bounds = self.store.bounds();
        for side in [-1.0, 1.0] {
            let at = bounds.clamp_point(pos + Vec2::new(side * spread, 0.0));
            if let Err(r) = self
                .store
                .spawn(EntitySpec::enemy(EnemyKind::Mite, at, scale))
            {
                log::debug!("Split refused: {}", r);
            }
        }
    }

    /// Apply a collected pickup and remove it
    pub fn collect_pickup(&mut self, id: EntityId) {
        let Some((kind, value)) = self.store.get(id).and_then(|e| match e.kind {
            EntityKind::Pickup(kind) if e.active => Some((kind, e.attrs.value)),
            _ => None,
        }) else {
            return;
        };
        if !self.store.despawn(id) {
            return;
        }
        let resource = match kind {
            PickupKind::Health => Resource::Health,
            PickupKind::Ammo => Resource::AmmoLight,
            PickupKind::Oxygen => Resource::Oxygen,
            PickupKind::Coin => Resource::Currency,
        };
        self.ledger.add(resource, value);
        self.events.push(GameEvent::PickupCollected(kind));
    }

    pub fn enemies_remaining(&self) -> usize {
        self.store.active_count(Category::Enemy)
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Random point on the border of `area`
fn perimeter_point<R: Rng + ?Sized>(area: &Aabb, rng: &mut R) -> Vec2 {
    let t: f32 = rng.random();
    match rng.random_range(0..4) {
        0 => Vec2::new(area.min.x + t * area.size().x, area.min.y),
        1 => Vec2::new(area.min.x + t * area.size().x, area.max.y),
        2 => Vec2::new(area.min.x, area.min.y + t * area.size().y),
        _ => Vec2::new(area.max.x, area.min.y + t * area.size().y),
    }
}
