//! Arcade Core headless demo
//!
//! Plays one real-time run with a simple autopilot, saving and reloading it
//! halfway, then plays one turn-based level. Usage:
//!
//! ```text
//! arcade-core [seed] [--tuning path/to/tuning.json]
//! ```
//!
//! Set `RUST_LOG=debug` for per-entity logging.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use arcade_core::persistence::{self, FileStore};
    use arcade_core::sim::{
        Category, FixedStep, GamePhase, GameState, Resource, ShopItem, Snapshot, TacticsAction,
        TacticsState, TickInput,
    };
    use arcade_core::{Tuning, direction_to};
    use glam::{IVec2, Vec2};

    const SAVE_KEY: &str = "demo";
    const MAX_FRAMES: u32 = 60 * 60 * 10;
    const MAX_TACTICS_ACTIONS: u32 = 500;

    pub struct Options {
        pub seed: u64,
        pub tuning: Tuning,
    }

    pub fn parse_args() -> Result<Options, Box<dyn std::error::Error>> {
        let mut seed = 12345;
        let mut tuning = Tuning::default();
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--tuning" => {
                    let path = args.next().ok_or("--tuning needs a path")?;
                    tuning = Tuning::load(path)?;
                }
                other => seed = other.parse()?,
            }
        }
        Ok(Options { seed, tuning })
    }

    /// Kite away from the nearest enemy and shoot it; shop between waves
    fn autopilot(state: &GameState, input: &mut TickInput) {
        input.primary = false;
        input.secondary = false;
        match state.phase {
            GamePhase::Playing => {
                let Some(pos) = state.player_pos() else {
                    return;
                };
                let mut nearest: Option<(Vec2, f32)> = None;
                state.store.for_each_of_kind(Category::Enemy, |e| {
                    let d = e.pos.distance(pos);
                    if nearest.is_none_or(|(_, best)| d < best) {
                        nearest = Some((e.pos, d));
                    }
                });
                let center = state.store.bounds().center();
                input.move_dir = match nearest {
                    Some((enemy, d)) if d < 150.0 => direction_to(enemy, pos),
                    _ => direction_to(pos, center) * 0.5,
                };
                input.primary = true;
                input.secondary = state.ledger.get(Resource::AmmoLight) <= 0.0;
            }
            GamePhase::Shop => {
                // Permanent upgrades only; they never come back AlreadyFull
                let funds = state.ledger.get(Resource::Currency);
                let upgrade = [ShopItem::Damage, ShopItem::Armor, ShopItem::MaxHealth]
                    .into_iter()
                    .find(|item| item.cost(&state.tuning) <= funds)
                    .and_then(|item| ShopItem::ALL.iter().position(|i| *i == item));
                match upgrade {
                    Some(slot) => {
                        input.select = Some(slot);
                        input.primary = true;
                    }
                    None => input.confirm = true,
                }
            }
            GamePhase::Menu => input.confirm = true,
            _ => {}
        }
    }

    fn report(label: &str, snap: &Snapshot) {
        println!(
            "{label}: phase={:?} wave={} tick={} health={:.0} currency={:.0} entities={}",
            snap.phase,
            snap.wave,
            snap.tick,
            snap.counter(Resource::Health),
            snap.counter(Resource::Currency),
            snap.entities.len()
        );
    }

    pub fn run_arena(opts: &Options) -> Result<(), Box<dyn std::error::Error>> {
        let mut state = GameState::new(opts.seed, opts.tuning.clone());
        let mut input = TickInput::default();
        let mut driver = FixedStep::new();
        let mut store = FileStore::new(std::env::temp_dir().join("arcade-core"));
        let mut reloaded = false;

        // Alternate frame lengths to exercise the accumulator
        let frames = [1.0 / 60.0, 1.0 / 30.0, 1.0 / 144.0];
        for frame in 0..MAX_FRAMES {
            autopilot(&state, &mut input);
            driver.update(&mut state, &mut input, frames[frame as usize % frames.len()]);

            for event in state.drain_events() {
                log::debug!("{:?}", event);
            }

            if !reloaded && state.phase == GamePhase::Playing && state.wave_index >= 1 {
                persistence::save(&mut store, SAVE_KEY, &state)?;
                if let Some(save) = persistence::load_or_none(&store, SAVE_KEY) {
                    state = GameState::restore(save, opts.tuning.clone());
                    report("reloaded", &Snapshot::from(&state));
                }
                reloaded = true;
            }

            if state.phase.is_terminal() {
                break;
            }
        }

        report("arena", &Snapshot::from(&state));
        println!("outcome: {:?}, kills: {}", state.outcome, state.kills);
        store_cleanup(&mut store);
        Ok(())
    }

    fn store_cleanup(store: &mut FileStore) {
        use arcade_core::persistence::SaveStore;
        if let Err(e) = store.remove(SAVE_KEY) {
            log::warn!("Could not remove demo save: {}", e);
        }
    }

    /// Attack when possible, otherwise head for the exit
    fn tactics_action(state: &TacticsState) -> TacticsAction {
        let (Some(cell), Some(level)) = (state.player_cell(), state.level.as_ref()) else {
            return TacticsAction::Confirm;
        };
        let adjacent = state.store.ids_of(Category::Enemy).into_iter().any(|id| {
            state
                .store
                .get(id)
                .is_some_and(|e| (e.pos.round().as_ivec2() - cell).abs().element_sum() == 1)
        });
        if adjacent {
            return TacticsAction::Attack;
        }
        let toward = (level.exit - cell).signum();
        for dir in [IVec2::new(toward.x, 0), IVec2::new(0, toward.y), IVec2::Y, IVec2::NEG_Y] {
            if dir != IVec2::ZERO && level.is_floor(cell + dir) {
                return TacticsAction::Move(dir);
            }
        }
        TacticsAction::EndTurn
    }

    pub fn run_tactics(opts: &Options) {
        let mut state = TacticsState::new(opts.seed, opts.tuning.clone());
        let _ = state.act(TacticsAction::Confirm);

        for _ in 0..MAX_TACTICS_ACTIONS {
            match state.phase {
                GamePhase::EnemyTurn => {
                    state.advance();
                    for cue in state.advance_animations(f32::MAX) {
                        log::debug!("cue {:?}", cue);
                    }
                }
                GamePhase::Playing => {
                    if state.act(tactics_action(&state)).is_err() {
                        let _ = state.act(TacticsAction::EndTurn);
                    }
                }
                _ => break,
            }
        }
        report("tactics", &Snapshot::from(&state));
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    arcade_core::init_logging();
    log::info!("Arcade Core (native) starting...");

    let opts = match demo::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("arcade-core: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = demo::run_arena(&opts) {
        eprintln!("arcade-core: {e}");
        std::process::exit(1);
    }
    demo::run_tactics(&opts);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library; there is no standalone web entry point
}
