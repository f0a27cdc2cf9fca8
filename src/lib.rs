//! Arcade Core - engine-agnostic simulation skeleton for arcade games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (phase machine, entities, collisions, AI, ledger)
//! - `persistence`: Versioned save envelope and storage backends
//! - `tuning`: Data-driven game balance
//! - `error`: Typed errors for the few conditions that are not gameplay rules
//!
//! Rendering and raw device input are left to the host engine. The host feeds
//! abstract [`sim::TickInput`]s into [`sim::tick`] (or [`sim::TacticsState`])
//! and reads back a [`sim::Snapshot`] every frame.

pub mod error;
pub mod persistence;
pub mod sim;
pub mod tuning;

pub use error::{PersistError, TuningError};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta the driver will accept (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Save envelope schema version
    pub const SAVE_VERSION: u32 = 1;

    /// Attack -> Chase exit multiplier on attack range
    pub const ATTACK_EXIT_FACTOR: f32 = 1.25;
    /// Flee -> Attack exit multiplier on flee radius
    pub const FLEE_EXIT_FACTOR: f32 = 1.5;

    /// Seconds between patrol heading changes
    pub const PATROL_RETARGET_SECS: f32 = 2.0;
    /// Patrol leash around an enemy's home position
    pub const PATROL_LEASH: f32 = 120.0;
}

/// Unit vector from `from` toward `to`, or zero when they coincide
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Unit vector for an angle in radians
#[inline]
pub fn heading(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Install the platform logger.
///
/// Native hosts get `env_logger` (configure with `RUST_LOG`); wasm hosts get
/// the browser console plus a panic hook. Safe to call more than once.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// Install the platform logger.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_to_handles_coincident_points() {
        assert_eq!(direction_to(Vec2::ONE, Vec2::ONE), Vec2::ZERO);
        let d = direction_to(Vec2::ZERO, Vec2::new(3.0, 4.0));
        assert!((d.length() - 1.0).abs() < 1e-5);
    }
}
