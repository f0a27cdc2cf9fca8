//! Fixed-timestep driver for variable host frames
//!
//! Hosts call [`FixedStep::update`] once per rendered frame with the wall-clock
//! delta. The simulation always advances in whole `SIM_DT` steps, so passive
//! drains and AI timers run at the same rate regardless of frame rate.

use super::state::GameState;
use super::tick::{TickInput, tick};
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedStep {
    /// Unsimulated time carried to the next frame
    pub accumulator: f32,
    pub max_substeps: u32,
}

impl Default for FixedStep {
    fn default() -> Self {
        Self {
            accumulator: 0.0,
            max_substeps: MAX_SUBSTEPS,
        }
    }
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bank `frame_dt` and run `step(SIM_DT)` for every whole step available.
    ///
    /// Frame deltas are capped at `MAX_FRAME_DT` and at most `max_substeps`
    /// steps run per call. Returns the number of steps taken.
    pub fn run<F: FnMut(f32)>(&mut self, frame_dt: f32, mut step: F) -> u32 {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < self.max_substeps {
            step(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == self.max_substeps && self.accumulator >= SIM_DT {
            log::debug!("Dropping {:.3}s of backlog", self.accumulator);
            self.accumulator %= SIM_DT;
        }
        substeps
    }

    /// Drive the real-time mode for one host frame.
    ///
    /// One-shot inputs are consumed by the first step so a single key press
    /// never toggles pause twice.
    pub fn update(&mut self, state: &mut GameState, input: &mut TickInput, frame_dt: f32) -> u32 {
        self.run(frame_dt, |dt| {
            tick(state, input, dt);
            input.clear_one_shots();
        })
    }

    /// Fraction of a step left in the accumulator, for render interpolation
    pub fn alpha(&self) -> f32 {
        (self.accumulator / SIM_DT).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
