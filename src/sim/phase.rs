//! Top-level game phase and its legal transitions

use serde::{Deserialize, Serialize};

/// Current phase of the game. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for start input
    #[default]
    Menu,
    /// Active gameplay
    Playing,
    /// Frozen; only the pause toggle is read
    Paused,
    /// Between waves; only purchase/continue are read
    Shop,
    /// Turn-based variants: enemies act
    EnemyTurn,
    /// Run lost
    GameOver,
    /// Run won
    Victory,
}

impl GamePhase {
    /// Whether `self -> next` is a legal edge
    pub fn can_transition_to(self, next: GamePhase) -> bool {
        use GamePhase::*;
        matches!(
            (self, next),
            (Menu, Playing)
                | (Playing, Paused)
                | (Playing, Shop)
                | (Playing, EnemyTurn)
                | (Playing, GameOver)
                | (Playing, Victory)
                | (Paused, Playing)
                | (Shop, Playing)
                | (EnemyTurn, Playing)
                | (EnemyTurn, GameOver)
                | (EnemyTurn, Victory)
                | (GameOver, Menu)
                | (Victory, Menu)
        )
    }

    /// GameOver and Victory only accept the return-to-menu input
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Victory)
    }

    /// Phases in which entity state may change
    pub fn runs_simulation(self) -> bool {
        matches!(self, GamePhase::Playing | GamePhase::EnemyTurn)
    }
}

/// Apply a transition if it is legal.
///
/// Returns the previous phase on success. Illegal requests leave `phase`
/// untouched and are logged.
pub fn transition(phase: &mut GamePhase, next: GamePhase) -> Option<GamePhase> {
    let from = *phase;
    if !from.can_transition_to(next) {
        log::warn!("Refused phase transition {:?} -> {:?}", from, next);
        return None;
    }
    log::info!("Phase {:?} -> {:?}", from, next);
    *phase = next;
    Some(from)
}
