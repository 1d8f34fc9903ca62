//! Game-level progression logic for Starfall.
//!
//! This crate owns the [`ProgressionController`]: the state machine that
//! sequences authentication, data loading, and the timed level loop around
//! the arrival (or failure) of backend completions. Gameplay mechanics and
//! rendering stay outside — the controller talks to them through the
//! collaborator traits in [`collaborators`].

mod collaborators;
mod config;
mod controller;
mod error;

pub use collaborators::{
    HostileSpawner, NoopPresentation, NoopShip, NoopSpawner, Presentation, Ship,
};
pub use config::{GameConfig, GameMode, GamePhase};
pub use controller::ProgressionController;
pub use error::GameError;
