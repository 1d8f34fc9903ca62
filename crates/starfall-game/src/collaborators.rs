//! Seams to the gameplay and presentation layers.
//!
//! The controller never touches rendering, input, or unit mechanics — it
//! drives them through these traits and is driven back through the
//! `on_ship_destroyed` / `on_boss_destroyed` notifications on
//! [`ProgressionController`](crate::ProgressionController). All calls are
//! one-way: nothing here returns a value the controller consumes.

use starfall_protocol::{Leaderboard, ScoreEntry};

// ---------------------------------------------------------------------------
// Gameplay units
// ---------------------------------------------------------------------------

/// Spawns and clears hostile waves.
pub trait HostileSpawner {
    /// Begins spawning waves for a level. Endless mode passes `-1`.
    fn start_spawning(&mut self, level_index: i32);

    /// Stops producing new waves; active hostiles are unaffected.
    fn stop_spawning(&mut self);

    /// Detonates every hostile currently alive (victory sweep).
    fn explode_all_active(&mut self);
}

/// The player's unit.
pub trait Ship {
    /// Places a fresh ship at the start of a run.
    fn spawn(&mut self);

    /// Restores the ship to full health between levels.
    fn heal(&mut self);
}

/// A spawner that does nothing. For headless runs and tests that don't
/// inspect unit traffic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSpawner;

impl HostileSpawner for NoopSpawner {
    fn start_spawning(&mut self, _level_index: i32) {}
    fn stop_spawning(&mut self) {}
    fn explode_all_active(&mut self) {}
}

/// A ship that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopShip;

impl Ship for NoopShip {
    fn spawn(&mut self) {}
    fn heal(&mut self) {}
}

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

/// One-way notifications to the HUD and dialog layer.
pub trait Presentation {
    // -- Connection flow --
    fn show_connecting(&mut self);
    fn hide_connecting(&mut self);
    /// Ask the player to pick a login method.
    fn prompt_login(&mut self);
    /// Surface a backend failure message to the player.
    fn notify_error(&mut self, message: &str);
    /// The bootstrap data could not be loaded; a run cannot start.
    fn notify_load_failed(&mut self, message: &str);
    fn show_main_menu(&mut self);

    // -- In-run HUD --
    /// Banner announcing the level about to start.
    fn show_level_banner(&mut self, text: &str);
    fn hide_level_banner(&mut self);
    /// The level's goal text, shown alongside the banner.
    fn push_level_goal(&mut self, description: &str);
    /// The live run clock, in seconds.
    fn set_elapsed(&mut self, secs: f64);
    /// The next leaderboard entry the player is chasing.
    fn push_chased_entry(&mut self, entry: &ScoreEntry);
    /// The player has passed the best cached entry.
    fn set_all_time_best(&mut self);

    // -- End of run --
    fn show_game_over(&mut self);
    fn hide_game_over(&mut self);
    fn show_victory(&mut self);
    fn hide_victory(&mut self);
    /// Ask for a display name before posting a score.
    fn prompt_display_name(&mut self);
    fn show_play_again(&mut self);
    /// Present a freshly fetched leaderboard page.
    fn show_leaderboards(&mut self, board: &Leaderboard);
}

/// A presentation layer that swallows every notification.
///
/// The explicit no-op handler for headless runs and tests that don't
/// inspect HUD traffic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPresentation;

impl Presentation for NoopPresentation {
    fn show_connecting(&mut self) {}
    fn hide_connecting(&mut self) {}
    fn prompt_login(&mut self) {}
    fn notify_error(&mut self, _message: &str) {}
    fn notify_load_failed(&mut self, _message: &str) {}
    fn show_main_menu(&mut self) {}
    fn show_level_banner(&mut self, _text: &str) {}
    fn hide_level_banner(&mut self) {}
    fn push_level_goal(&mut self, _description: &str) {}
    fn set_elapsed(&mut self, _secs: f64) {}
    fn push_chased_entry(&mut self, _entry: &ScoreEntry) {}
    fn set_all_time_best(&mut self) {}
    fn show_game_over(&mut self) {}
    fn hide_game_over(&mut self) {}
    fn show_victory(&mut self) {}
    fn hide_victory(&mut self) {}
    fn prompt_display_name(&mut self) {}
    fn show_play_again(&mut self) {}
    fn show_leaderboards(&mut self, _board: &Leaderboard) {}
}
