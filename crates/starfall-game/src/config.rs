//! Run configuration, game modes, and the progression phase enum.

use std::fmt;

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Tunables for the progression loop.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// How long the level-transition banner stays up, in seconds.
    pub level_banner_secs: f64,
    /// How long the game-over / victory banner stays up, in seconds.
    pub end_banner_secs: f64,
    /// The leaderboard the controller fetches at load time and polls for
    /// the chased-rank display.
    pub main_leaderboard_id: String,
    /// First rank of the fetched leaderboard page (0-based).
    pub fetch_range_start: u32,
    /// Last rank of the fetched leaderboard page (0-based, inclusive).
    pub fetch_range_end: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            level_banner_secs: 2.0,
            end_banner_secs: 2.0,
            main_leaderboard_id: "Main".into(),
            fetch_range_start: 0,
            fetch_range_end: 9,
        }
    }
}

// ---------------------------------------------------------------------------
// GameMode
// ---------------------------------------------------------------------------

/// How a run is scored and sequenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// A single indefinite level. The run ends only on ship destruction;
    /// the score is elapsed survival time, posted on game over.
    Endless,
    /// A finite ordered sequence of timed levels. Reaching a level's
    /// duration forces advance; clearing the list (or the final boss) ends
    /// the run in victory. No score posting.
    Horde,
}

// ---------------------------------------------------------------------------
// GamePhase
// ---------------------------------------------------------------------------

/// Where the controller is in its run lifecycle.
///
/// ```text
///                 auth completion        mode selected
///  Authenticating ───────────────► LoadingData ───────────► LevelTransition
///                                                                │ banner
///        ┌───────────────────────────────────────────────────────┘ expires
///        ▼                ship destroyed
///     Gameplay ──────────────────────────────► GameOver
///        │  │ duration reached                     │ banner expires:
///        │  └──────────► LevelTransition           ▼ post / play-again
///        │ boss destroyed or level list cleared
///        └──────────────────────────────────► Victory
/// ```
///
/// `LoadingData` covers both the concurrent bootstrap fetches and, once the
/// level feed has landed, the main-menu wait for a mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for an authentication or reconnect completion.
    Authenticating,
    /// Bootstrap fetches in flight, then the main menu.
    LoadingData,
    /// A level is live: the clock accumulates and hostiles spawn.
    Gameplay,
    /// Between levels, showing the level banner.
    LevelTransition,
    /// The ship was destroyed; showing the end-of-run banner.
    GameOver,
    /// The run was won; showing the victory banner.
    Victory,
}

impl GamePhase {
    /// Returns `true` while a run is in flight (clock or banner timers are
    /// meaningful).
    pub fn is_run_active(&self) -> bool {
        matches!(self, Self::Gameplay | Self::LevelTransition)
    }

    /// Returns `true` once the run has reached a terminal banner.
    pub fn is_run_over(&self) -> bool {
        matches!(self, Self::GameOver | Self::Victory)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Authenticating => "authenticating",
            Self::LoadingData => "loading-data",
            Self::Gameplay => "gameplay",
            Self::LevelTransition => "level-transition",
            Self::GameOver => "game-over",
            Self::Victory => "victory",
        };
        f.write_str(name)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_run_active_only_during_play_and_transition() {
        assert!(GamePhase::Gameplay.is_run_active());
        assert!(GamePhase::LevelTransition.is_run_active());
        assert!(!GamePhase::Authenticating.is_run_active());
        assert!(!GamePhase::LoadingData.is_run_active());
        assert!(!GamePhase::GameOver.is_run_active());
        assert!(!GamePhase::Victory.is_run_active());
    }

    #[test]
    fn test_is_run_over_only_for_terminal_banners() {
        assert!(GamePhase::GameOver.is_run_over());
        assert!(GamePhase::Victory.is_run_over());
        assert!(!GamePhase::Gameplay.is_run_over());
    }

    #[test]
    fn test_phase_display_names() {
        assert_eq!(GamePhase::Authenticating.to_string(), "authenticating");
        assert_eq!(GamePhase::LevelTransition.to_string(), "level-transition");
    }

    #[test]
    fn test_default_config_targets_main_leaderboard() {
        let config = GameConfig::default();
        assert_eq!(config.main_leaderboard_id, "Main");
        assert!(config.fetch_range_start < config.fetch_range_end);
        assert!(config.level_banner_secs > 0.0);
    }
}
