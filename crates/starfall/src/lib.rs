//! # Starfall
//!
//! Backend-session orchestration and level progression for an arcade game
//! client.
//!
//! Starfall authenticates a player against a remote backend, keeps ranked
//! score data cached locally, and drives a timed level-progression loop
//! gated on network completions. Gameplay mechanics, rendering, and the
//! backend's wire protocol stay outside; the crate consumes them through
//! the traits in [`starfall_game`] and [`starfall_client`].
//!
//! ```text
//!  ┌──────────────────────────────────────────────┐
//!  │ starfall       GameApp wiring, StarfallError │
//!  ├──────────────────────────────────────────────┤
//!  │ starfall-game       ProgressionController    │
//!  ├───────────────────────┬──────────────────────┤
//!  │ starfall-client       │ starfall-scores      │
//!  │ SessionClient         │ LeaderboardStore     │
//!  ├───────────────────────┴──────────────────────┤
//!  │ starfall-protocol  request/response contract │
//!  └──────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use starfall::prelude::*;
//! # use std::sync::Arc;
//! # fn make_transport() -> Arc<dyn BackendTransport> { unimplemented!() }
//!
//! let mut app = GameApp::builder(make_transport()).build();
//! app.start();
//! // then, once per frame:
//! app.tick(1.0 / 60.0);
//! ```

mod app;
mod error;

pub use app::{GameApp, GameAppBuilder};
pub use error::StarfallError;

pub use starfall_client::{
    BackendEvent, BackendFault, BackendReply, BackendRequest, BackendTransport,
    ClientConfig, ClientError, IdentityVault, MemoryVault, ReplySender,
    Session, SessionClient, StoredIdentity,
};
pub use starfall_game::{
    GameConfig, GameError, GameMode, GamePhase, HostileSpawner,
    NoopPresentation, NoopShip, NoopSpawner, Presentation,
    ProgressionController, Ship,
};
pub use starfall_protocol::{
    Achievement, ApiCall, Leaderboard, LevelDescriptor, ProtocolError,
    RequestId, ScoreEntry, ScoreTime, Statistic, UserProgress,
};
pub use starfall_scores::LeaderboardStore;

/// Commonly used types, re-exported for glob import.
pub mod prelude {
    pub use crate::{
        BackendEvent, BackendTransport, ClientConfig, ClientError, GameApp,
        GameAppBuilder, GameConfig, GameError, GameMode, GamePhase,
        HostileSpawner, IdentityVault, Leaderboard, LeaderboardStore,
        Presentation, ProgressionController, ScoreEntry, ScoreTime, Session,
        SessionClient, Ship, StarfallError,
    };
}

/// Installs a global tracing subscriber filtered by `RUST_LOG`, defaulting
/// to `info` when the variable is unset.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
