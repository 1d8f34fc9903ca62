//! `GameApp` builder and frame loop entry point.
//!
//! This is where the pieces get wired together: one transport, one
//! identity vault, one session client, one store, one controller per
//! process. Everything is passed explicitly at construction; no component
//! reaches for a global to find another.

use std::sync::Arc;

use starfall_client::{
    BackendEvent, BackendTransport, ClientConfig, IdentityVault, MemoryVault,
    SessionClient,
};
use starfall_game::{
    GameConfig, HostileSpawner, NoopPresentation, NoopShip, NoopSpawner,
    Presentation, ProgressionController, Ship,
};
use starfall_scores::LeaderboardStore;

/// Builder for assembling a [`GameApp`].
///
/// # Example
///
/// ```rust,ignore
/// use starfall::prelude::*;
///
/// let mut app = GameApp::builder(my_transport)
///     .vault(my_disk_vault)
///     .spawner(my_spawner)
///     .ship(my_ship)
///     .presentation(my_hud)
///     .build();
/// app.start();
/// loop {
///     // once per frame
///     app.tick(dt);
/// }
/// ```
pub struct GameAppBuilder {
    transport: Arc<dyn BackendTransport>,
    vault: Box<dyn IdentityVault>,
    client_config: ClientConfig,
    game_config: GameConfig,
    spawner: Box<dyn HostileSpawner>,
    ship: Box<dyn Ship>,
    presentation: Box<dyn Presentation>,
}

impl GameAppBuilder {
    /// Creates a builder with in-memory identity storage and no-op
    /// collaborators. Real deployments override all of them.
    pub fn new(transport: Arc<dyn BackendTransport>) -> Self {
        Self {
            transport,
            vault: Box::new(MemoryVault::new()),
            client_config: ClientConfig::default(),
            game_config: GameConfig::default(),
            spawner: Box::new(NoopSpawner),
            ship: Box::new(NoopShip),
            presentation: Box::new(NoopPresentation),
        }
    }

    /// Sets the persisted-identifier storage.
    pub fn vault(mut self, vault: impl IdentityVault) -> Self {
        self.vault = Box::new(vault);
        self
    }

    /// Sets the session-client configuration.
    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    /// Sets the progression configuration.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Sets the hostile-wave spawner.
    pub fn spawner(mut self, spawner: impl HostileSpawner + 'static) -> Self {
        self.spawner = Box::new(spawner);
        self
    }

    /// Sets the player's ship.
    pub fn ship(mut self, ship: impl Ship + 'static) -> Self {
        self.ship = Box::new(ship);
        self
    }

    /// Sets the HUD/dialog layer.
    pub fn presentation(
        mut self,
        presentation: impl Presentation + 'static,
    ) -> Self {
        self.presentation = Box::new(presentation);
        self
    }

    /// Assembles the app.
    pub fn build(self) -> GameApp {
        let client =
            SessionClient::new(self.transport, self.vault, self.client_config);
        let controller = ProgressionController::new(
            client,
            LeaderboardStore::new(),
            self.game_config,
            self.spawner,
            self.ship,
            self.presentation,
        );
        GameApp { controller }
    }
}

/// The assembled game client: a progression controller with its session
/// client and leaderboard store, stepped once per frame.
pub struct GameApp {
    controller: ProgressionController,
}

impl GameApp {
    /// Creates a new builder around the given transport.
    pub fn builder(transport: Arc<dyn BackendTransport>) -> GameAppBuilder {
        GameAppBuilder::new(transport)
    }

    /// Kicks off authentication (silent reconnect or interactive login).
    pub fn start(&mut self) {
        self.controller.start();
    }

    /// Advances everything by one frame. Completions for requests issued
    /// directly on the session client are returned for the caller to
    /// handle.
    pub fn tick(&mut self, dt: f64) -> Vec<BackendEvent> {
        self.controller.tick(dt)
    }

    pub fn controller(&self) -> &ProgressionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ProgressionController {
        &mut self.controller
    }
}
