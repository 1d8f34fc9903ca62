//! The progression state machine.
//!
//! One controller per process. It owns the [`SessionClient`] and the
//! [`LeaderboardStore`], sequences the run lifecycle described on
//! [`GamePhase`], and reacts to backend completions drained once per frame
//! from [`tick`](ProgressionController::tick).
//!
//! # Stale completions
//!
//! Cancellation doesn't exist: every issued request eventually resolves,
//! possibly long after the phase it was issued under is gone. Each request
//! the controller issues is tagged with the run epoch current at issue
//! time; a completion whose tag no longer matches is dropped without
//! touching any state. The epoch advances whenever a run is discarded
//! (play-again), so a score post from the previous run can never corrupt
//! the next one.

use std::collections::HashMap;

use starfall_client::{BackendEvent, ClientError, SessionClient};
use starfall_protocol::{LevelDescriptor, RequestId, ScoreTime, Statistic};
use starfall_scores::LeaderboardStore;
use tracing::{debug, info, warn};

use crate::{
    GameConfig, GameError, GameMode, GamePhase, HostileSpawner, Presentation,
    Ship,
};

/// Endless mode runs a single indefinite level under this sentinel index.
const ENDLESS_LEVEL: i32 = -1;

/// Drives the run lifecycle around backend completions and real-time ticks.
pub struct ProgressionController {
    client: SessionClient,
    store: LeaderboardStore,
    config: GameConfig,
    spawner: Box<dyn HostileSpawner>,
    ship: Box<dyn Ship>,
    presentation: Box<dyn Presentation>,

    phase: GamePhase,
    mode: GameMode,
    /// Run epoch for staleness tagging; see the module docs.
    epoch: u64,
    /// Requests this controller issued, tagged with their issue epoch.
    issued: HashMap<RequestId, u64>,

    levels: Vec<LevelDescriptor>,
    levels_loaded: bool,
    statistics: Vec<Statistic>,

    level_index: i32,
    /// Run clock, accumulated during Gameplay only.
    elapsed: f64,
    banner_remaining: f64,
    /// The score captured when the run ended.
    final_time: ScoreTime,
    /// Whether a level has already run this session (gates the heal).
    has_played_level: bool,

    /// Index into the main board and its millisecond time: the entry the
    /// player is currently chasing. `None` when nothing is cached to chase.
    chase: Option<(usize, i64)>,
    all_time_best: bool,
    /// The leaderboard refetch issued after a successful score post.
    post_refetch: Option<RequestId>,
}

impl ProgressionController {
    pub fn new(
        client: SessionClient,
        store: LeaderboardStore,
        config: GameConfig,
        spawner: Box<dyn HostileSpawner>,
        ship: Box<dyn Ship>,
        presentation: Box<dyn Presentation>,
    ) -> Self {
        Self {
            client,
            store,
            config,
            spawner,
            ship,
            presentation,
            phase: GamePhase::Authenticating,
            mode: GameMode::Endless,
            epoch: 0,
            issued: HashMap::new(),
            levels: Vec::new(),
            levels_loaded: false,
            statistics: Vec::new(),
            level_index: ENDLESS_LEVEL,
            elapsed: 0.0,
            banner_remaining: 0.0,
            final_time: ScoreTime::from_millis(0),
            has_played_level: false,
            chase: None,
            all_time_best: false,
            post_refetch: None,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// The run clock, in seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Current level index; `-1` in endless mode.
    pub fn level_index(&self) -> i32 {
        self.level_index
    }

    pub fn levels(&self) -> &[LevelDescriptor] {
        &self.levels
    }

    /// The latest user-statistics snapshot.
    pub fn statistics(&self) -> &[Statistic] {
        &self.statistics
    }

    pub fn store(&self) -> &LeaderboardStore {
        &self.store
    }

    pub fn session_client(&self) -> &SessionClient {
        &self.client
    }

    /// Mutable client access for operations outside the run lifecycle
    /// (achievements, identities, progress entities). Their completions
    /// pass through [`tick`](Self::tick) untouched.
    pub fn session_client_mut(&mut self) -> &mut SessionClient {
        &mut self.client
    }

    // -----------------------------------------------------------------------
    // Lifecycle entry points
    // -----------------------------------------------------------------------

    /// Begins the authentication phase: silent reconnect when a previous
    /// run left identifiers behind, interactive login otherwise.
    pub fn start(&mut self) {
        self.presentation.show_connecting();
        if self.client.has_stored_identity() {
            let result = self.client.reconnect();
            self.issue(result);
        } else {
            self.presentation.hide_connecting();
            self.presentation.prompt_login();
        }
    }

    /// Interactive anonymous login, from the login dialog.
    pub fn login_anonymous(&mut self) -> Result<(), GameError> {
        self.require_phase(GamePhase::Authenticating)?;
        self.presentation.show_connecting();
        let id = self.client.authenticate_anonymous();
        self.track(id);
        Ok(())
    }

    /// Interactive email login, from the login dialog.
    pub fn login_email(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<(), GameError> {
        self.require_phase(GamePhase::Authenticating)?;
        self.presentation.show_connecting();
        let id = self.client.authenticate_email(email, password);
        self.track(id);
        Ok(())
    }

    /// Interactive universal-id login, from the login dialog.
    pub fn login_universal(
        &mut self,
        user_id: &str,
        password: &str,
    ) -> Result<(), GameError> {
        self.require_phase(GamePhase::Authenticating)?;
        self.presentation.show_connecting();
        let id = self.client.authenticate_universal(user_id, password);
        self.track(id);
        Ok(())
    }

    /// Starts an endless run from the main menu.
    pub fn start_endless_mode(&mut self) -> Result<(), GameError> {
        self.require_phase(GamePhase::LoadingData)?;
        if !self.levels_loaded {
            return Err(GameError::LevelsNotLoaded);
        }
        info!("starting endless mode");
        self.mode = GameMode::Endless;
        self.begin_run(ENDLESS_LEVEL);
        Ok(())
    }

    /// Starts a horde run from the main menu.
    pub fn start_horde_mode(&mut self) -> Result<(), GameError> {
        self.require_phase(GamePhase::LoadingData)?;
        if !self.levels_loaded || self.levels.is_empty() {
            return Err(GameError::LevelsNotLoaded);
        }
        info!(levels = self.levels.len(), "starting horde mode");
        self.mode = GameMode::Horde;
        self.begin_run(0);
        Ok(())
    }

    /// Restarts the same mode after a game-over or victory banner.
    ///
    /// Any completion still in flight from the finished run (score post,
    /// refetch) goes stale and is dropped when it lands.
    pub fn play_again(&mut self) -> Result<(), GameError> {
        if !self.phase.is_run_over() {
            return Err(GameError::InvalidPhase(self.phase));
        }
        info!(mode = ?self.mode, "restarting run");
        self.epoch += 1;
        self.post_refetch = None;
        self.presentation.hide_game_over();
        self.presentation.hide_victory();
        let level = match self.mode {
            GameMode::Endless => ENDLESS_LEVEL,
            GameMode::Horde => 0,
        };
        self.begin_run(level);
        Ok(())
    }

    /// Logs out and returns to the authentication phase, discarding the
    /// loaded data. Every completion still in flight goes stale, so a
    /// bootstrap fetch from the abandoned session can never leak into the
    /// next one.
    pub fn reset_authentication(&mut self) -> Result<(), GameError> {
        let id = self.client.logout()?;
        info!("forced authentication reset");
        if self.phase.is_run_active() {
            self.spawner.stop_spawning();
            self.spawner.explode_all_active();
        }
        self.epoch += 1;
        self.track(id);
        self.levels.clear();
        self.levels_loaded = false;
        self.post_refetch = None;
        self.set_phase(GamePhase::Authenticating);
        self.presentation.show_connecting();
        Ok(())
    }

    /// Completes the display-name prompt: saves the name server-side and
    /// posts the finished run's score under it.
    pub fn submit_display_name(&mut self, name: &str) -> Result<(), GameError> {
        if !self.phase.is_run_over() {
            return Err(GameError::InvalidPhase(self.phase));
        }
        let result = self.client.update_username(name);
        self.issue(result);
        let result = self
            .client
            .post_score_with_nickname(self.final_time, name);
        self.issue(result);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Gameplay notifications
    // -----------------------------------------------------------------------

    /// The player's ship was destroyed. Fires once per run; calls outside
    /// Gameplay are ignored.
    pub fn on_ship_destroyed(&mut self) {
        if self.phase != GamePhase::Gameplay {
            return;
        }
        self.final_time = ScoreTime::from_seconds(self.elapsed);
        info!(time = %self.final_time, "ship destroyed, run over");
        self.spawner.stop_spawning();
        self.presentation.show_game_over();
        self.banner_remaining = self.config.end_banner_secs;
        self.set_phase(GamePhase::GameOver);
    }

    /// The boss was destroyed; the run is won. Calls outside Gameplay are
    /// ignored.
    pub fn on_boss_destroyed(&mut self) {
        if self.phase != GamePhase::Gameplay {
            return;
        }
        info!("boss destroyed");
        self.enter_victory();
    }

    // -----------------------------------------------------------------------
    // Frame step
    // -----------------------------------------------------------------------

    /// Advances the controller by one frame: drains backend completions,
    /// then steps whatever timer the current phase runs on.
    ///
    /// Completions for requests the controller didn't issue (anything sent
    /// through [`session_client_mut`](Self::session_client_mut)) are
    /// returned to the caller instead of being handled here.
    pub fn tick(&mut self, dt: f64) -> Vec<BackendEvent> {
        let mut passthrough = Vec::new();
        for event in self.client.run_callbacks() {
            if let Some(event) = self.handle_event(event) {
                passthrough.push(event);
            }
        }

        match self.phase {
            GamePhase::Gameplay => self.tick_gameplay(dt),
            GamePhase::LevelTransition => {
                self.banner_remaining -= dt;
                if self.banner_remaining <= 0.0 {
                    self.presentation.hide_level_banner();
                    self.enter_gameplay();
                }
            }
            GamePhase::GameOver | GamePhase::Victory => {
                if self.banner_remaining > 0.0 {
                    self.banner_remaining -= dt;
                    if self.banner_remaining <= 0.0 {
                        self.end_of_run_banner_expired();
                    }
                }
            }
            GamePhase::Authenticating | GamePhase::LoadingData => {}
        }

        passthrough
    }

    fn tick_gameplay(&mut self, dt: f64) {
        self.elapsed += dt;

        match self.mode {
            GameMode::Horde => {
                let level = &self.levels[self.level_index as usize];
                if !level.is_untimed() && self.elapsed >= level.duration {
                    // Clamp the clock to the goal before advancing so the
                    // HUD never shows an overshoot.
                    self.elapsed = level.duration;
                    self.presentation.set_elapsed(self.elapsed);
                    self.advance_level();
                    return;
                }
                self.presentation.set_elapsed(self.elapsed);
            }
            GameMode::Endless => {
                self.presentation.set_elapsed(self.elapsed);
                self.tick_chase();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Completion handling
    // -----------------------------------------------------------------------

    /// Applies one completion, or gives it back when it isn't ours.
    /// Stale completions (issued under an older epoch) are consumed and
    /// dropped.
    fn handle_event(&mut self, event: BackendEvent) -> Option<BackendEvent> {
        match self.issued.remove(&event.request_id()) {
            None => return Some(event),
            Some(epoch) if epoch != self.epoch => {
                debug!(
                    id = %event.request_id(),
                    "completion from a discarded run ignored"
                );
                return None;
            }
            Some(_) => {}
        }

        match event {
            BackendEvent::Authenticated { result, .. } => {
                self.on_authenticated(result)
            }
            BackendEvent::LevelsLoaded { result, .. } => {
                self.on_levels_loaded(result)
            }
            BackendEvent::LeaderboardLoaded { id, result } => {
                self.on_leaderboard_loaded(id, result)
            }
            BackendEvent::StatisticsLoaded { result, .. } => {
                match result {
                    Ok(stats) => self.statistics = stats,
                    // Statistics are decorative at load time.
                    Err(e) => debug!(error = %e, "statistics fetch failed"),
                }
            }
            BackendEvent::ScorePosted { result, .. } => {
                self.on_score_posted(result)
            }
            BackendEvent::UsernameUpdated { result, .. } => {
                if let Err(e) = result {
                    warn!(error = %e, "username update failed");
                    self.presentation.notify_error(&e.status_message());
                }
            }
            BackendEvent::LoggedOut { result, .. } => {
                match result {
                    // The client already cleared the session and vault.
                    Ok(()) => {
                        self.presentation.hide_connecting();
                        self.presentation.prompt_login();
                    }
                    Err(e) => {
                        warn!(error = %e, "logout failed");
                        self.presentation.hide_connecting();
                        self.presentation.notify_error(&e.status_message());
                        self.presentation.prompt_login();
                    }
                }
            }
            other => {
                // Tracked but not run-lifecycle relevant; nothing consumes
                // these today.
                debug!(id = %other.request_id(), "unhandled completion");
            }
        }
        None
    }

    fn on_authenticated(
        &mut self,
        result: Result<starfall_client::Session, ClientError>,
    ) {
        if self.phase != GamePhase::Authenticating {
            debug!("authentication completion outside auth phase ignored");
            return;
        }
        match result {
            Ok(session) => {
                info!(username = %session.username, "authenticated, loading data");
                self.presentation.hide_connecting();
                self.enter_loading();
            }
            Err(e) => {
                warn!(error = %e, "authentication failed");
                self.presentation.hide_connecting();
                self.presentation.notify_error(&e.status_message());
                self.presentation.prompt_login();
            }
        }
    }

    fn on_levels_loaded(
        &mut self,
        result: Result<Vec<LevelDescriptor>, ClientError>,
    ) {
        if self.phase != GamePhase::LoadingData {
            debug!("level feed arrived outside loading phase, ignored");
            return;
        }
        match result {
            Ok(levels) => {
                info!(count = levels.len(), "level definitions loaded");
                self.levels = levels;
                self.levels_loaded = true;
                self.presentation.show_main_menu();
            }
            Err(e) => {
                // No recovery path: a run cannot start without the feed.
                warn!(error = %e, "level definition fetch failed");
                self.presentation.notify_load_failed(&e.status_message());
            }
        }
    }

    fn on_leaderboard_loaded(
        &mut self,
        id: RequestId,
        result: Result<starfall_protocol::Leaderboard, ClientError>,
    ) {
        let is_post_refetch = self.post_refetch == Some(id);
        if is_post_refetch {
            self.post_refetch = None;
        }

        match result {
            Ok(board) => {
                let name = board.name.clone();
                self.store.upsert(board);

                if is_post_refetch {
                    if let Some(board) = self.store.get(&name) {
                        self.presentation.show_leaderboards(board);
                    }
                    self.presentation.show_play_again();
                } else if self.phase == GamePhase::Gameplay
                    && self.mode == GameMode::Endless
                    && name == self.config.main_leaderboard_id
                {
                    self.refresh_chase();
                }
            }
            Err(e) => {
                if is_post_refetch {
                    self.presentation.notify_error(&e.status_message());
                    self.presentation.show_play_again();
                } else {
                    // A failed poll keeps the stale display; the next
                    // successful fetch refreshes it.
                    debug!(error = %e, "leaderboard fetch failed");
                }
            }
        }
    }

    fn on_score_posted(&mut self, result: Result<ScoreTime, ClientError>) {
        match result {
            Ok(time) => {
                info!(%time, "score posted, refetching leaderboard");
                self.store.record_posted_time(time);
                let result = self.client.fetch_leaderboard(
                    &self.config.main_leaderboard_id,
                    self.config.fetch_range_start,
                    self.config.fetch_range_end,
                );
                if let Ok(id) = &result {
                    self.post_refetch = Some(*id);
                }
                self.issue(result);
            }
            Err(e) => {
                // The posted time stays unset, so no fetched entry will be
                // claimed as the player's own.
                warn!(error = %e, "score post failed");
                self.presentation.notify_error(&e.status_message());
                self.presentation.show_play_again();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase transitions
    // -----------------------------------------------------------------------

    fn enter_loading(&mut self) {
        self.set_phase(GamePhase::LoadingData);
        // All three fetches fly concurrently; only the level feed gates
        // the menu.
        let result = self.client.fetch_level_descriptors();
        self.issue(result);
        let result = self.client.fetch_leaderboard(
            &self.config.main_leaderboard_id,
            self.config.fetch_range_start,
            self.config.fetch_range_end,
        );
        self.issue(result);
        let result = self.client.fetch_user_statistics();
        self.issue(result);
    }

    fn begin_run(&mut self, level_index: i32) {
        self.level_index = level_index;
        self.elapsed = 0.0;
        self.has_played_level = false;
        self.all_time_best = false;
        self.chase = None;
        self.ship.spawn();
        self.enter_transition();
    }

    fn enter_transition(&mut self) {
        // Clear the field between levels: nothing from the previous level
        // survives into the next.
        self.spawner.stop_spawning();
        self.spawner.explode_all_active();
        let goal = self.current_level().map(|l| l.description.clone());
        match goal {
            Some(goal) => {
                let banner = format!("Level {}", self.level_index + 1);
                self.presentation.show_level_banner(&banner);
                self.presentation.push_level_goal(&goal);
            }
            None => self.presentation.show_level_banner("Endless"),
        }
        self.banner_remaining = self.config.level_banner_secs;
        self.set_phase(GamePhase::LevelTransition);
    }

    fn enter_gameplay(&mut self) {
        self.elapsed = 0.0;
        if self.has_played_level {
            self.ship.heal();
        }
        self.has_played_level = true;
        self.spawner.start_spawning(self.level_index);
        self.set_phase(GamePhase::Gameplay);
        if self.mode == GameMode::Endless {
            self.refresh_chase();
        }
    }

    fn advance_level(&mut self) {
        self.level_index += 1;
        self.elapsed = 0.0;
        if self.level_index as usize >= self.levels.len() {
            info!("level list cleared");
            self.enter_victory();
        } else {
            self.enter_transition();
        }
    }

    fn enter_victory(&mut self) {
        self.final_time = ScoreTime::from_seconds(self.elapsed);
        self.spawner.stop_spawning();
        self.spawner.explode_all_active();
        self.presentation.show_victory();
        self.banner_remaining = self.config.end_banner_secs;
        self.set_phase(GamePhase::Victory);
    }

    /// The game-over/victory banner timer expired: branch into the score
    /// post (endless) or straight to play-again (horde).
    fn end_of_run_banner_expired(&mut self) {
        match self.mode {
            GameMode::Endless => {
                if self.client.session().is_username_saved() {
                    let result = self.client.post_score(self.final_time);
                    self.issue(result);
                } else {
                    self.presentation.prompt_display_name();
                }
            }
            GameMode::Horde => self.presentation.show_play_again(),
        }
    }

    // -----------------------------------------------------------------------
    // Chased-rank tracking (endless)
    // -----------------------------------------------------------------------

    /// Re-derives the chased entry from the cached main board. Runs only
    /// when a new snapshot lands or gameplay starts; the per-tick path is
    /// the O(1) comparison in [`tick_chase`](Self::tick_chase).
    fn refresh_chase(&mut self) {
        self.chase = None;
        if self.all_time_best {
            return;
        }
        let Some(board) = self.store.get(&self.config.main_leaderboard_id)
        else {
            return;
        };
        if board.entries.is_empty() {
            return;
        }

        let elapsed_ms = ScoreTime::from_seconds(self.elapsed).as_millis();
        // Best-first order: the chased entry is the worst one the player
        // hasn't outlasted yet, i.e. the highest index still ahead.
        for (i, entry) in board.entries.iter().enumerate().rev() {
            let target_ms = entry.time.as_millis();
            // A tie is not a pass: the entry stays ahead until the clock
            // strictly exceeds it.
            if target_ms >= elapsed_ms {
                self.chase = Some((i, target_ms));
                self.presentation.push_chased_entry(entry);
                return;
            }
        }
        self.all_time_best = true;
        self.presentation.set_all_time_best();
    }

    fn tick_chase(&mut self) {
        let Some((index, target_ms)) = self.chase else {
            return;
        };
        let elapsed_ms = ScoreTime::from_seconds(self.elapsed).as_millis();
        if elapsed_ms <= target_ms {
            return;
        }

        let Some(board) = self.store.get(&self.config.main_leaderboard_id)
        else {
            return;
        };
        let mut index = index;
        loop {
            if index == 0 {
                self.chase = None;
                self.all_time_best = true;
                self.presentation.set_all_time_best();
                return;
            }
            index -= 1;
            let entry = &board.entries[index];
            let target_ms = entry.time.as_millis();
            if target_ms >= elapsed_ms {
                self.chase = Some((index, target_ms));
                self.presentation.push_chased_entry(entry);
                return;
            }
            // A large frame step can pass several entries at once; only
            // the final target is pushed.
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn current_level(&self) -> Option<&LevelDescriptor> {
        usize::try_from(self.level_index)
            .ok()
            .and_then(|i| self.levels.get(i))
    }

    fn require_phase(&self, phase: GamePhase) -> Result<(), GameError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(GameError::InvalidPhase(self.phase))
        }
    }

    fn set_phase(&mut self, phase: GamePhase) {
        debug!(from = %self.phase, to = %phase, "phase transition");
        self.phase = phase;
    }

    fn track(&mut self, id: RequestId) {
        self.issued.insert(id, self.epoch);
    }

    /// Tracks an issued request, or logs the precondition failure. The
    /// gate can only be closed here through a logout race, so this is a
    /// warn, not an error path the machine branches on.
    fn issue(&mut self, result: Result<RequestId, ClientError>) {
        match result {
            Ok(id) => self.track(id),
            Err(e) => warn!(error = %e, "request rejected before send"),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
