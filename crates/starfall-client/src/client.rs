//! The session client: issues backend requests and drains completions.
//!
//! Every operation follows the same contract:
//!
//! - The call returns immediately. Protected operations check the
//!   authentication gate first and fail **synchronously** with
//!   [`ClientError::NotAuthenticated`] — nothing is submitted.
//! - An accepted request produces exactly one [`BackendEvent`] during a
//!   later [`run_callbacks`](SessionClient::run_callbacks) drain.
//!
//! # Concurrency note
//!
//! `SessionClient` is NOT thread-safe and doesn't need to be: request
//! issuance, response parsing, and session mutation all happen on the one
//! logical thread that steps the game. Only the transport crosses threads,
//! and it touches nothing here — it just sends on the reply channel.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rand::Rng;
use serde_json::Value;
use starfall_protocol::{response, ApiCall, RequestId, ScoreTime};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    BackendEvent, BackendFault, BackendReply, BackendRequest, BackendTransport,
    ClientConfig, ClientError, IdentityVault, ReplySender, Session,
    StoredIdentity,
};

impl From<BackendFault> for ClientError {
    fn from(fault: BackendFault) -> Self {
        match fault {
            BackendFault::Server { code, message } => {
                Self::Server { code, message }
            }
            BackendFault::Unreachable { message } => Self::Transport(message),
        }
    }
}

/// What kind of operation a pending request id belongs to.
///
/// Stored when the request is issued, consumed (removed) when its reply
/// lands — removal-before-dispatch is what makes double delivery
/// impossible even for a misbehaving transport.
enum PendingCall {
    Authenticate,
    Logout,
    UpdateUsername,
    PostScore { time: ScoreTime },
    FetchLeaderboard { name: String },
    FetchCountryLeaderboard { name: String },
    FetchLevels,
    FetchStatistics,
    IncrementStatistics,
    FetchAchievements,
    AwardAchievement,
    FetchProgress,
    CreateProgress,
    UpdateProgress,
    FetchIdentities,
    AttachEmail,
}

/// Owns authentication state and issues all backend requests.
///
/// One `SessionClient` per process, constructed once at startup and passed
/// explicitly to whatever needs it.
pub struct SessionClient {
    transport: Arc<dyn BackendTransport>,
    vault: Box<dyn IdentityVault>,
    config: ClientConfig,
    session: Session,
    /// Identity type names linked to the profile, cached from the last
    /// identities fetch.
    identity_types: Vec<String>,
    pending: HashMap<RequestId, PendingCall>,
    next_id: u64,
    reply_tx: ReplySender,
    reply_rx: mpsc::UnboundedReceiver<BackendReply>,
}

impl SessionClient {
    /// Creates a client, loading any persisted identifiers from the vault.
    pub fn new(
        transport: Arc<dyn BackendTransport>,
        vault: Box<dyn IdentityVault>,
        config: ClientConfig,
    ) -> Self {
        let stored = vault.load();
        let session = Session {
            profile_id: stored.profile_id,
            anonymous_id: stored.anonymous_id,
            username: String::new(),
            is_authenticated: false,
        };
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            vault,
            config,
            session,
            identity_types: Vec::new(),
            pending: HashMap::new(),
            next_id: 1,
            reply_tx,
            reply_rx,
        }
    }

    /// The current session snapshot.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns `true` if the authentication gate is open.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated
    }

    /// Returns `true` if a previous run authenticated on this device, so a
    /// silent reconnect can be attempted instead of an interactive login.
    pub fn has_stored_identity(&self) -> bool {
        !self.session.profile_id.is_empty()
            && !self.session.anonymous_id.is_empty()
    }

    /// Identity type names linked to the profile, from the last
    /// [`fetch_identities`](Self::fetch_identities) completion.
    pub fn identity_types(&self) -> &[String] {
        &self.identity_types
    }

    // -----------------------------------------------------------------------
    // Authentication
    // -----------------------------------------------------------------------

    /// Authenticates with the device's anonymous id, generating one on
    /// first use.
    pub fn authenticate_anonymous(&mut self) -> RequestId {
        if self.session.anonymous_id.is_empty() {
            self.session.anonymous_id = generate_anonymous_id();
            debug!("generated new anonymous id");
        }
        info!("anonymous authentication requested");
        self.submit(
            ApiCall::AuthenticateAnonymous {
                anonymous_id: self.session.anonymous_id.clone(),
            },
            PendingCall::Authenticate,
        )
    }

    /// Authenticates with an email/password identity.
    pub fn authenticate_email(&mut self, email: &str, password: &str) -> RequestId {
        info!("email authentication requested");
        self.submit(
            ApiCall::AuthenticateEmail {
                email: email.into(),
                password: password.into(),
            },
            PendingCall::Authenticate,
        )
    }

    /// Authenticates with a universal id/password identity.
    pub fn authenticate_universal(
        &mut self,
        user_id: &str,
        password: &str,
    ) -> RequestId {
        info!("universal authentication requested");
        self.submit(
            ApiCall::AuthenticateUniversal {
                user_id: user_id.into(),
                password: password.into(),
            },
            PendingCall::Authenticate,
        )
    }

    /// Authenticates with a token obtained from an external provider.
    pub fn authenticate_external(
        &mut self,
        provider: &str,
        external_id: &str,
        token: &str,
    ) -> RequestId {
        info!(provider, "external authentication requested");
        self.submit(
            ApiCall::AuthenticateExternal {
                provider: provider.into(),
                external_id: external_id.into(),
                token: token.into(),
            },
            PendingCall::Authenticate,
        )
    }

    /// Resumes a previous session from stored identifiers.
    ///
    /// # Errors
    /// [`ClientError::NoStoredIdentity`] if no previous run authenticated
    /// on this device. Nothing is submitted in that case.
    pub fn reconnect(&mut self) -> Result<RequestId, ClientError> {
        if !self.has_stored_identity() {
            return Err(ClientError::NoStoredIdentity);
        }
        info!("reconnect requested");
        Ok(self.submit(
            ApiCall::Reconnect {
                profile_id: self.session.profile_id.clone(),
                anonymous_id: self.session.anonymous_id.clone(),
            },
            PendingCall::Authenticate,
        ))
    }

    /// Ends the session. On completion the session and all persisted
    /// identifiers are cleared, so a later restart requires fresh
    /// authentication.
    pub fn logout(&mut self) -> Result<RequestId, ClientError> {
        self.ensure_authenticated()?;
        info!("logout requested");
        Ok(self.submit(ApiCall::Logout, PendingCall::Logout))
    }

    // -----------------------------------------------------------------------
    // Player state
    // -----------------------------------------------------------------------

    /// Changes the player's display name. The cached name is updated from
    /// the server's echo, which may differ after normalization.
    pub fn update_username(&mut self, name: &str) -> Result<RequestId, ClientError> {
        self.ensure_authenticated()?;
        debug!(name, "username update requested");
        Ok(self.submit(
            ApiCall::UpdateUsername { name: name.into() },
            PendingCall::UpdateUsername,
        ))
    }

    // -----------------------------------------------------------------------
    // Leaderboards
    // -----------------------------------------------------------------------

    /// Posts a score under the session's display name.
    pub fn post_score(&mut self, time: ScoreTime) -> Result<RequestId, ClientError> {
        let nickname = self.session.username.clone();
        self.post_score_with_nickname(time, &nickname)
    }

    /// Posts a score under an explicit nickname against the configured
    /// leaderboards, as a single atomic server-side operation.
    ///
    /// The score only becomes visible to fetches whose completion fires
    /// after this post's completion — post and fetch are independent
    /// round-trips with no other ordering guarantee.
    pub fn post_score_with_nickname(
        &mut self,
        time: ScoreTime,
        nickname: &str,
    ) -> Result<RequestId, ClientError> {
        self.ensure_authenticated()?;
        info!(%time, nickname, "score post requested");
        Ok(self.submit(
            ApiCall::PostScore {
                leaderboards: self.config.score_leaderboards.clone(),
                score_ms: time.as_millis(),
                nickname: nickname.into(),
            },
            PendingCall::PostScore { time },
        ))
    }

    /// Fetches one ranked page of the named leaderboard.
    pub fn fetch_leaderboard(
        &mut self,
        name: &str,
        range_start: u32,
        range_end: u32,
    ) -> Result<RequestId, ClientError> {
        self.ensure_authenticated()?;
        debug!(name, range_start, range_end, "leaderboard fetch requested");
        Ok(self.submit(
            ApiCall::FetchLeaderboard {
                name: name.into(),
                range_start,
                range_end,
            },
            PendingCall::FetchLeaderboard { name: name.into() },
        ))
    }

    /// Fetches the first page of the per-country leaderboard.
    ///
    /// This is a page query against the custom entity store, not a named
    /// leaderboard fetch: rows arrive best-first without server ranks, so
    /// ranks are assigned locally and the country code stands in as the
    /// nickname. Completes as [`BackendEvent::LeaderboardLoaded`] under the
    /// configured country board name.
    pub fn fetch_country_leaderboard(&mut self) -> Result<RequestId, ClientError> {
        self.ensure_authenticated()?;
        debug!("country leaderboard fetch requested");
        Ok(self.submit(
            ApiCall::FetchCountryLeaderboard {
                entity_type: self.config.country_entity_type.clone(),
                rows_per_page: self.config.country_page_size,
                page: 1,
            },
            PendingCall::FetchCountryLeaderboard {
                name: self.config.country_leaderboard_id.clone(),
            },
        ))
    }

    // -----------------------------------------------------------------------
    // Bulk data, statistics, achievements, progress, identities
    // -----------------------------------------------------------------------

    /// Fetches the level-definition feed.
    pub fn fetch_level_descriptors(&mut self) -> Result<RequestId, ClientError> {
        self.ensure_authenticated()?;
        debug!("level descriptor fetch requested");
        Ok(self.submit(ApiCall::FetchLevelDescriptors, PendingCall::FetchLevels))
    }

    /// Reads all user statistics.
    pub fn fetch_user_statistics(&mut self) -> Result<RequestId, ClientError> {
        self.ensure_authenticated()?;
        debug!("user statistics fetch requested");
        Ok(self.submit(ApiCall::FetchUserStatistics, PendingCall::FetchStatistics))
    }

    /// Applies a map of deltas to the user's statistics; the completion
    /// carries the post-increment values.
    pub fn increment_user_statistics(
        &mut self,
        deltas: BTreeMap<String, i64>,
    ) -> Result<RequestId, ClientError> {
        self.ensure_authenticated()?;
        debug!(count = deltas.len(), "statistics increment requested");
        Ok(self.submit(
            ApiCall::IncrementUserStatistics { deltas },
            PendingCall::IncrementStatistics,
        ))
    }

    /// Reads the achievement list.
    pub fn fetch_achievements(&mut self) -> Result<RequestId, ClientError> {
        self.ensure_authenticated()?;
        debug!("achievements fetch requested");
        Ok(self.submit(ApiCall::FetchAchievements, PendingCall::FetchAchievements))
    }

    /// Awards one achievement by id.
    pub fn award_achievement(&mut self, id: &str) -> Result<RequestId, ClientError> {
        self.ensure_authenticated()?;
        info!(achievement = id, "achievement award requested");
        Ok(self.submit(
            ApiCall::AwardAchievement { id: id.into() },
            PendingCall::AwardAchievement,
        ))
    }

    /// Reads the player's progress entity, if any.
    pub fn fetch_user_progress(&mut self) -> Result<RequestId, ClientError> {
        self.ensure_authenticated()?;
        debug!("user progress fetch requested");
        Ok(self.submit(ApiCall::FetchUserProgress, PendingCall::FetchProgress))
    }

    /// Creates a fresh progress entity with default contents.
    pub fn create_user_progress(&mut self) -> Result<RequestId, ClientError> {
        self.ensure_authenticated()?;
        debug!("user progress create requested");
        Ok(self.submit(ApiCall::CreateUserProgress, PendingCall::CreateProgress))
    }

    /// Overwrites the progress entity's data document.
    pub fn update_user_progress(
        &mut self,
        entity_id: &str,
        data: Value,
    ) -> Result<RequestId, ClientError> {
        self.ensure_authenticated()?;
        debug!(entity_id, "user progress update requested");
        Ok(self.submit(
            ApiCall::UpdateUserProgress {
                entity_id: entity_id.into(),
                entity_type: self.config.progress_entity_type.clone(),
                data,
            },
            PendingCall::UpdateProgress,
        ))
    }

    /// Reads the identity types linked to the profile.
    pub fn fetch_identities(&mut self) -> Result<RequestId, ClientError> {
        self.ensure_authenticated()?;
        debug!("identities fetch requested");
        Ok(self.submit(ApiCall::FetchIdentities, PendingCall::FetchIdentities))
    }

    /// Attaches an email identity to the current (e.g. anonymous) profile.
    pub fn attach_email_identity(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<RequestId, ClientError> {
        self.ensure_authenticated()?;
        info!("email identity attach requested");
        Ok(self.submit(
            ApiCall::AttachEmailIdentity {
                email: email.into(),
                password: password.into(),
            },
            PendingCall::AttachEmail,
        ))
    }

    // -----------------------------------------------------------------------
    // Callback drain
    // -----------------------------------------------------------------------

    /// Drains all buffered transport replies into typed events.
    ///
    /// Invoke this exactly once per frame — queued completions are delayed
    /// by a missed drain, never lost. Callbacks fire only from here (plus
    /// the synchronous precondition fast path on the request methods), so
    /// session mutation never races with request issuance.
    pub fn run_callbacks(&mut self) -> Vec<BackendEvent> {
        let mut events = Vec::new();
        while let Ok(reply) = self.reply_rx.try_recv() {
            if let Some(event) = self.handle_reply(reply) {
                events.push(event);
            }
        }
        events
    }

    fn handle_reply(&mut self, reply: BackendReply) -> Option<BackendEvent> {
        let Some(pending) = self.pending.remove(&reply.id) else {
            // A transport bug (double reply) or a reply that outlived a
            // client rebuild. Either way there is no pending request to
            // answer, so it cannot produce an event.
            warn!(id = %reply.id, "reply for unknown request ignored");
            return None;
        };

        let id = reply.id;
        let outcome = reply.outcome.map_err(ClientError::from);

        let event = match pending {
            PendingCall::Authenticate => {
                let result =
                    outcome.and_then(|doc| self.apply_auth_success(&doc));
                match &result {
                    Ok(session) => {
                        info!(username = %session.username, "authenticated")
                    }
                    Err(e) => warn!(error = %e, "authentication failed"),
                }
                BackendEvent::Authenticated { id, result }
            }
            PendingCall::Logout => {
                let result = outcome.map(|_| self.apply_logout());
                BackendEvent::LoggedOut { id, result }
            }
            PendingCall::UpdateUsername => {
                let result = outcome.and_then(|doc| {
                    let echoed = response::parse_player_name(&doc)?;
                    // The server's echo wins over what we asked for.
                    self.session.username = echoed.clone();
                    Ok(echoed)
                });
                BackendEvent::UsernameUpdated { id, result }
            }
            PendingCall::PostScore { time } => {
                let result = outcome.map(|_| time);
                BackendEvent::ScorePosted { id, result }
            }
            PendingCall::FetchLeaderboard { name } => {
                let result = outcome.and_then(|doc| {
                    Ok(response::parse_leaderboard(&name, &doc)?)
                });
                BackendEvent::LeaderboardLoaded { id, result }
            }
            PendingCall::FetchCountryLeaderboard { name } => {
                let result = outcome.and_then(|doc| {
                    Ok(response::parse_country_leaderboard(&name, &doc)?)
                });
                BackendEvent::LeaderboardLoaded { id, result }
            }
            PendingCall::FetchLevels => {
                let result = outcome
                    .and_then(|doc| Ok(response::parse_level_descriptors(&doc)?));
                BackendEvent::LevelsLoaded { id, result }
            }
            PendingCall::FetchStatistics => {
                let result =
                    outcome.and_then(|doc| Ok(response::parse_statistics(&doc)?));
                BackendEvent::StatisticsLoaded { id, result }
            }
            PendingCall::IncrementStatistics => {
                let result =
                    outcome.and_then(|doc| Ok(response::parse_statistics(&doc)?));
                BackendEvent::StatisticsIncremented { id, result }
            }
            PendingCall::FetchAchievements => {
                let result = outcome
                    .and_then(|doc| Ok(response::parse_achievements(&doc)?));
                BackendEvent::AchievementsLoaded { id, result }
            }
            PendingCall::AwardAchievement => {
                let result = outcome.map(|_| ());
                BackendEvent::AchievementAwarded { id, result }
            }
            PendingCall::FetchProgress => {
                let result = outcome
                    .and_then(|doc| Ok(response::parse_user_progress(&doc)?));
                BackendEvent::ProgressLoaded { id, result }
            }
            PendingCall::CreateProgress => {
                let result = outcome.map(|_| ());
                BackendEvent::ProgressCreated { id, result }
            }
            PendingCall::UpdateProgress => {
                let result = outcome.map(|_| ());
                BackendEvent::ProgressUpdated { id, result }
            }
            PendingCall::FetchIdentities => {
                let result = outcome.and_then(|doc| {
                    let types = response::parse_identities(&doc)?;
                    self.identity_types = types.clone();
                    Ok(types)
                });
                BackendEvent::IdentitiesLoaded { id, result }
            }
            PendingCall::AttachEmail => {
                let result = outcome.map(|_| {
                    if !self.identity_types.iter().any(|t| t == "Email") {
                        self.identity_types.push("Email".into());
                    }
                });
                BackendEvent::EmailIdentityAttached { id, result }
            }
        };
        Some(event)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn ensure_authenticated(&self) -> Result<(), ClientError> {
        if self.session.is_authenticated {
            Ok(())
        } else {
            Err(ClientError::NotAuthenticated)
        }
    }

    fn submit(&mut self, call: ApiCall, pending: PendingCall) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.pending.insert(id, pending);
        self.transport
            .submit(BackendRequest { id, call }, self.reply_tx.clone());
        id
    }

    fn apply_auth_success(
        &mut self,
        doc: &Value,
    ) -> Result<Session, ClientError> {
        let auth = response::parse_auth(doc)?;
        self.session.is_authenticated = true;
        self.session.profile_id = auth.profile_id;
        self.session.username = auth.player_name;
        self.vault.save(&StoredIdentity {
            profile_id: self.session.profile_id.clone(),
            anonymous_id: self.session.anonymous_id.clone(),
        });
        Ok(self.session.clone())
    }

    fn apply_logout(&mut self) {
        info!("logged out, clearing session and stored identifiers");
        self.session = Session::default();
        self.vault.clear();
    }
}

/// Generates a random 32-character hex anonymous id (128 bits of entropy),
/// stable for the device once persisted.
fn generate_anonymous_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionClient`.
    //!
    //! The transport is a recording fake: it captures every submitted
    //! request together with the reply channel, and tests inject replies
    //! by hand before calling `run_callbacks()`. That makes completion
    //! ordering fully deterministic — no sleeps, no runtime.

    use std::sync::Mutex;

    use serde_json::json;
    use starfall_protocol::ApiCall;

    use super::*;
    use crate::MemoryVault;

    // -- Helpers ----------------------------------------------------------

    #[derive(Default)]
    struct FakeTransport {
        submitted: Mutex<Vec<(BackendRequest, ReplySender)>>,
    }

    impl FakeTransport {
        fn submitted_calls(&self) -> Vec<ApiCall> {
            self.submitted
                .lock()
                .unwrap()
                .iter()
                .map(|(req, _)| req.call.clone())
                .collect()
        }

        fn submission_count(&self) -> usize {
            self.submitted.lock().unwrap().len()
        }

        /// Delivers a reply for the n-th submitted request.
        fn reply(&self, index: usize, outcome: Result<Value, BackendFault>) {
            let guard = self.submitted.lock().unwrap();
            let (req, tx) = &guard[index];
            tx.send(BackendReply {
                id: req.id,
                outcome,
            })
            .unwrap();
        }
    }

    impl BackendTransport for FakeTransport {
        fn submit(&self, request: BackendRequest, replies: ReplySender) {
            self.submitted.lock().unwrap().push((request, replies));
        }
    }

    fn client_with(vault: MemoryVault) -> (SessionClient, Arc<FakeTransport>) {
        let transport = Arc::new(FakeTransport::default());
        let client = SessionClient::new(
            transport.clone(),
            Box::new(vault),
            ClientConfig::default(),
        );
        (client, transport)
    }

    fn fresh_client() -> (SessionClient, Arc<FakeTransport>) {
        client_with(MemoryVault::new())
    }

    fn auth_success_doc() -> Value {
        json!({ "data": { "profileId": "prof-1", "playerName": "Ada" } })
    }

    /// Drives a client through a successful anonymous authentication.
    fn authenticate(client: &mut SessionClient, transport: &FakeTransport) {
        client.authenticate_anonymous();
        let index = transport.submission_count() - 1;
        transport.reply(index, Ok(auth_success_doc()));
        let events = client.run_callbacks();
        assert!(matches!(
            events.last(),
            Some(BackendEvent::Authenticated { result: Ok(_), .. })
        ));
    }

    fn server_fault(code: i32, message: &str) -> BackendFault {
        BackendFault::Server {
            code,
            message: message.into(),
        }
    }

    // =====================================================================
    // Authentication precondition
    // =====================================================================

    #[test]
    fn test_protected_call_unauthenticated_fails_sync_with_no_side_effects() {
        let (mut client, transport) = fresh_client();

        let result = client.fetch_leaderboard("Main", 0, 9);

        assert!(matches!(result, Err(ClientError::NotAuthenticated)));
        assert_eq!(
            transport.submission_count(),
            0,
            "nothing may reach the transport"
        );
        assert!(
            client.run_callbacks().is_empty(),
            "no deferred event may fire either"
        );
    }

    #[test]
    fn test_every_protected_operation_is_gated() {
        let (mut client, transport) = fresh_client();

        assert!(client.logout().is_err());
        assert!(client.update_username("Ada").is_err());
        assert!(client.post_score(ScoreTime::from_seconds(1.0)).is_err());
        assert!(client.fetch_leaderboard("Main", 0, 9).is_err());
        assert!(client.fetch_country_leaderboard().is_err());
        assert!(client.fetch_level_descriptors().is_err());
        assert!(client.fetch_user_statistics().is_err());
        assert!(client.increment_user_statistics(BTreeMap::new()).is_err());
        assert!(client.fetch_achievements().is_err());
        assert!(client.award_achievement("ach-1").is_err());
        assert!(client.fetch_user_progress().is_err());
        assert!(client.create_user_progress().is_err());
        assert!(client.update_user_progress("e", json!({})).is_err());
        assert!(client.fetch_identities().is_err());
        assert!(client.attach_email_identity("a@b.c", "pw").is_err());

        assert_eq!(transport.submission_count(), 0);
    }

    // =====================================================================
    // Authentication flows
    // =====================================================================

    #[test]
    fn test_authenticate_anonymous_generates_and_reuses_anonymous_id() {
        let (mut client, transport) = fresh_client();

        client.authenticate_anonymous();
        let first = match &transport.submitted_calls()[0] {
            ApiCall::AuthenticateAnonymous { anonymous_id } => {
                anonymous_id.clone()
            }
            other => panic!("unexpected call {other:?}"),
        };
        assert_eq!(first.len(), 32, "32 hex chars");

        client.authenticate_anonymous();
        let second = match &transport.submitted_calls()[1] {
            ApiCall::AuthenticateAnonymous { anonymous_id } => {
                anonymous_id.clone()
            }
            other => panic!("unexpected call {other:?}"),
        };
        assert_eq!(first, second, "anonymous id is stable once generated");
    }

    #[test]
    fn test_auth_success_opens_gate_and_stores_server_username() {
        let (mut client, transport) = fresh_client();

        authenticate(&mut client, &transport);

        assert!(client.is_authenticated());
        assert_eq!(client.session().profile_id, "prof-1");
        assert_eq!(client.session().username, "Ada");
    }

    #[test]
    fn test_auth_success_persists_identifiers_for_reconnect() {
        let transport = Arc::new(FakeTransport::default());
        let mut client = SessionClient::new(
            transport.clone(),
            Box::new(MemoryVault::new()),
            ClientConfig::default(),
        );
        authenticate(&mut client, &transport);
        assert!(client.has_stored_identity());
    }

    #[test]
    fn test_auth_failure_forwards_status_message_verbatim() {
        let (mut client, transport) = fresh_client();

        client.authenticate_email("a@b.c", "wrong");
        transport.reply(0, Err(server_fault(40307, "Invalid credentials")));
        let events = client.run_callbacks();

        let [BackendEvent::Authenticated { result: Err(e), .. }] = &events[..]
        else {
            panic!("expected one failed auth event, got {events:?}");
        };
        assert_eq!(e.status_message(), "Invalid credentials");
        assert!(!client.is_authenticated(), "gate must stay closed");
    }

    #[test]
    fn test_auth_malformed_response_is_failure_not_panic() {
        let (mut client, transport) = fresh_client();

        client.authenticate_anonymous();
        transport.reply(0, Ok(json!({ "data": {} })));
        let events = client.run_callbacks();

        assert!(matches!(
            &events[..],
            [BackendEvent::Authenticated { result: Err(ClientError::Response(_)), .. }]
        ));
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_reconnect_without_stored_identity_is_rejected() {
        let (mut client, transport) = fresh_client();

        assert!(matches!(
            client.reconnect(),
            Err(ClientError::NoStoredIdentity)
        ));
        assert_eq!(transport.submission_count(), 0);
    }

    #[test]
    fn test_reconnect_submits_stored_identifiers() {
        let (mut client, transport) =
            client_with(MemoryVault::with_identity("prof-9", "anon-9"));

        client.reconnect().expect("stored identity present");

        assert_eq!(
            transport.submitted_calls()[0],
            ApiCall::Reconnect {
                profile_id: "prof-9".into(),
                anonymous_id: "anon-9".into(),
            }
        );
    }

    #[test]
    fn test_logout_clears_session_and_vault() {
        let (mut client, transport) = fresh_client();
        authenticate(&mut client, &transport);

        client.logout().unwrap();
        transport.reply(1, Ok(json!({ "data": {} })));
        let events = client.run_callbacks();

        assert!(matches!(
            &events[..],
            [BackendEvent::LoggedOut { result: Ok(()), .. }]
        ));
        assert!(!client.is_authenticated());
        assert_eq!(client.session(), &Session::default());
        assert!(
            !client.has_stored_identity(),
            "restart must require fresh authentication"
        );
    }

    // =====================================================================
    // Username
    // =====================================================================

    #[test]
    fn test_update_username_stores_server_echo_not_requested_name() {
        let (mut client, transport) = fresh_client();
        authenticate(&mut client, &transport);

        client.update_username("Ada!!").unwrap();
        // Server normalized the name.
        transport.reply(1, Ok(json!({ "data": { "playerName": "Ada" } })));
        let events = client.run_callbacks();

        let [BackendEvent::UsernameUpdated { result: Ok(echoed), .. }] =
            &events[..]
        else {
            panic!("expected username event");
        };
        assert_eq!(echoed, "Ada");
        assert_eq!(client.session().username, "Ada");
    }

    // =====================================================================
    // Scores
    // =====================================================================

    #[test]
    fn test_post_score_submits_millisecond_value() {
        let (mut client, transport) = fresh_client();
        authenticate(&mut client, &transport);

        client
            .post_score_with_nickname(ScoreTime::from_seconds(7.256), "Ada")
            .unwrap();

        match &transport.submitted_calls()[1] {
            ApiCall::PostScore {
                leaderboards,
                score_ms,
                nickname,
            } => {
                assert_eq!(*score_ms, 7256);
                assert_eq!(nickname, "Ada");
                assert_eq!(leaderboards, &["Main", "Daily"]);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn test_post_score_completion_carries_canonical_time() {
        let (mut client, transport) = fresh_client();
        authenticate(&mut client, &transport);

        client.post_score(ScoreTime::from_seconds(7.256)).unwrap();
        transport.reply(1, Ok(json!({ "data": {} })));
        let events = client.run_callbacks();

        let [BackendEvent::ScorePosted { result: Ok(time), .. }] = &events[..]
        else {
            panic!("expected score event");
        };
        assert_eq!(*time, ScoreTime::from_millis(7256));
    }

    #[test]
    fn test_fetch_leaderboard_completion_carries_parsed_page() {
        let (mut client, transport) = fresh_client();
        authenticate(&mut client, &transport);

        client.fetch_leaderboard("Main", 0, 9).unwrap();
        transport.reply(
            1,
            Ok(json!({
                "data": {
                    "leaderboard": [
                        { "rank": 1, "score": 30500, "data": { "nickname": "Grace" } }
                    ]
                }
            })),
        );
        let events = client.run_callbacks();

        let [BackendEvent::LeaderboardLoaded { result: Ok(board), .. }] =
            &events[..]
        else {
            panic!("expected leaderboard event");
        };
        assert_eq!(board.name, "Main");
        assert_eq!(board.entries[0].rank, 1);
    }

    #[test]
    fn test_fetch_country_leaderboard_pages_entities_and_ranks_locally() {
        let (mut client, transport) = fresh_client();
        authenticate(&mut client, &transport);

        client.fetch_country_leaderboard().unwrap();
        match &transport.submitted_calls()[1] {
            ApiCall::FetchCountryLeaderboard {
                entity_type,
                rows_per_page,
                page,
            } => {
                assert_eq!(entity_type, "countryLeaderboard");
                assert_eq!(*rows_per_page, 10);
                assert_eq!(*page, 1);
            }
            other => panic!("unexpected call {other:?}"),
        }

        transport.reply(
            1,
            Ok(json!({
                "data": {
                    "results": {
                        "items": [
                            { "data": { "countryCode": "JP", "score": 30500 } },
                            { "data": { "countryCode": "CA", "score": 12340 } }
                        ]
                    }
                }
            })),
        );
        let events = client.run_callbacks();

        let [BackendEvent::LeaderboardLoaded { result: Ok(board), .. }] =
            &events[..]
        else {
            panic!("expected leaderboard event");
        };
        assert_eq!(board.name, "Country");
        assert_eq!(board.entries[0].rank, 1, "ranks are assigned locally");
        assert_eq!(board.entries[0].nickname, "JP");
        assert_eq!(board.entries[1].rank, 2);
        assert_eq!(board.entries[1].time, ScoreTime::from_millis(12340));
    }

    // =====================================================================
    // Drain semantics
    // =====================================================================

    #[test]
    fn test_each_request_produces_exactly_one_event() {
        let (mut client, transport) = fresh_client();
        authenticate(&mut client, &transport);

        client.fetch_user_statistics().unwrap();
        transport.reply(1, Ok(json!({ "data": { "statistics": {} } })));

        let first = client.run_callbacks();
        assert_eq!(first.len(), 1);
        let second = client.run_callbacks();
        assert!(second.is_empty(), "a completion must never fire twice");
    }

    #[test]
    fn test_missed_drains_delay_but_never_lose_completions() {
        let (mut client, transport) = fresh_client();
        authenticate(&mut client, &transport);

        // Two requests resolve while the game skips its drain.
        client.fetch_user_statistics().unwrap();
        client.fetch_achievements().unwrap();
        transport.reply(1, Ok(json!({ "data": { "statistics": {} } })));
        transport.reply(2, Ok(json!({ "data": { "achievements": [] } })));

        let events = client.run_callbacks();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_reply_for_unknown_request_is_ignored() {
        let (mut client, transport) = fresh_client();
        authenticate(&mut client, &transport);

        client.fetch_user_statistics().unwrap();
        transport.reply(1, Ok(json!({ "data": { "statistics": {} } })));
        // A duplicate reply from a misbehaving transport.
        transport.reply(1, Ok(json!({ "data": { "statistics": {} } })));

        let events = client.run_callbacks();
        assert_eq!(events.len(), 1, "the duplicate must not become an event");
    }

    #[test]
    fn test_replies_pair_with_requests_by_id_not_order() {
        let (mut client, transport) = fresh_client();
        authenticate(&mut client, &transport);

        client.fetch_user_statistics().unwrap();
        client.fetch_achievements().unwrap();
        // Replies land in reverse order.
        transport.reply(2, Ok(json!({ "data": { "achievements": [] } })));
        transport.reply(1, Ok(json!({ "data": { "statistics": {} } })));

        let events = client.run_callbacks();
        assert!(matches!(events[0], BackendEvent::AchievementsLoaded { .. }));
        assert!(matches!(events[1], BackendEvent::StatisticsLoaded { .. }));
    }

    // =====================================================================
    // Identities
    // =====================================================================

    #[test]
    fn test_fetch_identities_caches_type_names() {
        let (mut client, transport) = fresh_client();
        authenticate(&mut client, &transport);

        client.fetch_identities().unwrap();
        transport.reply(
            1,
            Ok(json!({ "data": { "identities": { "Anonymous": "x" } } })),
        );
        client.run_callbacks();

        assert_eq!(client.identity_types(), ["Anonymous"]);
    }

    #[test]
    fn test_attach_email_identity_adds_email_type_once() {
        let (mut client, transport) = fresh_client();
        authenticate(&mut client, &transport);

        client.attach_email_identity("a@b.c", "pw").unwrap();
        transport.reply(1, Ok(json!({ "data": {} })));
        client.run_callbacks();
        assert_eq!(client.identity_types(), ["Email"]);

        client.attach_email_identity("a@b.c", "pw").unwrap();
        transport.reply(2, Ok(json!({ "data": {} })));
        client.run_callbacks();
        assert_eq!(client.identity_types(), ["Email"], "no duplicate entry");
    }

    // =====================================================================
    // Failure taxonomy
    // =====================================================================

    #[test]
    fn test_unreachable_backend_surfaces_transport_error() {
        let (mut client, transport) = fresh_client();
        authenticate(&mut client, &transport);

        client.fetch_leaderboard("Main", 0, 9).unwrap();
        transport.reply(
            1,
            Err(BackendFault::Unreachable {
                message: "connection timed out".into(),
            }),
        );
        let events = client.run_callbacks();

        assert!(matches!(
            &events[..],
            [BackendEvent::LeaderboardLoaded {
                result: Err(ClientError::Transport(_)),
                ..
            }]
        ));
    }

    #[test]
    fn test_failed_operations_leave_session_untouched() {
        let (mut client, transport) = fresh_client();
        authenticate(&mut client, &transport);
        let before = client.session().clone();

        client.update_username("Grace").unwrap();
        transport.reply(1, Err(server_fault(500, "internal error")));
        client.run_callbacks();

        assert_eq!(client.session(), &before);
    }
}
