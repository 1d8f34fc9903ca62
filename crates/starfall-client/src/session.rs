//! Session state and persisted-identifier storage.
//!
//! A "session" is the client's record of the authenticated player. It is
//! mutated only by [`SessionClient`](crate::SessionClient) on successful or
//! failed auth and on logout, and its `is_authenticated` flag is the single
//! gate for every other backend call.

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Configuration for the session client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Leaderboards every score post targets, as a single atomic
    /// server-side operation.
    pub score_leaderboards: Vec<String>,
    /// Entity type used for the per-user progress record.
    pub progress_entity_type: String,
    /// Name under which the country leaderboard page is cached.
    pub country_leaderboard_id: String,
    /// Entity type of the custom-entity records backing the country
    /// leaderboard.
    pub country_entity_type: String,
    /// Page size of the country leaderboard query.
    pub country_page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            score_leaderboards: vec!["Main".into(), "Daily".into()],
            progress_entity_type: "progress".into(),
            country_leaderboard_id: "Country".into(),
            country_entity_type: "countryLeaderboard".into(),
            country_page_size: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The authenticated player, as the client currently knows them.
///
/// Created at process start from persisted identifiers (possibly empty).
/// `is_authenticated` flips true only on a successful auth completion and
/// back to false only on logout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Backend profile id. Empty until first successful authentication.
    pub profile_id: String,
    /// Device-generated anonymous id, stable across restarts.
    pub anonymous_id: String,
    /// The player's display name as the server knows it.
    pub username: String,
    /// The single gate for all protected backend calls.
    pub is_authenticated: bool,
}

impl Session {
    /// Returns `true` if a display name is known for this player.
    pub fn is_username_saved(&self) -> bool {
        !self.username.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Identity persistence
// ---------------------------------------------------------------------------

/// The identifier pair persisted across process restarts.
///
/// Both ids present means a previous authentication succeeded on this
/// device and a silent reconnect can be attempted instead of an
/// interactive login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredIdentity {
    pub profile_id: String,
    pub anonymous_id: String,
}

impl StoredIdentity {
    /// Returns `true` if both identifiers are present.
    pub fn is_complete(&self) -> bool {
        !self.profile_id.is_empty() && !self.anonymous_id.is_empty()
    }
}

/// Where persisted identifiers live.
///
/// The client doesn't care whether that's a settings file, a platform
/// keychain, or test memory — it only needs load/save/clear. Logout must
/// go through [`clear`](Self::clear) so a later restart requires fresh
/// authentication.
pub trait IdentityVault: Send + 'static {
    /// Loads the stored identifiers (empty strings when nothing is stored).
    fn load(&self) -> StoredIdentity;

    /// Persists the identifiers after a successful authentication.
    fn save(&mut self, identity: &StoredIdentity);

    /// Invalidates all stored identifiers.
    fn clear(&mut self);
}

/// An in-memory vault. The default for tests and headless runs; real
/// deployments supply a disk-backed implementation.
#[derive(Debug, Default)]
pub struct MemoryVault {
    identity: StoredIdentity,
}

impl MemoryVault {
    /// Creates an empty vault (no previous authentication).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a vault pre-seeded with identifiers, as if a previous run
    /// had authenticated.
    pub fn with_identity(profile_id: &str, anonymous_id: &str) -> Self {
        Self {
            identity: StoredIdentity {
                profile_id: profile_id.into(),
                anonymous_id: anonymous_id.into(),
            },
        }
    }
}

impl IdentityVault for MemoryVault {
    fn load(&self) -> StoredIdentity {
        self.identity.clone()
    }

    fn save(&mut self, identity: &StoredIdentity) {
        self.identity = identity.clone();
    }

    fn clear(&mut self) {
        self.identity = StoredIdentity::default();
    }
}

// =========================================================================
// Tests
// =========================================================================
