//! Domain types shared across the Starfall stack.
//!
//! Everything the game keeps in memory about the backend lives here: score
//! times, leaderboard pages, level descriptors, statistics, achievements,
//! and the fixed set of request shapes ([`ApiCall`]) the client can issue.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RequestId
// ---------------------------------------------------------------------------

/// A unique identifier for one outbound backend request.
///
/// Newtype over `u64` so a request id can't be confused with any other
/// counter. Ids are assigned by the client, echoed back by the transport
/// on the matching reply, and used to pair exactly one completion with
/// exactly one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ScoreTime — millisecond-canonical time
// ---------------------------------------------------------------------------

/// A survival time, stored at millisecond granularity.
///
/// The backend stores scores as integer milliseconds, so every time that
/// enters the system is canonicalized immediately: `ms = round(secs * 1000)`.
/// Two times that differ by less than a millisecond compare equal, which is
/// what makes the gameplay rank-chase comparison stable — comparing raw
/// floats against fetched scores drifts and advances the displayed rank a
/// frame early or late.
///
/// `Ord` is derived on the millisecond value, so sorting and comparing
/// `ScoreTime`s is exact integer arithmetic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ScoreTime(i64);

impl ScoreTime {
    /// Canonicalizes a time in seconds to millisecond precision.
    pub fn from_seconds(secs: f64) -> Self {
        Self((secs * 1000.0).round() as i64)
    }

    /// Wraps a raw millisecond value (the backend's native unit).
    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    /// The raw millisecond value, as submitted to the backend.
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// The canonical time in seconds (`ms / 1000.0`).
    pub fn seconds(self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

impl fmt::Display for ScoreTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.seconds())
    }
}

// ---------------------------------------------------------------------------
// Leaderboards
// ---------------------------------------------------------------------------

/// One row of a ranked leaderboard page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Display name attached to the score when it was posted.
    pub nickname: String,
    /// 1-based rank, taken verbatim from the backend — never recomputed.
    pub rank: u32,
    /// The score itself (lower is a worse survival time).
    pub time: ScoreTime,
    /// Whether this entry is the local player's own posted score.
    /// Set by the score store, not by parsing.
    pub is_user_score: bool,
}

/// A full leaderboard page, rebuilt wholesale from each fetch.
///
/// Entries are rank-ascending (best score first). There is no incremental
/// patching: a new fetch produces a new `Leaderboard` that replaces the old
/// one in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    /// The leaderboard's backend name, e.g. `"Main"` or `"Daily"`.
    pub name: String,
    /// Ranked entries. Rows outside the fetched range are simply absent.
    pub entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    /// Creates a leaderboard from already-parsed entries.
    pub fn new(name: impl Into<String>, entries: Vec<ScoreEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// The entry at `index`, or `None` past the end of the page.
    pub fn entry_at(&self, index: usize) -> Option<&ScoreEntry> {
        self.entries.get(index)
    }

    /// Number of entries on this page.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the page has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Level descriptors
// ---------------------------------------------------------------------------

/// Sentinel duration meaning "this level has no time limit".
pub const UNTIMED: f64 = -1.0;

/// One level definition from the bulk level-definition feed.
///
/// Fetch order defines the level index 0..N-1. Immutable after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    /// Backend entity type of the record.
    pub entity_type: String,
    /// Backend entity id of the record.
    pub entity_id: String,
    /// Level duration in seconds, or [`UNTIMED`] (-1) for no limit.
    pub duration: f64,
    /// Human-readable level goal shown in the level banner.
    pub description: String,
}

impl LevelDescriptor {
    /// Returns `true` if this level never auto-advances on elapsed time.
    pub fn is_untimed(&self) -> bool {
        self.duration == UNTIMED
    }
}

// ---------------------------------------------------------------------------
// Statistics, achievements, per-user progress
// ---------------------------------------------------------------------------

/// One named user statistic (e.g. games played, hostiles destroyed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistic {
    /// Backend statistic key.
    pub name: String,
    /// Current accumulated value.
    pub value: i64,
}

/// One achievement definition with its award status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Award status string, forwarded verbatim from the backend.
    pub status: String,
}

/// The player's per-user progress entity.
///
/// A single typed entity in the backend's key/value store recording which
/// levels the player has completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    pub entity_id: String,
    pub entity_type: String,
    pub level_one_completed: bool,
    pub level_two_completed: bool,
    pub level_three_completed: bool,
    pub level_boss_completed: bool,
}

// ---------------------------------------------------------------------------
// ApiCall — the fixed set of request shapes
// ---------------------------------------------------------------------------

/// Every request the client can issue against the backend.
///
/// This is not a general-purpose networking surface: it is the closed set
/// of operations this one game uses. The transport serializes a call
/// however its protocol demands; `#[serde(tag = "op")]` gives the default
/// JSON encoding an explicit operation tag:
///
/// ```text
/// { "op": "FetchLeaderboard", "name": "Main", "range_start": 0, "range_end": 9 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum ApiCall {
    // -- Authentication --
    /// Authenticate with a device-generated anonymous id.
    AuthenticateAnonymous { anonymous_id: String },
    /// Authenticate with an email/password identity.
    AuthenticateEmail { email: String, password: String },
    /// Authenticate with a universal id/password identity.
    AuthenticateUniversal { user_id: String, password: String },
    /// Authenticate with a token from an external provider.
    AuthenticateExternal {
        provider: String,
        external_id: String,
        token: String,
    },
    /// Resume a previous session from stored identifiers.
    Reconnect {
        profile_id: String,
        anonymous_id: String,
    },
    /// End the current session server-side.
    Logout,

    // -- Player state --
    /// Change the player's display name. The server echoes the name it
    /// actually stored, which may differ after normalization.
    UpdateUsername { name: String },

    // -- Leaderboards --
    /// Post one score against several named leaderboards as a single
    /// atomic server-side operation.
    PostScore {
        leaderboards: Vec<String>,
        score_ms: i64,
        nickname: String,
    },
    /// Fetch one ranked page of a named leaderboard.
    FetchLeaderboard {
        name: String,
        range_start: u32,
        range_end: u32,
    },
    /// Fetch the per-country leaderboard: a page query against the custom
    /// entity store. The backend returns the page sorted best-first with
    /// no server ranks; rows carry a country code instead of a nickname.
    FetchCountryLeaderboard {
        entity_type: String,
        rows_per_page: u32,
        page: u32,
    },

    // -- Bulk data --
    /// Fetch the level-definition feed.
    FetchLevelDescriptors,

    // -- Statistics --
    FetchUserStatistics,
    /// Apply a map of deltas to the player's statistics.
    IncrementUserStatistics {
        deltas: std::collections::BTreeMap<String, i64>,
    },

    // -- Achievements --
    FetchAchievements,
    AwardAchievement { id: String },

    // -- Per-user entity store --
    FetchUserProgress,
    CreateUserProgress,
    UpdateUserProgress {
        entity_id: String,
        entity_type: String,
        data: serde_json::Value,
    },

    // -- Identities --
    FetchIdentities,
    AttachEmailIdentity { email: String, password: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // ScoreTime canonicalization
    // =====================================================================

    #[test]
    fn test_from_seconds_rounds_to_milliseconds() {
        assert_eq!(ScoreTime::from_seconds(7.256).as_millis(), 7256);
        assert_eq!(ScoreTime::from_seconds(12.340).as_millis(), 12340);
        assert_eq!(ScoreTime::from_seconds(0.0).as_millis(), 0);
    }

    #[test]
    fn test_from_seconds_sub_millisecond_differences_compare_equal() {
        // Any two times within half a millisecond of each other must
        // canonicalize identically.
        let pairs: [(f64, f64); 4] = [
            (1.0002, 0.9998),
            (12.3400, 12.3404),
            (0.0001, 0.0004),
            (99.9996, 99.9999),
        ];
        for (t1, t2) in pairs {
            assert!((t1 - t2).abs() < 0.0005, "bad test fixture");
            assert_eq!(
                ScoreTime::from_seconds(t1),
                ScoreTime::from_seconds(t2),
                "{t1} and {t2} should canonicalize to the same millisecond"
            );
        }
    }

    #[test]
    fn test_from_seconds_is_idempotent_through_seconds() {
        // Canonicalize, read back as seconds, canonicalize again:
        // the second pass must not move the value.
        let t = ScoreTime::from_seconds(7.2564);
        let again = ScoreTime::from_seconds(t.seconds());
        assert_eq!(t, again);
    }

    #[test]
    fn test_seconds_is_millis_over_one_thousand() {
        let t = ScoreTime::from_millis(12340);
        assert_eq!(t.seconds(), 12.340);
    }

    #[test]
    fn test_ordering_follows_millisecond_value() {
        let slower = ScoreTime::from_seconds(12.341);
        let faster = ScoreTime::from_seconds(12.340);
        assert!(slower > faster);
        assert!(faster < slower);
    }

    #[test]
    fn test_display_shows_three_decimals() {
        assert_eq!(ScoreTime::from_millis(12340).to_string(), "12.340s");
    }

    #[test]
    fn test_score_time_serializes_as_plain_millis() {
        let json = serde_json::to_string(&ScoreTime::from_millis(7256)).unwrap();
        assert_eq!(json, "7256");
    }

    // =====================================================================
    // Leaderboard helpers
    // =====================================================================

    fn entry(nickname: &str, rank: u32, secs: f64) -> ScoreEntry {
        ScoreEntry {
            nickname: nickname.into(),
            rank,
            time: ScoreTime::from_seconds(secs),
            is_user_score: false,
        }
    }

    #[test]
    fn test_entry_at_in_range_returns_entry() {
        let board = Leaderboard::new("Main", vec![entry("Ada", 1, 30.0)]);
        assert_eq!(board.entry_at(0).unwrap().nickname, "Ada");
    }

    #[test]
    fn test_entry_at_out_of_range_returns_none() {
        let board = Leaderboard::new("Main", vec![entry("Ada", 1, 30.0)]);
        assert!(board.entry_at(1).is_none());
    }

    #[test]
    fn test_empty_leaderboard_is_empty() {
        let board = Leaderboard::new("Daily", Vec::new());
        assert!(board.is_empty());
        assert_eq!(board.len(), 0);
    }

    // =====================================================================
    // LevelDescriptor
    // =====================================================================

    #[test]
    fn test_is_untimed_for_sentinel_duration() {
        let level = LevelDescriptor {
            entity_type: "level".into(),
            entity_id: "lvl-2".into(),
            duration: UNTIMED,
            description: "Survive".into(),
        };
        assert!(level.is_untimed());
    }

    #[test]
    fn test_is_untimed_false_for_positive_duration() {
        let level = LevelDescriptor {
            entity_type: "level".into(),
            entity_id: "lvl-1".into(),
            duration: 5.0,
            description: "Clear the wave".into(),
        };
        assert!(!level.is_untimed());
    }

    // =====================================================================
    // ApiCall JSON shapes
    // =====================================================================

    #[test]
    fn test_api_call_fetch_leaderboard_json_format() {
        let call = ApiCall::FetchLeaderboard {
            name: "Main".into(),
            range_start: 0,
            range_end: 9,
        };
        let json: serde_json::Value = serde_json::to_value(&call).unwrap();
        assert_eq!(json["op"], "FetchLeaderboard");
        assert_eq!(json["name"], "Main");
        assert_eq!(json["range_start"], 0);
        assert_eq!(json["range_end"], 9);
    }

    #[test]
    fn test_api_call_post_score_carries_millis() {
        let call = ApiCall::PostScore {
            leaderboards: vec!["Main".into(), "Daily".into()],
            score_ms: ScoreTime::from_seconds(7.256).as_millis(),
            nickname: "Ada".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&call).unwrap();
        assert_eq!(json["op"], "PostScore");
        assert_eq!(json["score_ms"], 7256);
        assert_eq!(json["leaderboards"][1], "Daily");
    }

    #[test]
    fn test_api_call_country_leaderboard_is_a_page_query() {
        let call = ApiCall::FetchCountryLeaderboard {
            entity_type: "countryLeaderboard".into(),
            rows_per_page: 10,
            page: 1,
        };
        let json: serde_json::Value = serde_json::to_value(&call).unwrap();
        assert_eq!(json["op"], "FetchCountryLeaderboard");
        assert_eq!(json["entity_type"], "countryLeaderboard");
        assert_eq!(json["rows_per_page"], 10);
        assert_eq!(json["page"], 1);
    }

    #[test]
    fn test_api_call_unit_variant_round_trip() {
        let call = ApiCall::FetchLevelDescriptors;
        let bytes = serde_json::to_vec(&call).unwrap();
        let decoded: ApiCall = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(call, decoded);
    }

    #[test]
    fn test_api_call_increment_statistics_round_trip() {
        let mut deltas = std::collections::BTreeMap::new();
        deltas.insert("GamesPlayed".to_string(), 1);
        deltas.insert("HostilesDestroyed".to_string(), 12);
        let call = ApiCall::IncrementUserStatistics { deltas };
        let bytes = serde_json::to_vec(&call).unwrap();
        let decoded: ApiCall = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(call, decoded);
    }
}
