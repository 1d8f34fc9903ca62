//! The leaderboard store: a name-keyed cache of ranked pages.
//!
//! # Concurrency note
//!
//! `LeaderboardStore` is NOT thread-safe by itself — it's a plain
//! `HashMap` owned by the single logical thread that also drains backend
//! callbacks. Nothing in the core runs concurrently with it, so there is
//! no hidden locking here.

use std::collections::HashMap;

use starfall_protocol::{Leaderboard, ScoreTime};

/// Process-wide cache of leaderboards, keyed by backend name.
///
/// ## Lifecycle
///
/// ```text
/// fetch completes ──→ upsert() ──→ get() by the display layer
///                        ▲
/// post completes ──→ record_posted_time()
/// ```
///
/// The cached "posted time" marks the matching entry of every leaderboard
/// inserted *afterwards*; it is never re-applied to pages already stored.
/// Logging out does not clear the store — scores persist server-side and
/// the cached pages stay valid reads.
#[derive(Debug, Default)]
pub struct LeaderboardStore {
    boards: HashMap<String, Leaderboard>,
    /// The local player's most recently posted time, millisecond-canonical.
    posted: Option<ScoreTime>,
}

impl LeaderboardStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly fetched leaderboard, replacing any existing page
    /// under the same name entirely (no merge).
    ///
    /// If a posted time is cached, the first entry whose time matches it
    /// millisecond-exact is flagged as the user's own score. At most one
    /// entry is flagged, even when duplicates exist.
    pub fn upsert(&mut self, mut board: Leaderboard) {
        if let Some(posted) = self.posted {
            if let Some(entry) =
                board.entries.iter_mut().find(|e| e.time == posted)
            {
                entry.is_user_score = true;
            }
        }

        tracing::debug!(
            name = %board.name,
            entries = board.len(),
            "leaderboard cached"
        );
        self.boards.insert(board.name.clone(), board);
    }

    /// Looks up a cached leaderboard by name.
    pub fn get(&self, name: &str) -> Option<&Leaderboard> {
        self.boards.get(name)
    }

    /// Caches the player's just-posted time, overwriting any previous one.
    ///
    /// Does not retroactively re-scan pages already in the store — the
    /// score only becomes visible in a page fetched after the post anyway.
    pub fn record_posted_time(&mut self, time: ScoreTime) {
        tracing::debug!(%time, "posted time recorded");
        self.posted = Some(time);
    }

    /// The cached posted time, if a post has completed this process.
    pub fn posted_time(&self) -> Option<ScoreTime> {
        self.posted
    }

    /// Number of cached leaderboards.
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    /// Returns `true` if no leaderboard has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use starfall_protocol::ScoreEntry;

    // -- Helpers ----------------------------------------------------------

    fn entry(nickname: &str, rank: u32, secs: f64) -> ScoreEntry {
        ScoreEntry {
            nickname: nickname.into(),
            rank,
            time: ScoreTime::from_seconds(secs),
            is_user_score: false,
        }
    }

    fn board(name: &str, entries: Vec<ScoreEntry>) -> Leaderboard {
        Leaderboard::new(name, entries)
    }

    // =====================================================================
    // upsert()
    // =====================================================================

    #[test]
    fn test_upsert_then_get_returns_board() {
        let mut store = LeaderboardStore::new();
        store.upsert(board("Main", vec![entry("Ada", 1, 30.0)]));

        let cached = store.get("Main").expect("board should be cached");
        assert_eq!(cached.len(), 1);
        assert_eq!(cached.entries[0].nickname, "Ada");
    }

    #[test]
    fn test_upsert_same_name_replaces_not_merges() {
        let mut store = LeaderboardStore::new();
        store.upsert(board(
            "Main",
            vec![entry("Ada", 1, 30.0), entry("Grace", 2, 20.0)],
        ));
        store.upsert(board("Main", vec![entry("Lin", 1, 40.0)]));

        let cached = store.get("Main").unwrap();
        assert_eq!(cached.len(), 1, "old entries must be discarded");
        assert_eq!(cached.entries[0].nickname, "Lin");
        assert_eq!(store.len(), 1, "no duplicate names in the store");
    }

    #[test]
    fn test_upsert_is_idempotent_under_identical_input() {
        let mut store = LeaderboardStore::new();
        let page = board("Main", vec![entry("Ada", 1, 30.0)]);

        store.upsert(page.clone());
        let once = store.get("Main").unwrap().clone();
        store.upsert(page);
        let twice = store.get("Main").unwrap().clone();

        assert_eq!(once, twice);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_distinct_names_coexist() {
        let mut store = LeaderboardStore::new();
        store.upsert(board("Main", vec![entry("Ada", 1, 30.0)]));
        store.upsert(board("Daily", vec![entry("Grace", 1, 12.0)]));

        assert_eq!(store.len(), 2);
        assert!(store.get("Main").is_some());
        assert!(store.get("Daily").is_some());
    }

    // =====================================================================
    // user-score marking
    // =====================================================================

    #[test]
    fn test_upsert_marks_entry_matching_posted_time() {
        let mut store = LeaderboardStore::new();
        store.record_posted_time(ScoreTime::from_seconds(7.256));

        store.upsert(board(
            "Main",
            vec![entry("Ada", 1, 30.0), entry("You", 2, 7.256)],
        ));

        let cached = store.get("Main").unwrap();
        assert!(!cached.entries[0].is_user_score);
        assert!(cached.entries[1].is_user_score);
    }

    #[test]
    fn test_upsert_marking_is_millisecond_exact() {
        let mut store = LeaderboardStore::new();
        store.record_posted_time(ScoreTime::from_seconds(7.256));

        // 7.2561s rounds to the same millisecond; 7.257s does not.
        store.upsert(board(
            "Main",
            vec![entry("Close", 1, 7.257), entry("Same", 2, 7.2561)],
        ));

        let cached = store.get("Main").unwrap();
        assert!(!cached.entries[0].is_user_score);
        assert!(cached.entries[1].is_user_score);
    }

    #[test]
    fn test_upsert_marks_at_most_one_entry_first_match_wins() {
        let mut store = LeaderboardStore::new();
        store.record_posted_time(ScoreTime::from_seconds(10.0));

        store.upsert(board(
            "Main",
            vec![entry("First", 1, 10.0), entry("Second", 2, 10.0)],
        ));

        let cached = store.get("Main").unwrap();
        assert!(cached.entries[0].is_user_score);
        assert!(!cached.entries[1].is_user_score);
    }

    #[test]
    fn test_upsert_without_posted_time_marks_nothing() {
        let mut store = LeaderboardStore::new();
        store.upsert(board("Main", vec![entry("Ada", 1, 30.0)]));

        assert!(!store.get("Main").unwrap().entries[0].is_user_score);
    }

    // =====================================================================
    // record_posted_time()
    // =====================================================================

    #[test]
    fn test_record_posted_time_overwrites_previous() {
        let mut store = LeaderboardStore::new();
        store.record_posted_time(ScoreTime::from_seconds(5.0));
        store.record_posted_time(ScoreTime::from_seconds(9.0));

        assert_eq!(store.posted_time(), Some(ScoreTime::from_seconds(9.0)));
    }

    #[test]
    fn test_record_posted_time_does_not_rescan_existing_boards() {
        let mut store = LeaderboardStore::new();
        store.upsert(board("Main", vec![entry("You", 1, 7.256)]));
        store.record_posted_time(ScoreTime::from_seconds(7.256));

        // The already-stored page is untouched; only later inserts mark.
        assert!(!store.get("Main").unwrap().entries[0].is_user_score);

        store.upsert(board("Main", vec![entry("You", 1, 7.256)]));
        assert!(store.get("Main").unwrap().entries[0].is_user_score);
    }

    // =====================================================================
    // get() / len() / is_empty()
    // =====================================================================

    #[test]
    fn test_get_unknown_name_returns_none() {
        let store = LeaderboardStore::new();
        assert!(store.get("Country").is_none());
    }

    #[test]
    fn test_len_tracks_board_count() {
        let mut store = LeaderboardStore::new();
        assert!(store.is_empty());

        store.upsert(board("Main", Vec::new()));
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }
}
