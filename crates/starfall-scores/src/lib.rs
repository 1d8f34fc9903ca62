//! In-memory leaderboard cache for Starfall.
//!
//! One [`LeaderboardStore`] per process. Fetched leaderboard pages are
//! inserted wholesale (no merging), and the player's own freshly posted
//! score is flagged on later inserts so the display can highlight it.

mod store;

pub use store::LeaderboardStore;
