//! Backend contract types for Starfall.
//!
//! This crate defines the *contract* the game consumes from the remote
//! backend service: the fixed set of request shapes the client can issue
//! ([`ApiCall`]) and the parsers that turn the backend's opaque response
//! documents into domain objects ([`response`]).
//!
//! The transport and encoding of those documents are deliberately out of
//! scope — a transport hands us `serde_json::Value` documents and we hand
//! back [`Leaderboard`]s, [`LevelDescriptor`]s, and friends.
//!
//! # How it fits in the stack
//!
//! ```text
//! Game Layer (above)      ← progression state machine, score display
//!     ↕
//! Client Layer            ← issues ApiCalls, drains completions
//!     ↕
//! Protocol Layer (this crate)  ← request shapes + response parsing
//! ```

mod error;
pub mod response;
mod types;

pub use error::ProtocolError;
pub use types::{
    Achievement, ApiCall, Leaderboard, LevelDescriptor, RequestId, ScoreEntry,
    ScoreTime, Statistic, UserProgress,
};
