//! Typed completion events delivered by the callback drain.

use starfall_protocol::{
    Achievement, Leaderboard, LevelDescriptor, RequestId, ScoreTime, Statistic,
    UserProgress,
};

use crate::{ClientError, Session};

/// The terminal outcome of one issued request, delivered during
/// [`SessionClient::run_callbacks`](crate::SessionClient::run_callbacks).
///
/// # Single-fire contract
///
/// Every request the client accepts produces **exactly one** event — never
/// zero, never two — and the event's variant matches the operation that was
/// issued. Success and failure travel in the same variant as a `Result`,
/// so a consumer can't handle one and forget the other.
///
/// Events carry the [`RequestId`] of the request they answer. A consumer
/// that cares about *when* a request was issued (e.g. before or after a
/// phase change) must compare that id against its own records; the client
/// makes no promise that the world hasn't moved on since issuance.
#[derive(Debug)]
pub enum BackendEvent {
    /// An authentication or reconnect attempt resolved. On success the
    /// session snapshot reflects the newly authenticated player.
    Authenticated {
        id: RequestId,
        result: Result<Session, ClientError>,
    },
    /// A logout resolved. On success the session and persisted
    /// identifiers have already been cleared.
    LoggedOut {
        id: RequestId,
        result: Result<(), ClientError>,
    },
    /// A display-name update resolved; the payload is the name the server
    /// actually stored.
    UsernameUpdated {
        id: RequestId,
        result: Result<String, ClientError>,
    },
    /// A score post resolved; the payload is the millisecond-canonical
    /// time that was submitted.
    ScorePosted {
        id: RequestId,
        result: Result<ScoreTime, ClientError>,
    },
    /// A leaderboard page arrived.
    LeaderboardLoaded {
        id: RequestId,
        result: Result<Leaderboard, ClientError>,
    },
    /// The level-definition feed arrived.
    LevelsLoaded {
        id: RequestId,
        result: Result<Vec<LevelDescriptor>, ClientError>,
    },
    /// The user-statistics read resolved.
    StatisticsLoaded {
        id: RequestId,
        result: Result<Vec<Statistic>, ClientError>,
    },
    /// A statistics increment resolved; the payload is the post-increment
    /// values.
    StatisticsIncremented {
        id: RequestId,
        result: Result<Vec<Statistic>, ClientError>,
    },
    /// The achievement list arrived.
    AchievementsLoaded {
        id: RequestId,
        result: Result<Vec<Achievement>, ClientError>,
    },
    /// An achievement award resolved.
    AchievementAwarded {
        id: RequestId,
        result: Result<(), ClientError>,
    },
    /// The per-user progress read resolved; `None` means the player has
    /// no progress entity yet.
    ProgressLoaded {
        id: RequestId,
        result: Result<Option<UserProgress>, ClientError>,
    },
    /// A progress-entity create resolved.
    ProgressCreated {
        id: RequestId,
        result: Result<(), ClientError>,
    },
    /// A progress-entity update resolved.
    ProgressUpdated {
        id: RequestId,
        result: Result<(), ClientError>,
    },
    /// The linked-identities read resolved; the payload is the identity
    /// type names attached to the profile.
    IdentitiesLoaded {
        id: RequestId,
        result: Result<Vec<String>, ClientError>,
    },
    /// An email-identity attach resolved.
    EmailIdentityAttached {
        id: RequestId,
        result: Result<(), ClientError>,
    },
}

impl BackendEvent {
    /// The id of the request this event answers.
    pub fn request_id(&self) -> RequestId {
        match self {
            Self::Authenticated { id, .. }
            | Self::LoggedOut { id, .. }
            | Self::UsernameUpdated { id, .. }
            | Self::ScorePosted { id, .. }
            | Self::LeaderboardLoaded { id, .. }
            | Self::LevelsLoaded { id, .. }
            | Self::StatisticsLoaded { id, .. }
            | Self::StatisticsIncremented { id, .. }
            | Self::AchievementsLoaded { id, .. }
            | Self::AchievementAwarded { id, .. }
            | Self::ProgressLoaded { id, .. }
            | Self::ProgressCreated { id, .. }
            | Self::ProgressUpdated { id, .. }
            | Self::IdentitiesLoaded { id, .. }
            | Self::EmailIdentityAttached { id, .. } => *id,
        }
    }
}
