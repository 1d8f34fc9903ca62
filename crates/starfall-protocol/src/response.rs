//! Parsers for backend response documents.
//!
//! The backend answers every call with an opaque structured document. These
//! functions pull the fixed shapes this game consumes out of those documents
//! and build the domain objects in [`crate::types`].
//!
//! Two rules apply everywhere:
//!
//! - An **absent or empty array** where a list is expected yields an empty
//!   sequence, not an error. A page with no rows is a normal response.
//! - A **missing scalar field** the contract requires is a
//!   [`ProtocolError`]. The caller reports it through the operation's
//!   failure path; it never aborts the frame step.

use serde_json::Value;

use crate::{
    Achievement, Leaderboard, LevelDescriptor, ProtocolError, ScoreEntry,
    ScoreTime, Statistic, UserProgress,
};

/// The session fields extracted from a successful authentication response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPayload {
    /// Backend profile id, persisted for reconnects.
    pub profile_id: String,
    /// The player's display name as the server knows it. May be empty for
    /// a fresh anonymous account.
    pub player_name: String,
}

// ---------------------------------------------------------------------------
// Field navigation helpers
// ---------------------------------------------------------------------------

fn field<'a>(doc: &'a Value, path: &str) -> Result<&'a Value, ProtocolError> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current
            .get(segment)
            .ok_or_else(|| ProtocolError::missing(path))?;
    }
    Ok(current)
}

fn str_field(doc: &Value, path: &str) -> Result<String, ProtocolError> {
    field(doc, path)?
        .as_str()
        .map(str::to_owned)
        .ok_or(ProtocolError::WrongType {
            path: path.into(),
            expected: "string",
        })
}

fn i64_field(doc: &Value, path: &str) -> Result<i64, ProtocolError> {
    field(doc, path)?.as_i64().ok_or(ProtocolError::WrongType {
        path: path.into(),
        expected: "integer",
    })
}

fn f64_field(doc: &Value, path: &str) -> Result<f64, ProtocolError> {
    field(doc, path)?.as_f64().ok_or(ProtocolError::WrongType {
        path: path.into(),
        expected: "number",
    })
}

fn bool_field(doc: &Value, path: &str) -> Result<bool, ProtocolError> {
    field(doc, path)?
        .as_bool()
        .ok_or(ProtocolError::WrongType {
            path: path.into(),
            expected: "boolean",
        })
}

/// An array field that may be absent entirely. Absent or non-array yields
/// an empty slice.
fn optional_array<'a>(doc: &'a Value, path: &str) -> &'a [Value] {
    field(doc, path)
        .ok()
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

/// Extracts the human-readable status message from a failure payload.
///
/// Falls back to a generic message when the payload doesn't carry one, so
/// a malformed error document still produces a presentable string.
pub fn status_message(error_doc: &Value) -> String {
    error_doc
        .get("status_message")
        .and_then(Value::as_str)
        .unwrap_or("backend request failed")
        .to_owned()
}

/// Parses a successful authentication (or reconnect) response.
pub fn parse_auth(doc: &Value) -> Result<AuthPayload, ProtocolError> {
    Ok(AuthPayload {
        profile_id: str_field(doc, "data.profileId")?,
        player_name: str_field(doc, "data.playerName")?,
    })
}

/// Parses the server-echoed display name from an update-username response.
///
/// The echoed value is authoritative: the server may have normalized or
/// sanitized the requested name.
pub fn parse_player_name(doc: &Value) -> Result<String, ProtocolError> {
    str_field(doc, "data.playerName")
}

/// Parses one ranked leaderboard page.
///
/// Ranks are taken verbatim from the response — never recomputed locally.
/// Scores arrive as integer milliseconds and stay millisecond-canonical.
pub fn parse_leaderboard(
    name: &str,
    doc: &Value,
) -> Result<Leaderboard, ProtocolError> {
    let mut entries = Vec::new();
    for row in optional_array(doc, "data.leaderboard") {
        entries.push(ScoreEntry {
            rank: i64_field(row, "rank")? as u32,
            nickname: str_field(row, "data.nickname")?,
            time: ScoreTime::from_millis(i64_field(row, "score")?),
            is_user_score: false,
        });
    }
    Ok(Leaderboard::new(name, entries))
}

/// Parses a country leaderboard page from a custom-entity page query.
///
/// Unlike [`parse_leaderboard`], rows carry no server rank: the backend
/// returns the page already sorted best-first, so ranks are assigned
/// locally 1..N. The country code stands in as the nickname.
pub fn parse_country_leaderboard(
    name: &str,
    doc: &Value,
) -> Result<Leaderboard, ProtocolError> {
    let mut entries = Vec::new();
    for (i, row) in optional_array(doc, "data.results.items").iter().enumerate()
    {
        entries.push(ScoreEntry {
            rank: i as u32 + 1,
            nickname: str_field(row, "data.countryCode")?,
            time: ScoreTime::from_millis(i64_field(row, "data.score")?),
            is_user_score: false,
        });
    }
    Ok(Leaderboard::new(name, entries))
}

/// Parses the bulk level-definition feed. Response order defines the level
/// index 0..N-1.
pub fn parse_level_descriptors(
    doc: &Value,
) -> Result<Vec<LevelDescriptor>, ProtocolError> {
    let mut levels = Vec::new();
    for entity in optional_array(doc, "data.entityList") {
        levels.push(LevelDescriptor {
            entity_type: str_field(entity, "entityType")?,
            entity_id: str_field(entity, "entityId")?,
            duration: f64_field(entity, "data.level.duration")?,
            description: str_field(entity, "data.level.description")?,
        });
    }
    Ok(levels)
}

/// Parses the user-statistics map. Keys are sorted so the resulting list
/// is deterministic regardless of JSON object ordering.
pub fn parse_statistics(doc: &Value) -> Result<Vec<Statistic>, ProtocolError> {
    let Some(stats) = field(doc, "data.statistics").ok().and_then(Value::as_object)
    else {
        return Ok(Vec::new());
    };

    let mut names: Vec<&String> = stats.keys().collect();
    names.sort();

    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let value = stats[name].as_i64().ok_or(ProtocolError::WrongType {
            path: format!("data.statistics.{name}"),
            expected: "integer",
        })?;
        out.push(Statistic {
            name: name.clone(),
            value,
        });
    }
    Ok(out)
}

/// Parses the achievement list.
pub fn parse_achievements(
    doc: &Value,
) -> Result<Vec<Achievement>, ProtocolError> {
    let mut out = Vec::new();
    for row in optional_array(doc, "data.achievements") {
        out.push(Achievement {
            id: str_field(row, "id")?,
            title: str_field(row, "title")?,
            description: str_field(row, "description")?,
            status: str_field(row, "status")?,
        });
    }
    Ok(out)
}

/// Parses the player's progress entity, if one exists yet.
///
/// A brand-new player has no entity; that parses to `None` so the caller
/// can create one.
pub fn parse_user_progress(
    doc: &Value,
) -> Result<Option<UserProgress>, ProtocolError> {
    let entities = optional_array(doc, "data.entities");
    let Some(first) = entities.first() else {
        return Ok(None);
    };
    Ok(Some(UserProgress {
        entity_id: str_field(first, "entityId")?,
        entity_type: str_field(first, "entityType")?,
        level_one_completed: bool_field(first, "data.levelOneCompleted")?,
        level_two_completed: bool_field(first, "data.levelTwoCompleted")?,
        level_three_completed: bool_field(first, "data.levelThreeCompleted")?,
        level_boss_completed: bool_field(first, "data.levelBossCompleted")?,
    }))
}

/// Parses the linked-identities map into the list of identity type names
/// attached to this profile (e.g. `["Anonymous", "Email"]`).
pub fn parse_identities(doc: &Value) -> Result<Vec<String>, ProtocolError> {
    let Some(identities) =
        field(doc, "data.identities").ok().and_then(Value::as_object)
    else {
        return Ok(Vec::new());
    };
    let mut names: Vec<String> = identities.keys().cloned().collect();
    names.sort();
    Ok(names)
}

// =========================================================================
// Tests
// =========================================================================
