use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::tournament::{
    Participant, ParticipantResultInput, RoomUpdate, RoomUpdateRequest, Tournament,
};

/// Loose numeric input from the admin console: numbers or numeric strings,
/// truncated toward zero. Anything else, negatives included, becomes 0.
pub fn coerce_count(value: Option<&Value>) -> i32 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(v) if v.is_finite() && v > 0.0 => v.trunc().min(i32::MAX as f64) as i32,
        _ => 0,
    }
}

/// Turns an admin request into an update against `current`.
///
/// A supplied participant list replaces the stored one wholesale. Entries
/// that omit `ign`/`uid`/`joinedAt` inherit them from the existing entry for
/// the same user.
pub fn prepare(
    current: &Tournament,
    request: RoomUpdateRequest,
    now: DateTime<Utc>,
) -> AppResult<RoomUpdate> {
    if let Some(next) = request.status {
        if next < current.status {
            return Err(AppError::Conflict(format!(
                "Status cannot move from {} back to {}",
                current.status, next
            )));
        }
    }

    let participants = match request.participants {
        Some(entries) => Some(replace_participants(current, entries, now)?),
        None => None,
    };

    Ok(RoomUpdate {
        room_id: request.room_id,
        room_password: request.room_password,
        status: request.status,
        participants,
    })
}

fn replace_participants(
    current: &Tournament,
    entries: Vec<ParticipantResultInput>,
    now: DateTime<Utc>,
) -> AppResult<Vec<Participant>> {
    if entries.len() > current.max_players.max(0) as usize {
        return Err(AppError::BadRequest(format!(
            "At most {} participants allowed",
            current.max_players
        )));
    }

    let mut seen = HashSet::with_capacity(entries.len());
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let user = entry
            .user
            .as_deref()
            .and_then(|u| Uuid::parse_str(u.trim()).ok())
            .ok_or_else(|| AppError::BadRequest("Each participant needs a valid user id".into()))?;
        if !seen.insert(user) {
            return Err(AppError::BadRequest(format!(
                "Participant {user} listed more than once"
            )));
        }

        let existing = current.participants.iter().find(|p| p.user == user);
        let text = |given: Option<String>, fallback: Option<&String>| {
            given
                .map(|s| s.trim().to_string())
                .or_else(|| fallback.cloned())
                .unwrap_or_default()
        };

        out.push(Participant {
            user,
            ign: text(entry.ign, existing.map(|p| &p.ign)),
            uid: text(entry.uid, existing.map(|p| &p.uid)),
            kills: coerce_count(entry.kills.as_ref()),
            rank: coerce_count(entry.rank.as_ref()),
            joined_at: entry
                .joined_at
                .or_else(|| existing.map(|p| p.joined_at))
                .unwrap_or(now),
        });
    }
    Ok(out)
}
