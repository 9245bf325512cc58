//! Time-and-membership gate for room credentials.
//!
//! Evaluated on every read. A registered participant sees the real room id
//! and password from 15 minutes before the scheduled start onward; everyone
//! else gets [`ROOM_PLACEHOLDER`] in both fields.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::tournament::{RoomCredentials, Tournament, TournamentWithRoom};

pub const ROOM_PLACEHOLDER: &str = "REVEALING 15M BEFORE START";

pub const REVEAL_LEAD_MINUTES: i64 = 15;

pub fn reveal_opens_at(tournament: &Tournament) -> DateTime<Utc> {
    tournament.start_time - Duration::minutes(REVEAL_LEAD_MINUTES)
}

/// Inclusive at the opening instant.
pub fn can_reveal(tournament: &Tournament, viewer: Option<Uuid>, now: DateTime<Utc>) -> bool {
    let Some(viewer) = viewer else {
        return false;
    };
    now >= reveal_opens_at(tournament) && tournament.is_participant(viewer)
}

pub fn masked() -> RoomCredentials {
    RoomCredentials {
        room_id: Some(ROOM_PLACEHOLDER.to_string()),
        room_password: Some(ROOM_PLACEHOLDER.to_string()),
    }
}

pub fn mask_room(
    tournament: &Tournament,
    stored: RoomCredentials,
    viewer: Option<Uuid>,
    now: DateTime<Utc>,
) -> RoomCredentials {
    if can_reveal(tournament, viewer, now) {
        stored
    } else {
        masked()
    }
}

pub fn reveal_view(
    tournament: Tournament,
    stored: RoomCredentials,
    viewer: Option<Uuid>,
    now: DateTime<Utc>,
) -> TournamentWithRoom {
    let room = mask_room(&tournament, stored, viewer, now);
    TournamentWithRoom { tournament, room }
}
