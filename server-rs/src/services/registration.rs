use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::tournament::{JoinTournamentRequest, MatchStatus, Participant, Tournament};

/// Why a join attempt was refused. All of these are caller-correctable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum JoinRejection {
    #[error("Match not found")]
    NotFound,
    #[error("Registration closed")]
    RegistrationClosed,
    #[error("Arena full")]
    ArenaFull,
    #[error("Already registered")]
    AlreadyRegistered,
    #[error("IGN and UID are required")]
    MissingFields,
}

impl From<JoinRejection> for AppError {
    fn from(r: JoinRejection) -> Self {
        match r {
            JoinRejection::NotFound => AppError::NotFound(r.to_string()),
            JoinRejection::MissingFields => AppError::BadRequest(r.to_string()),
            JoinRejection::RegistrationClosed
            | JoinRejection::ArenaFull
            | JoinRejection::AlreadyRegistered => AppError::Conflict(r.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub user: Uuid,
    pub ign: String,
    pub uid: String,
}

impl JoinRequest {
    pub fn new(user: Uuid, body: JoinTournamentRequest) -> Self {
        Self {
            user,
            ign: body.ign.unwrap_or_default(),
            uid: body.uid.unwrap_or_default(),
        }
    }
}

/// Checks a join against the current state of the match and builds the
/// participant entry to append. First failing check wins, in this order:
/// existence, open registration, capacity, membership, input fields.
///
/// Stores call this while holding whatever lock makes the check and the
/// subsequent write atomic.
pub fn admit(
    tournament: Option<&Tournament>,
    request: &JoinRequest,
    now: DateTime<Utc>,
) -> Result<Participant, JoinRejection> {
    let tournament = tournament.ok_or(JoinRejection::NotFound)?;

    if tournament.status != MatchStatus::Upcoming {
        return Err(JoinRejection::RegistrationClosed);
    }
    if tournament.is_full() {
        return Err(JoinRejection::ArenaFull);
    }
    if tournament.is_participant(request.user) {
        return Err(JoinRejection::AlreadyRegistered);
    }

    let ign = request.ign.trim();
    let uid = request.uid.trim();
    if ign.is_empty() || uid.is_empty() {
        return Err(JoinRejection::MissingFields);
    }

    Ok(Participant {
        user: request.user,
        ign: ign.to_string(),
        uid: uid.to_string(),
        kills: 0,
        rank: 0,
        joined_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tournament::MatchCategory;
    use chrono::Duration;

    fn open_match(capacity: i32) -> Tournament {
        Tournament::fixture(
            MatchCategory::ClashSquad,
            MatchStatus::Upcoming,
            Utc::now() + Duration::hours(2),
            capacity,
        )
    }

    fn request(user: Uuid) -> JoinRequest {
        JoinRequest {
            user,
            ign: "  Raistar ".into(),
            uid: " 55123 ".into(),
        }
    }

    #[test]
    fn admits_with_trimmed_fields_and_blank_stats() {
        let now = Utc::now();
        let user = Uuid::new_v4();
        let p = admit(Some(&open_match(4)), &request(user), now).unwrap();
        assert_eq!(p.user, user);
        assert_eq!(p.ign, "Raistar");
        assert_eq!(p.uid, "55123");
        assert_eq!((p.kills, p.rank), (0, 0));
        assert_eq!(p.joined_at, now);
    }

    #[test]
    fn missing_match() {
        assert_eq!(
            admit(None, &request(Uuid::new_v4()), Utc::now()),
            Err(JoinRejection::NotFound)
        );
    }

    #[test]
    fn closed_once_live_or_completed() {
        for status in [MatchStatus::Live, MatchStatus::Completed] {
            let mut t = open_match(4);
            t.status = status;
            assert_eq!(
                admit(Some(&t), &request(Uuid::new_v4()), Utc::now()),
                Err(JoinRejection::RegistrationClosed)
            );
        }
    }

    #[test]
    fn full_arena() {
        let t = open_match(2)
            .with_player(Uuid::new_v4(), "a", 0, 0)
            .with_player(Uuid::new_v4(), "b", 0, 0);
        assert_eq!(
            admit(Some(&t), &request(Uuid::new_v4()), Utc::now()),
            Err(JoinRejection::ArenaFull)
        );
    }

    #[test]
    fn second_join_is_rejected() {
        let user = Uuid::new_v4();
        let t = open_match(4).with_player(user, "Raistar", 0, 0);
        assert_eq!(
            admit(Some(&t), &request(user), Utc::now()),
            Err(JoinRejection::AlreadyRegistered)
        );
    }

    #[test]
    fn whitespace_only_fields_are_missing() {
        let req = JoinRequest {
            user: Uuid::new_v4(),
            ign: "   ".into(),
            uid: "123".into(),
        };
        assert_eq!(
            admit(Some(&open_match(4)), &req, Utc::now()),
            Err(JoinRejection::MissingFields)
        );
    }

    #[test]
    fn status_is_checked_before_capacity() {
        let mut t = open_match(1).with_player(Uuid::new_v4(), "a", 0, 0);
        t.status = MatchStatus::Live;
        let req = JoinRequest {
            user: Uuid::new_v4(),
            ign: String::new(),
            uid: String::new(),
        };
        assert_eq!(admit(Some(&t), &req, Utc::now()), Err(JoinRejection::RegistrationClosed));
    }

    #[test]
    fn rejections_map_to_http_errors() {
        assert!(matches!(AppError::from(JoinRejection::NotFound), AppError::NotFound(_)));
        assert!(matches!(AppError::from(JoinRejection::MissingFields), AppError::BadRequest(_)));
        match AppError::from(JoinRejection::ArenaFull) {
            AppError::Conflict(msg) => assert_eq!(msg, "Arena full"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn loose_body_with_wrong_types_reaches_field_check() {
        let body = serde_json::json!({ "ign": 123, "uid": "x" });
        let req = JoinRequest::new(Uuid::new_v4(), JoinTournamentRequest::from_loose(Some(&body)));
        assert_eq!((req.ign.as_str(), req.uid.as_str()), ("", "x"));
        assert_eq!(
            admit(Some(&open_match(4)), &req, Utc::now()),
            Err(JoinRejection::MissingFields)
        );

        let empty = JoinRequest::new(Uuid::new_v4(), JoinTournamentRequest::from_loose(None));
        assert!(empty.ign.is_empty() && empty.uid.is_empty());
    }
}
