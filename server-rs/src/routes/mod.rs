pub mod admin;
pub mod auth;
pub mod health;
pub mod leaderboard;
pub mod tournaments;

use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Path ids that are not UUIDs cannot name a match.
pub(crate) fn parse_match_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Match not found".into()))
}
