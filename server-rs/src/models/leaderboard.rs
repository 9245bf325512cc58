use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MatchCategory;

/// One participant's line from one completed match.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub category: MatchCategory,
    pub user: Uuid,
    pub ign: String,
    pub kills: i32,
    pub rank: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub id: Uuid,
    pub username: String,
    pub ign: String,
    pub total_points: i64,
    pub total_kills: i64,
    pub total_matches: i64,
}
