use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Game mode of a match. Decides which scoring formula applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchCategory {
    BattleRoyale,
    #[default]
    ClashSquad,
    LoneWolf,
}

impl MatchCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchCategory::BattleRoyale => "BATTLE_ROYALE",
            MatchCategory::ClashSquad => "CLASH_SQUAD",
            MatchCategory::LoneWolf => "LONE_WOLF",
        }
    }
}

impl FromStr for MatchCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BATTLE_ROYALE" => Ok(MatchCategory::BattleRoyale),
            "CLASH_SQUAD" => Ok(MatchCategory::ClashSquad),
            "LONE_WOLF" => Ok(MatchCategory::LoneWolf),
            other => Err(format!("unknown match category {other:?}")),
        }
    }
}

/// Lifecycle of a match. Variant order is the forward progression.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    #[default]
    Upcoming,
    Live,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "UPCOMING",
            MatchStatus::Live => "LIVE",
            MatchStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPCOMING" => Ok(MatchStatus::Upcoming),
            "LIVE" => Ok(MatchStatus::Live),
            "COMPLETED" => Ok(MatchStatus::Completed),
            other => Err(format!("unknown match status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    #[serde(rename = "1v1")]
    Solo,
    #[serde(rename = "2v2")]
    Duo,
    #[serde(rename = "3v3")]
    Trio,
    #[default]
    #[serde(rename = "4v4")]
    Squad,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Solo => "1v1",
            MatchType::Duo => "2v2",
            MatchType::Trio => "3v3",
            MatchType::Squad => "4v4",
        }
    }
}

impl FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1v1" => Ok(MatchType::Solo),
            "2v2" => Ok(MatchType::Duo),
            "3v3" => Ok(MatchType::Trio),
            "4v4" => Ok(MatchType::Squad),
            other => Err(format!("unknown match type {other:?}")),
        }
    }
}

/// A user's registration in one match. `rank == 0` means no placement recorded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user: Uuid,
    pub ign: String,
    pub uid: String,
    pub kills: i32,
    pub rank: i32,
    pub joined_at: DateTime<Utc>,
}

/// Default read projection of a match. Never carries room credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: Uuid,
    pub title: String,
    pub game: String,
    pub match_category: MatchCategory,
    pub match_type: MatchType,
    pub map: String,
    pub description: String,
    pub rules: Vec<String>,
    pub banner: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub entry_fee: i64,
    pub prize_pool: i64,
    pub max_players: i32,
    pub status: MatchStatus,
    pub participants: Vec<Participant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tournament {
    pub fn is_participant(&self, user: Uuid) -> bool {
        self.participants.iter().any(|p| p.user == user)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.max_players.max(0) as usize
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCredentials {
    pub room_id: Option<String>,
    pub room_password: Option<String>,
}

/// A match together with its room fields. Only built by the reveal path
/// and the admin listing.
#[derive(Debug, Clone, Serialize)]
pub struct TournamentWithRoom {
    #[serde(flatten)]
    pub tournament: Tournament,
    #[serde(flatten)]
    pub room: RoomCredentials,
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinTournamentRequest {
    pub ign: Option<String>,
    pub uid: Option<String>,
}

impl JoinTournamentRequest {
    /// Reads `ign` and `uid` from an arbitrary body. Missing, non-string or
    /// unparseable input leaves the field empty so the join rule reports it.
    pub fn from_loose(body: Option<&Value>) -> Self {
        let field = |name: &str| {
            body.and_then(|b| b.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            ign: field("ign"),
            uid: field("uid"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTournamentRequest {
    pub title: String,
    pub game: Option<String>,
    pub match_category: Option<MatchCategory>,
    pub match_type: Option<MatchType>,
    pub map: Option<String>,
    pub description: Option<String>,
    pub rules: Option<Vec<String>>,
    pub banner: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub entry_fee: Option<i64>,
    pub prize_pool: i64,
    pub max_players: i32,
}

/// Validated input for a new match, produced from [`CreateTournamentRequest`].
#[derive(Debug, Clone)]
pub struct NewTournament {
    pub title: String,
    pub game: String,
    pub match_category: MatchCategory,
    pub match_type: MatchType,
    pub map: String,
    pub description: String,
    pub rules: Vec<String>,
    pub banner: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub entry_fee: i64,
    pub prize_pool: i64,
    pub max_players: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUpdateRequest {
    pub room_id: Option<String>,
    pub room_password: Option<String>,
    pub status: Option<MatchStatus>,
    pub participants: Option<Vec<ParticipantResultInput>>,
}

/// One participant row as sent by the admin console. Numbers arrive loosely
/// typed and are coerced before they reach the store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResultInput {
    pub user: Option<String>,
    pub ign: Option<String>,
    pub uid: Option<String>,
    pub kills: Option<Value>,
    pub rank: Option<Value>,
    pub joined_at: Option<DateTime<Utc>>,
}

/// Coerced admin update, ready to apply. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct RoomUpdate {
    pub room_id: Option<String>,
    pub room_password: Option<String>,
    pub status: Option<MatchStatus>,
    pub participants: Option<Vec<Participant>>,
}

#[cfg(test)]
impl Tournament {
    pub(crate) fn fixture(
        category: MatchCategory,
        status: MatchStatus,
        start_time: DateTime<Utc>,
        max_players: i32,
    ) -> Self {
        Tournament {
            id: Uuid::new_v4(),
            title: "Bermuda Showdown".into(),
            game: "Free Fire".into(),
            match_category: category,
            match_type: MatchType::Squad,
            map: "Bermuda".into(),
            description: String::new(),
            rules: vec![],
            banner: String::new(),
            start_time,
            end_time: start_time + chrono::Duration::hours(1),
            entry_fee: 0,
            prize_pool: 500,
            max_players,
            status,
            participants: vec![],
            created_at: start_time - chrono::Duration::days(2),
            updated_at: start_time - chrono::Duration::days(2),
        }
    }

    pub(crate) fn with_player(mut self, user: Uuid, ign: &str, kills: i32, rank: i32) -> Self {
        self.participants.push(Participant {
            user,
            ign: ign.into(),
            uid: "1000001".into(),
            kills,
            rank,
            joined_at: self.created_at,
        });
        self
    }
}
