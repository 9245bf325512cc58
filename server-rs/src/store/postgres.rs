use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::leaderboard::MatchResult;
use crate::models::tournament::*;
use crate::models::user::{NewUser, User};
use crate::services::registration::{self, JoinRejection, JoinRequest};
use crate::services::results;
use crate::store::TournamentStore;

/// Public projection: never includes `room_id` or `room_password`.
const TOURNAMENT_COLUMNS: &str = "id, title, game, match_category, match_type, map, description, \
     rules, banner, start_time, end_time, entry_fee, prize_pool, max_players, status, \
     created_at, updated_at";

#[derive(sqlx::FromRow)]
struct TournamentRow {
    id: Uuid,
    title: String,
    game: String,
    match_category: String,
    match_type: String,
    map: String,
    description: String,
    rules: Vec<String>,
    banner: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    entry_fee: i64,
    prize_pool: i64,
    max_players: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct TournamentRoomRow {
    #[sqlx(flatten)]
    tournament: TournamentRow,
    room_id: Option<String>,
    room_password: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ParticipantRow {
    tournament_id: Uuid,
    user_id: Uuid,
    ign: String,
    uid: String,
    kills: i32,
    placement: i32,
    joined_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

fn corrupt(e: String) -> AppError {
    AppError::Internal(format!("corrupt row: {e}"))
}

impl TournamentRow {
    fn into_tournament(self, participants: Vec<Participant>) -> AppResult<Tournament> {
        Ok(Tournament {
            id: self.id,
            title: self.title,
            game: self.game,
            match_category: self.match_category.parse().map_err(corrupt)?,
            match_type: self.match_type.parse().map_err(corrupt)?,
            map: self.map,
            description: self.description,
            rules: self.rules,
            banner: self.banner,
            start_time: self.start_time,
            end_time: self.end_time,
            entry_fee: self.entry_fee,
            prize_pool: self.prize_pool,
            max_players: self.max_players,
            status: self.status.parse().map_err(corrupt)?,
            participants,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl From<ParticipantRow> for Participant {
    fn from(r: ParticipantRow) -> Self {
        Participant {
            user: r.user_id,
            ign: r.ign,
            uid: r.uid,
            kills: r.kills,
            rank: r.placement,
            joined_at: r.joined_at,
        }
    }
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(r: UserRow) -> AppResult<Self> {
        Ok(User {
            id: r.id,
            username: r.username,
            email: r.email,
            password_hash: r.password_hash,
            role: r.role.parse().map_err(corrupt)?,
            created_at: r.created_at,
        })
    }
}

async fn load_participants<'c>(
    exec: impl PgExecutor<'c>,
    ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<Participant>>> {
    let rows: Vec<ParticipantRow> = sqlx::query_as(
        r#"SELECT tournament_id, user_id, ign, uid, kills, placement, joined_at
        FROM tournament_participants
        WHERE tournament_id = ANY($1)
        ORDER BY tournament_id, position"#,
    )
    .bind(ids)
    .fetch_all(exec)
    .await?;

    let mut by_tournament: HashMap<Uuid, Vec<Participant>> = HashMap::new();
    for row in rows {
        by_tournament
            .entry(row.tournament_id)
            .or_default()
            .push(row.into());
    }
    Ok(by_tournament)
}

async fn insert_participant<'c>(
    exec: impl PgExecutor<'c>,
    tournament_id: Uuid,
    position: usize,
    p: &Participant,
) -> AppResult<()> {
    sqlx::query(
        r#"INSERT INTO tournament_participants
            (tournament_id, user_id, position, ign, uid, kills, placement, joined_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
    )
    .bind(tournament_id)
    .bind(p.user)
    .bind(position as i32)
    .bind(&p.ign)
    .bind(&p.uid)
    .bind(p.kills)
    .bind(p.rank)
    .bind(p.joined_at)
    .execute(exec)
    .await?;
    Ok(())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, rows: Vec<TournamentRow>) -> AppResult<Vec<Tournament>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut participants = load_participants(&self.pool, &ids).await?;
        rows.into_iter()
            .map(|r| {
                let parts = participants.remove(&r.id).unwrap_or_default();
                r.into_tournament(parts)
            })
            .collect()
    }
}

#[async_trait]
impl TournamentStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await?;
        if exists {
            return Err(AppError::Conflict("Username or email already registered".into()));
        }

        let row: UserRow = sqlx::query_as(
            r#"INSERT INTO users (id, username, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, role, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("Username or email already registered".into())
            }
            other => other.into(),
        })?;
        row.try_into()
    }

    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn usernames(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, String>> {
        let rows: Vec<(Uuid, String)> =
            sqlx::query_as("SELECT id, username FROM users WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    async fn list_tournaments(&self) -> AppResult<Vec<Tournament>> {
        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments ORDER BY start_time ASC, id");
        let rows: Vec<TournamentRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }

    async fn list_tournaments_with_room(&self) -> AppResult<Vec<TournamentWithRoom>> {
        let sql = format!(
            "SELECT {TOURNAMENT_COLUMNS}, room_id, room_password FROM tournaments ORDER BY start_time DESC, id"
        );
        let rows: Vec<TournamentRoomRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.tournament.id).collect();
        let mut participants = load_participants(&self.pool, &ids).await?;
        rows.into_iter()
            .map(|r| {
                let parts = participants.remove(&r.tournament.id).unwrap_or_default();
                Ok(TournamentWithRoom {
                    tournament: r.tournament.into_tournament(parts)?,
                    room: RoomCredentials {
                        room_id: r.room_id,
                        room_password: r.room_password,
                    },
                })
            })
            .collect()
    }

    async fn tournament(&self, id: Uuid) -> AppResult<Option<Tournament>> {
        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1");
        let row: Option<TournamentRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn room_credentials(&self, id: Uuid) -> AppResult<RoomCredentials> {
        let row: Option<(Option<String>, Option<String>)> =
            sqlx::query_as("SELECT room_id, room_password FROM tournaments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row
            .map(|(room_id, room_password)| RoomCredentials {
                room_id,
                room_password,
            })
            .unwrap_or_default())
    }

    async fn registered_tournaments(&self, user: Uuid) -> AppResult<Vec<Tournament>> {
        let sql = format!(
            r#"SELECT {TOURNAMENT_COLUMNS} FROM tournaments t
            WHERE EXISTS (
                SELECT 1 FROM tournament_participants p
                WHERE p.tournament_id = t.id AND p.user_id = $1
            )
            ORDER BY start_time ASC, id"#
        );
        let rows: Vec<TournamentRow> = sqlx::query_as(&sql)
            .bind(user)
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    async fn create_tournament(
        &self,
        new: NewTournament,
        now: DateTime<Utc>,
    ) -> AppResult<Tournament> {
        let sql = format!(
            r#"INSERT INTO tournaments
                (id, title, game, match_category, match_type, map, description, rules, banner,
                 start_time, end_time, entry_fee, prize_pool, max_players, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16)
            RETURNING {TOURNAMENT_COLUMNS}"#
        );
        let row: TournamentRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.title)
            .bind(&new.game)
            .bind(new.match_category.as_str())
            .bind(new.match_type.as_str())
            .bind(&new.map)
            .bind(&new.description)
            .bind(&new.rules)
            .bind(&new.banner)
            .bind(new.start_time)
            .bind(new.end_time)
            .bind(new.entry_fee)
            .bind(new.prize_pool)
            .bind(new.max_players)
            .bind(MatchStatus::Upcoming.as_str())
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
        row.into_tournament(Vec::new())
    }

    async fn join_tournament(
        &self,
        id: Uuid,
        request: &JoinRequest,
        now: DateTime<Utc>,
    ) -> AppResult<Tournament> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent joins on the same match.
        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1 FOR UPDATE");
        let row: Option<TournamentRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let current = match row {
            Some(row) => {
                let mut parts = load_participants(&mut *tx, &[id]).await?;
                Some(row.into_tournament(parts.remove(&id).unwrap_or_default())?)
            }
            None => None,
        };

        let participant = registration::admit(current.as_ref(), request, now)?;
        let mut tournament = current.ok_or(JoinRejection::NotFound)?;

        insert_participant(&mut *tx, id, tournament.participants.len(), &participant)
            .await
            .map_err(|e| match e {
                AppError::Database(sqlx::Error::Database(ref db)) if db.is_unique_violation() => {
                    JoinRejection::AlreadyRegistered.into()
                }
                other => other,
            })?;
        sqlx::query("UPDATE tournaments SET updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tournament.participants.push(participant);
        tournament.updated_at = now;
        Ok(tournament)
    }

    async fn update_room(
        &self,
        id: Uuid,
        request: RoomUpdateRequest,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1 FOR UPDATE");
        let row: TournamentRow = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Match not found".into()))?;
        let mut parts = load_participants(&mut *tx, &[id]).await?;
        let current = row.into_tournament(parts.remove(&id).unwrap_or_default())?;

        let update = results::prepare(&current, request, now)?;

        sqlx::query(
            r#"UPDATE tournaments SET
                room_id = COALESCE($2, room_id),
                room_password = COALESCE($3, room_password),
                status = COALESCE($4, status),
                updated_at = $5
            WHERE id = $1"#,
        )
        .bind(id)
        .bind(update.room_id.as_deref())
        .bind(update.room_password.as_deref())
        .bind(update.status.map(|s| s.as_str()))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if let Some(participants) = &update.participants {
            sqlx::query("DELETE FROM tournament_participants WHERE tournament_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for (position, p) in participants.iter().enumerate() {
                insert_participant(&mut *tx, id, position, p)
                    .await
                    .map_err(|e| match e {
                        AppError::Database(sqlx::Error::Database(ref db))
                            if db.is_foreign_key_violation() =>
                        {
                            AppError::BadRequest(format!("Unknown participant user {}", p.user))
                        }
                        other => other,
                    })?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn completed_results(&self) -> AppResult<Vec<MatchResult>> {
        let rows: Vec<(String, Uuid, String, i32, i32)> = sqlx::query_as(
            r#"SELECT t.match_category, p.user_id, p.ign, p.kills, p.placement
            FROM tournaments t
            JOIN tournament_participants p ON p.tournament_id = t.id
            WHERE t.status = 'COMPLETED'
            ORDER BY t.start_time ASC, t.id, p.position"#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(category, user, ign, kills, rank)| {
                Ok(MatchResult {
                    category: category.parse().map_err(corrupt)?,
                    user,
                    ign,
                    kills,
                    rank,
                })
            })
            .collect()
    }

    async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
