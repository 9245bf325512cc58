use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::leaderboard::MatchResult;
use crate::models::tournament::*;
use crate::models::user::{NewUser, User};
use crate::services::registration::{self, JoinRejection, JoinRequest};
use crate::services::{results, scoring};
use crate::store::TournamentStore;

struct StoredTournament {
    tournament: Tournament,
    room: RoomCredentials,
}

/// Process-local store. Every mutation of a match happens under the single
/// tournaments write lock, so the join check and append cannot interleave.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    tournaments: Arc<RwLock<HashMap<Uuid, StoredTournament>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn soonest_first(list: &mut [Tournament]) {
    list.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Conflict("Username or email already registered".into()));
        }
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn usernames(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, String>> {
        let users = self.users.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| users.get(id).map(|u| (*id, u.username.clone())))
            .collect())
    }

    async fn list_tournaments(&self) -> AppResult<Vec<Tournament>> {
        let tournaments = self.tournaments.read().await;
        let mut list: Vec<Tournament> = tournaments.values().map(|s| s.tournament.clone()).collect();
        soonest_first(&mut list);
        Ok(list)
    }

    async fn list_tournaments_with_room(&self) -> AppResult<Vec<TournamentWithRoom>> {
        let tournaments = self.tournaments.read().await;
        let mut list: Vec<TournamentWithRoom> = tournaments
            .values()
            .map(|s| TournamentWithRoom {
                tournament: s.tournament.clone(),
                room: s.room.clone(),
            })
            .collect();
        list.sort_by(|a, b| {
            b.tournament
                .start_time
                .cmp(&a.tournament.start_time)
                .then(a.tournament.id.cmp(&b.tournament.id))
        });
        Ok(list)
    }

    async fn tournament(&self, id: Uuid) -> AppResult<Option<Tournament>> {
        let tournaments = self.tournaments.read().await;
        Ok(tournaments.get(&id).map(|s| s.tournament.clone()))
    }

    async fn room_credentials(&self, id: Uuid) -> AppResult<RoomCredentials> {
        let tournaments = self.tournaments.read().await;
        Ok(tournaments
            .get(&id)
            .map(|s| s.room.clone())
            .unwrap_or_default())
    }

    async fn registered_tournaments(&self, user: Uuid) -> AppResult<Vec<Tournament>> {
        let tournaments = self.tournaments.read().await;
        let mut list: Vec<Tournament> = tournaments
            .values()
            .filter(|s| s.tournament.is_participant(user))
            .map(|s| s.tournament.clone())
            .collect();
        soonest_first(&mut list);
        Ok(list)
    }

    async fn create_tournament(
        &self,
        new: NewTournament,
        now: DateTime<Utc>,
    ) -> AppResult<Tournament> {
        let tournament = Tournament {
            id: Uuid::new_v4(),
            title: new.title,
            game: new.game,
            match_category: new.match_category,
            match_type: new.match_type,
            map: new.map,
            description: new.description,
            rules: new.rules,
            banner: new.banner,
            start_time: new.start_time,
            end_time: new.end_time,
            entry_fee: new.entry_fee,
            prize_pool: new.prize_pool,
            max_players: new.max_players,
            status: MatchStatus::Upcoming,
            participants: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.tournaments.write().await.insert(
            tournament.id,
            StoredTournament {
                tournament: tournament.clone(),
                room: RoomCredentials::default(),
            },
        );
        Ok(tournament)
    }

    async fn join_tournament(
        &self,
        id: Uuid,
        request: &JoinRequest,
        now: DateTime<Utc>,
    ) -> AppResult<Tournament> {
        let mut tournaments = self.tournaments.write().await;
        let stored = tournaments.get_mut(&id);
        let participant =
            registration::admit(stored.as_ref().map(|s| &s.tournament), request, now)?;
        let stored = stored.ok_or(JoinRejection::NotFound)?;

        stored.tournament.participants.push(participant);
        stored.tournament.updated_at = now;
        Ok(stored.tournament.clone())
    }

    async fn update_room(
        &self,
        id: Uuid,
        request: RoomUpdateRequest,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        // lock order: users, then tournaments
        let users = self.users.read().await;
        let mut tournaments = self.tournaments.write().await;
        let stored = tournaments
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Match not found".into()))?;

        let update = results::prepare(&stored.tournament, request, now)?;
        if let Some(participants) = &update.participants {
            if let Some(p) = participants.iter().find(|p| !users.contains_key(&p.user)) {
                return Err(AppError::BadRequest(format!(
                    "Unknown participant user {}",
                    p.user
                )));
            }
        }

        if let Some(room_id) = update.room_id {
            stored.room.room_id = Some(room_id);
        }
        if let Some(room_password) = update.room_password {
            stored.room.room_password = Some(room_password);
        }
        if let Some(status) = update.status {
            stored.tournament.status = status;
        }
        if let Some(participants) = update.participants {
            stored.tournament.participants = participants;
        }
        stored.tournament.updated_at = now;
        Ok(())
    }

    async fn completed_results(&self) -> AppResult<Vec<MatchResult>> {
        let tournaments = self.tournaments.read().await;
        Ok(scoring::completed_results(
            tournaments.values().map(|s| &s.tournament),
        ))
    }

    async fn ping(&self) -> bool {
        true
    }
}
