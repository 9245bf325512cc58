//! Persistence behind the HTTP handlers.
//!
//! Handlers talk to a [`TournamentStore`]; production wires in [`PgStore`],
//! local runs and the test suite use [`MemoryStore`]. Both implementations
//! run the join and result-update rules while holding the lock that makes
//! check-then-write atomic.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::leaderboard::MatchResult;
use crate::models::tournament::{
    NewTournament, RoomCredentials, RoomUpdateRequest, Tournament, TournamentWithRoom,
};
use crate::models::user::{NewUser, User};
use crate::services::registration::JoinRequest;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type SharedStore = Arc<dyn TournamentStore>;

#[async_trait]
pub trait TournamentStore: Send + Sync {
    /// Fails with a conflict when the username or email is taken.
    async fn insert_user(&self, user: NewUser) -> AppResult<User>;

    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn usernames(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, String>>;

    /// All matches, soonest start first. No room credentials.
    async fn list_tournaments(&self) -> AppResult<Vec<Tournament>>;

    /// All matches with their stored room credentials, latest start first.
    async fn list_tournaments_with_room(&self) -> AppResult<Vec<TournamentWithRoom>>;

    async fn tournament(&self, id: Uuid) -> AppResult<Option<Tournament>>;

    /// Explicit fetch of the secret projection. Unknown ids yield empty credentials.
    async fn room_credentials(&self, id: Uuid) -> AppResult<RoomCredentials>;

    /// Matches the user is registered in, soonest start first.
    async fn registered_tournaments(&self, user: Uuid) -> AppResult<Vec<Tournament>>;

    async fn create_tournament(
        &self,
        new: NewTournament,
        now: DateTime<Utc>,
    ) -> AppResult<Tournament>;

    /// Runs the join rule and appends the participant atomically.
    async fn join_tournament(
        &self,
        id: Uuid,
        request: &JoinRequest,
        now: DateTime<Utc>,
    ) -> AppResult<Tournament>;

    /// Applies an admin update atomically. Unknown ids are not-found.
    async fn update_room(
        &self,
        id: Uuid,
        request: RoomUpdateRequest,
        now: DateTime<Utc>,
    ) -> AppResult<()>;

    /// One record per participant of every completed match, in encounter order.
    async fn completed_results(&self) -> AppResult<Vec<MatchResult>>;

    async fn ping(&self) -> bool;
}
