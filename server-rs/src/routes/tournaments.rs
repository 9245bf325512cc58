use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::tournament::JoinTournamentRequest;
use crate::routes::parse_match_id;
use crate::services::registration::JoinRequest;
use crate::services::reveal;
use crate::AppState;

pub async fn list_tournaments(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let tournaments = state.store.list_tournaments().await?;
    Ok(Json(json!({ "tournaments": tournaments })))
}

/// Single match with room fields run through the reveal gate.
pub async fn get_tournament(
    State(state): State<AppState>,
    viewer: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_match_id(&id)?;
    let tournament = state
        .store
        .tournament(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Match not found".into()))?;
    let stored = state.store.room_credentials(id).await?;

    let view = reveal::reveal_view(
        tournament,
        stored,
        viewer.map(|Extension(u)| u.id),
        Utc::now(),
    );
    Ok(Json(json!({ "tournament": view })))
}

pub async fn registered(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Value>> {
    let tournaments = state.store.registered_tournaments(user.id).await?;
    Ok(Json(json!({ "tournaments": tournaments })))
}

pub async fn join_tournament(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> AppResult<Json<Value>> {
    let id = parse_match_id(&id)?;
    let body = JoinTournamentRequest::from_loose(body.as_ref().map(|Json(v)| v));
    let request = JoinRequest::new(user.id, body);

    let tournament = match state.store.join_tournament(id, &request, Utc::now()).await {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!(match_id = %id, user_id = %user.id, "join rejected: {e}");
            return Err(e);
        }
    };
    tracing::info!(
        match_id = %id,
        user_id = %user.id,
        participants = tournament.participants.len(),
        capacity = tournament.max_players,
        "player joined"
    );

    Ok(Json(json!({
        "success": true,
        "message": "Successfully joined the tournament",
        "tournament": tournament,
    })))
}
