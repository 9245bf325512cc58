use axum::{
    extract::{Path, State},
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::tournament::*;
use crate::routes::parse_match_id;
use crate::services::leaderboard;
use crate::AppState;

const DEFAULT_BANNER: &str = "https://wallpaperaccess.com/full/2155823.jpg";

fn default_rules() -> Vec<String> {
    ["No Hacks", "No Grenades", "Join 15 mins before"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Every match, newest first, with real room credentials.
pub async fn list_tournaments(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let tournaments = state.store.list_tournaments_with_room().await?;
    Ok(Json(json!({ "tournaments": tournaments })))
}

fn validate_new(body: CreateTournamentRequest) -> AppResult<NewTournament> {
    let title = body.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }
    if body.max_players <= 0 {
        return Err(AppError::BadRequest("maxPlayers must be positive".into()));
    }
    if body.end_time < body.start_time {
        return Err(AppError::BadRequest("endTime must not precede startTime".into()));
    }
    if body.prize_pool < 0 || body.entry_fee.unwrap_or(0) < 0 {
        return Err(AppError::BadRequest("Fees and prizes cannot be negative".into()));
    }

    Ok(NewTournament {
        title,
        game: body.game.unwrap_or_else(|| "Free Fire".into()),
        match_category: body.match_category.unwrap_or_default(),
        match_type: body.match_type.unwrap_or_default(),
        map: body.map.unwrap_or_else(|| "Bermuda".into()),
        description: body
            .description
            .unwrap_or_else(|| "Standard Clash Squad Tournament".into()),
        rules: body.rules.unwrap_or_else(default_rules),
        banner: body.banner.unwrap_or_else(|| DEFAULT_BANNER.into()),
        start_time: body.start_time,
        end_time: body.end_time,
        entry_fee: body.entry_fee.unwrap_or(0),
        prize_pool: body.prize_pool,
        max_players: body.max_players,
    })
}

pub async fn create_tournament(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    WithRejection(Json(body), _): WithRejection<Json<CreateTournamentRequest>, AppError>,
) -> AppResult<Json<Value>> {
    let new = validate_new(body)?;
    let tournament = state.store.create_tournament(new, Utc::now()).await?;
    tracing::info!(
        match_id = %tournament.id,
        admin_id = %admin.id,
        category = tournament.match_category.as_str(),
        "match created"
    );
    Ok(Json(json!({ "tournament": tournament })))
}

/// Sets room credentials, status and results. The response never echoes secrets.
pub async fn update_room(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<RoomUpdateRequest>, AppError>,
) -> AppResult<Json<Value>> {
    let id = parse_match_id(&id)?;
    let status = body.status;
    let results = body.participants.as_ref().map(Vec::len);

    state.store.update_room(id, body, Utc::now()).await?;
    leaderboard::invalidate(&state).await;
    tracing::info!(
        match_id = %id,
        admin_id = %admin.id,
        status = ?status,
        results = ?results,
        "match updated"
    );

    Ok(Json(json!({
        "success": true,
        "message": "Tournament updated successfully",
    })))
}
