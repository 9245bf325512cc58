use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::services::leaderboard;
use crate::AppState;

pub async fn get_leaderboard(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let entries = leaderboard::top_players(&state).await?;
    Ok(Json(json!({ "entries": entries })))
}
