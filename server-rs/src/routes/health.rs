use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let store_ok = state.store.ping().await;
    let cache_ok = match &state.cache {
        Some(cache) => Some(cache.health_check().await),
        None => None,
    };

    let status = if store_ok && cache_ok.unwrap_or(true) {
        "healthy"
    } else {
        "degraded"
    };
    Json(json!({
        "status": status,
        "store": store_ok,
        "redis": cache_ok,
        "timestamp": chrono::Utc::now(),
    }))
}
