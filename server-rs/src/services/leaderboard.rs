use std::collections::HashSet;

use uuid::Uuid;

use crate::cache::Cache;
use crate::error::AppResult;
use crate::models::leaderboard::LeaderboardEntry;
use crate::services::scoring::{self, LEADERBOARD_LIMIT};
use crate::AppState;

const GENERATION_KEY: &str = "leaderboard:gen";

/// Boards are cached per generation. Invalidation bumps the generation, so a
/// board computed from pre-update data can only land under a retired key.
fn board_key(generation: Option<&str>) -> String {
    format!("leaderboard:top:{}", generation.unwrap_or("0"))
}

async fn current_key(cache: &Cache) -> String {
    board_key(cache.get(GENERATION_KEY).await.as_deref())
}

pub async fn top_players(state: &AppState) -> AppResult<Vec<LeaderboardEntry>> {
    // Pin the key before reading the store.
    let key = match &state.cache {
        Some(cache) => {
            let key = current_key(cache).await;
            if let Some(hit) = cache.get_json::<Vec<LeaderboardEntry>>(&key).await {
                return Ok(hit);
            }
            Some(key)
        }
        None => None,
    };

    let results = state.store.completed_results().await?;
    let ids: Vec<Uuid> = results
        .iter()
        .map(|r| r.user)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let usernames = state.store.usernames(&ids).await?;
    let entries = scoring::rank_players(results, &usernames, LEADERBOARD_LIMIT);

    if let (Some(cache), Some(key)) = (&state.cache, key) {
        cache
            .set_json(&key, &entries, state.config.leaderboard.cache_seconds)
            .await;
    }
    Ok(entries)
}

/// Retires the cached board. Call after the store write has committed.
pub async fn invalidate(state: &AppState) {
    if let Some(cache) = &state.cache {
        if cache.incr(GENERATION_KEY).await.is_none() {
            // Fall back to dropping the current board outright.
            cache.del(&current_key(cache).await).await;
        }
    }
}
