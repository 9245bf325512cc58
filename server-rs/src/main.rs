use std::net::SocketAddr;
use std::sync::Arc;

use arena_api::cache::Cache;
use arena_api::config::{Config, StoreBackend};
use arena_api::store::{MemoryStore, PgStore, SharedStore};
use arena_api::{build_router, db, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .json()
        .init();

    let store: SharedStore = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&config).await?;
            db::migrate(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let cache = match &config.redis_url {
        Some(url) => match Cache::connect(url).await {
            Ok(cache) => Some(cache),
            Err(e) => {
                tracing::warn!("redis unavailable, leaderboard caching disabled: {e}");
                None
            }
        },
        None => None,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(store, cache, config);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Free Fire arena API listening on {addr}");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
