use axum::{
    http::HeaderValue,
    middleware as axum_mw,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use cache::Cache;
use config::Config;
use middleware::rate_limit::RateLimiter;
use store::SharedStore;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub cache: Option<Cache>,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimiter,
    pub join_rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(store: SharedStore, cache: Option<Cache>, config: Config) -> Self {
        let rate_limiter =
            RateLimiter::new(config.rate_limit.max_requests, config.rate_limit.window_secs);
        let join_rate_limiter =
            RateLimiter::new(config.rate_limit.join_max, config.rate_limit.window_secs);
        Self {
            store,
            cache,
            config: Arc::new(config),
            rate_limiter,
            join_rate_limiter,
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let allow_origin = if origins.is_empty() || config.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn build_router(state: AppState) -> Router {
    // --- Auth routes ---
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route(
            "/me",
            get(routes::auth::me).layer(axum_mw::from_fn_with_state(
                state.clone(),
                middleware::auth::authenticate,
            )),
        );

    // --- Public lobby + registration ---
    let tournament_routes = Router::new()
        .route("/", get(routes::tournaments::list_tournaments))
        .route(
            "/registered",
            get(routes::tournaments::registered).layer(axum_mw::from_fn_with_state(
                state.clone(),
                middleware::auth::authenticate,
            )),
        )
        .route(
            "/:id",
            get(routes::tournaments::get_tournament).layer(axum_mw::from_fn_with_state(
                state.clone(),
                middleware::auth::optional_auth,
            )),
        )
        .route(
            "/:id/join",
            post(routes::tournaments::join_tournament)
                .layer(axum_mw::from_fn_with_state(
                    state.clone(),
                    middleware::rate_limit::join_rate_limit,
                ))
                .layer(axum_mw::from_fn_with_state(
                    state.clone(),
                    middleware::auth::authenticate,
                )),
        );

    // --- Admin console ---
    let admin_routes = Router::new()
        .route(
            "/tournaments",
            get(routes::admin::list_tournaments).post(routes::admin::create_tournament),
        )
        .route("/tournaments/:id/room", patch(routes::admin::update_room))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::admin::require_admin,
        ))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/tournaments", tournament_routes)
        .nest("/admin", admin_routes)
        .route("/leaderboard", get(routes::leaderboard::get_leaderboard));

    Router::new()
        .nest("/api", api)
        .route("/health", get(routes::health::health))
        // Global middleware
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::rate_limit,
        ))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
