#![allow(dead_code)]

use std::sync::Arc;

use arena_api::config::Config;
use arena_api::store::MemoryStore;
use arena_api::{build_router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@arena.gg";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub struct Account {
    pub id: Uuid,
    pub token: String,
}

pub fn app() -> TestApp {
    let mut config = Config::from_env();
    config.auth.bcrypt_cost = 4;
    config.auth.jwt_secret = "integration-secret".into();
    config.auth.admin_emails = vec![ADMIN_EMAIL.to_string()];
    config.rate_limit.max_requests = 10_000;
    config.rate_limit.join_max = 10_000;

    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), None, config);
    TestApp {
        router: build_router(state),
        store,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// Sends `body` verbatim, with an explicit content type or none at all.
    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        content_type: Option<&str>,
        body: &str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn account(&self, username: &str, email: &str) -> Account {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "username": username, "email": email, "password": "hunter22" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");

        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": "hunter22" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");

        Account {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn admin(&self) -> Account {
        self.account("commander", ADMIN_EMAIL).await
    }

    pub async fn create_match(
        &self,
        admin: &Account,
        category: &str,
        start: DateTime<Utc>,
        max_players: i32,
    ) -> Uuid {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/admin/tournaments",
                Some(&admin.token),
                Some(json!({
                    "title": format!("{category} cup"),
                    "matchCategory": category,
                    "startTime": start,
                    "endTime": start + chrono::Duration::hours(1),
                    "prizePool": 1000,
                    "maxPlayers": max_players,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create failed: {body}");
        body["tournament"]["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn join(&self, match_id: Uuid, player: &Account, ign: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            &format!("/api/tournaments/{match_id}/join"),
            Some(&player.token),
            Some(json!({ "ign": ign, "uid": "2093847561" })),
        )
        .await
    }

    pub async fn update_room(&self, admin: &Account, match_id: Uuid, body: Value) -> (StatusCode, Value) {
        self.send(
            Method::PATCH,
            &format!("/api/admin/tournaments/{match_id}/room"),
            Some(&admin.token),
            Some(body),
        )
        .await
    }
}
