use axum::{extract::State, Extension, Json};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{generate_token, AuthUser};
use crate::models::user::*;
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> AppResult<Json<Value>> {
    let username = body.username.trim().to_string();
    let email = body.email.trim().to_lowercase();

    if username.is_empty() || email.is_empty() || body.password.len() < 6 {
        return Err(AppError::BadRequest(
            "Username and email required and password must be at least 6 characters".into(),
        ));
    }

    let password_hash = bcrypt::hash(&body.password, state.config.auth.bcrypt_cost)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let role = if state.config.is_admin_email(&email) {
        UserRole::Admin
    } else {
        UserRole::User
    };

    let user = state
        .store
        .insert_user(NewUser {
            username,
            email,
            password_hash,
            role,
        })
        .await?;
    tracing::info!(user_id = %user.id, role = %user.role, "user registered");

    Ok(Json(json!({
        "message": "User registered successfully",
        "user": UserPublic::from(&user),
    })))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<Json<Value>> {
    let email = body.email.trim().to_lowercase();
    let user = state
        .store
        .user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".into()))?;

    let valid = bcrypt::verify(&body.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let token = generate_token(
        user.id,
        user.role,
        &state.config.auth.jwt_secret,
        state.config.auth.token_expiry_secs,
    )?;

    Ok(Json(json!({
        "token": token,
        "user": UserPublic::from(&user),
    })))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> AppResult<Json<Value>> {
    let user = state
        .store
        .user_by_id(auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(json!({ "user": UserPublic::from(&user) })))
}
