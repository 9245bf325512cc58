use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::user::UserRole;
use crate::AppState;

/// Middleware: requires the ADMIN role. Runs after `authenticate` and
/// re-reads the role from the store so a demoted account loses access
/// before its token expires.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

    let stored = state
        .store
        .user_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?;

    if stored.role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Access Denied: Admin privileges required.".into(),
        ));
    }
    req.extensions_mut().insert(AuthUser {
        id: user.id,
        role: stored.role,
    });

    Ok(next.run(req).await)
}
