use super::{ApiError, ApiJson};
use crate::auth::password::verify_password;
use crate::auth::AuthUser;
use crate::db::user::UserRepository;
use crate::models::user::normalize_email;
use crate::models::User;
use crate::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Checks credentials. Unknown email and wrong password look the same to the caller.
async fn authenticate(state: &AppState, request: LoginRequest) -> Result<User, ApiError> {
    let (Some(email), Some(password)) = (
        request.email.map(|e| normalize_email(&e)).filter(|e| !e.is_empty()),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest("Email and password are required".to_string()));
    };

    let user_repo = UserRepository::new(state.db_pool.clone());
    let Some(user) = user_repo.get_by_email(&email).await? else {
        tracing::info!("Login failed for unknown user {}", email);
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    };

    if !verify_password(&password, &user.password_hash)? {
        tracing::info!("Login failed for {}: wrong password", email);
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    Ok(user)
}

/// Admins signing in here still get an admin-lifetime token, since it carries their role.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, request).await?;
    let ttl = if user.is_admin() {
        state.config.admin_token_ttl.min(state.config.user_token_ttl)
    } else {
        state.config.user_token_ttl
    };
    let token = state.jwt.issue_token(&user.email, &user.role, ttl)?;

    tracing::info!("{} logged in", user.email);
    Ok(Json(json!({ "message": "Login successful", "token": token })))
}

/// Same credentials check as `login`, but only admins get a (shorter-lived) token.
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, request).await?;
    if !user.is_admin() {
        tracing::warn!("{} attempted admin login without the admin role", user.email);
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = state
        .jwt
        .issue_token(&user.email, &user.role, state.config.admin_token_ttl)?;

    tracing::info!("Admin {} logged in", user.email);
    Ok(Json(json!({ "message": "Login successful", "token": token })))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let user_repo = UserRepository::new(state.db_pool.clone());
    let current = user_repo
        .get_by_email(&user.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(json!({ "user": current })))
}
