use super::{ApiError, ApiJson};
use crate::auth::password::hash_password;
use crate::auth::AdminUser;
use crate::db::user::UserRepository;
use crate::models::user::{is_valid_role, normalize_email, CreateUserRequest, UpdateUserRequest, ROLE_USER};
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn check_role(role: &str) -> Result<(), ApiError> {
    if is_valid_role(role) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("Unknown role '{role}'")))
    }
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<Value>, ApiError> {
    let users = UserRepository::new(state.db_pool.clone()).get_all().await?;
    Ok(Json(json!({ "users": users })))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (Some(name), Some(email), Some(password)) = (
        trimmed(request.name),
        trimmed(request.email).map(|e| normalize_email(&e)),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest("Name, email and password are required".to_string()));
    };
    let role = trimmed(request.role).unwrap_or_else(|| ROLE_USER.to_string());
    check_role(&role)?;

    let user_repo = UserRepository::new(state.db_pool.clone());
    if user_repo.email_taken(&email, None).await? {
        return Err(ApiError::BadRequest("Email already exists".to_string()));
    }

    let password_hash = hash_password(&password, state.config.bcrypt_cost)?;
    let user = user_repo
        .create(&User::new(name, email, trimmed(request.phone), password_hash, role))
        .await?;

    tracing::info!("Admin {} created user {} ({})", admin.email, user.email, user.role);
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    if request.is_empty() {
        return Err(ApiError::BadRequest("At least one field required for update".to_string()));
    }

    let user_repo = UserRepository::new(state.db_pool.clone());
    let mut user = user_repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if let Some(name) = trimmed(request.name) {
        user.name = name;
    }
    if let Some(email) = trimmed(request.email).map(|e| normalize_email(&e)) {
        if user_repo.email_taken(&email, Some(id)).await? {
            return Err(ApiError::BadRequest("Email already exists".to_string()));
        }
        user.email = email;
    }
    if let Some(phone) = request.phone {
        // An empty phone clears it
        user.phone = trimmed(Some(phone));
    }
    if let Some(role) = trimmed(request.role) {
        check_role(&role)?;
        user.role = role;
    }
    if let Some(password) = request.password.filter(|p| !p.is_empty()) {
        user.password_hash = hash_password(&password, state.config.bcrypt_cost)?;
    }

    if !user_repo.update(&user).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!("Admin {} updated user {}", admin.email, id);
    Ok(Json(json!({ "message": "User updated", "user": user })))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let user_repo = UserRepository::new(state.db_pool.clone());
    let user = user_repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if user.email == admin.email {
        return Err(ApiError::BadRequest("Cannot delete your own account".to_string()));
    }

    if !user_repo.delete(id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!("Admin {} deleted user {}", admin.email, user.email);
    Ok(Json(json!({ "message": "User deleted" })))
}
