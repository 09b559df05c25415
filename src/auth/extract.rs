use crate::db::user::UserRepository;
use crate::handlers::ApiError;
use crate::models::user::ROLE_ADMIN;
use crate::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

/// Caller identity: the email from a verified bearer token, with the role as currently stored.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
    pub role: String,
}

/// An `AuthUser` whose account currently has the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

/// Token part of an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn from_header(state: &AppState, header: Option<&str>) -> Result<Self, ApiError> {
        let header = header.ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;
        let token = bearer_token(header)
            .ok_or_else(|| ApiError::Unauthorized("Invalid authorization format".to_string()))?;

        let claims = state.jwt.verify_token(token).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            ApiError::Unauthorized("Invalid token".to_string())
        })?;

        Ok(AuthUser {
            email: claims.sub,
            role: claims.role,
        })
    }

    /// Re-reads the account so deleted or demoted users lose access before their token expires.
    pub async fn refresh(self, state: &AppState) -> Result<Self, ApiError> {
        let Some(account) = UserRepository::new(state.db_pool.clone())
            .get_by_email(&self.email)
            .await?
        else {
            tracing::info!("Rejected token for deleted account {}", self.email);
            return Err(ApiError::Unauthorized("Account no longer exists".to_string()));
        };

        if account.role != self.role {
            tracing::debug!("Role of {} changed from {} to {} since login", self.email, self.role, account.role);
        }
        Ok(AuthUser {
            email: account.email,
            role: account.role,
        })
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| ApiError::Unauthorized("Invalid authorization header".to_string()))?,
            ),
            None => None,
        };
        AuthUser::from_header(state, header)?.refresh(state).await
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!("Non-admin {} attempted an admin operation", user.email);
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}
