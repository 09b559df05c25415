use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Valid values for `User::role`
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_USER];

pub fn is_valid_role(role: &str) -> bool {
    VALID_ROLES.contains(&role)
}

/// Emails are stored and compared lowercased, so `Ada@x.com` and `ada@x.com` are one account.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: i64,
}

impl User {
    pub fn new(name: String, email: String, phone: Option<String>, password_hash: String, role: String) -> Self {
        Self {
            id: 0, // Will be set by database
            name,
            email: normalize_email(&email),
            phone,
            password_hash,
            role,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.password.is_none()
            && self.role.is_none()
    }
}
