use anyhow::{Context, Result};
use std::{env, fmt::Display, str::FromStr};

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub user_token_ttl: chrono::Duration,
    pub admin_token_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Reads the process environment. Call after `dotenv` so `.env` values are visible.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", 3000)?,
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://roombook.db".to_string()),
            jwt_secret,
            user_token_ttl: parse_ttl_hours("USER_TOKEN_TTL_HOURS", 24 * 7)?,
            admin_token_ttl: parse_ttl_hours("ADMIN_TOKEN_TTL_HOURS", 1)?,
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            admin_email: non_empty_var("ADMIN_EMAIL"),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {key} value '{raw}': {e}")),
        Err(_) => {
            tracing::debug!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

/// Token lifetime in whole hours. Must be positive and small enough to add to the current time.
fn parse_ttl_hours(key: &str, default: i64) -> Result<chrono::Duration> {
    let hours: i64 = parse_var(key, default)?;
    if hours <= 0 {
        anyhow::bail!("{key} must be a positive number of hours, got {hours}");
    }
    chrono::Duration::try_hours(hours)
        .filter(|ttl| chrono::Utc::now().checked_add_signed(*ttl).is_some())
        .ok_or_else(|| anyhow::anyhow!("{key} value {hours} is out of range"))
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            user_token_ttl: chrono::Duration::hours(24 * 7),
            admin_token_ttl: chrono::Duration::hours(1),
            bcrypt_cost: 4,
            admin_email: None,
            admin_password: None,
        }
    }
}
