mod auth;
mod booking;
mod config;
mod db;
mod handlers;
mod models;

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, patch, post},
};
use config::Config;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub struct AppState {
    pub db_pool: SqlitePool,
    pub jwt: auth::JwtKeys,
    pub config: Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables before the filter reads RUST_LOG
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roombook=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Invalid configuration")?;

    // Set up database
    tracing::info!("Connecting to database: {}", config.database_url);
    let db_pool = db::create_pool(&config.database_url).await
        .context("Failed to create database pool")?;

    // Run migrations
    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool).await
        .context("Failed to run migrations")?;

    tracing::info!("Loading admins");
    ensure_admin_account(&db_pool, &config).await?;
    load_admins(&db_pool).await?;

    let state = Arc::new(AppState {
        db_pool,
        jwt: auth::JwtKeys::new(config.jwt_secret.clone()),
        config,
    });

    let addr = state.config.server_address();
    let app = router(state);

    // Start server
    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("roombook stopped");
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    use handlers::{auth, bookings, users};

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/admin/login", post(auth::admin_login))
        .route("/api/bookings", get(bookings::list_bookings).post(bookings::create_booking))
        .route(
            "/api/bookings/:id",
            get(bookings::get_booking)
                .patch(bookings::update_booking)
                .delete(bookings::delete_booking),
        )
        .route("/api/admin/users", get(users::list_users).post(users::create_user))
        .route("/api/admin/users/:id", patch(users::update_user).delete(users::delete_user))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Resolves on ctrl-c or SIGTERM so in-flight requests can finish.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to register SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}

/// Create the bootstrap admin from ADMIN_EMAIL / ADMIN_PASSWORD if it does not exist yet
async fn ensure_admin_account(pool: &SqlitePool, config: &Config) -> Result<()> {
    use db::user::UserRepository;
    use models::user::{normalize_email, ROLE_ADMIN};

    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        tracing::debug!("No bootstrap admin configured (ADMIN_EMAIL / ADMIN_PASSWORD)");
        return Ok(());
    };
    let email = normalize_email(email);

    let user_repo = UserRepository::new(pool.clone());
    if user_repo.get_by_email(&email).await?.is_some() {
        tracing::info!("Bootstrap admin {} already exists", email);
        return Ok(());
    }

    let password_hash = auth::password::hash_password(password, config.bcrypt_cost)?;
    let admin = models::User::new("Administrator".to_string(), email.clone(), None, password_hash, ROLE_ADMIN.to_string());
    user_repo.create(&admin).await?;
    tracing::info!("Created bootstrap admin {}", email);
    Ok(())
}

/// Admin emails from a comma- or newline-separated list; `#` starts a comment line
fn parse_admin_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .flat_map(|line| line.split(','))
        .map(models::user::normalize_email)
        .filter(|email| !email.is_empty())
        .collect()
}

/// Promote users named in the ADMINS environment variable or admins.txt file
async fn load_admins(pool: &SqlitePool) -> Result<()> {
    use db::user::UserRepository;
    use models::user::ROLE_ADMIN;

    // Try environment variable first (for production)
    let admin_emails = if let Ok(admins_env) = std::env::var("ADMINS") {
        tracing::info!("Loading admins from ADMINS environment variable");
        parse_admin_list(&admins_env)
    }
    // Fall back to admins.txt file (for local development)
    else if let Ok(contents) = tokio::fs::read_to_string("admins.txt").await {
        tracing::info!("Loading admins from admins.txt file");
        parse_admin_list(&contents)
    } else {
        tracing::debug!("No admin list configured (no ADMINS env var or admins.txt file)");
        return Ok(());
    };

    let user_repo = UserRepository::new(pool.clone());
    for email in &admin_emails {
        match user_repo.update_role(email, ROLE_ADMIN).await {
            Ok(true) => tracing::info!("Promoted {} to admin", email),
            Ok(false) => tracing::warn!("Admin {} has no account yet", email),
            Err(e) => tracing::error!("Failed to promote {} to admin: {}", email, e),
        }
    }

    tracing::info!("Processed {} admin(s)", admin_emails.len());
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_state() -> Arc<AppState> {
    let config = Config::for_tests();
    Arc::new(AppState {
        db_pool: db::test_pool().await,
        jwt: auth::JwtKeys::new(config.jwt_secret.clone()),
        config,
    })
}
