pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use std::sync::Arc;

use actix_web::HttpResponse;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use config::Settings;
pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;

pub use auth::{AuthService, TokenIssuer};
pub use db::{DbOperations, User};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db_pool: Arc<PgPool>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(config: Settings) -> Result<Self> {
        // Lazy pool: connections are established on first use, so startup
        // does not block on the database being reachable.
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect_lazy(&config.database.url)
            .map_err(|e| {
                AppError::Database(error::DatabaseError::ConnectionError(e.to_string()))
            })?;
        let pool = Arc::new(pool);

        let tokens = TokenIssuer::new(&config.auth);
        let auth_service = AuthService::new(DbOperations::new(pool.clone()), tokens);

        Ok(Self {
            config: Arc::new(config),
            db_pool: pool,
            auth_service: Arc::new(auth_service),
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.db_pool.close().await;
        Ok(())
    }
}
