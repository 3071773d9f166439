//! Application state for bookstore-server

use sqlx::PgPool;

use crate::config::Config;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// JWT secret for user authentication
    pub jwt_secret: String,
    /// Directory served at /images
    pub image_dir: String,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            image_dir: config.image_dir.clone(),
        })
    }
}
