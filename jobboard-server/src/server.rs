use anyhow::{Context, Result};
use auth_identity::SecretHasher;
use database_layer::DatabasePool;
use std::sync::Arc;

use crate::auth::{
    cookies::CookiePolicy,
    db::{AuthStore, MemoryAuthStore, PgAuthStore},
    session::SessionManager,
    tokens::TokenCodec,
};
use crate::config::AppConfig;

/// Shared state handed to every handler and auth middleware
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub cookies: Arc<CookiePolicy>,
    pub store: Arc<dyn AuthStore>,
    pub cors_origins: Arc<Vec<String>>,
    /// `None` when running on the in-memory store
    pub database: Option<DatabasePool>,
}

impl AppState {
    /// Connect to PostgreSQL, apply migrations and build the state.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let pool = DatabasePool::new(&config.database.url, config.database.max_connections)
            .await
            .context("Failed to connect to the database")?;
        pool.migrate().await.context("Failed to apply migrations")?;

        let store = PgAuthStore::new(pool.clone()).with_lock_timeout_ms(config.database.lock_timeout_ms);
        Self::build(config, Arc::new(store), Some(pool))
    }

    /// State backed by `MemoryAuthStore`. Nothing is persisted.
    pub fn in_memory(config: &AppConfig) -> Result<Self> {
        Self::build(config, Arc::new(MemoryAuthStore::new()), None)
    }

    pub fn build(
        config: &AppConfig,
        store: Arc<dyn AuthStore>,
        database: Option<DatabasePool>,
    ) -> Result<Self> {
        let hasher = SecretHasher::new(&config.hashing).context("Invalid hashing parameters")?;
        let codec = TokenCodec::new(&config.token, hasher.clone()).context("Invalid token configuration")?;
        let sessions = SessionManager::new(Arc::clone(&store), Arc::new(codec), hasher);

        Ok(Self {
            sessions: Arc::new(sessions),
            cookies: Arc::new(CookiePolicy::from_config(&config.cookie, config.server.environment)),
            store,
            cors_origins: Arc::new(config.server.cors_origins.clone()),
            database,
        })
    }
}
