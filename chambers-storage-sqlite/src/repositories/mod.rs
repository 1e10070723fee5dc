//! Repository implementations for SQLite storage

pub mod password;
pub mod publication;
pub mod session;
pub mod user;

pub use password::SqlitePasswordRepository;
pub use publication::SqlitePublicationRepository;
pub use session::SqliteSessionRepository;
pub use user::SqliteUserRepository;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chambers_core::{
    Error,
    error::StorageError,
    repositories::{
        PasswordRepositoryProvider, PublicationRepositoryProvider, RepositoryProvider,
        SessionRepositoryProvider, UserRepositoryProvider,
    },
};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::{database_error, migrations};

/// Repository provider implementation for SQLite
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    user: Arc<SqliteUserRepository>,
    session: Arc<SqliteSessionRepository>,
    password: Arc<SqlitePasswordRepository>,
    publication: Arc<SqlitePublicationRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let user = Arc::new(SqliteUserRepository::new(pool.clone()));
        let session = Arc::new(SqliteSessionRepository::new(pool.clone()));
        let password = Arc::new(SqlitePasswordRepository::new(pool.clone()));
        let publication = Arc::new(SqlitePublicationRepository::new(pool.clone()));

        Self {
            pool,
            user,
            session,
            password,
            publication,
        }
    }

    /// Open (creating if needed) the database at `database_url`.
    ///
    /// In-memory databases get a single connection, since every SQLite connection to
    /// `:memory:` sees its own empty database.
    pub async fn connect(database_url: &str) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(database_error)?
            .create_if_missing(true)
            .foreign_keys(true);

        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            5
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(database_error)?;

        tracing::debug!(max_connections, "Connected to SQLite");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl UserRepositoryProvider for SqliteRepositoryProvider {
    type UserRepo = SqliteUserRepository;

    fn user(&self) -> &Self::UserRepo {
        &self.user
    }
}

impl SessionRepositoryProvider for SqliteRepositoryProvider {
    type SessionRepo = SqliteSessionRepository;

    fn session(&self) -> &Self::SessionRepo {
        &self.session
    }
}

impl PasswordRepositoryProvider for SqliteRepositoryProvider {
    type PasswordRepo = SqlitePasswordRepository;

    fn password(&self) -> &Self::PasswordRepo {
        &self.password
    }
}

impl PublicationRepositoryProvider for SqliteRepositoryProvider {
    type PublicationRepo = SqlitePublicationRepository;

    fn publication(&self) -> &Self::PublicationRepo {
        &self.publication
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        let manager = migrations::SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        let applied = manager.up(&migrations::all()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(e.to_string()))
        })?;

        if applied > 0 {
            tracing::info!(applied, "Database migrations complete");
        }

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(database_error)?;
        Ok(())
    }
}
