//! Schema migrations
//!
//! Each [`Migration`] runs inside its own transaction together with the row that records
//! it in `_chambers_migrations`, so a failed migration leaves no trace.
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

const MIGRATION_TABLE: &str = "_chambers_migrations";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration {name} failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait Migration: Send + Sync {
    /// Unique version number; migrations apply in ascending order
    fn version(&self) -> i64;

    fn name(&self) -> &str;

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error>;
}

pub struct SqliteMigrationManager {
    pool: SqlitePool,
}

impl SqliteMigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn initialize(&self) -> Result<(), MigrationError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {MIGRATION_TABLE} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Apply every migration that has not been recorded yet.
    ///
    /// Returns how many were applied.
    pub async fn up(&self, migrations: &[Box<dyn Migration>]) -> Result<usize, MigrationError> {
        let mut applied = 0;

        for migration in migrations {
            if self.is_applied(migration.version()).await? {
                continue;
            }

            let mut tx = self.pool.begin().await?;

            tracing::info!(
                version = migration.version(),
                name = migration.name(),
                "Applying migration"
            );

            migration
                .up(&mut *tx)
                .await
                .map_err(|source| MigrationError::Failed {
                    name: migration.name().to_string(),
                    source,
                })?;

            sqlx::query(&format!(
                "INSERT INTO {MIGRATION_TABLE} (version, name, applied_at) VALUES (?, ?, ?)"
            ))
            .bind(migration.version())
            .bind(migration.name())
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            applied += 1;
        }

        Ok(applied)
    }

    async fn is_applied(&self, version: i64) -> Result<bool, MigrationError> {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {MIGRATION_TABLE} WHERE version = ?)"
        ))
        .bind(version)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

/// All migrations, in order.
pub fn all() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(CreateUsersTable),
        Box::new(CreateSessionsTable),
        Box::new(CreatePublicationsTable),
    ]
}

pub struct CreateUsersTable;

#[async_trait]
impl Migration for CreateUsersTable {
    fn version(&self) -> i64 {
        1
    }

    fn name(&self) -> &str {
        "CreateUsersTable"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT,
                created_at INTEGER NOT NULL DEFAULT (unixepoch()),
                updated_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }
}

pub struct CreateSessionsTable;

#[async_trait]
impl Migration for CreateSessionsTable {
    fn version(&self) -> i64 {
        2
    }

    fn name(&self) -> &str {
        "CreateSessionsTable"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token_hash TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                user_agent TEXT,
                ip_address TEXT,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            );"#,
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id)")
            .execute(&mut *conn)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at)")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

pub struct CreatePublicationsTable;

#[async_trait]
impl Migration for CreatePublicationsTable {
    fn version(&self) -> i64 {
        3
    }

    fn name(&self) -> &str {
        "CreatePublicationsTable"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        // Empty slugs are allowed (rows imported before slugs existed) and backfilled
        // later, so uniqueness only applies to non-empty ones.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS publications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                slug TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL,
                image TEXT NOT NULL,
                date_published INTEGER NOT NULL,
                created_at INTEGER NOT NULL DEFAULT (unixepoch()),
                updated_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_publications_slug ON publications(slug) WHERE slug <> ''",
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_publications_date_published ON publications(date_published)",
        )
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
