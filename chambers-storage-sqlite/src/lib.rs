//! SQLite storage backend for chambers
//!
//! [`SqliteRepositoryProvider`] implements every repository trait from
//! `chambers_core::repositories` on top of a single [`sqlx::SqlitePool`]. Timestamps are
//! stored as unix seconds.
//!
//! ```rust,no_run
//! use chambers_core::RepositoryProvider;
//! use chambers_storage_sqlite::SqliteRepositoryProvider;
//!
//! # async fn run() -> Result<(), chambers_core::Error> {
//! let repositories = SqliteRepositoryProvider::connect("sqlite://chambers.db").await?;
//! repositories.migrate().await?;
//! # Ok(())
//! # }
//! ```
mod migrations;
pub mod repositories;

pub use repositories::{
    SqlitePasswordRepository, SqlitePublicationRepository, SqliteRepositoryProvider,
    SqliteSessionRepository, SqliteUserRepository,
};

use chambers_core::{Error, error::StorageError};
use chrono::{DateTime, Utc};

pub(crate) fn database_error(e: sqlx::Error) -> Error {
    Error::Storage(StorageError::Database(e.to_string()))
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub(crate) fn from_timestamp(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_default()
}
