use async_trait::async_trait;
use chambers_core::{Error, UserId, error::StorageError, repositories::PasswordRepository};
use sqlx::SqlitePool;

use crate::database_error;

/// Password hashes live in the `users.password_hash` column.
pub struct SqlitePasswordRepository {
    pool: SqlitePool,
}

impl SqlitePasswordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PasswordRepository for SqlitePasswordRepository {
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
        let result =
            sqlx::query("UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
                .bind(hash)
                .bind(chrono::Utc::now().timestamp())
                .bind(user_id.as_str())
                .execute(&self.pool)
                .await
                .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound.into());
        }

        Ok(())
    }

    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
        let hash: Option<Option<String>> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?1")
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(database_error)?;

        Ok(hash.flatten())
    }
}
