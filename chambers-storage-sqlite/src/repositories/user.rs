use async_trait::async_trait;
use chambers_core::{
    Error, User, UserId, error::AuthError, repositories::UserRepository, user::NewUser,
};
use sqlx::SqlitePool;

use crate::{database_error, from_timestamp, is_unique_violation};

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SqliteUser {
    id: String,
    username: String,
    created_at: i64,
    updated_at: i64,
}

impl From<SqliteUser> for User {
    fn from(user: SqliteUser) -> Self {
        User {
            id: UserId::new(&user.id),
            username: user.username,
            created_at: from_timestamp(user.created_at),
            updated_at: from_timestamp(user.updated_at),
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        let now = chrono::Utc::now().timestamp();

        let sqlite_user = sqlx::query_as::<_, SqliteUser>(
            r#"
            INSERT INTO users (id, username, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, username, created_at, updated_at
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.username)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Auth(AuthError::UsernameTaken)
            } else {
                database_error(e)
            }
        })?;

        Ok(sqlite_user.into())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        let sqlite_user = sqlx::query_as::<_, SqliteUser>(
            "SELECT id, username, created_at, updated_at FROM users WHERE id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(sqlite_user.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let sqlite_user = sqlx::query_as::<_, SqliteUser>(
            "SELECT id, username, created_at, updated_at FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(sqlite_user.map(Into::into))
    }

    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(())
    }
}
