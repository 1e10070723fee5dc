use async_trait::async_trait;
use chambers_core::{
    Error, Session, UserId, repositories::SessionRepository, session::SessionToken,
};
use sqlx::SqlitePool;

use crate::{database_error, from_timestamp};

pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SqliteSession {
    token_hash: String,
    user_id: String,
    user_agent: Option<String>,
    ip_address: Option<String>,
    created_at: i64,
    expires_at: i64,
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn create(&self, session: Session) -> Result<Session, Error> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, user_id, user_agent, ip_address, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&session.token_hash)
        .bind(session.user_id.as_str())
        .bind(&session.user_agent)
        .bind(&session.ip_address)
        .bind(session.created_at.timestamp())
        .bind(session.expires_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        // The caller keeps the plaintext token; only the hash was stored.
        Ok(session)
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        let sqlite_session = sqlx::query_as::<_, SqliteSession>(
            r#"
            SELECT token_hash, user_id, user_agent, ip_address, created_at, expires_at
            FROM sessions
            WHERE token_hash = ?1
            "#,
        )
        .bind(token.token_hash())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(sqlite_session
            .filter(|s| token.verify_hash(&s.token_hash))
            .map(|s| Session {
                token: token.clone(),
                token_hash: s.token_hash,
                user_id: UserId::new(&s.user_id),
                user_agent: s.user_agent,
                ip_address: s.ip_address,
                created_at: from_timestamp(s.created_at),
                expires_at: from_timestamp(s.expires_at),
            }))
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?1")
            .bind(token.token_hash())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(())
    }

    async fn delete_others(&self, user_id: &UserId, keep: &SessionToken) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?1 AND token_hash <> ?2")
            .bind(user_id.as_str())
            .bind(keep.token_hash())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?1")
            .bind(chrono::Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected())
    }
}
