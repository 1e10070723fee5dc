use crate::{Error, Session, UserId, session::SessionToken};
use async_trait::async_trait;

/// Repository for session data access
///
/// Implementations persist `Session::token_hash` and look sessions up by the hash of the
/// presented token; the plaintext token is never stored.
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Create a new session
    async fn create(&self, session: Session) -> Result<Session, Error>;

    /// Find a session by token
    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error>;

    /// Delete a session by token
    async fn delete(&self, token: &SessionToken) -> Result<(), Error>;

    /// Delete all sessions for a user except the one identified by `keep`
    async fn delete_others(&self, user_id: &UserId, keep: &SessionToken) -> Result<(), Error>;

    /// Delete expired sessions, returning how many were removed
    async fn cleanup_expired(&self) -> Result<u64, Error>;
}
