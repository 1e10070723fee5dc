use crate::{
    Error, Session, UserId, error::SessionError, repositories::SessionRepository,
    session::SessionToken,
};
use chrono::Duration;
use std::sync::Arc;

/// How often expired sessions are swept from storage.
const CLEANUP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60 * 60);

/// Service for session management operations
pub struct SessionService<R: SessionRepository> {
    repository: Arc<R>,
}

impl<R: SessionRepository> SessionService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create a new session for a user
    pub async fn create_session(
        &self,
        user_id: &UserId,
        user_agent: Option<String>,
        ip_address: Option<String>,
        expires_in: Duration,
    ) -> Result<Session, Error> {
        let session = Session::new(user_id, user_agent, ip_address, expires_in);
        self.repository.create(session).await
    }

    /// Look up a live session.
    ///
    /// An expired session is deleted and reported as `SessionError::Expired`.
    pub async fn get_session(&self, token: &SessionToken) -> Result<Session, Error> {
        let session = self
            .repository
            .find_by_token(token)
            .await?
            .ok_or(SessionError::NotFound)?;

        if session.is_expired() {
            self.repository.delete(token).await?;
            return Err(SessionError::Expired.into());
        }

        Ok(session)
    }

    pub async fn delete_session(&self, token: &SessionToken) -> Result<(), Error> {
        self.repository.delete(token).await
    }

    /// Revoke every session of `user_id` except `keep`
    pub async fn delete_other_sessions(
        &self,
        user_id: &UserId,
        keep: &SessionToken,
    ) -> Result<(), Error> {
        self.repository.delete_others(user_id, keep).await
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64, Error> {
        self.repository.cleanup_expired().await
    }

    /// Periodically delete expired sessions until `shutdown` changes.
    pub fn start_cleanup_task(
        self: &Arc<Self>,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(CLEANUP_INTERVAL);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        match service.cleanup_expired_sessions().await {
                            Ok(0) => {}
                            Ok(count) => tracing::info!(count, "Deleted expired sessions"),
                            Err(e) => tracing::error!(error = %e, "Failed to delete expired sessions"),
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down session cleanup task");
                        break;
                    }
                }
            }
        })
    }
}
