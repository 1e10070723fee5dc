//! # Chambers
//!
//! Backend for a law firm's website: public publications (articles), a contact form,
//! and an invite-only admin area whose password login is protected by a
//! [`LoginGuard`] that locks a username out after repeated failures.
//!
//! [`Chambers`] wires the services from `chambers-core` to a storage backend and is the
//! single entry point the HTTP layer talks to.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chambers::{Chambers, RegistrationPolicy, SqliteRepositoryProvider};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chambers::Error> {
//!     let repositories = SqliteRepositoryProvider::connect("sqlite::memory:").await?;
//!     let chambers = Chambers::new(Arc::new(repositories))
//!         .with_registration_policy(RegistrationPolicy::new(["FIRM-INVITE"]));
//!     chambers.migrate().await?;
//!
//!     chambers
//!         .register_user_with_invite("admin", "a-long-password", "FIRM-INVITE")
//!         .await?;
//!     let (user, session) = chambers
//!         .login_user_with_password("admin", "a-long-password", None, None)
//!         .await?;
//!     println!("{} signed in, session expires {}", user.username, session.expires_at);
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

use chambers_core::{
    RepositoryProvider,
    repositories::{
        PasswordRepositoryAdapter, PublicationRepositoryAdapter, SessionRepositoryAdapter,
        UserRepositoryAdapter,
    },
    services::{ContactService, PasswordService, PublicationService, SessionService, UserService},
};
use chrono::Duration;
use tokio::{sync::watch, task::JoinHandle};

pub use chambers_core::{
    Clock, ContactMessage, ContactNotifier, Error, ImageSource, ImageStore, ImageUpload,
    LocalImageStore, LockoutStatus, LoginGuard, LoginGuardConfig, ManualClock, NewPublication,
    Publication, PublicationId, PublicationUpdate, RegistrationPolicy, Session, SessionToken,
    SystemClock, TracingContactNotifier, User, UserId,
};

/// Re-export storage backends
#[cfg(feature = "sqlite")]
pub use chambers_storage_sqlite::SqliteRepositoryProvider;

/// Where uploaded images go when no store is configured.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
/// URL prefix under which [`DEFAULT_UPLOAD_DIR`] is served.
pub const DEFAULT_PUBLIC_UPLOAD_PATH: &str = "/uploads";

/// Session settings.
///
/// ```rust
/// use chambers::SessionConfig;
/// use chrono::Duration;
///
/// let config = SessionConfig::default().expires_in(Duration::hours(8));
/// assert_eq!(config.expires_in, Duration::hours(8));
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Lifetime of a newly issued session
    pub expires_in: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expires_in: Duration::hours(24),
        }
    }
}

impl SessionConfig {
    pub fn expires_in(mut self, duration: Duration) -> Self {
        self.expires_in = duration;
        self
    }
}

type PasswordServiceFor<R> = PasswordService<UserRepositoryAdapter<R>, PasswordRepositoryAdapter<R>>;

/// Coordinates the services over one repository provider.
pub struct Chambers<R: RepositoryProvider> {
    repositories: Arc<R>,
    user_service: Arc<UserService<UserRepositoryAdapter<R>>>,
    password_service: Arc<PasswordServiceFor<R>>,
    session_service: Arc<SessionService<SessionRepositoryAdapter<R>>>,
    publication_service: Arc<PublicationService<PublicationRepositoryAdapter<R>>>,
    contact_service: Arc<ContactService>,
    login_guard: Arc<LoginGuard>,
    registration_policy: RegistrationPolicy,
    session_config: SessionConfig,
}

impl<R: RepositoryProvider> Chambers<R> {
    /// Create a new instance with default settings.
    ///
    /// Defaults: a fresh [`LoginGuard`] (5 failures, 15 minutes), 24 hour sessions,
    /// sign-up closed, images written to `./uploads`, contact messages logged.
    pub fn new(repositories: Arc<R>) -> Self {
        let user_repo = Arc::new(UserRepositoryAdapter::new(repositories.clone()));
        let login_guard = Arc::new(LoginGuard::new());
        let registration_policy = RegistrationPolicy::closed();

        Self {
            user_service: Arc::new(UserService::new(user_repo)),
            password_service: Arc::new(Self::build_password_service(
                &repositories,
                login_guard.clone(),
                registration_policy.clone(),
            )),
            session_service: Arc::new(SessionService::new(Arc::new(
                SessionRepositoryAdapter::new(repositories.clone()),
            ))),
            publication_service: Arc::new(Self::build_publication_service(
                &repositories,
                Arc::new(LocalImageStore::new(
                    DEFAULT_UPLOAD_DIR,
                    DEFAULT_PUBLIC_UPLOAD_PATH,
                )),
            )),
            contact_service: Arc::new(ContactService::default()),
            login_guard,
            registration_policy,
            session_config: SessionConfig::default(),
            repositories,
        }
    }

    fn build_password_service(
        repositories: &Arc<R>,
        login_guard: Arc<LoginGuard>,
        policy: RegistrationPolicy,
    ) -> PasswordServiceFor<R> {
        PasswordService::new(
            Arc::new(UserRepositoryAdapter::new(repositories.clone())),
            Arc::new(PasswordRepositoryAdapter::new(repositories.clone())),
            login_guard,
        )
        .with_registration_policy(policy)
    }

    fn build_publication_service(
        repositories: &Arc<R>,
        image_store: Arc<dyn ImageStore>,
    ) -> PublicationService<PublicationRepositoryAdapter<R>> {
        PublicationService::new(
            Arc::new(PublicationRepositoryAdapter::new(repositories.clone())),
            image_store,
        )
    }

    /// Use a specific login guard, e.g. one with a custom config or clock.
    pub fn with_login_guard(mut self, login_guard: Arc<LoginGuard>) -> Self {
        self.password_service = Arc::new(Self::build_password_service(
            &self.repositories,
            login_guard.clone(),
            self.registration_policy.clone(),
        ));
        self.login_guard = login_guard;
        self
    }

    pub fn with_registration_policy(mut self, policy: RegistrationPolicy) -> Self {
        self.password_service = Arc::new(Self::build_password_service(
            &self.repositories,
            self.login_guard.clone(),
            policy.clone(),
        ));
        self.registration_policy = policy;
        self
    }

    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn with_image_store(mut self, image_store: Arc<dyn ImageStore>) -> Self {
        self.publication_service =
            Arc::new(Self::build_publication_service(&self.repositories, image_store));
        self
    }

    pub fn with_contact_notifier(mut self, notifier: Arc<dyn ContactNotifier>) -> Self {
        self.contact_service = Arc::new(ContactService::new(notifier));
        self
    }

    /// The guard shared by every login through this instance
    pub fn login_guard(&self) -> &Arc<LoginGuard> {
        &self.login_guard
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.session_config
    }

    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    /// Spawn the periodic sweeps (expired lockout records and expired sessions).
    ///
    /// Both tasks stop when `shutdown` changes.
    pub fn start_background_tasks(&self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        tracing::debug!("Starting lockout and session cleanup tasks");
        vec![
            self.login_guard.start_cleanup_task(shutdown.clone()),
            self.session_service.start_cleanup_task(shutdown),
        ]
    }

    // Users and sessions

    pub async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, Error> {
        self.user_service.get_user(user_id).await
    }

    /// Check credentials through the login guard and issue a session.
    ///
    /// # Errors
    ///
    /// `AuthError::LockedOut` while the username is locked out, otherwise
    /// `AuthError::InvalidCredentials` for any credential mismatch.
    pub async fn login_user_with_password(
        &self,
        username: &str,
        password: &str,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<(User, Session), Error> {
        let user = self.password_service.authenticate(username, password).await?;
        let session = self.create_session(&user.id, user_agent, ip_address).await?;
        Ok((user, session))
    }

    pub async fn register_user_with_invite(
        &self,
        username: &str,
        password: &str,
        invite_code: &str,
    ) -> Result<User, Error> {
        self.password_service
            .register_user(username, password, invite_code)
            .await
    }

    /// Change a user's password and revoke their other sessions.
    ///
    /// `current_session` stays valid so the caller is not signed out.
    pub async fn change_password(
        &self,
        user_id: &UserId,
        current_session: &SessionToken,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), Error> {
        self.password_service
            .change_password(user_id, old_password, new_password)
            .await?;

        self.session_service
            .delete_other_sessions(user_id, current_session)
            .await?;

        tracing::info!(user_id = %user_id, "Password changed; other sessions revoked");
        Ok(())
    }

    pub async fn create_session(
        &self,
        user_id: &UserId,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<Session, Error> {
        self.session_service
            .create_session(
                user_id,
                user_agent,
                ip_address,
                self.session_config.expires_in,
            )
            .await
    }

    /// Returns the session if it exists and has not expired
    pub async fn get_session(&self, token: &SessionToken) -> Result<Session, Error> {
        self.session_service.get_session(token).await
    }

    pub async fn delete_session(&self, token: &SessionToken) -> Result<(), Error> {
        self.session_service.delete_session(token).await
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64, Error> {
        self.session_service.cleanup_expired_sessions().await
    }

    // Publications

    pub async fn list_publications(&self) -> Result<Vec<Publication>, Error> {
        self.publication_service.list().await
    }

    pub async fn get_publication(&self, id: PublicationId) -> Result<Publication, Error> {
        self.publication_service.get(id).await
    }

    pub async fn get_publication_by_slug(&self, slug: &str) -> Result<Publication, Error> {
        self.publication_service.get_by_slug(slug).await
    }

    pub async fn create_publication(
        &self,
        publication: NewPublication,
    ) -> Result<Publication, Error> {
        self.publication_service.create(publication).await
    }

    pub async fn update_publication(
        &self,
        id: PublicationId,
        update: PublicationUpdate,
    ) -> Result<Publication, Error> {
        self.publication_service.update(id, update).await
    }

    pub async fn delete_publication(&self, id: PublicationId) -> Result<(), Error> {
        self.publication_service.delete(id).await
    }

    /// Backfill slugs for publications that have none; returns how many were set.
    pub async fn populate_missing_slugs(&self) -> Result<usize, Error> {
        self.publication_service.populate_missing_slugs().await
    }

    // Contact form

    pub async fn submit_contact_message(&self, message: ContactMessage) -> Result<(), Error> {
        self.contact_service.submit(message).await
    }
}
