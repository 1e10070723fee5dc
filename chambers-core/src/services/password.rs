//! Password authentication, invite-only sign-up and password changes
//!
//! [`PasswordService::authenticate`] is the only place the [`LoginGuard`] is consulted.
//! A locked-out username is rejected before its credentials are looked at, and every
//! failed check (unknown username or wrong password) counts against the username.
use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    Error, LoginGuard, User, UserId,
    crypto::{hash_password, verify_dummy_password, verify_password},
    error::AuthError,
    repositories::{PasswordRepository, UserRepository},
    services::UserService,
    validation::{require, validate_password},
};

/// Which invite codes may create an admin account.
///
/// The default policy has no codes, which closes sign-up entirely.
#[derive(Debug, Clone, Default)]
pub struct RegistrationPolicy {
    invite_codes: HashSet<String>,
}

impl RegistrationPolicy {
    pub fn new<I, S>(invite_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            invite_codes: invite_codes
                .into_iter()
                .map(Into::into)
                .map(|code: String| code.trim().to_string())
                .filter(|code| !code.is_empty())
                .collect(),
        }
    }

    /// A policy that rejects every sign-up.
    pub fn closed() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list such as `"alpha,beta"`.
    pub fn from_comma_separated(codes: &str) -> Self {
        Self::new(codes.split(','))
    }

    pub fn accepts(&self, invite_code: &str) -> bool {
        self.invite_codes.contains(invite_code.trim())
    }

    pub fn is_closed(&self) -> bool {
        self.invite_codes.is_empty()
    }
}

/// Service for password authentication operations
pub struct PasswordService<U: UserRepository, P: PasswordRepository> {
    user_service: Arc<UserService<U>>,
    password_repository: Arc<P>,
    login_guard: Arc<LoginGuard>,
    registration: RegistrationPolicy,
}

impl<U: UserRepository, P: PasswordRepository> PasswordService<U, P> {
    pub fn new(
        user_repository: Arc<U>,
        password_repository: Arc<P>,
        login_guard: Arc<LoginGuard>,
    ) -> Self {
        Self {
            user_service: Arc::new(UserService::new(user_repository)),
            password_repository,
            login_guard,
            registration: RegistrationPolicy::closed(),
        }
    }

    pub fn with_registration_policy(mut self, policy: RegistrationPolicy) -> Self {
        self.registration = policy;
        self
    }

    pub fn login_guard(&self) -> &Arc<LoginGuard> {
        &self.login_guard
    }

    pub fn registration_policy(&self) -> &RegistrationPolicy {
        &self.registration
    }

    /// Check a username and password without touching the login guard.
    ///
    /// Returns `None` when the username is unknown, has no password, or the password
    /// does not match. All three cases run one argon2 verification.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, Error> {
        let Some(user) = self.user_service.get_user_by_username(username).await? else {
            verify_dummy_password(password);
            return Ok(None);
        };

        let Some(hash) = self.password_repository.get_password_hash(&user.id).await? else {
            verify_dummy_password(password);
            return Ok(None);
        };

        if verify_password(password, &hash) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Authenticate a username and password through the login guard.
    ///
    /// # Errors
    ///
    /// - `AuthError::LockedOut` while the username is locked out; the password is not checked
    /// - `AuthError::InvalidCredentials` for an unknown username or a wrong password
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, Error> {
        let username = username.trim();
        require("username", username)?;
        require("password", password)?;

        if !self.login_guard.is_allowed(username) {
            let retry_after_seconds = self.login_guard.remaining_lockout_seconds(username);
            tracing::warn!(
                username = %username,
                retry_after_seconds,
                "Rejected login attempt for locked out username"
            );
            return Err(AuthError::LockedOut {
                retry_after_seconds,
            }
            .into());
        }

        match self.verify_credentials(username, password).await? {
            Some(user) => {
                self.login_guard.record_success(username);
                tracing::info!(user_id = %user.id, "User authenticated");
                Ok(user)
            }
            None => {
                self.login_guard.record_failure(username);
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    /// Create an admin account, gated by an invite code.
    ///
    /// # Errors
    ///
    /// - `ValidationError::MissingField` when any input is blank
    /// - `AuthError::InvalidInviteCode` when the code is not accepted
    /// - `ValidationError` for a malformed username or weak password
    /// - `AuthError::UsernameTaken` when the username is already registered
    pub async fn register_user(
        &self,
        username: &str,
        password: &str,
        invite_code: &str,
    ) -> Result<User, Error> {
        let username = username.trim();
        require("username", username)?;
        require("password", password)?;
        require("inviteCode", invite_code)?;

        if !self.registration.accepts(invite_code) {
            tracing::warn!(username = %username, "Sign-up rejected: invalid invite code");
            return Err(AuthError::InvalidInviteCode.into());
        }

        validate_password(password)?;

        if self
            .user_service
            .get_user_by_username(username)
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken.into());
        }

        let password_hash = hash_password(password);
        let user = self.user_service.create_user(username).await?;
        self.password_repository
            .set_password_hash(&user.id, &password_hash)
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Registered admin user");
        Ok(user)
    }

    /// Change a user's password after checking the current one
    pub async fn change_password(
        &self,
        user_id: &UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), Error> {
        require("oldPassword", old_password)?;
        require("newPassword", new_password)?;

        let current_hash = self
            .password_repository
            .get_password_hash(user_id)
            .await?
            .ok_or(Error::Auth(AuthError::InvalidCredentials))?;

        if !verify_password(old_password, &current_hash) {
            return Err(Error::Auth(AuthError::InvalidCredentials));
        }

        validate_password(new_password)?;

        self.password_repository
            .set_password_hash(user_id, &hash_password(new_password))
            .await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}
