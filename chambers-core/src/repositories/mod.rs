//! Repository traits for the data access layer
//!
//! Services talk to storage only through these traits:
//!
//! - Each `*Repository` trait defines the operations for one kind of record
//! - Each `*RepositoryProvider` trait hands out one repository
//! - [`RepositoryProvider`] combines the providers with lifecycle methods
//!
//! Storage backends (such as `chambers-storage-sqlite`) implement all of them.

pub mod adapter;
pub mod password;
pub mod publication;
pub mod session;
pub mod user;

pub use adapter::{
    PasswordRepositoryAdapter, PublicationRepositoryAdapter, SessionRepositoryAdapter,
    UserRepositoryAdapter,
};
pub use password::PasswordRepository;
pub use publication::PublicationRepository;
pub use session::SessionRepository;
pub use user::UserRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for user repository access.
pub trait UserRepositoryProvider: Send + Sync + 'static {
    type UserRepo: UserRepository;

    fn user(&self) -> &Self::UserRepo;
}

/// Provider trait for session repository access.
pub trait SessionRepositoryProvider: Send + Sync + 'static {
    type SessionRepo: SessionRepository;

    fn session(&self) -> &Self::SessionRepo;
}

/// Provider trait for password repository access.
pub trait PasswordRepositoryProvider: Send + Sync + 'static {
    type PasswordRepo: PasswordRepository;

    fn password(&self) -> &Self::PasswordRepo;
}

/// Provider trait for publication repository access.
pub trait PublicationRepositoryProvider: Send + Sync + 'static {
    type PublicationRepo: PublicationRepository;

    fn publication(&self) -> &Self::PublicationRepo;
}

/// Everything a storage backend must provide.
///
/// ```rust,ignore
/// use chambers_core::repositories::*;
///
/// struct MyStorage { /* ... */ }
///
/// impl UserRepositoryProvider for MyStorage {
///     type UserRepo = MyUserRepository;
///     fn user(&self) -> &Self::UserRepo { &self.user_repo }
/// }
///
/// // ... the other provider traits ...
///
/// #[async_trait]
/// impl RepositoryProvider for MyStorage {
///     async fn migrate(&self) -> Result<(), Error> { /* ... */ }
///     async fn health_check(&self) -> Result<(), Error> { /* ... */ }
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider:
    UserRepositoryProvider
    + SessionRepositoryProvider
    + PasswordRepositoryProvider
    + PublicationRepositoryProvider
{
    /// Run all pending schema migrations
    async fn migrate(&self) -> Result<(), Error>;

    /// Check that storage is reachable
    async fn health_check(&self) -> Result<(), Error>;
}
