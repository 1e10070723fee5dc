use crate::{Error, User, UserId, user::NewUser};
use async_trait::async_trait;

/// Repository for admin user data access
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Create a new user
    ///
    /// Fails with `AuthError::UsernameTaken` if the username already exists.
    async fn create(&self, user: NewUser) -> Result<User, Error>;

    /// Find a user by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error>;

    /// Find a user by exact (case-sensitive) username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error>;

    /// Delete a user by ID
    async fn delete(&self, id: &UserId) -> Result<(), Error>;
}
