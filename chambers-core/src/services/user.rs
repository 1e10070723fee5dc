use crate::{
    Error, User, UserId, repositories::UserRepository, user::NewUser,
    validation::validate_username,
};
use std::sync::Arc;

/// Service for admin user management
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create a new user after validating the username
    pub async fn create_user(&self, username: &str) -> Result<User, Error> {
        validate_username(username)?;

        self.repository.create(NewUser::new(username)).await
    }

    pub async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, Error> {
        self.repository.find_by_id(user_id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        self.repository.find_by_username(username).await
    }

    pub async fn delete_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.repository.delete(user_id).await
    }
}
