//! Adapters exposing one repository of a shared [`RepositoryProvider`]
//!
//! Services own their repository by value; these wrappers let several services share
//! one `Arc<R>` provider.
use crate::{
    Error, Session, User, UserId,
    publication::{Publication, PublicationId, PublicationRecord},
    repositories::{
        PasswordRepository, PublicationRepository, RepositoryProvider, SessionRepository,
        UserRepository,
    },
    session::SessionToken,
    user::NewUser,
};
use async_trait::async_trait;
use std::sync::Arc;

pub struct UserRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> UserRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> UserRepository for UserRepositoryAdapter<R> {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        self.provider.user().create(user).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.provider.user().find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        self.provider.user().find_by_username(username).await
    }

    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        self.provider.user().delete(id).await
    }
}

pub struct SessionRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> SessionRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> SessionRepository for SessionRepositoryAdapter<R> {
    async fn create(&self, session: Session) -> Result<Session, Error> {
        self.provider.session().create(session).await
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        self.provider.session().find_by_token(token).await
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        self.provider.session().delete(token).await
    }

    async fn delete_others(&self, user_id: &UserId, keep: &SessionToken) -> Result<(), Error> {
        self.provider.session().delete_others(user_id, keep).await
    }

    async fn cleanup_expired(&self) -> Result<u64, Error> {
        self.provider.session().cleanup_expired().await
    }
}

pub struct PasswordRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> PasswordRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> PasswordRepository for PasswordRepositoryAdapter<R> {
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
        self.provider.password().set_password_hash(user_id, hash).await
    }

    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
        self.provider.password().get_password_hash(user_id).await
    }
}

pub struct PublicationRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> PublicationRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> PublicationRepository for PublicationRepositoryAdapter<R> {
    async fn list(&self) -> Result<Vec<Publication>, Error> {
        self.provider.publication().list().await
    }

    async fn find_by_id(&self, id: PublicationId) -> Result<Option<Publication>, Error> {
        self.provider.publication().find_by_id(id).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Publication>, Error> {
        self.provider.publication().find_by_slug(slug).await
    }

    async fn slug_exists(
        &self,
        slug: &str,
        except: Option<PublicationId>,
    ) -> Result<bool, Error> {
        self.provider.publication().slug_exists(slug, except).await
    }

    async fn create(&self, record: PublicationRecord) -> Result<Publication, Error> {
        self.provider.publication().create(record).await
    }

    async fn update(
        &self,
        id: PublicationId,
        record: PublicationRecord,
    ) -> Result<Publication, Error> {
        self.provider.publication().update(id, record).await
    }

    async fn delete(&self, id: PublicationId) -> Result<bool, Error> {
        self.provider.publication().delete(id).await
    }

    async fn list_missing_slugs(&self) -> Result<Vec<Publication>, Error> {
        self.provider.publication().list_missing_slugs().await
    }

    async fn set_slug(&self, id: PublicationId, slug: &str) -> Result<(), Error> {
        self.provider.publication().set_slug(id, slug).await
    }
}
