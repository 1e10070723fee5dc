use crate::{
    Error,
    publication::{Publication, PublicationId, PublicationRecord},
};
use async_trait::async_trait;

/// Repository for publications
#[async_trait]
pub trait PublicationRepository: Send + Sync + 'static {
    /// All publications, newest `date_published` first
    async fn list(&self) -> Result<Vec<Publication>, Error>;

    async fn find_by_id(&self, id: PublicationId) -> Result<Option<Publication>, Error>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Publication>, Error>;

    /// Whether any publication other than `except` already uses `slug`
    async fn slug_exists(&self, slug: &str, except: Option<PublicationId>)
    -> Result<bool, Error>;

    async fn create(&self, record: PublicationRecord) -> Result<Publication, Error>;

    /// Replace every field of an existing publication
    ///
    /// Fails with `StorageError::NotFound` if `id` does not exist.
    async fn update(&self, id: PublicationId, record: PublicationRecord)
    -> Result<Publication, Error>;

    /// Delete a publication, returning whether it existed
    async fn delete(&self, id: PublicationId) -> Result<bool, Error>;

    /// Publications whose slug is empty
    async fn list_missing_slugs(&self) -> Result<Vec<Publication>, Error>;

    async fn set_slug(&self, id: PublicationId, slug: &str) -> Result<(), Error>;
}
