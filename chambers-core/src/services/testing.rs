//! In-memory repositories for service tests
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    Error, ImageStore, ImageUpload, Session, User, UserId,
    error::{AuthError, StorageError},
    publication::{Publication, PublicationId, PublicationRecord},
    repositories::{PasswordRepository, PublicationRepository, SessionRepository, UserRepository},
    session::SessionToken,
    user::NewUser,
};

#[derive(Default)]
pub(crate) struct MockUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, Error> {
        let mut users = self.users.lock().await;
        if users.values().any(|u| u.username == new_user.username) {
            return Err(AuthError::UsernameTaken.into());
        }

        let now = Utc::now();
        let user = User {
            id: new_user.id,
            username: new_user.username,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        Ok(self.users.lock().await.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        self.users.lock().await.remove(id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MockPasswordRepository {
    hashes: Mutex<HashMap<UserId, String>>,
}

#[async_trait]
impl PasswordRepository for MockPasswordRepository {
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
        self.hashes
            .lock()
            .await
            .insert(user_id.clone(), hash.to_string());
        Ok(())
    }

    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
        Ok(self.hashes.lock().await.get(user_id).cloned())
    }
}

/// Keyed by token hash, like a real backend.
#[derive(Default)]
pub(crate) struct MockSessionRepository {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MockSessionRepository {
    pub(crate) async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[async_trait]
impl SessionRepository for MockSessionRepository {
    async fn create(&self, session: Session) -> Result<Session, Error> {
        self.sessions
            .lock()
            .await
            .insert(session.token_hash.clone(), session.clone());
        Ok(session)
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        Ok(self
            .sessions
            .lock()
            .await
            .get(&token.token_hash())
            .map(|s| Session {
                token: token.clone(),
                ..s.clone()
            }))
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        self.sessions.lock().await.remove(&token.token_hash());
        Ok(())
    }

    async fn delete_others(&self, user_id: &UserId, keep: &SessionToken) -> Result<(), Error> {
        let keep_hash = keep.token_hash();
        self.sessions
            .lock()
            .await
            .retain(|hash, s| &s.user_id != user_id || *hash == keep_hash);
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, Error> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}

#[derive(Default)]
pub(crate) struct MockPublicationRepository {
    publications: Mutex<HashMap<PublicationId, Publication>>,
    next_id: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MockPublicationRepository {
    /// Make every later `create` and `update` fail with a constraint violation.
    pub(crate) fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Constraint("slug already exists".to_string()).into());
        }
        Ok(())
    }

    /// Insert a row directly, bypassing slug generation.
    pub(crate) async fn insert_raw(&self, record: PublicationRecord) -> Publication {
        self.create(record).await.expect("mock insert")
    }
}

#[async_trait]
impl PublicationRepository for MockPublicationRepository {
    async fn list(&self) -> Result<Vec<Publication>, Error> {
        let mut all: Vec<_> = self.publications.lock().await.values().cloned().collect();
        all.sort_by(|a, b| b.date_published.cmp(&a.date_published));
        Ok(all)
    }

    async fn find_by_id(&self, id: PublicationId) -> Result<Option<Publication>, Error> {
        Ok(self.publications.lock().await.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Publication>, Error> {
        Ok(self
            .publications
            .lock()
            .await
            .values()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn slug_exists(
        &self,
        slug: &str,
        except: Option<PublicationId>,
    ) -> Result<bool, Error> {
        Ok(self
            .publications
            .lock()
            .await
            .values()
            .any(|p| p.slug == slug && Some(p.id) != except))
    }

    async fn create(&self, record: PublicationRecord) -> Result<Publication, Error> {
        self.check_write()?;
        let id = PublicationId::new(self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1);
        let now = Utc::now();
        let publication = Publication {
            id,
            title: record.title,
            slug: record.slug,
            content: record.content,
            image: record.image,
            date_published: record.date_published,
            created_at: now,
            updated_at: now,
        };
        self.publications
            .lock()
            .await
            .insert(id, publication.clone());
        Ok(publication)
    }

    async fn update(
        &self,
        id: PublicationId,
        record: PublicationRecord,
    ) -> Result<Publication, Error> {
        self.check_write()?;
        let mut publications = self.publications.lock().await;
        let existing = publications.get_mut(&id).ok_or(StorageError::NotFound)?;
        existing.title = record.title;
        existing.slug = record.slug;
        existing.content = record.content;
        existing.image = record.image;
        existing.date_published = record.date_published;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete(&self, id: PublicationId) -> Result<bool, Error> {
        Ok(self.publications.lock().await.remove(&id).is_some())
    }

    async fn list_missing_slugs(&self) -> Result<Vec<Publication>, Error> {
        Ok(self
            .publications
            .lock()
            .await
            .values()
            .filter(|p| p.slug.is_empty())
            .cloned()
            .collect())
    }

    async fn set_slug(&self, id: PublicationId, slug: &str) -> Result<(), Error> {
        let mut publications = self.publications.lock().await;
        let existing = publications.get_mut(&id).ok_or(StorageError::NotFound)?;
        existing.slug = slug.to_string();
        Ok(())
    }
}

/// Records uploads and returns predictable URLs.
#[derive(Default)]
pub(crate) struct MockImageStore {
    stored: AtomicUsize,
    removed: std::sync::Mutex<Vec<String>>,
}

impl MockImageStore {
    pub(crate) fn stored(&self) -> usize {
        self.stored.load(Ordering::SeqCst)
    }

    pub(crate) fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn put(&self, upload: &ImageUpload) -> Result<String, Error> {
        self.stored.fetch_add(1, Ordering::SeqCst);
        Ok(format!("/uploads/{}", upload.file_name))
    }

    async fn remove(&self, url: &str) -> Result<(), Error> {
        self.removed.lock().unwrap().push(url.to_string());
        Ok(())
    }
}
