//! Publication management
//!
//! Fields are trimmed and validated before anything is written, and an uploaded image is
//! removed again if the row that would reference it cannot be saved. Slugs are assigned once, from the title at
//! creation time, and never change afterwards so published links stay valid.
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    Error, ImageStore,
    error::{StorageError, ValidationError},
    publication::{
        ImageSource, NewPublication, Publication, PublicationId, PublicationRecord,
        PublicationUpdate,
    },
    repositories::PublicationRepository,
    slug::{FALLBACK_SLUG, candidate, slugify},
    validation::{validate_content, validate_image_upload, validate_title},
};

/// Service for publication CRUD and slug maintenance
pub struct PublicationService<R: PublicationRepository> {
    repository: Arc<R>,
    image_store: Arc<dyn ImageStore>,
}

impl<R: PublicationRepository> PublicationService<R> {
    pub fn new(repository: Arc<R>, image_store: Arc<dyn ImageStore>) -> Self {
        Self {
            repository,
            image_store,
        }
    }

    /// All publications, newest first
    pub async fn list(&self) -> Result<Vec<Publication>, Error> {
        self.repository.list().await
    }

    pub async fn get(&self, id: PublicationId) -> Result<Publication, Error> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(StorageError::NotFound.into())
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Publication, Error> {
        self.repository
            .find_by_slug(slug)
            .await?
            .ok_or(StorageError::NotFound.into())
    }

    pub async fn create(&self, publication: NewPublication) -> Result<Publication, Error> {
        let title = publication.title.trim().to_string();
        let content = publication.content.trim().to_string();
        validate_title(&title)?;
        validate_content(&content)?;

        let date_published = publication
            .date_published
            .ok_or_else(|| ValidationError::MissingField("datePublished".to_string()))?;

        let image = check_image_source(publication.image)?
            .ok_or_else(|| ValidationError::MissingField("image".to_string()))?;

        let slug = self.unique_slug(&title, None).await?;
        let uploaded = matches!(image, ImageSource::Upload(_));
        let image = self.store_image(image).await?;

        let record = PublicationRecord {
            title,
            slug,
            content,
            image: image.clone(),
            date_published,
        };
        let created = match self.repository.create(record).await {
            Ok(created) => created,
            Err(e) => {
                if uploaded {
                    self.discard_image(&image).await;
                }
                return Err(e);
            }
        };

        tracing::info!(id = %created.id, slug = %created.slug, "Created publication");
        Ok(created)
    }

    /// Edit a publication.
    ///
    /// The cover image is, in order of preference: a new upload, a new URL,
    /// `existing_image`, then whatever is already stored. A missing `date_published`
    /// keeps the stored date.
    pub async fn update(
        &self,
        id: PublicationId,
        update: PublicationUpdate,
    ) -> Result<Publication, Error> {
        let existing = self.get(id).await?;

        let title = update.title.trim().to_string();
        let content = update.content.trim().to_string();
        validate_title(&title)?;
        validate_content(&content)?;

        let date_published: DateTime<Utc> =
            update.date_published.unwrap_or(existing.date_published);

        let new_image = check_image_source(update.image)?;

        let slug = if existing.slug.is_empty() {
            self.unique_slug(&title, Some(id)).await?
        } else {
            existing.slug
        };

        let uploaded = matches!(new_image, Some(ImageSource::Upload(_)));
        let image = match new_image {
            Some(source) => self.store_image(source).await?,
            None => update
                .existing_image
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(existing.image),
        };

        let record = PublicationRecord {
            title,
            slug,
            content,
            image: image.clone(),
            date_published,
        };
        let updated = match self.repository.update(id, record).await {
            Ok(updated) => updated,
            Err(e) => {
                if uploaded {
                    self.discard_image(&image).await;
                }
                return Err(e);
            }
        };

        tracing::info!(id = %updated.id, "Updated publication");
        Ok(updated)
    }

    pub async fn delete(&self, id: PublicationId) -> Result<(), Error> {
        if !self.repository.delete(id).await? {
            return Err(StorageError::NotFound.into());
        }

        tracing::info!(id = %id, "Deleted publication");
        Ok(())
    }

    /// Give every publication with an empty slug one derived from its title.
    ///
    /// Returns how many publications were updated.
    pub async fn populate_missing_slugs(&self) -> Result<usize, Error> {
        let missing = self.repository.list_missing_slugs().await?;
        let mut updated = 0;

        for publication in missing {
            let slug = self.unique_slug(&publication.title, Some(publication.id)).await?;
            self.repository.set_slug(publication.id, &slug).await?;
            tracing::info!(id = %publication.id, slug = %slug, "Assigned slug");
            updated += 1;
        }

        Ok(updated)
    }

    /// First free candidate among `base`, `base-2`, `base-3`, ...
    async fn unique_slug(
        &self,
        title: &str,
        except: Option<PublicationId>,
    ) -> Result<String, Error> {
        let mut base = slugify(title);
        if base.is_empty() {
            base = FALLBACK_SLUG.to_string();
        }

        let mut attempt = 1;
        loop {
            let slug = candidate(&base, attempt);
            if !self.repository.slug_exists(&slug, except).await? {
                return Ok(slug);
            }
            attempt += 1;
        }
    }

    async fn store_image(&self, source: ImageSource) -> Result<String, Error> {
        match source {
            ImageSource::Upload(upload) => self.image_store.put(&upload).await,
            ImageSource::Url(url) => Ok(url),
        }
    }

    async fn discard_image(&self, url: &str) {
        match self.image_store.remove(url).await {
            Ok(()) => tracing::debug!(url = %url, "Removed image of unsaved publication"),
            Err(e) => tracing::warn!(url = %url, error = %e, "Failed to remove orphaned image"),
        }
    }
}

/// Validate an image source without storing anything.
///
/// Blank URLs count as no image at all.
fn check_image_source(source: Option<ImageSource>) -> Result<Option<ImageSource>, Error> {
    match source {
        Some(ImageSource::Upload(upload)) => {
            validate_image_upload(&upload.content_type, upload.len())?;
            Ok(Some(ImageSource::Upload(upload)))
        }
        Some(ImageSource::Url(url)) => {
            let url = url.trim();
            if url.is_empty() {
                Ok(None)
            } else {
                Ok(Some(ImageSource::Url(url.to_string())))
            }
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageUpload;
    use crate::services::testing::{MockImageStore, MockPublicationRepository};
    use crate::validation::MAX_IMAGE_BYTES;
    use chrono::Duration;

    const CONTENT: &str = "A thorough look at how leases are enforced.";

    struct Fixture {
        service: PublicationService<MockPublicationRepository>,
        repository: Arc<MockPublicationRepository>,
        images: Arc<MockImageStore>,
    }

    fn fixture() -> Fixture {
        let repository = Arc::new(MockPublicationRepository::default());
        let images = Arc::new(MockImageStore::default());
        Fixture {
            service: PublicationService::new(repository.clone(), images.clone()),
            repository,
            images,
        }
    }

    fn new_publication(title: &str) -> NewPublication {
        NewPublication {
            title: title.to_string(),
            content: CONTENT.to_string(),
            date_published: Some(Utc::now()),
            image: Some(ImageSource::Url("https://cdn.example.com/cover.jpg".to_string())),
        }
    }

    fn update_of(publication: &Publication) -> PublicationUpdate {
        PublicationUpdate {
            title: publication.title.clone(),
            content: publication.content.clone(),
            date_published: Some(publication.date_published),
            image: None,
            existing_image: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_slug_and_trims() {
        let f = fixture();
        let created = f
            .service
            .create(NewPublication {
                title: "  Tenant Rights in 2024!  ".to_string(),
                ..new_publication("")
            })
            .await
            .unwrap();

        assert_eq!(created.title, "Tenant Rights in 2024!");
        assert_eq!(created.slug, "tenant-rights-in-2024");
        assert_eq!(created.image, "https://cdn.example.com/cover.jpg");
    }

    #[tokio::test]
    async fn test_duplicate_titles_get_numbered_slugs() {
        let f = fixture();
        let first = f.service.create(new_publication("Estate Planning")).await.unwrap();
        let second = f.service.create(new_publication("Estate Planning")).await.unwrap();
        let third = f.service.create(new_publication("Estate  planning")).await.unwrap();

        assert_eq!(first.slug, "estate-planning");
        assert_eq!(second.slug, "estate-planning-2");
        assert_eq!(third.slug, "estate-planning-3");
    }

    #[tokio::test]
    async fn test_title_without_slug_characters_uses_fallback() {
        let f = fixture();
        let created = f.service.create(new_publication("¿¿¿¿¿")).await.unwrap();
        assert_eq!(created.slug, FALLBACK_SLUG);
    }

    #[tokio::test]
    async fn test_create_validates_fields() {
        let f = fixture();

        let short_title = f.service.create(new_publication("Hi")).await;
        assert!(matches!(
            short_title,
            Err(Error::Validation(ValidationError::InvalidField(_)))
        ));

        let short_content = f
            .service
            .create(NewPublication {
                content: "too short".to_string(),
                ..new_publication("Valid title")
            })
            .await;
        assert!(short_content.is_err());

        let no_date = f
            .service
            .create(NewPublication {
                date_published: None,
                ..new_publication("Valid title")
            })
            .await;
        assert!(matches!(
            no_date,
            Err(Error::Validation(ValidationError::MissingField(f))) if f == "datePublished"
        ));

        let no_image = f
            .service
            .create(NewPublication {
                image: Some(ImageSource::Url("   ".to_string())),
                ..new_publication("Valid title")
            })
            .await;
        assert!(matches!(
            no_image,
            Err(Error::Validation(ValidationError::MissingField(f))) if f == "image"
        ));

        assert!(f.service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_upload_stores_image() {
        let f = fixture();
        let created = f
            .service
            .create(NewPublication {
                image: Some(ImageSource::Upload(ImageUpload::new(
                    "cover.png",
                    "image/png",
                    vec![0u8; 128],
                ))),
                ..new_publication("With an upload")
            })
            .await
            .unwrap();

        assert_eq!(created.image, "/uploads/cover.png");
        assert_eq!(f.images.stored(), 1);
    }

    #[tokio::test]
    async fn test_rejected_upload_is_not_stored() {
        let f = fixture();

        let too_big = f
            .service
            .create(NewPublication {
                image: Some(ImageSource::Upload(ImageUpload::new(
                    "huge.png",
                    "image/png",
                    vec![0u8; MAX_IMAGE_BYTES + 1],
                ))),
                ..new_publication("Too big an image")
            })
            .await;
        assert!(matches!(
            too_big,
            Err(Error::Validation(ValidationError::InvalidImage(_)))
        ));

        let not_image = f
            .service
            .create(NewPublication {
                image: Some(ImageSource::Upload(ImageUpload::new(
                    "doc.pdf",
                    "application/pdf",
                    vec![0u8; 16],
                ))),
                ..new_publication("Not an image")
            })
            .await;
        assert!(not_image.is_err());

        let bad_title = f
            .service
            .create(NewPublication {
                image: Some(ImageSource::Upload(ImageUpload::new(
                    "cover.png",
                    "image/png",
                    vec![0u8; 16],
                ))),
                ..new_publication("Bad")
            })
            .await;
        assert!(bad_title.is_err());

        assert_eq!(f.images.stored(), 0);
    }

    #[tokio::test]
    async fn test_failed_write_removes_uploaded_image() {
        let f = fixture();
        let existing = f
            .service
            .create(new_publication("Already here"))
            .await
            .unwrap();
        f.repository.fail_writes();

        let upload = || {
            Some(ImageSource::Upload(ImageUpload::new(
                "cover.png",
                "image/png",
                vec![0u8; 16],
            )))
        };

        let created = f
            .service
            .create(NewPublication {
                image: upload(),
                ..new_publication("Lost the slug race")
            })
            .await;
        assert!(matches!(
            created,
            Err(Error::Storage(StorageError::Constraint(_)))
        ));

        let updated = f
            .service
            .update(
                existing.id,
                PublicationUpdate {
                    image: upload(),
                    ..update_of(&existing)
                },
            )
            .await;
        assert!(updated.is_err());

        assert_eq!(f.images.stored(), 2);
        assert_eq!(f.images.removed(), ["/uploads/cover.png", "/uploads/cover.png"]);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_linked_image() {
        let f = fixture();
        f.repository.fail_writes();

        let created = f
            .service
            .create(NewPublication {
                image: Some(ImageSource::Url("https://cdn.example.com/a.png".to_string())),
                ..new_publication("External image")
            })
            .await;
        assert!(created.is_err());
        assert!(f.images.removed().is_empty());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let f = fixture();
        let now = Utc::now();
        for (title, days_ago) in [("Oldest article", 10), ("Newest article", 0), ("Middle article", 5)] {
            f.service
                .create(NewPublication {
                    date_published: Some(now - Duration::days(days_ago)),
                    ..new_publication(title)
                })
                .await
                .unwrap();
        }

        let titles: Vec<_> = f
            .service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, ["Newest article", "Middle article", "Oldest article"]);
    }

    #[tokio::test]
    async fn test_get_and_get_by_slug() {
        let f = fixture();
        let created = f.service.create(new_publication("Family Law")).await.unwrap();

        assert_eq!(f.service.get(created.id).await.unwrap(), created);
        assert_eq!(f.service.get_by_slug("family-law").await.unwrap(), created);

        assert!(f.service.get(PublicationId::new(999)).await.unwrap_err().is_not_found());
        assert!(f.service.get_by_slug("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_update_keeps_slug_and_image() {
        let f = fixture();
        let created = f.service.create(new_publication("Original title")).await.unwrap();

        let updated = f
            .service
            .update(
                created.id,
                PublicationUpdate {
                    title: "A completely new title".to_string(),
                    ..update_of(&created)
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "A completely new title");
        assert_eq!(updated.slug, "original-title");
        assert_eq!(updated.image, created.image);
    }

    #[tokio::test]
    async fn test_update_image_precedence() {
        let f = fixture();
        let created = f.service.create(new_publication("Image precedence")).await.unwrap();

        let with_existing = f
            .service
            .update(
                created.id,
                PublicationUpdate {
                    existing_image: Some("/uploads/kept.png".to_string()),
                    ..update_of(&created)
                },
            )
            .await
            .unwrap();
        assert_eq!(with_existing.image, "/uploads/kept.png");

        let with_url = f
            .service
            .update(
                created.id,
                PublicationUpdate {
                    image: Some(ImageSource::Url("https://img.example.com/new.jpg".to_string())),
                    existing_image: Some("/uploads/kept.png".to_string()),
                    ..update_of(&created)
                },
            )
            .await
            .unwrap();
        assert_eq!(with_url.image, "https://img.example.com/new.jpg");

        let with_upload = f
            .service
            .update(
                created.id,
                PublicationUpdate {
                    image: Some(ImageSource::Upload(ImageUpload::new(
                        "fresh.png",
                        "image/png",
                        vec![1u8; 8],
                    ))),
                    existing_image: Some("/uploads/kept.png".to_string()),
                    ..update_of(&created)
                },
            )
            .await
            .unwrap();
        assert_eq!(with_upload.image, "/uploads/fresh.png");
    }

    #[tokio::test]
    async fn test_update_without_date_keeps_stored_date() {
        let f = fixture();
        let created = f.service.create(new_publication("Dated article")).await.unwrap();

        let updated = f
            .service
            .update(
                created.id,
                PublicationUpdate {
                    date_published: None,
                    ..update_of(&created)
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.date_published, created.date_published);
    }

    #[tokio::test]
    async fn test_update_missing_publication() {
        let f = fixture();
        let created = f.service.create(new_publication("Some article")).await.unwrap();

        let err = f
            .service
            .update(PublicationId::new(999), update_of(&created))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete() {
        let f = fixture();
        let created = f.service.create(new_publication("Short lived")).await.unwrap();

        f.service.delete(created.id).await.unwrap();
        assert!(f.service.delete(created.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_populate_missing_slugs() {
        let f = fixture();
        f.service.create(new_publication("Estate Planning")).await.unwrap();

        for title in ["Estate Planning", "Business Formation"] {
            f.repository
                .insert_raw(PublicationRecord {
                    title: title.to_string(),
                    slug: String::new(),
                    content: CONTENT.to_string(),
                    image: "https://cdn.example.com/x.jpg".to_string(),
                    date_published: Utc::now(),
                })
                .await;
        }

        assert_eq!(f.service.populate_missing_slugs().await.unwrap(), 2);
        assert_eq!(f.service.populate_missing_slugs().await.unwrap(), 0);

        assert!(f.service.get_by_slug("estate-planning-2").await.is_ok());
        assert!(f.service.get_by_slug("business-formation").await.is_ok());
    }
}
