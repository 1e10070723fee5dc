use async_trait::async_trait;
use chambers_core::{
    Error,
    error::StorageError,
    publication::{Publication, PublicationId, PublicationRecord},
    repositories::PublicationRepository,
};
use sqlx::SqlitePool;

use crate::{database_error, from_timestamp, is_unique_violation};

const COLUMNS: &str = "id, title, slug, content, image, date_published, created_at, updated_at";

pub struct SqlitePublicationRepository {
    pool: SqlitePool,
}

impl SqlitePublicationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SqlitePublication {
    id: i64,
    title: String,
    slug: String,
    content: String,
    image: String,
    date_published: i64,
    created_at: i64,
    updated_at: i64,
}

impl From<SqlitePublication> for Publication {
    fn from(p: SqlitePublication) -> Self {
        Publication {
            id: PublicationId::new(p.id),
            title: p.title,
            slug: p.slug,
            content: p.content,
            image: p.image,
            date_published: from_timestamp(p.date_published),
            created_at: from_timestamp(p.created_at),
            updated_at: from_timestamp(p.updated_at),
        }
    }
}

fn write_error(e: sqlx::Error) -> Error {
    if is_unique_violation(&e) {
        Error::Storage(StorageError::Constraint(
            "A publication with this slug already exists".to_string(),
        ))
    } else {
        database_error(e)
    }
}

#[async_trait]
impl PublicationRepository for SqlitePublicationRepository {
    async fn list(&self) -> Result<Vec<Publication>, Error> {
        let rows = sqlx::query_as::<_, SqlitePublication>(&format!(
            "SELECT {COLUMNS} FROM publications ORDER BY date_published DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: PublicationId) -> Result<Option<Publication>, Error> {
        let row = sqlx::query_as::<_, SqlitePublication>(&format!(
            "SELECT {COLUMNS} FROM publications WHERE id = ?1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.map(Into::into))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Publication>, Error> {
        if slug.is_empty() {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, SqlitePublication>(&format!(
            "SELECT {COLUMNS} FROM publications WHERE slug = ?1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.map(Into::into))
    }

    async fn slug_exists(
        &self,
        slug: &str,
        except: Option<PublicationId>,
    ) -> Result<bool, Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM publications WHERE slug = ?1 AND (?2 IS NULL OR id <> ?2))",
        )
        .bind(slug)
        .bind(except.map(|id| id.value()))
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(exists)
    }

    async fn create(&self, record: PublicationRecord) -> Result<Publication, Error> {
        let now = chrono::Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqlitePublication>(&format!(
            r#"
            INSERT INTO publications (title, slug, content, image, date_published, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&record.title)
        .bind(&record.slug)
        .bind(&record.content)
        .bind(&record.image)
        .bind(record.date_published.timestamp())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(row.into())
    }

    async fn update(
        &self,
        id: PublicationId,
        record: PublicationRecord,
    ) -> Result<Publication, Error> {
        let row = sqlx::query_as::<_, SqlitePublication>(&format!(
            r#"
            UPDATE publications
            SET title = ?1, slug = ?2, content = ?3, image = ?4, date_published = ?5, updated_at = ?6
            WHERE id = ?7
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&record.title)
        .bind(&record.slug)
        .bind(&record.content)
        .bind(&record.image)
        .bind(record.date_published.timestamp())
        .bind(chrono::Utc::now().timestamp())
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)?;

        row.map(Into::into)
            .ok_or(Error::Storage(StorageError::NotFound))
    }

    async fn delete(&self, id: PublicationId) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM publications WHERE id = ?1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_missing_slugs(&self) -> Result<Vec<Publication>, Error> {
        let rows = sqlx::query_as::<_, SqlitePublication>(&format!(
            "SELECT {COLUMNS} FROM publications WHERE slug = '' ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn set_slug(&self, id: PublicationId, slug: &str) -> Result<(), Error> {
        let result = sqlx::query("UPDATE publications SET slug = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(slug)
            .bind(chrono::Utc::now().timestamp())
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound.into());
        }

        Ok(())
    }
}
