//! Storage for publication cover images
//!
//! The [`ImageStore`] trait takes an uploaded file and returns the public URL it can be
//! served from. [`LocalImageStore`] writes files to a directory that the HTTP layer (or a
//! reverse proxy) serves statically; other backends only need to implement the trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{Error, error::StorageError};

/// An image file received from a client.
#[derive(Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Persists uploaded images and hands back their public URL.
#[async_trait]
pub trait ImageStore: Send + Sync + 'static {
    async fn put(&self, upload: &ImageUpload) -> Result<String, Error>;

    /// Delete an image previously returned by [`put`](Self::put).
    ///
    /// URLs this store did not produce are left alone.
    async fn remove(&self, url: &str) -> Result<(), Error>;
}

/// Writes images to a local directory.
///
/// Files are named `{uuid}-{sanitized original name}` so concurrent uploads of the same
/// file never collide, and the URL returned is `{public_prefix}/{file name}`.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn stored_name(file_name: &str) -> String {
        format!("{}-{}", Uuid::new_v4(), sanitize_file_name(file_name))
    }

    /// The file name behind a URL from [`put`](ImageStore::put), if it is one of ours.
    fn file_name_of<'a>(&self, url: &'a str) -> Option<&'a str> {
        let name = url
            .strip_prefix(self.public_prefix.trim_end_matches('/'))?
            .strip_prefix('/')?;

        (!name.is_empty() && !name.contains(['/', '\\']) && !name.starts_with('.'))
            .then_some(name)
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, upload: &ImageUpload) -> Result<String, Error> {
        let name = Self::stored_name(&upload.file_name);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::Image(format!("Failed to create upload directory: {e}")))?;

        tokio::fs::write(self.root.join(&name), &upload.bytes)
            .await
            .map_err(|e| StorageError::Image(format!("Failed to write image: {e}")))?;

        tracing::info!(file = %name, bytes = upload.bytes.len(), "Stored uploaded image");

        Ok(format!("{}/{}", self.public_prefix.trim_end_matches('/'), name))
    }

    async fn remove(&self, url: &str) -> Result<(), Error> {
        let Some(name) = self.file_name_of(url) else {
            return Ok(());
        };

        match tokio::fs::remove_file(self.root.join(name)).await {
            Ok(()) => {
                tracing::info!(file = %name, "Removed uploaded image");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Image(format!("Failed to remove image: {e}")).into()),
        }
    }
}

/// Reduce a client-supplied file name to a safe basename.
fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = sanitized.trim_start_matches('.');
    if sanitized.is_empty() {
        "image".to_string()
    } else {
        sanitized.to_string()
    }
}
