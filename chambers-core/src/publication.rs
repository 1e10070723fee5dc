//! Publications (articles) shown on the public site
//!
//! | Field            | Type            | Description                                   |
//! | ---------------- | --------------- | --------------------------------------------- |
//! | `id`             | `PublicationId` | Numeric identifier assigned by storage.       |
//! | `title`          | `String`        | Trimmed title, 5 to 200 characters.           |
//! | `slug`           | `String`        | Unique URL slug derived from the title.       |
//! | `content`        | `String`        | Trimmed body (rich-text HTML from the editor).|
//! | `image`          | `String`        | Public URL of the cover image.                |
//! | `date_published` | `DateTime`      | Publication date shown to readers.            |
//! | `created_at`     | `DateTime`      | When the record was created.                  |
//! | `updated_at`     | `DateTime`      | When the record was last modified.            |
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::image::ImageUpload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicationId(i64);

impl PublicationId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for PublicationId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::str::FromStr for PublicationId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl std::fmt::Display for PublicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub id: PublicationId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image: String,
    pub date_published: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where a publication's cover image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// A file uploaded with the form; stored through the image store.
    Upload(ImageUpload),
    /// An externally hosted image, used as-is.
    Url(String),
}

/// Input for creating a publication.
#[derive(Debug, Clone)]
pub struct NewPublication {
    pub title: String,
    pub content: String,
    pub date_published: Option<DateTime<Utc>>,
    pub image: Option<ImageSource>,
}

/// Input for editing a publication.
///
/// When `image` is `None`, `existing_image` is kept, and failing that the stored image.
#[derive(Debug, Clone)]
pub struct PublicationUpdate {
    pub title: String,
    pub content: String,
    pub date_published: Option<DateTime<Utc>>,
    pub image: Option<ImageSource>,
    pub existing_image: Option<String>,
}

/// A validated publication ready to be written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationRecord {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image: String,
    pub date_published: DateTime<Utc>,
}
