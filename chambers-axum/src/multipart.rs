//! Multipart publication forms
use axum::extract::Multipart;
use chambers::{Error, ImageSource, ImageUpload, NewPublication, PublicationUpdate};
use chambers_core::error::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::ApiError;

/// The fields of a publication create or edit form.
///
/// `image` is a file part; `imageUrl` and `existingImage` are text parts. Empty parts
/// count as absent.
#[derive(Debug, Default)]
pub struct PublicationForm {
    pub title: String,
    pub content: String,
    pub date_published: Option<String>,
    pub image: Option<ImageUpload>,
    pub image_url: Option<String>,
    pub existing_image: Option<String>,
}

impl PublicationForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            match name.as_str() {
                "title" => form.title = field.text().await?,
                "content" => form.content = field.text().await?,
                "datePublished" => form.date_published = non_blank(field.text().await?),
                "imageUrl" => form.image_url = non_blank(field.text().await?),
                "existingImage" => form.existing_image = non_blank(field.text().await?),
                "image" => {
                    let file_name = field.file_name().unwrap_or("image").to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;

                    if !bytes.is_empty() {
                        form.image = Some(ImageUpload::new(file_name, content_type, bytes.to_vec()));
                    }
                }
                other => tracing::debug!(field = other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    /// An uploaded file wins over a URL.
    fn image_source(&mut self) -> Option<ImageSource> {
        self.image
            .take()
            .map(ImageSource::Upload)
            .or_else(|| self.image_url.take().map(ImageSource::Url))
    }

    pub fn into_new_publication(mut self) -> Result<NewPublication, Error> {
        Ok(NewPublication {
            date_published: parse_date(self.date_published.as_deref())?,
            image: self.image_source(),
            title: self.title,
            content: self.content,
        })
    }

    pub fn into_update(mut self) -> Result<PublicationUpdate, Error> {
        Ok(PublicationUpdate {
            date_published: parse_date(self.date_published.as_deref())?,
            image: self.image_source(),
            existing_image: self.existing_image,
            title: self.title,
            content: self.content,
        })
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(value: Option<&str>) -> Result<Option<DateTime<Utc>>, Error> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(timestamp.with_timezone(&Utc)));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Some(midnight.and_utc()))
        .ok_or_else(|| {
            ValidationError::InvalidField(format!("datePublished is not a valid date: {value}"))
                .into()
        })
}
