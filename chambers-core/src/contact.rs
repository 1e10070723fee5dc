//! Messages submitted through the public contact form
use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    validation::{require, validate_email},
};

/// Missing fields deserialize as empty and are reported by [`ContactMessage::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactMessage {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

impl ContactMessage {
    /// All fields except `phone` are required; `email` must be well formed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("firstName", &self.first_name)?;
        require("lastName", &self.last_name)?;
        require("email", &self.email)?;
        require("message", &self.message)?;
        validate_email(self.email.trim())
    }

    pub fn subject(&self) -> String {
        format!(
            "New contact form message from {} {}",
            self.first_name.trim(),
            self.last_name.trim()
        )
    }

    /// Phone number, or `N/A` when none was given.
    pub fn phone_display(&self) -> &str {
        match self.phone.as_deref().map(str::trim) {
            Some(phone) if !phone.is_empty() => phone,
            _ => "N/A",
        }
    }

    /// Plain-text rendering delivered to the firm.
    pub fn body_text(&self) -> String {
        format!(
            "Name: {} {}\nEmail: {}\nPhone: {}\n\nMessage:\n{}",
            self.first_name.trim(),
            self.last_name.trim(),
            self.email.trim(),
            self.phone_display(),
            self.message.trim()
        )
    }
}
