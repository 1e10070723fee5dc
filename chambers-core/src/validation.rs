use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

/// Centralized validation rules for user input.
///
/// Practical subset of RFC 5322, compiled once.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

static USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]{3,50}$").expect("Invalid username regex pattern")
});

pub const MIN_TITLE_LENGTH: usize = 5;
pub const MAX_TITLE_LENGTH: usize = 200;
pub const MIN_CONTENT_LENGTH: usize = 20;
/// Uploaded images are capped at 5 MiB.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Fail with `MissingField(name)` when `value` is empty after trimming.
pub fn require(name: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(name.to_string()));
    }
    Ok(())
}

/// Validates an email address
///
/// ```rust
/// use chambers_core::validation::validate_email;
///
/// assert!(validate_email("client@example.com").is_ok());
/// assert!(validate_email("invalid-email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingField("email".to_string()));
    }

    if email.len() > 254 {
        return Err(ValidationError::InvalidEmail(
            "Email is too long".to_string(),
        ));
    }

    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

/// Validates an admin username
///
/// 3 to 50 characters from `A-Z a-z 0-9 . _ -`.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::MissingField("username".to_string()));
    }

    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUsername(
            "Username must be 3-50 characters of letters, digits, '.', '_' or '-'".to_string(),
        ))
    }
}

/// Validates a password according to security requirements
///
/// - Minimum 8 characters
/// - Maximum 128 characters
/// - Cannot be whitespace only
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField("password".to_string()));
    }

    if password.trim().is_empty() {
        return Err(ValidationError::InvalidPassword(
            "Password cannot be only whitespace".to_string(),
        ));
    }

    if password.chars().count() < 8 {
        return Err(ValidationError::InvalidPassword(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if password.chars().count() > 128 {
        return Err(ValidationError::InvalidPassword(
            "Password must be no more than 128 characters long".to_string(),
        ));
    }

    Ok(())
}

/// Validates a publication title (already trimmed).
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    require("title", title)?;

    let length = title.chars().count();
    if length < MIN_TITLE_LENGTH {
        return Err(ValidationError::InvalidField(format!(
            "Title must be at least {MIN_TITLE_LENGTH} characters"
        )));
    }
    if length > MAX_TITLE_LENGTH {
        return Err(ValidationError::InvalidField(format!(
            "Title must not exceed {MAX_TITLE_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Validates publication body content (already trimmed).
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    require("content", content)?;

    if content.chars().count() < MIN_CONTENT_LENGTH {
        return Err(ValidationError::InvalidField(format!(
            "Content must be at least {MIN_CONTENT_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Validates an uploaded image's size and declared content type.
pub fn validate_image_upload(content_type: &str, size: usize) -> Result<(), ValidationError> {
    if size == 0 {
        return Err(ValidationError::InvalidImage("Image file is empty".to_string()));
    }

    if size > MAX_IMAGE_BYTES {
        return Err(ValidationError::InvalidImage(
            "File size exceeds 5MB limit".to_string(),
        ));
    }

    if !content_type.starts_with("image/") {
        return Err(ValidationError::InvalidImage(
            "Invalid file type. Please upload an image.".to_string(),
        ));
    }

    Ok(())
}
