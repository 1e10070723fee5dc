//! Admin users
//!
//! Only site administrators have accounts. They sign in with a username and password
//! to manage publications.
//!
//! | Field        | Type       | Description                                 |
//! | ------------ | ---------- | ------------------------------------------- |
//! | `id`         | `UserId`   | Opaque, stable identifier (`usr_...`).      |
//! | `username`   | `String`   | Unique, case-sensitive login name.          |
//! | `created_at` | `DateTime` | When the account was created.               |
//! | `updated_at` | `DateTime` | When the account was last modified.         |
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{generate_prefixed_id, validate_prefixed_id};

/// A unique, stable identifier for a user
///
/// Treat the value as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> Self {
        UserId(id.to_string())
    }

    pub fn new_random() -> Self {
        UserId(generate_prefixed_id("usr"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "usr")
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub username: String,
}

impl NewUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: UserId::new_random(),
            username: username.into(),
        }
    }
}
