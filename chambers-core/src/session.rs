//! Admin sessions
//!
//! A successful login issues an opaque [`SessionToken`]. The plaintext token goes back to
//! the client (cookie or bearer header); storage only ever sees its SHA-256 hash.
//!
//! | Field        | Type             | Description                                  |
//! | ------------ | ---------------- | -------------------------------------------- |
//! | `token`      | `SessionToken`   | Plaintext token, only known at creation/use. |
//! | `user_id`    | `UserId`         | Owner of the session.                        |
//! | `user_agent` | `Option<String>` | Client user agent at login.                  |
//! | `ip_address` | `Option<String>` | Client IP at login.                          |
//! | `created_at` | `DateTime`       | When the session was issued.                 |
//! | `expires_at` | `DateTime`       | When the session stops being accepted.       |
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    crypto::{generate_secure_token, hash_token, verify_token_hash},
    user::UserId,
};

/// Opaque bearer token with 256 bits of entropy.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }

    pub fn new_random() -> Self {
        Self(generate_secure_token())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// The value stored in place of the token.
    pub fn token_hash(&self) -> String {
        hash_token(&self.0)
    }

    pub fn verify_hash(&self, stored_hash: &str) -> bool {
        verify_token_hash(&self.0, stored_hash)
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Keep tokens out of logs.
impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: SessionToken,

    #[serde(skip)]
    pub token_hash: String,

    pub user_id: UserId,

    pub user_agent: Option<String>,

    pub ip_address: Option<String>,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A fresh session for `user_id` that expires `expires_in` from now.
    pub fn new(
        user_id: &UserId,
        user_agent: Option<String>,
        ip_address: Option<String>,
        expires_in: Duration,
    ) -> Self {
        let token = SessionToken::new_random();
        let now = Utc::now();
        Self {
            token_hash: token.token_hash(),
            token,
            user_id: user_id.clone(),
            user_agent,
            ip_address,
            created_at: now,
            expires_at: now + expires_in,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
