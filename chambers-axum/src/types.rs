use chambers::{Session, User, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "inviteCode")]
    pub invite_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default, alias = "oldPassword")]
    pub old_password: String,
    #[serde(default, alias = "newPassword")]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub session: Session,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: String,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session: Session,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: CookieSameSite,
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session_id".to_string(),
            http_only: true,
            secure: true,
            same_site: CookieSameSite::Lax,
            path: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum CookieSameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl CookieConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Cookies that also work over plain HTTP
    pub fn development() -> Self {
        Self {
            secure: false,
            ..Self::default()
        }
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_accepts_both_field_spellings() {
        let snake: SignupRequest = serde_json::from_str(
            r#"{"username":"admin","password":"pw","invite_code":"CODE"}"#,
        )
        .unwrap();
        let camel: SignupRequest =
            serde_json::from_str(r#"{"username":"admin","password":"pw","inviteCode":"CODE"}"#)
                .unwrap();

        assert_eq!(snake.invite_code, "CODE");
        assert_eq!(camel.invite_code, "CODE");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let request: LoginRequest = serde_json::from_str("{}").unwrap();
        assert!(request.username.is_empty());
        assert!(request.password.is_empty());
    }

    #[test]
    fn test_cookie_config_defaults() {
        let config = CookieConfig::default();
        assert_eq!(config.name, "session_id");
        assert!(config.secure);
        assert!(!CookieConfig::development().secure);
    }
}
