use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Returned for unknown usernames and wrong passwords alike.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account temporarily locked. Try again in {retry_after_seconds} seconds.")]
    LockedOut { retry_after_seconds: u64 },

    #[error("Invalid invite code")]
    InvalidInviteCode,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Password hash error: {0}")]
    PasswordHashError(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,

    #[error("Session expired")]
    Expired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Image storage error: {0}")]
    Image(String),

    #[error("Record not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl Error {
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Error::Auth(AuthError::InvalidCredentials) | Error::Auth(AuthError::LockedOut { .. })
        )
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    pub fn is_session_error(&self) -> bool {
        matches!(self, Error::Session(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Storage(StorageError::NotFound) | Error::Session(SessionError::NotFound)
        )
    }

    /// Seconds until a locked-out username may try again, if this is a lockout.
    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            Error::Auth(AuthError::LockedOut {
                retry_after_seconds,
            }) => Some(*retry_after_seconds),
            _ => None,
        }
    }
}
