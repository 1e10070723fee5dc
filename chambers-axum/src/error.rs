use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chambers::Error;
use chambers_core::error::{AuthError, SessionError, StorageError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Chambers(#[from] Error),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid ID")]
    InvalidId,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ApiError {
    /// Map a not-found error to a resource specific message, leaving others untouched.
    pub fn not_found_as(err: Error, message: &'static str) -> Self {
        if err.is_not_found() {
            ApiError::NotFound(message)
        } else {
            ApiError::Chambers(err)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Chambers(err) => chambers_status(err),
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidId => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Rejected { status, .. } => *status,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Chambers(Error::Auth(err)) => match err {
                AuthError::PasswordHashError(_) => "Internal server error".to_string(),
                other => other.to_string(),
            },
            ApiError::Chambers(Error::Validation(err)) => err.to_string(),
            ApiError::Chambers(Error::Session(_)) => "Invalid session".to_string(),
            ApiError::Chambers(Error::Storage(StorageError::NotFound)) => "Not found".to_string(),
            ApiError::Chambers(Error::Storage(StorageError::Constraint(_))) => {
                "Conflicts with an existing record".to_string()
            }
            ApiError::Chambers(Error::Storage(_)) | ApiError::InternalError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

fn chambers_status(err: &Error) -> StatusCode {
    match err {
        Error::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
        Error::Auth(AuthError::LockedOut { .. }) => StatusCode::TOO_MANY_REQUESTS,
        Error::Auth(AuthError::InvalidInviteCode) => StatusCode::FORBIDDEN,
        Error::Auth(AuthError::UsernameTaken) => StatusCode::CONFLICT,
        Error::Auth(AuthError::PasswordHashError(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::Session(SessionError::NotFound | SessionError::Expired) => StatusCode::UNAUTHORIZED,
        Error::Session(SessionError::InvalidToken(_)) => StatusCode::UNAUTHORIZED,
        Error::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
        Error::Storage(StorageError::Constraint(_)) => StatusCode::CONFLICT,
        Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Rejected {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.message(),
            "code": status.as_u16()
        }));

        let mut response = (status, body).into_response();

        if let ApiError::Chambers(err) = &self {
            if let Some(seconds) = err.retry_after_seconds() {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
            }
        }

        response
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
