use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chambers::{Chambers, User};
use chambers_core::RepositoryProvider;

use crate::{error::ApiError, extractors::session_token_from_headers, types::CookieConfig};

pub struct ApiState<R: RepositoryProvider> {
    pub chambers: Arc<Chambers<R>>,
    pub cookie_config: CookieConfig,
}

impl<R: RepositoryProvider> Clone for ApiState<R> {
    fn clone(&self) -> Self {
        Self {
            chambers: self.chambers.clone(),
            cookie_config: self.cookie_config.clone(),
        }
    }
}

/// Resolve the caller's session and put the `User` and `Session` into the request
/// extensions. Requests without a valid session pass through untouched.
pub async fn auth_middleware<R>(
    State(state): State<ApiState<R>>,
    mut request: Request,
    next: Next,
) -> Response
where
    R: RepositoryProvider,
{
    let session_token = session_token_from_headers(request.headers(), &state.cookie_config.name);

    if let Some(session_token) = session_token {
        match state.chambers.get_session(&session_token).await {
            Ok(session) => match state.chambers.get_user(&session.user_id).await {
                Ok(Some(user)) => {
                    request.extensions_mut().insert(user);
                    request.extensions_mut().insert(session);
                }
                Ok(None) => {
                    tracing::warn!(user_id = %session.user_id, "User not found for session");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Error getting user");
                }
            },
            Err(e) => {
                tracing::debug!(error = %e, "Invalid session");
            }
        }
    }

    next.run(request).await
}

/// Reject requests that [`auth_middleware`] did not authenticate.
pub async fn require_auth(request: Request, next: Next) -> Result<Response, ApiError> {
    if request.extensions().get::<User>().is_none() {
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}
