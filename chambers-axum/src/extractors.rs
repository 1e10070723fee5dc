use std::net::SocketAddr;

use axum::{
    RequestPartsExt,
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use axum_extra::{TypedHeader, extract::CookieJar, headers::UserAgent};
use chambers::{Session, SessionToken, User};

use crate::{
    error::ApiError,
    types::{ConnectionInfo, CookieConfig},
};

impl<S> FromRequestParts<S> for ConnectionInfo
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .extract::<Option<TypedHeader<UserAgent>>>()
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid user agent header"))?
            .map(|ua| ua.to_string());

        let ip = parts
            .extract::<ConnectInfo<SocketAddr>>()
            .await
            .ok()
            .map(|addr| addr.ip().to_string());

        Ok(ConnectionInfo { ip, user_agent })
    }
}

/// The authenticated user; 401 when the request carries no valid session.
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthUser)
            .ok_or(ApiError::Unauthorized)
    }
}

pub struct OptionalAuthUser(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuthUser(parts.extensions.get::<User>().cloned()))
    }
}

/// The session the request was authenticated with.
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or(ApiError::Unauthorized)
    }
}

/// The raw session token, valid or not, from the bearer header or the session cookie.
pub struct SessionTokenFromRequest(pub Option<SessionToken>);

impl<S> FromRequestParts<S> for SessionTokenFromRequest
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let cookie_name = parts
            .extensions
            .get::<CookieConfig>()
            .map(|config| config.name.clone())
            .unwrap_or_else(|| CookieConfig::default().name);

        Ok(SessionTokenFromRequest(session_token_from_headers(
            &parts.headers,
            &cookie_name,
        )))
    }
}

/// Bearer token first, then the named cookie.
pub(crate) fn session_token_from_headers(
    headers: &HeaderMap,
    cookie_name: &str,
) -> Option<SessionToken> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        return Some(SessionToken::new(token));
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .map(SessionToken::from)
}
