use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use chambers::{Chambers, ContactMessage, PublicationId};
use chambers_core::RepositoryProvider;
use tower::ServiceBuilder;

use crate::{
    error::{ApiError, Result},
    extractors::{AuthUser, CurrentSession, OptionalAuthUser, SessionTokenFromRequest},
    middleware::{ApiState, auth_middleware, require_auth},
    multipart::PublicationForm,
    types::*,
};

/// Request body limit for publication forms: a 5 MiB image plus the text fields.
pub const MAX_PUBLICATION_BODY: usize = 6 * 1024 * 1024;

const PUBLICATION_NOT_FOUND: &str = "Publication not found";

pub fn create_router<R>(chambers: Arc<Chambers<R>>, cookie_config: CookieConfig) -> Router
where
    R: RepositoryProvider + 'static,
{
    let state = ApiState {
        chambers,
        cookie_config: cookie_config.clone(),
    };

    Router::new()
        .route("/health", get(health_handler))
        .nest("/auth", auth_routes())
        .nest("/publications", publication_routes())
        .route("/contact", post(contact_handler))
        .layer(from_fn_with_state(state.clone(), auth_middleware::<R>))
        .with_state(state)
        .layer(Extension(cookie_config))
}

fn auth_routes<R>() -> Router<ApiState<R>>
where
    R: RepositoryProvider + 'static,
{
    let protected = Router::new()
        .route("/update-password", post(change_password_handler))
        .route_layer(from_fn(require_auth));

    Router::new()
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler).delete(logout_handler))
        .route("/session", get(get_session_handler))
        .route("/user", get(get_user_handler))
        .route("/signup", post(signup_handler))
        .merge(protected)
}

fn publication_routes<R>() -> Router<ApiState<R>>
where
    R: RepositoryProvider + 'static,
{
    let protected = Router::new()
        .route("/", post(create_publication_handler))
        .route(
            "/{id}",
            patch(update_publication_handler).delete(delete_publication_handler),
        )
        .route_layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(MAX_PUBLICATION_BODY))
                .layer(from_fn(require_auth)),
        );

    Router::new()
        .route("/", get(list_publications_handler))
        .route("/{id}", get(get_publication_handler))
        .route("/slug/{slug}", get(get_publication_by_slug_handler))
        .merge(protected)
}

fn session_cookie(config: &CookieConfig, token: String) -> Cookie<'static> {
    let same_site = match config.same_site {
        CookieSameSite::Strict => SameSite::Strict,
        CookieSameSite::Lax => SameSite::Lax,
        CookieSameSite::None => SameSite::None,
    };

    Cookie::build((config.name.clone(), token))
        .path(config.path.clone())
        .http_only(config.http_only)
        .secure(config.secure)
        .same_site(same_site)
        .build()
}

fn parse_id(id: &str) -> Result<PublicationId> {
    id.trim().parse().map_err(|_| ApiError::InvalidId)
}

async fn health_handler<R>(State(state): State<ApiState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state
        .chambers
        .health_check()
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

// Authentication

async fn login_handler<R>(
    State(state): State<ApiState<R>>,
    connection_info: ConnectionInfo,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let Json(payload) = payload?;

    let (user, session) = state
        .chambers
        .login_user_with_password(
            &payload.username,
            &payload.password,
            connection_info.user_agent,
            connection_info.ip,
        )
        .await?;

    tracing::info!(user_id = %user.id, "User signed in");

    let cookie = session_cookie(&state.cookie_config, session.token.to_string());

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(AuthResponse { user, session }),
    ))
}

async fn logout_handler<R>(
    State(state): State<ApiState<R>>,
    jar: CookieJar,
    SessionTokenFromRequest(session_token): SessionTokenFromRequest,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    if let Some(session_token) = session_token {
        if let Err(e) = state.chambers.delete_session(&session_token).await {
            tracing::debug!(error = %e, "Failed to delete session on logout");
        }
    }

    let jar = jar.remove(
        Cookie::build((state.cookie_config.name.clone(), ""))
            .path(state.cookie_config.path.clone()),
    );

    Ok((jar, Json(MessageResponse::new("Successfully logged out"))))
}

async fn get_session_handler(
    CurrentSession(session): CurrentSession,
) -> Result<impl IntoResponse> {
    Ok(Json(SessionResponse { session }))
}

async fn get_user_handler(OptionalAuthUser(user): OptionalAuthUser) -> Result<impl IntoResponse> {
    match user {
        Some(user) => Ok(Json(UserResponse { user })),
        None => Err(ApiError::Unauthorized),
    }
}

async fn signup_handler<R>(
    State(state): State<ApiState<R>>,
    payload: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let Json(payload) = payload?;

    let user = state
        .chambers
        .register_user_with_invite(&payload.username, &payload.password, &payload.invite_code)
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User created");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
            user_id: user.id,
        }),
    ))
}

async fn change_password_handler<R>(
    State(state): State<ApiState<R>>,
    AuthUser(user): AuthUser,
    CurrentSession(session): CurrentSession,
    payload: std::result::Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let Json(payload) = payload?;

    state
        .chambers
        .change_password(
            &user.id,
            &session.token,
            &payload.old_password,
            &payload.new_password,
        )
        .await?;

    Ok(Json(MessageResponse::new("Password updated successfully")))
}

// Publications

async fn list_publications_handler<R>(
    State(state): State<ApiState<R>>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    Ok(Json(state.chambers.list_publications().await?))
}

async fn get_publication_handler<R>(
    State(state): State<ApiState<R>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let id = parse_id(&id)?;

    let publication = state
        .chambers
        .get_publication(id)
        .await
        .map_err(|e| ApiError::not_found_as(e, PUBLICATION_NOT_FOUND))?;

    Ok(Json(publication))
}

async fn get_publication_by_slug_handler<R>(
    State(state): State<ApiState<R>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let publication = state
        .chambers
        .get_publication_by_slug(&slug)
        .await
        .map_err(|e| ApiError::not_found_as(e, PUBLICATION_NOT_FOUND))?;

    Ok(Json(publication))
}

async fn create_publication_handler<R>(
    State(state): State<ApiState<R>>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let form = PublicationForm::read(multipart).await?;

    let publication = state
        .chambers
        .create_publication(form.into_new_publication()?)
        .await?;

    tracing::info!(
        user_id = %user.id,
        publication_id = %publication.id,
        slug = %publication.slug,
        "Publication created"
    );

    Ok((StatusCode::CREATED, Json(publication)))
}

async fn update_publication_handler<R>(
    State(state): State<ApiState<R>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let id = parse_id(&id)?;
    let form = PublicationForm::read(multipart).await?;

    let publication = state
        .chambers
        .update_publication(id, form.into_update()?)
        .await
        .map_err(|e| ApiError::not_found_as(e, PUBLICATION_NOT_FOUND))?;

    tracing::info!(user_id = %user.id, publication_id = %id, "Publication updated");

    Ok(Json(publication))
}

async fn delete_publication_handler<R>(
    State(state): State<ApiState<R>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let id = parse_id(&id)?;

    state
        .chambers
        .delete_publication(id)
        .await
        .map_err(|e| ApiError::not_found_as(e, PUBLICATION_NOT_FOUND))?;

    tracing::info!(user_id = %user.id, publication_id = %id, "Publication deleted");

    Ok(Json(MessageResponse::new("Publication deleted successfully")))
}

// Contact form

async fn contact_handler<R>(
    State(state): State<ApiState<R>>,
    payload: std::result::Result<Json<ContactMessage>, JsonRejection>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let Json(message) = payload?;

    state.chambers.submit_contact_message(message).await?;

    Ok(Json(MessageResponse::new("Message sent successfully!")))
}
