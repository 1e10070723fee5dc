//! # Chambers Axum Integration
//!
//! JSON API for the chambers site backend: admin authentication, publications and the
//! contact form. Every error is rendered as `{"error": "...", "code": N}`.
//!
//! Sessions are read from the `session_id` cookie or an `Authorization: Bearer` header.
//! A login attempt against a locked-out username answers `429 Too Many Requests` with a
//! `Retry-After` header.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chambers::{Chambers, SqliteRepositoryProvider};
//! use chambers_axum::CookieConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repositories = SqliteRepositoryProvider::connect("sqlite://chambers.db").await?;
//!     let chambers = Arc::new(Chambers::new(Arc::new(repositories)));
//!     chambers.migrate().await?;
//!
//!     let app = chambers_axum::routes(chambers)
//!         .with_cookie_config(CookieConfig::development())
//!         .build();
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod extractors;
mod middleware;
mod multipart;
mod routes;
mod types;

pub use error::{ApiError, Result};
pub use extractors::{AuthUser, CurrentSession, OptionalAuthUser, SessionTokenFromRequest};
pub use middleware::{ApiState, auth_middleware, require_auth};
pub use multipart::{PublicationForm, parse_date};
pub use routes::{MAX_PUBLICATION_BODY, create_router};
pub use types::{
    AuthResponse, ChangePasswordRequest, ConnectionInfo, CookieConfig, CookieSameSite,
    HealthResponse, LoginRequest, MessageResponse, SessionResponse, SignupRequest,
    SignupResponse, UserResponse,
};

use axum::Router;
use chambers::Chambers;
use chambers_core::RepositoryProvider;
use std::sync::Arc;

/// Create the API routes.
///
/// The returned builder produces a [`Router`] with `/health`, `/auth/*`,
/// `/publications*` and `/contact`, ready to be served or nested.
pub fn routes<R>(chambers: Arc<Chambers<R>>) -> ApiRouterBuilder<R>
where
    R: RepositoryProvider + 'static,
{
    ApiRouterBuilder {
        chambers,
        cookie_config: CookieConfig::default(),
    }
}

/// Builder for configuring the API routes
pub struct ApiRouterBuilder<R: RepositoryProvider> {
    chambers: Arc<Chambers<R>>,
    cookie_config: CookieConfig,
}

impl<R: RepositoryProvider + 'static> ApiRouterBuilder<R> {
    /// Set custom cookie configuration
    pub fn with_cookie_config(mut self, config: CookieConfig) -> Self {
        self.cookie_config = config;
        self
    }

    pub fn build(self) -> Router {
        create_router(self.chambers, self.cookie_config)
    }
}

impl<R: RepositoryProvider + 'static> From<ApiRouterBuilder<R>> for Router {
    fn from(builder: ApiRouterBuilder<R>) -> Self {
        builder.build()
    }
}
