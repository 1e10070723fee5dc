use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use chambers::{
    Chambers, LocalImageStore, RegistrationPolicy, SessionConfig, SqliteRepositoryProvider,
};
use chambers_axum::CookieConfig;
use clap::{ArgAction, Parser, Subcommand};

/// Law firm site backend
#[derive(Debug, Parser)]
#[command(name = "chambers-server", author, version, about, long_about = None)]
pub struct Cli {
    /// Database connection string
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://chambers.db")]
    pub database_url: String,

    /// Address the HTTP server listens on
    #[arg(long, env = "CHAMBERS_BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: SocketAddr,

    /// Comma-separated invite codes accepted at sign-up; empty closes sign-up
    #[arg(long, env = "VALID_INVITE_CODES", default_value = "")]
    pub invite_codes: String,

    /// Directory uploaded images are written to
    #[arg(long, env = "CHAMBERS_UPLOAD_DIR", default_value = chambers::DEFAULT_UPLOAD_DIR)]
    pub upload_dir: PathBuf,

    /// URL path the upload directory is served under
    #[arg(long, env = "CHAMBERS_PUBLIC_UPLOAD_PATH", default_value = chambers::DEFAULT_PUBLIC_UPLOAD_PATH)]
    pub public_upload_path: String,

    /// Mark the session cookie `Secure`
    #[arg(long, env = "CHAMBERS_SECURE_COOKIES", default_value_t = true, action = ArgAction::Set)]
    pub secure_cookies: bool,

    /// Session lifetime in hours
    #[arg(long, env = "CHAMBERS_SESSION_HOURS", default_value_t = 24)]
    pub session_hours: u32,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Run database migrations
    Migrate,
    /// Give every publication without a slug one derived from its title
    PopulateSlugs,
    /// Print version information
    Version,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }

    /// The upload path with a single leading slash and no trailing one.
    pub fn public_upload_path(&self) -> String {
        format!("/{}", self.public_upload_path.trim_matches('/'))
    }

    pub fn registration_policy(&self) -> RegistrationPolicy {
        RegistrationPolicy::from_comma_separated(&self.invite_codes)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default().expires_in(chrono::Duration::hours(i64::from(self.session_hours)))
    }

    pub fn cookie_config(&self) -> CookieConfig {
        CookieConfig::default().with_secure(self.secure_cookies)
    }

    pub async fn chambers(&self) -> Result<Chambers<SqliteRepositoryProvider>, chambers::Error> {
        let repositories = SqliteRepositoryProvider::connect(&self.database_url).await?;

        Ok(Chambers::new(Arc::new(repositories))
            .with_registration_policy(self.registration_policy())
            .with_session_config(self.session_config())
            .with_image_store(Arc::new(LocalImageStore::new(
                self.upload_dir.clone(),
                self.public_upload_path(),
            ))))
    }
}
