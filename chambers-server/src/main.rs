mod config;

use std::{net::SocketAddr, sync::Arc};

use clap::Parser;
use tokio::sync::watch;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command() {
        Command::Version => {
            println!("chambers v{}", env!("CARGO_PKG_VERSION"));
        }
        Command::Migrate => {
            let chambers = cli.chambers().await?;
            chambers.migrate().await?;
            info!("Migrations applied");
        }
        Command::PopulateSlugs => {
            let chambers = cli.chambers().await?;
            chambers.migrate().await?;
            let updated = chambers.populate_missing_slugs().await?;
            info!(updated, "Populated missing slugs");
        }
        Command::Serve => serve(&cli).await?,
    }

    Ok(())
}

async fn serve(cli: &Cli) -> anyhow::Result<()> {
    let chambers = Arc::new(cli.chambers().await?);
    chambers.migrate().await?;

    if cli.registration_policy().is_closed() {
        warn!("No invite codes configured; sign-up is closed");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let tasks = chambers.start_background_tasks(shutdown_rx);

    let uploads = ServeDir::new(&cli.upload_dir);
    let public_upload_path = cli.public_upload_path();
    let api = chambers_axum::routes(chambers.clone())
        .with_cookie_config(cli.cookie_config())
        .build();

    let app = if public_upload_path == "/" {
        api.fallback_service(uploads)
    } else {
        api.nest_service(&public_upload_path, uploads)
    }
    .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(cli.bind_addr).await?;
    info!(
        addr = %cli.bind_addr,
        uploads = %cli.upload_dir.display(),
        "chambers listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Stop the cleanup tasks.
    let _ = shutdown_tx.send(true);
    for task in tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "Background task did not shut down cleanly");
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
