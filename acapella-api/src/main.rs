//! acapella-api - social music catalog service
//!
//! Accounts, follows, likes, reviews, feeds, playlists, and the
//! admin-managed catalog, served over HTTP against a SQLite database.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use acapella_api::{build_router, AppState};
use acapella_common::{config, db};

#[derive(Parser, Debug)]
#[command(name = "acapella-api", version, about = "Social music catalog service")]
struct Cli {
    /// Root folder holding acapella.db (overrides env and config file)
    #[arg(long)]
    root_folder: Option<String>,

    /// Listen port (overrides env and config file)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting acapella-api v{}", env!("CARGO_PKG_VERSION"));

    let service_config = config::resolve(cli.root_folder.as_deref(), cli.port)?;
    config::ensure_root_folder(&service_config)?;

    let db_path = service_config.database_path();
    info!("Database path: {}", db_path.display());

    let pool = db::init_database(&db_path).await?;

    if service_config.master_admin_emails.is_empty() {
        info!("No master admin emails configured");
    } else {
        info!(
            "Master admin emails configured: {}",
            service_config.master_admin_emails.len()
        );
    }

    let port = service_config.port;
    let state = AppState::new(pool, service_config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("acapella-api listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
