use clap::Parser;
use tracing_subscriber::EnvFilter;

use bookshelf_api::api::{self, AppState};
use bookshelf_api::config::AppConfig;

#[derive(Parser)]
#[command(name = "bookshelf-api")]
#[command(about = "Bookshelf API - authenticated GraphQL book catalog")]
#[command(version)]
struct Args {
    #[arg(long, help = "Listen port (overrides PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Database URL (overrides DATABASE_URL)")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up AUTH0_DOMAIN, AUTH0_AUDIENCE, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bookshelf_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(url) = args.database_url {
        config.database.url = url;
    }
    tracing::info!("Starting Bookshelf API in {:?} mode", config.environment);

    let cors = api::cors_layer(&config.server.frontend_url)?;
    let state = AppState::initialize(&config).await?;
    let app = api::router(state, cors);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Bookshelf API listening on http://{}/graphql", bind_addr);
    tracing::info!("Accepting requests from {}", config.server.frontend_url);

    axum::serve(listener, app).await?;
    Ok(())
}
