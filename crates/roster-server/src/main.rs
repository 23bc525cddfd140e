use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use roster_api::{AppState, AppStateInner};
use roster_db::Storage;

struct Config {
    db_path: PathBuf,
    host: String,
    port: u16,
}

impl Config {
    fn from_env() -> anyhow::Result<Self> {
        let db_path = std::env::var("ROSTER_DB_PATH").unwrap_or_else(|_| "roster.db".into());
        let host = std::env::var("ROSTER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("ROSTER_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()?;

        Ok(Self {
            db_path: PathBuf::from(db_path),
            host,
            port,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roster=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let storage = Storage::open(&config.db_path)?;
    if !storage.is_ready_to_use() {
        anyhow::bail!("Storage at {} is not usable", config.db_path.display());
    }

    let state: AppState = Arc::new(AppStateInner { storage });

    let app = roster_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Roster server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
