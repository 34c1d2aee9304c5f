//! tagnotes server - serves the notes API over HTTP.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, LogFormat};
use tagnotes_sqlite::SqliteStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "tagnotes=info,tagnotes_api=info,tagnotes_sqlite=info,tower_http=info";

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();
    init_tracing(config.log_format);

    let store = SqliteStore::open(&config.database).with_context(|| {
        format!("Failed to open database at {}", config.database.display())
    })?;
    let app = tagnotes_api::router(store);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, database = %config.database.display(), "tagnotes listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
