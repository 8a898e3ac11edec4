//! crumb-server binary.
//!
//! Reads `crumb.toml` (or the path given with `--config`) layered with
//! `CRUMB_*` environment variables, opens the SQLite ledger store, and
//! serves the JSON API over HTTP.

mod settings;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use crumb_api::AppState;
use crumb_core::external::SystemClock;
use crumb_ledger::{Ledger, StaticCatalog};
use crumb_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Crumb daily inventory ledger server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "crumb.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let catalog = StaticCatalog::new(server_cfg.catalog.clone());
  if catalog.is_empty() {
    tracing::warn!("catalog is empty; wastage cannot be priced");
  }
  if server_cfg.supervisors.is_empty() {
    tracing::warn!("no supervisors configured; approvals and corrections are disabled");
  }

  let ledger = Ledger::new(
    store,
    catalog,
    Arc::new(SystemClock),
    server_cfg.ledger.clone(),
  );
  let state = AppState::new(ledger, server_cfg.supervisors.clone());

  let app = axum::Router::new()
    .nest("/api", crumb_api::api_router(state))
    .layer(TraceLayer::new_for_http());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
