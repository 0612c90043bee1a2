//! parking-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `PARKING_*`
//! environment variables, opens the configured primary sheet and serves the
//! JSON API over HTTP.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use parking_api::ApiState;
use parking_core::sheet::Sheet;
use parking_server::{PrimaryConfig, ServerConfig, expand_tilde, prepare_store};
use parking_store::{AccessToken, GoogleSheet, MemorySheet, Primary};
use parking_store_sqlite::SqliteSheet;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Parking reservation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
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

  // Load configuration.
  let server_cfg = ServerConfig::load(&cli.config).context("failed to read configuration")?;
  let http = parking_store::http_client().context("failed to build HTTP client")?;

  // Open the primary sheet. Failing to do so is not fatal.
  match server_cfg.primary.clone() {
    PrimaryConfig::Memory => {
      tracing::warn!("using an in-memory sheet; records are lost on exit");
      serve(Primary::ready(MemorySheet::new()), &server_cfg, http).await
    }
    PrimaryConfig::Sqlite { path } => {
      let path = expand_tilde(&path);
      let sheet = SqliteSheet::open(&path, &server_cfg.sheet_name).await;
      if let Err(e) = &sheet {
        tracing::error!(path = %path.display(), error = %e, "failed to open sqlite sheet");
      }
      serve(Primary::from_result(sheet), &server_cfg, http).await
    }
    PrimaryConfig::GoogleSheets { ref spreadsheet_id, .. } => {
      let credentials = server_cfg.primary.credentials().unwrap_or_default();
      let sheet = AccessToken::resolve(&credentials).and_then(|token| {
        GoogleSheet::connect(http.clone(), token, spreadsheet_id, &server_cfg.sheet_name)
      });
      if let Err(e) = &sheet {
        tracing::error!(error = %e, "google sheets client unavailable");
      }
      serve(Primary::from_result(sheet), &server_cfg, http).await
    }
  }
}

async fn serve<S: Sheet + 'static>(
  primary: Primary<S>,
  server_cfg: &ServerConfig,
  http: reqwest::Client,
) -> anyhow::Result<()> {
  let store = prepare_store(primary, server_cfg, http).await;
  let state = ApiState::new(store).with_origin(&server_cfg.origin);
  let app = parking_server::router(state);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
