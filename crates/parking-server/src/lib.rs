//! HTTP server for the parking reservation store.
//!
//! Serves the JSON API under `/api`, backed by whichever primary sheet the
//! configuration names, with published CSV snapshots as read fallbacks.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use axum::Router;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use parking_api::ApiState;
use parking_core::{sheet::Sheet, submission::DEFAULT_ORIGIN};
use parking_store::{CredentialSource, Primary, RecordStore, SnapshotSource};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PARKING_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  /// Tab of the primary store holding the records.
  pub sheet_name:     String,
  pub cache_ttl_secs: u64,
  /// Origin tag for submissions that do not carry one.
  pub origin:         String,
  pub primary:        PrimaryConfig,
  /// CSV snapshot locations (URLs or paths), tried in order when the primary
  /// cannot be read.
  pub snapshots:      Vec<String>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:           "127.0.0.1".to_owned(),
      port:           8080,
      sheet_name:     "formularios".to_owned(),
      cache_ttl_secs: 60,
      origin:         DEFAULT_ORIGIN.to_owned(),
      primary:        PrimaryConfig::default(),
      snapshots:      Vec::new(),
    }
  }
}

/// Which backend holds the records.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrimaryConfig {
  /// A local SQLite file.
  Sqlite { path: PathBuf },
  /// A Google Sheets spreadsheet, authorised by a bearer token.
  GoogleSheets {
    spreadsheet_id:    String,
    #[serde(default)]
    access_token:      Option<String>,
    #[serde(default)]
    access_token_file: Option<PathBuf>,
  },
  /// Records live only as long as the process.
  #[default]
  Memory,
}

impl PrimaryConfig {
  /// Where to look for the Google Sheets token, with `~` expanded.
  pub fn credentials(&self) -> Option<CredentialSource> {
    match self {
      Self::GoogleSheets { access_token, access_token_file, .. } => Some(CredentialSource {
        access_token:      access_token.clone(),
        access_token_file: access_token_file.as_deref().map(expand_tilde),
      }),
      _ => None,
    }
  }
}

impl ServerConfig {
  /// Read `path` (if it exists) and overlay `PARKING_*` environment
  /// variables. Nested keys use `__`, e.g. `PARKING_PRIMARY__KIND=sqlite`;
  /// `PARKING_SNAPSHOTS` is a comma-separated list.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_builder(Config::builder().add_source(File::from(path).required(false)))
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
    builder
      .add_source(
        Environment::with_prefix("PARKING")
          .separator("__")
          .list_separator(",")
          .with_list_parse_key("snapshots")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn cache_ttl(&self) -> Duration { Duration::from_secs(self.cache_ttl_secs) }

  pub fn snapshot_sources(&self) -> Vec<SnapshotSource> {
    self
      .snapshots
      .iter()
      .map(|location| match SnapshotSource::parse(location) {
        SnapshotSource::File(path) => SnapshotSource::File(expand_tilde(&path)),
        url => url,
      })
      .collect()
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Assembly ────────────────────────────────────────────────────────────────

/// Wrap `primary` in a record store configured by `config`, and bring the
/// sheet's header up to date. A primary that cannot be prepared is logged,
/// not fatal: reads still fall back to the snapshots.
pub async fn prepare_store<S: Sheet>(
  primary: Primary<S>,
  config: &ServerConfig,
  http: reqwest::Client,
) -> RecordStore<S> {
  let store = RecordStore::new(primary, http)
    .with_snapshots(config.snapshot_sources())
    .with_cache_ttl(config.cache_ttl());

  match store.primary() {
    Primary::Ready(_) => match store.ensure_schema().await {
      Ok(header) => info!(columns = header.len(), sheet = %config.sheet_name, "sheet ready"),
      Err(e) => warn!(kind = %e.kind, message = %e.message, "could not prepare sheet"),
    },
    Primary::Unavailable { kind, reason } => {
      warn!(%kind, %reason, "primary sheet unavailable; serving snapshots only")
    }
  }
  for source in store.snapshots() {
    info!(%source, "snapshot fallback configured");
  }
  store
}

/// Build the application router: the JSON API under `/api`, with request
/// tracing.
pub fn router<S: Sheet + 'static>(state: ApiState<S>) -> Router {
  Router::new()
    .nest("/api", parking_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use config::FileFormat;
  use parking_core::sheet::FailureKind;
  use parking_store::MemorySheet;
  use tower::ServiceExt as _;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.sheet_name, "formularios");
    assert_eq!(cfg.cache_ttl(), Duration::from_secs(60));
    assert_eq!(cfg.origin, "web");
    assert!(matches!(cfg.primary, PrimaryConfig::Memory));
    assert!(cfg.snapshots.is_empty());
  }

  #[test]
  fn google_sheets_primary() {
    let cfg = parse(
      r#"
        port = 9000
        snapshots = ["https://example.com/formularios.csv", "data/formularios.csv"]

        [primary]
        kind = "google_sheets"
        spreadsheet_id = "1AbC"
        access_token_file = "/run/secrets/token"
      "#,
    );
    assert_eq!(cfg.port, 9000);
    let PrimaryConfig::GoogleSheets { ref spreadsheet_id, .. } = cfg.primary else {
      panic!("expected google_sheets, got {:?}", cfg.primary);
    };
    assert_eq!(spreadsheet_id, "1AbC");
    let creds = cfg.primary.credentials().unwrap();
    assert_eq!(creds.access_token, None);
    assert_eq!(creds.access_token_file, Some(PathBuf::from("/run/secrets/token")));

    let sources = cfg.snapshot_sources();
    assert!(matches!(sources[0], SnapshotSource::Url(_)));
    assert_eq!(sources[1], SnapshotSource::File("data/formularios.csv".into()));
  }

  #[test]
  fn sqlite_primary() {
    let cfg = parse("[primary]\nkind = \"sqlite\"\npath = \"/var/lib/parking.db\"\n");
    assert!(matches!(
      cfg.primary,
      PrimaryConfig::Sqlite { ref path } if path == Path::new("/var/lib/parking.db")
    ));
    assert!(cfg.primary.credentials().is_none());
  }

  #[test]
  fn tilde_is_expanded() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/token")), PathBuf::from(home).join("token"));
    assert_eq!(expand_tilde(Path::new("/abs/token")), PathBuf::from("/abs/token"));
  }

  #[tokio::test]
  async fn prepared_store_has_canonical_header() {
    let sheet = MemorySheet::new();
    let http = reqwest::Client::new();
    let store = prepare_store(Primary::ready(sheet.clone()), &ServerConfig::default(), http).await;
    assert!(store.primary().is_ready());
    assert_eq!(sheet.values().len(), 1);
  }

  #[tokio::test]
  async fn unavailable_primary_still_serves() {
    let store: RecordStore<MemorySheet> = prepare_store(
      Primary::Unavailable { kind: FailureKind::Credentials, reason: "no token".into() },
      &ServerConfig::default(),
      reqwest::Client::new(),
    )
    .await;
    let app = router(ApiState::new(store));

    let resp = app
      .clone()
      .oneshot(Request::get("/api/report").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
      .oneshot(
        Request::post("/api/submissions")
          .header("content-type", "application/json")
          .body(Body::from(
            r#"{"name":"Ana","national_id":"1","plate":"A1","unit":"U","days":["Lunes"],"hours":[8]}"#,
          ))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
  }
}
