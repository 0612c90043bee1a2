//! Read-only CSV snapshots consulted when the primary sheet is unreachable.

use std::{fmt, path::PathBuf};

use parking_core::schema::Table;
use url::Url;

use crate::{Error, Result};

/// Where a published CSV export of the sheet lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
  Url(Url),
  File(PathBuf),
}

impl SnapshotSource {
  /// `http://` and `https://` locations are fetched over the network;
  /// anything else is a local path (a `file://` URL is accepted too).
  pub fn parse(location: &str) -> Self {
    let location = location.trim();
    match Url::parse(location) {
      Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Url(url),
      Ok(url) if url.scheme() == "file" => {
        Self::File(url.to_file_path().unwrap_or_else(|()| PathBuf::from(url.path())))
      }
      _ => Self::File(PathBuf::from(location)),
    }
  }

  /// Download (or read) the snapshot and parse it as a table.
  pub async fn fetch(&self, client: &reqwest::Client) -> Result<Table> {
    let text = match self {
      Self::Url(url) => {
        client
          .get(url.clone())
          .send()
          .await?
          .error_for_status()?
          .text()
          .await?
      }
      Self::File(path) => tokio::fs::read_to_string(path).await.map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
      })?,
    };
    Ok(parking_csv::parse_table(&text)?)
  }
}

impl fmt::Display for SnapshotSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Url(url) => write!(f, "{url}"),
      Self::File(path) => write!(f, "{}", path.display()),
    }
  }
}
