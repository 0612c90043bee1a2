//! Error type for `parking-store`.

use parking_core::sheet::{Diagnose, FailureKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("credentials unavailable: {0}")]
  Credentials(String),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("HTTP {status}: {message}")]
  Status { status: u16, message: String },

  #[error("unexpected response: {0}")]
  InvalidResponse(String),

  #[error("invalid URL: {0}")]
  Url(#[from] url::ParseError),

  #[error("sheet offline")]
  Offline,

  #[error("cannot read {path}: {source}")]
  Io {
    path:   String,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed snapshot: {0}")]
  Csv(#[from] parking_csv::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Diagnose for Error {
  fn failure_kind(&self) -> FailureKind {
    match self {
      Error::Credentials(_) => FailureKind::Credentials,
      Error::Http(e) => match e.status() {
        Some(status) => status_kind(status.as_u16()),
        None if e.is_connect() || e.is_timeout() || e.is_request() => FailureKind::Unreachable,
        None if e.is_decode() => FailureKind::InvalidResponse,
        None => FailureKind::Other,
      },
      Error::Status { status, .. } => status_kind(*status),
      Error::InvalidResponse(_) | Error::Csv(_) | Error::Json(_) => FailureKind::InvalidResponse,
      Error::Url(_) => FailureKind::Other,
      Error::Offline => FailureKind::Unreachable,
      Error::Io { source, .. } => match source.kind() {
        std::io::ErrorKind::PermissionDenied => FailureKind::PermissionDenied,
        _ => FailureKind::Unreachable,
      },
    }
  }
}

fn status_kind(status: u16) -> FailureKind {
  match status {
    401 => FailureKind::Credentials,
    403 => FailureKind::PermissionDenied,
    429 => FailureKind::QuotaExceeded,
    500..=599 => FailureKind::Unreachable,
    _ => FailureKind::Other,
  }
}
