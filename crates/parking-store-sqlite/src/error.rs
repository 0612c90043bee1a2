//! Error type for `parking-store-sqlite`.

use parking_core::sheet::{Diagnose, FailureKind};
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("sheet not found: {0:?}")]
  SheetNotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Diagnose for Error {
  fn failure_kind(&self) -> FailureKind {
    match self {
      Error::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))) => {
        match e.code {
          ErrorCode::ReadOnly
          | ErrorCode::PermissionDenied
          | ErrorCode::AuthorizationForStatementDenied => FailureKind::PermissionDenied,
          ErrorCode::CannotOpen
          | ErrorCode::DatabaseBusy
          | ErrorCode::DatabaseLocked
          | ErrorCode::SystemIoFailure => FailureKind::Unreachable,
          ErrorCode::DiskFull => FailureKind::QuotaExceeded,
          _ => FailureKind::Other,
        }
      }
      Error::Database(tokio_rusqlite::Error::ConnectionClosed) => FailureKind::Unreachable,
      Error::Database(_) => FailureKind::Other,
      Error::Json(_) => FailureKind::InvalidResponse,
      Error::SheetNotFound(_) => FailureKind::Other,
    }
  }
}
