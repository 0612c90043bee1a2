//! The `Sheet` trait: the primary tabular store the records live in.
//!
//! The trait is implemented by storage backends (Google Sheets, SQLite, an
//! in-memory sheet). Higher layers depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

// ─── Failure classification ──────────────────────────────────────────────────

/// The nature of a backend failure, as reported to submitters.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
  /// No usable authorized client could be constructed.
  Credentials,
  PermissionDenied,
  /// The backend could not be reached (network, file system).
  Unreachable,
  QuotaExceeded,
  /// The backend answered with something that could not be understood.
  InvalidResponse,
  Other,
}

/// Implemented by backend error types so callers can classify failures
/// without knowing the backend.
pub trait Diagnose {
  fn failure_kind(&self) -> FailureKind;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// An addressable sheet: a header row followed by data rows, all cells text.
///
/// Rows are only ever appended. The header row may be rewritten, which is
/// how the schema gains columns.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait Sheet: Send + Sync {
  type Error: std::error::Error + Diagnose + Send + Sync + 'static;

  /// Create the sheet if it does not exist yet. Idempotent.
  fn ensure_sheet(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Every row, header first. An empty sheet yields no rows at all.
  fn read_values(
    &self,
  ) -> impl Future<Output = Result<Vec<Vec<String>>, Self::Error>> + Send + '_;

  /// The header row, or `None` if the sheet is empty.
  fn header(
    &self,
  ) -> impl Future<Output = Result<Option<Vec<String>>, Self::Error>> + Send + '_;

  /// Replace the header row (or write it, on an empty sheet).
  fn set_header(
    &self,
    header: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Append `rows` after the last row, in order.
  fn append_rows(
    &self,
    rows: Vec<Vec<String>>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
