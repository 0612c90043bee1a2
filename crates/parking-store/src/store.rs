//! [`RecordStore`]: appends records to the primary sheet and reads them back
//! through an ordered fallback chain.

use std::{fmt, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use parking_core::{
  record::Record,
  schema::{CANONICAL_COLUMNS, Table, canonical_header, merge_header},
  sheet::{Diagnose, FailureKind, Sheet},
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{ReadCache, SnapshotSource, cache::DEFAULT_TTL};

// ─── Schema ──────────────────────────────────────────────────────────────────

/// Make sure `sheet` exists and its header contains every canonical column.
///
/// An empty sheet gets the canonical header. An existing header keeps all
/// of its columns in place and gains the missing canonical ones at the end;
/// it is only rewritten when that changes it. Returns the effective header.
pub async fn ensure_schema<S: Sheet>(sheet: &S) -> Result<Vec<String>, S::Error> {
  sheet.ensure_sheet().await?;

  let existing = sheet
    .header()
    .await?
    .filter(|h| h.iter().any(|cell| !cell.trim().is_empty()));

  match existing {
    None => {
      let header = canonical_header();
      sheet.set_header(header.clone()).await?;
      info!("wrote canonical header");
      Ok(header)
    }
    Some(existing) => {
      let merged = merge_header(&existing, &CANONICAL_COLUMNS);
      if merged != existing {
        sheet.set_header(merged.clone()).await?;
        info!(added = merged.len() - existing.len(), "extended sheet header");
      }
      Ok(merged)
    }
  }
}

// ─── Primary ─────────────────────────────────────────────────────────────────

/// The read/write sheet, or the reason it could not be set up.
///
/// A store whose primary is unavailable still serves reads from its
/// snapshots; every write fails with the recorded kind.
pub enum Primary<S> {
  Ready(Arc<S>),
  Unavailable { kind: FailureKind, reason: String },
}

impl<S> Primary<S> {
  pub fn ready(sheet: S) -> Self { Self::Ready(Arc::new(sheet)) }

  /// Wrap the outcome of constructing a backend.
  pub fn from_result<E: Diagnose + fmt::Display>(result: Result<S, E>) -> Self {
    match result {
      Ok(sheet) => Self::ready(sheet),
      Err(e) => Self::Unavailable { kind: e.failure_kind(), reason: e.to_string() },
    }
  }

  pub fn is_ready(&self) -> bool { matches!(self, Self::Ready(_)) }
}

// ─── Read chain ──────────────────────────────────────────────────────────────

/// One way of obtaining the full table, tried in order by [`read_chain`].
pub enum ReadStrategy<'a, S> {
  Primary(&'a Primary<S>),
  Snapshot(&'a SnapshotSource),
}

impl<S: Sheet> ReadStrategy<'_, S> {
  fn describe(&self) -> String {
    match self {
      Self::Primary(_) => "primary sheet".to_owned(),
      Self::Snapshot(source) => format!("snapshot {source}"),
    }
  }

  async fn read(&self, http: &reqwest::Client) -> Result<Table, ReadFailure> {
    let fail = |kind: FailureKind, message: String| ReadFailure {
      strategy: self.describe(),
      kind,
      message,
    };
    match self {
      Self::Primary(Primary::Ready(sheet)) => match sheet.read_values().await {
        Ok(values) => Ok(Table::from_values(values)),
        Err(e) => Err(fail(e.failure_kind(), e.to_string())),
      },
      Self::Primary(Primary::Unavailable { kind, reason }) => Err(fail(*kind, reason.clone())),
      Self::Snapshot(source) => match source.fetch(http).await {
        Ok(table) => Ok(table),
        Err(e) => Err(fail(e.failure_kind(), e.to_string())),
      },
    }
  }

  fn origin(&self) -> ReadOrigin {
    match self {
      Self::Primary(_) => ReadOrigin::Primary,
      Self::Snapshot(source) => ReadOrigin::Snapshot { location: source.to_string() },
    }
  }
}

/// Why one strategy of the read chain produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadFailure {
  pub strategy: String,
  pub kind:     FailureKind,
  pub message:  String,
}

/// Which strategy supplied a [`ReadOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReadOrigin {
  Primary,
  Snapshot { location: String },
  /// Every strategy failed; the table is empty with the canonical header.
  Empty,
}

/// The result of reading the full record set.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
  pub origin:        ReadOrigin,
  pub table:         Table,
  pub records:       Vec<Record>,
  /// Non-blank rows that could not be decoded into records.
  pub rejected_rows: usize,
  /// Strategies tried and failed before `origin` answered.
  pub failures:      Vec<ReadFailure>,
  pub read_at:       DateTime<Utc>,
}

impl ReadOutcome {
  fn new(origin: ReadOrigin, table: Table, failures: Vec<ReadFailure>) -> Self {
    let decoded = table.decode();
    for (row, error) in &decoded.rejected {
      warn!(%row, %error, "skipping undecodable row");
    }
    Self {
      origin,
      records: decoded.records,
      rejected_rows: decoded.rejected.len(),
      table,
      failures,
      read_at: Utc::now(),
    }
  }

  pub fn is_empty_fallback(&self) -> bool { self.origin == ReadOrigin::Empty }
}

/// Try each strategy in order; the first table obtained wins. If all of them
/// fail the outcome is an empty table with origin [`ReadOrigin::Empty`].
pub async fn read_chain<S: Sheet>(
  strategies: &[ReadStrategy<'_, S>],
  http: &reqwest::Client,
) -> ReadOutcome {
  let mut failures = Vec::new();
  for strategy in strategies {
    match strategy.read(http).await {
      Ok(table) => {
        if !failures.is_empty() {
          info!(source = %strategy.describe(), "read served by fallback");
        }
        return ReadOutcome::new(strategy.origin(), table, failures);
      }
      Err(failure) => {
        warn!(
          source = %failure.strategy,
          kind = %failure.kind,
          message = %failure.message,
          "read failed, trying next source"
        );
        failures.push(failure);
      }
    }
  }
  warn!("no source could be read; serving an empty table");
  ReadOutcome::new(ReadOrigin::Empty, Table::empty(), failures)
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// A failed append, as reported to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct WriteError {
  pub kind:    FailureKind,
  pub message: String,
}

impl WriteError {
  pub fn from_backend<E: Diagnose + fmt::Display>(error: &E) -> Self {
    Self { kind: error.failure_kind(), message: error.to_string() }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppendReceipt {
  pub rows: usize,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// The record store client: one primary sheet, any number of read-only
/// snapshots, and a cache over reads.
pub struct RecordStore<S> {
  primary:   Primary<S>,
  snapshots: Vec<SnapshotSource>,
  http:      reqwest::Client,
  cache:     ReadCache<ReadOutcome>,
}

impl<S: Sheet> RecordStore<S> {
  pub fn new(primary: Primary<S>, http: reqwest::Client) -> Self {
    Self { primary, snapshots: Vec::new(), http, cache: ReadCache::new(DEFAULT_TTL) }
  }

  pub fn with_snapshots(mut self, snapshots: impl IntoIterator<Item = SnapshotSource>) -> Self {
    self.snapshots.extend(snapshots);
    self
  }

  pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
    self.cache = ReadCache::new(ttl);
    self
  }

  pub fn primary(&self) -> &Primary<S> { &self.primary }

  pub fn snapshots(&self) -> &[SnapshotSource] { &self.snapshots }

  /// Bring the primary sheet's header up to the canonical schema.
  pub async fn ensure_schema(&self) -> Result<Vec<String>, WriteError> {
    let sheet = self.writable()?;
    ensure_schema::<S>(sheet).await.map_err(|e| WriteError::from_backend(&e))
  }

  /// Append `records` to the primary sheet, in order, laid out under the
  /// sheet's effective header. Success invalidates the read cache.
  pub async fn append(&self, records: &[Record]) -> Result<AppendReceipt, WriteError> {
    let sheet = self.writable()?;
    if records.is_empty() {
      return Ok(AppendReceipt { rows: 0 });
    }

    let result = async {
      let header = ensure_schema::<S>(sheet).await?;
      let rows: Vec<Vec<String>> = records.iter().map(|r| r.to_row(&header)).collect();
      sheet.append_rows(rows).await
    }
    .await;

    match result {
      Ok(()) => {
        self.cache.invalidate();
        info!(rows = records.len(), "appended records");
        Ok(AppendReceipt { rows: records.len() })
      }
      Err(e) => {
        let error = WriteError::from_backend(&e);
        warn!(kind = %error.kind, message = %error.message, "append failed");
        Err(error)
      }
    }
  }

  /// Every persisted record. Served from the cache while fresh; otherwise
  /// read through the fallback chain. Never fails.
  pub async fn read_all(&self) -> Arc<ReadOutcome> {
    if let Some(cached) = self.cache.get() {
      debug!("serving cached read");
      return cached;
    }

    let epoch = self.cache.epoch();
    let strategies: Vec<ReadStrategy<'_, S>> =
      std::iter::once(ReadStrategy::Primary(&self.primary))
        .chain(self.snapshots.iter().map(ReadStrategy::Snapshot))
        .collect();
    let outcome = Arc::new(read_chain(&strategies, &self.http).await);
    if !self.cache.put_since(Arc::clone(&outcome), epoch) {
      debug!("read overtaken by a write; not cached");
    }
    outcome
  }

  /// Drop the cached read and read again.
  pub async fn refresh(&self) -> Arc<ReadOutcome> {
    self.cache.invalidate();
    self.read_all().await
  }

  pub fn invalidate_cache(&self) { self.cache.invalidate(); }

  fn writable(&self) -> Result<&Arc<S>, WriteError> {
    match &self.primary {
      Primary::Ready(sheet) => Ok(sheet),
      Primary::Unavailable { kind, reason } => {
        Err(WriteError { kind: *kind, message: reason.clone() })
      }
    }
  }
}
