//! [`SqliteSheet`]: the SQLite implementation of [`Sheet`].

use std::{path::Path, sync::Arc};

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use parking_core::sheet::Sheet;

use crate::{
  Error, Result,
  encode::{decode_cells, encode_cells, encode_dt},
  schema::SCHEMA,
};

// ─── Sheet ───────────────────────────────────────────────────────────────────

/// One named sheet inside a SQLite file. Several sheets may share a file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteSheet {
  conn: tokio_rusqlite::Connection,
  name: Arc<str>,
}

impl SqliteSheet {
  /// Open (or create) the database at `path` and address `sheet_name` in it.
  pub async fn open(path: impl AsRef<Path>, sheet_name: &str) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, sheet_name).await
  }

  /// Open an in-memory database, for tests.
  pub async fn open_in_memory(sheet_name: &str) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, sheet_name).await
  }

  /// Address another sheet in the same database.
  pub fn sheet(&self, sheet_name: &str) -> Self {
    Self { conn: self.conn.clone(), name: Arc::from(sheet_name) }
  }

  pub fn name(&self) -> &str { &self.name }

  async fn init(conn: tokio_rusqlite::Connection, sheet_name: &str) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, name: Arc::from(sheet_name) })
  }

  /// Run `f` only if this sheet exists; `Ok(None)` otherwise.
  async fn with_sheet<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut rusqlite::Connection, &str) -> rusqlite::Result<T> + Send + 'static,
  {
    let name = self.name.to_string();
    let out = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row("SELECT 1 FROM sheets WHERE name = ?1", rusqlite::params![name], |_| {
            Ok(true)
          })
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(None);
        }
        Ok(Some(f(conn, &name)?))
      })
      .await?;
    out.ok_or_else(|| Error::SheetNotFound(self.name.to_string()))
  }
}

// ─── Sheet impl ──────────────────────────────────────────────────────────────

impl Sheet for SqliteSheet {
  type Error = Error;

  async fn ensure_sheet(&self) -> Result<()> {
    let name = self.name.to_string();
    let at = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO sheets (name, created_at) VALUES (?1, ?2)",
          rusqlite::params![name, at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn read_values(&self) -> Result<Vec<Vec<String>>> {
    let raw: Vec<String> = self
      .with_sheet(|conn, name| {
        let mut stmt =
          conn.prepare("SELECT cells_json FROM sheet_rows WHERE sheet = ?1 ORDER BY seq")?;
        let rows = stmt
          .query_map(rusqlite::params![name], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    raw.iter().map(|s| decode_cells(s)).collect()
  }

  async fn header(&self) -> Result<Option<Vec<String>>> {
    let raw: Option<String> = self
      .with_sheet(|conn, name| {
        conn
          .query_row(
            "SELECT cells_json FROM sheet_rows WHERE sheet = ?1 ORDER BY seq LIMIT 1",
            rusqlite::params![name],
            |r| r.get(0),
          )
          .optional()
      })
      .await?;
    raw.as_deref().map(decode_cells).transpose()
  }

  async fn set_header(&self, header: Vec<String>) -> Result<()> {
    let cells = encode_cells(&header)?;
    self
      .with_sheet(move |conn, name| {
        let tx = conn.transaction()?;
        let first: Option<i64> = tx
          .query_row(
            "SELECT MIN(seq) FROM sheet_rows WHERE sheet = ?1",
            rusqlite::params![name],
            |r| r.get(0),
          )?;
        match first {
          Some(seq) => tx.execute(
            "UPDATE sheet_rows SET cells_json = ?1 WHERE seq = ?2",
            rusqlite::params![cells, seq],
          )?,
          None => tx.execute(
            "INSERT INTO sheet_rows (sheet, cells_json) VALUES (?1, ?2)",
            rusqlite::params![name, cells],
          )?,
        };
        tx.commit()
      })
      .await
  }

  async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<()> {
    let encoded = rows.iter().map(|r| encode_cells(r)).collect::<Result<Vec<_>>>()?;
    self
      .with_sheet(move |conn, name| {
        let tx = conn.transaction()?;
        {
          let mut stmt =
            tx.prepare("INSERT INTO sheet_rows (sheet, cells_json) VALUES (?1, ?2)")?;
          for cells in &encoded {
            stmt.execute(rusqlite::params![name, cells])?;
          }
        }
        tx.commit()
      })
      .await
  }
}
