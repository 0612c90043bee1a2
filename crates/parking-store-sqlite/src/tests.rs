//! Integration tests for `SqliteSheet` against in-memory and on-disk
//! databases.

use parking_core::sheet::{Diagnose, FailureKind, Sheet};

use crate::{Error, SqliteSheet};

async fn sheet() -> SqliteSheet {
  let s = SqliteSheet::open_in_memory("formularios")
    .await
    .expect("in-memory sheet");
  s.ensure_sheet().await.expect("create sheet");
  s
}

fn row(cells: &[&str]) -> Vec<String> { cells.iter().map(|c| (*c).to_owned()).collect() }

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn new_sheet_is_empty() {
  let s = sheet().await;
  assert!(s.read_values().await.unwrap().is_empty());
  assert!(s.header().await.unwrap().is_none());
}

#[tokio::test]
async fn ensure_sheet_is_idempotent() {
  let s = sheet().await;
  s.set_header(row(&["a"])).await.unwrap();
  s.ensure_sheet().await.unwrap();
  assert_eq!(s.read_values().await.unwrap(), [row(&["a"])]);
}

#[tokio::test]
async fn missing_sheet_errors() {
  let s = SqliteSheet::open_in_memory("nope").await.unwrap();
  let err = s.read_values().await.unwrap_err();
  assert!(matches!(err, Error::SheetNotFound(ref name) if name == "nope"));
  assert_eq!(err.failure_kind(), FailureKind::Other);

  let err = s.append_rows(vec![row(&["x"])]).await.unwrap_err();
  assert!(matches!(err, Error::SheetNotFound(_)));
}

// ─── Header and rows ─────────────────────────────────────────────────────────

#[tokio::test]
async fn append_keeps_order_after_header() {
  let s = sheet().await;
  s.set_header(row(&["name", "plate"])).await.unwrap();
  s.append_rows(vec![row(&["Ana", "A1"]), row(&["Luis", "B2"])])
    .await
    .unwrap();
  s.append_rows(vec![row(&["Eva", "C3"])]).await.unwrap();

  let values = s.read_values().await.unwrap();
  assert_eq!(values, [
    row(&["name", "plate"]),
    row(&["Ana", "A1"]),
    row(&["Luis", "B2"]),
    row(&["Eva", "C3"]),
  ]);
}

#[tokio::test]
async fn set_header_rewrites_only_the_first_row() {
  let s = sheet().await;
  s.set_header(row(&["name"])).await.unwrap();
  s.append_rows(vec![row(&["Ana"])]).await.unwrap();
  s.set_header(row(&["name", "plate"])).await.unwrap();

  assert_eq!(s.header().await.unwrap(), Some(row(&["name", "plate"])));
  let values = s.read_values().await.unwrap();
  assert_eq!(values.len(), 2);
  assert_eq!(values[1], row(&["Ana"]));
}

#[tokio::test]
async fn cells_keep_unicode_and_separators() {
  let s = sheet().await;
  s.append_rows(vec![row(&["Cirugía", "a,b\n\"c\""])]).await.unwrap();
  assert_eq!(s.read_values().await.unwrap()[0], row(&["Cirugía", "a,b\n\"c\""]));
}

#[tokio::test]
async fn sheets_in_one_file_are_isolated() {
  let a = sheet().await;
  let b = a.sheet("otra");
  b.ensure_sheet().await.unwrap();

  a.append_rows(vec![row(&["1"])]).await.unwrap();
  assert!(b.read_values().await.unwrap().is_empty());
  assert_eq!(b.name(), "otra");
}

#[tokio::test]
async fn rows_persist_across_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("parking.db");

  {
    let s = SqliteSheet::open(&path, "formularios").await.unwrap();
    s.ensure_sheet().await.unwrap();
    s.set_header(row(&["name"])).await.unwrap();
    s.append_rows(vec![row(&["Ana"])]).await.unwrap();
  }

  let s = SqliteSheet::open(&path, "formularios").await.unwrap();
  assert_eq!(s.read_values().await.unwrap(), [row(&["name"]), row(&["Ana"])]);
}
