//! SQL schema for the parking SQLite sheet store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS sheets (
    name        TEXT PRIMARY KEY,
    created_at  TEXT NOT NULL
);

-- One row per spreadsheet row. The lowest seq of a sheet is its header.
-- Data rows are append-only; only the header row is ever UPDATEd.
CREATE TABLE IF NOT EXISTS sheet_rows (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    sheet       TEXT NOT NULL REFERENCES sheets(name),
    cells_json  TEXT NOT NULL    -- JSON array of cell strings
);

CREATE INDEX IF NOT EXISTS idx_sheet_rows_sheet ON sheet_rows(sheet, seq);
";
