//! CSV codec for the parking store.
//!
//! Reads published CSV snapshots into a [`Table`] and writes filtered
//! records out as a downloadable CSV export. Pure synchronous; no HTTP or
//! database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use parking_csv::parse_table;
//!
//! let csv = "timestamp,registration_id,name\n2024-03-04T08:00:00Z,abc,Ana\n";
//! let table = parse_table(csv).unwrap();
//! println!("{} columns, {} rows", table.header.len(), table.len());
//! ```

pub mod error;
mod parse;
mod serialize;

use chrono::NaiveDateTime;
pub use error::{Error, Result};
use parking_core::{record::Record, schema::Table};

/// Byte-order mark prepended to exports so spreadsheet applications detect
/// UTF-8 and render accented characters correctly.
pub const UTF8_BOM: &str = "\u{feff}";

/// Prefix of every export file name.
pub const EXPORT_PREFIX: &str = "formularios_filtrado";

// ─── Public API ──────────────────────────────────────────────────────────────

/// Parse a CSV document whose first record is the header.
///
/// A leading byte-order mark is ignored and rows may have a different number
/// of cells than the header. An empty document yields [`Table::empty`].
pub fn parse_table(input: &str) -> Result<Table> { parse::parse_table(input) }

/// Write `table` as CSV, header first, without a byte-order mark.
pub fn write_table(table: &Table) -> Result<Vec<u8>> {
  serialize::write_rows(std::iter::once(&table.header).chain(&table.rows))
}

/// Export records under the canonical header, prefixed with a UTF-8
/// byte-order mark.
pub fn export_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Result<Vec<u8>> {
  serialize::export_records(records)
}

/// The download name for an export created at `at`, e.g.
/// `formularios_filtrado_20240304_083000.csv`.
pub fn export_filename(at: NaiveDateTime) -> String {
  format!("{EXPORT_PREFIX}_{}.csv", at.format("%Y%m%d_%H%M%S"))
}
