//! The canonical column schema and the plain tabular form rows travel in.
//!
//! The schema is append-only: a store's header may gain columns over time
//! but existing columns are never dropped or reordered.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::{
  Error,
  record::{HeaderIndex, Record},
};

// ─── Columns ─────────────────────────────────────────────────────────────────

/// A column of the canonical schema. Declaration order is column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Column {
  Timestamp,
  RegistrationId,
  Name,
  NationalId,
  Phone,
  Email,
  VehicleModel,
  Color,
  Plate,
  Unit,
  Box,
  Place,
  DayOfWeek,
  Hour,
  Note,
  Origin,
}

impl Column {
  /// The header name, e.g. `"national_id"`.
  pub fn name(self) -> &'static str { self.into() }

  /// Look up a column by its header name. Surrounding whitespace is ignored.
  pub fn from_name(name: &str) -> Option<Self> {
    let name = name.trim();
    Self::iter().find(|c| c.name() == name)
  }
}

/// The canonical header, in order.
pub const CANONICAL_COLUMNS: [&str; 16] = [
  "timestamp",
  "registration_id",
  "name",
  "national_id",
  "phone",
  "email",
  "vehicle_model",
  "color",
  "plate",
  "unit",
  "box",
  "place",
  "day_of_week",
  "hour",
  "note",
  "origin",
];

pub fn canonical_header() -> Vec<String> {
  CANONICAL_COLUMNS.iter().map(|c| (*c).to_owned()).collect()
}

/// Union an existing header with the canonical one.
///
/// Every existing column is kept in its current position (duplicates
/// included); canonical columns that are absent are appended in canonical
/// order.
pub fn merge_header(existing: &[String], canonical: &[&str]) -> Vec<String> {
  let mut merged = existing.to_vec();
  for column in canonical {
    if !merged.iter().any(|h| h == column) {
      merged.push((*column).to_owned());
    }
  }
  merged
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// A header row plus data rows, as read from a sheet or a CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
  pub header: Vec<String>,
  pub rows:   Vec<Vec<String>>,
}

/// The outcome of decoding a [`Table`] into records.
#[derive(Debug, Default)]
pub struct Decoded {
  pub records:  Vec<Record>,
  /// Rows that could not be decoded, with their 1-based data row number.
  pub rejected: Vec<(usize, Error)>,
}

impl Table {
  /// An empty table carrying the canonical header.
  pub fn empty() -> Self { Self { header: canonical_header(), rows: Vec::new() } }

  /// Build a table from raw sheet values, whose first row is the header.
  /// No values at all yields [`Table::empty`].
  pub fn from_values(mut values: Vec<Vec<String>>) -> Self {
    if values.is_empty() {
      return Self::empty();
    }
    let header = values.remove(0);
    Self { header, rows: values }
  }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn len(&self) -> usize { self.rows.len() }

  /// Decode every data row. Rows with only blank cells are skipped silently;
  /// rows that fail to decode are reported in [`Decoded::rejected`].
  pub fn decode(&self) -> Decoded {
    let index = HeaderIndex::new(&self.header);
    let mut decoded = Decoded::default();
    for (i, row) in self.rows.iter().enumerate() {
      if row.iter().all(|cell| cell.trim().is_empty()) {
        continue;
      }
      match Record::from_row(&index, row) {
        Ok(record) => decoded.records.push(record),
        Err(e) => decoded.rejected.push((i + 1, e)),
      }
    }
    decoded
  }
}
