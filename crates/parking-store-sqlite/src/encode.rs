//! Encoding helpers between sheet rows and SQLite columns.
//!
//! A row's cells are stored as a compact JSON array of strings; timestamps
//! as RFC 3339 strings.

use chrono::{DateTime, Utc};

use crate::Result;

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn encode_cells(cells: &[String]) -> Result<String> { Ok(serde_json::to_string(cells)?) }

pub fn decode_cells(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }
