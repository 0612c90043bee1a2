//! CSV reader.

use parking_core::schema::Table;

use crate::{UTF8_BOM, error::Result};

pub(crate) fn parse_table(input: &str) -> Result<Table> {
  let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);

  let mut reader = csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .from_reader(input.as_bytes());

  let mut values = Vec::new();
  for record in reader.records() {
    let record = record?;
    values.push(record.iter().map(str::to_owned).collect::<Vec<_>>());
  }

  Ok(Table::from_values(values))
}
