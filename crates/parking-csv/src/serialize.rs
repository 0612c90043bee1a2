//! CSV writer. Records are terminated by `\n` and quoted only when needed.

use parking_core::{record::Record, schema::canonical_header};

use crate::{UTF8_BOM, error::Result};

pub(crate) fn write_rows<'a>(rows: impl IntoIterator<Item = &'a Vec<String>>) -> Result<Vec<u8>> {
  write_into(Vec::new(), rows)
}

pub(crate) fn export_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Result<Vec<u8>> {
  let header = canonical_header();
  let rows: Vec<Vec<String>> = std::iter::once(header.clone())
    .chain(records.into_iter().map(|r| r.to_row(&header)))
    .collect();
  write_into(UTF8_BOM.as_bytes().to_vec(), &rows)
}

fn write_into<'a>(
  buf: Vec<u8>,
  rows: impl IntoIterator<Item = &'a Vec<String>>,
) -> Result<Vec<u8>> {
  let mut writer = csv::WriterBuilder::new()
    .flexible(true)
    .terminator(csv::Terminator::Any(b'\n'))
    .from_writer(buf);

  for row in rows {
    writer.write_record(row)?;
  }

  writer.into_inner().map_err(|e| e.into_error().into())
}
