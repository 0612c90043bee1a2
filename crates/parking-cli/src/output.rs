//! Plain-text rendering of dashboard summaries.

use std::fmt::Write as _;

use crate::client::ReportView;

/// Render a report the way `parking report` prints it.
pub fn render_report(view: &ReportView) -> String {
  let r = &view.report;
  let mut out = String::new();

  if let Some(warning) = &view.warning {
    let _ = writeln!(out, "warning: {warning}");
  }
  let _ = writeln!(out, "source: {}", origin_label(&view.origin));
  if view.rejected_rows > 0 {
    let _ = writeln!(out, "skipped {} unreadable rows", view.rejected_rows);
  }
  let _ = writeln!(
    out,
    "records: {}  persons: {}  vehicles: {}  units: {}",
    r.total, r.distinct_persons, r.distinct_vehicles, r.distinct_units
  );

  if !r.by_unit.is_empty() {
    let _ = writeln!(out, "\nby unit");
    let width = r.by_unit.iter().map(|u| u.unit.chars().count()).max().unwrap_or(0);
    for u in &r.by_unit {
      let _ = writeln!(out, "  {:<width$}  {}", u.unit, u.count);
    }
  }

  if !r.by_slot.is_empty() {
    let _ = writeln!(out, "\nby slot");
    for s in &r.by_slot {
      let _ = writeln!(out, "  {:<9} {:>2}:00  {}", s.day.as_str(), s.hour.get(), s.count);
    }
  }

  if !r.top_persons.is_empty() {
    let _ = writeln!(out, "\ntop requesters");
    for p in &r.top_persons {
      let _ = writeln!(out, "  {} ({})  {}", p.name, p.national_id, p.count);
    }
  }

  out
}

fn origin_label(origin: &serde_json::Value) -> String {
  match origin.get("kind").and_then(|k| k.as_str()) {
    Some("snapshot") => {
      let location = origin.get("location").and_then(|l| l.as_str()).unwrap_or("?");
      format!("snapshot {location}")
    }
    Some(kind) => kind.to_owned(),
    None => "unknown".to_owned(),
  }
}
