//! Aggregation of persisted records for the reporting dashboard.
//!
//! Reports are computed on read from the full record set; nothing here is
//! stored.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::record::{Hour, Record, Weekday};

/// Number of persons listed in [`Report::top_persons`] by default.
pub const DEFAULT_TOP_PERSONS: usize = 20;

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Restricts the records a report covers. Each dimension is independent;
/// `None` or an empty set places no restriction on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
  pub units: Option<BTreeSet<String>>,
  pub days:  Option<BTreeSet<Weekday>>,
  pub hours: Option<BTreeSet<Hour>>,
}

impl RecordFilter {
  pub fn matches(&self, record: &Record) -> bool {
    admits(&self.units, &record.location.unit)
      && admits(&self.days, &record.slot.day)
      && admits(&self.hours, &record.slot.hour)
  }

  /// The records matching this filter, in input order.
  pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
    records.iter().filter(|r| self.matches(r)).collect()
  }
}

fn admits<T: Ord>(set: &Option<BTreeSet<T>>, value: &T) -> bool {
  match set {
    Some(set) if !set.is_empty() => set.contains(value),
    _ => true,
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCount {
  pub unit:  String,
  pub count: usize,
}

/// Occupancy of one cell of the day×hour heatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCount {
  #[serde(rename = "day_of_week")]
  pub day:   Weekday,
  pub hour:  Hour,
  pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonCount {
  pub name:        String,
  pub national_id: String,
  pub count:       usize,
}

/// Summary counts over a (filtered) record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
  pub total:             usize,
  /// Distinct non-empty national IDs.
  pub distinct_persons:  usize,
  /// Distinct non-empty plates.
  pub distinct_vehicles: usize,
  pub distinct_units:    usize,
  /// Descending by count; ties keep first-appearance order.
  pub by_unit:           Vec<UnitCount>,
  /// Only slots present in the data, by weekday then hour.
  pub by_slot:           Vec<SlotCount>,
  /// At most `top_n` entries, descending by count; ties keep
  /// first-appearance order.
  pub top_persons:       Vec<PersonCount>,
}

impl Report {
  /// Filter `records` and summarise what remains.
  pub fn build(records: &[Record], filter: &RecordFilter, top_n: usize) -> Self {
    Self::summarize(&filter.apply(records), top_n)
  }

  /// Summarise an already-filtered record set.
  pub fn summarize(records: &[&Record], top_n: usize) -> Self {
    let distinct = |f: fn(&Record) -> &str| {
      records
        .iter()
        .map(|r| f(r))
        .filter(|s| !s.is_empty())
        .collect::<HashSet<_>>()
        .len()
    };

    let mut by_unit: IndexMap<&str, usize> = IndexMap::new();
    let mut by_slot: BTreeMap<(Weekday, Hour), usize> = BTreeMap::new();
    let mut by_person: IndexMap<(&str, &str), usize> = IndexMap::new();

    for r in records {
      *by_unit.entry(r.location.unit.as_str()).or_default() += 1;
      *by_slot.entry((r.slot.day, r.slot.hour)).or_default() += 1;
      *by_person
        .entry((r.person.name.as_str(), r.person.national_id.as_str()))
        .or_default() += 1;
    }

    let mut by_unit: Vec<UnitCount> = by_unit
      .into_iter()
      .map(|(unit, count)| UnitCount { unit: unit.to_owned(), count })
      .collect();
    by_unit.sort_by(|a, b| b.count.cmp(&a.count));

    let mut top_persons: Vec<PersonCount> = by_person
      .into_iter()
      .map(|((name, national_id), count)| PersonCount {
        name: name.to_owned(),
        national_id: national_id.to_owned(),
        count,
      })
      .collect();
    top_persons.sort_by(|a, b| b.count.cmp(&a.count));
    top_persons.truncate(top_n);

    Self {
      total: records.len(),
      distinct_persons: distinct(|r| r.person.national_id.as_str()),
      distinct_vehicles: distinct(|r| r.vehicle.plate.as_str()),
      distinct_units: distinct(|r| r.location.unit.as_str()),
      by_unit,
      by_slot: by_slot
        .into_iter()
        .map(|((day, hour), count)| SlotCount { day, hour, count })
        .collect(),
      top_persons,
    }
  }
}

// ─── Facets ──────────────────────────────────────────────────────────────────

/// The filter values actually present in a record set, for offering choices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
  /// Non-blank units, sorted.
  pub units: Vec<String>,
  /// In weekday order.
  pub days:  Vec<Weekday>,
  /// Ascending.
  pub hours: Vec<Hour>,
}

impl Facets {
  pub fn collect(records: &[Record]) -> Self {
    let units: BTreeSet<&str> = records
      .iter()
      .map(|r| r.location.unit.trim())
      .filter(|u| !u.is_empty())
      .collect();
    let days: BTreeSet<Weekday> = records.iter().map(|r| r.slot.day).collect();
    let hours: BTreeSet<Hour> = records.iter().map(|r| r.slot.hour).collect();

    Self {
      units: units.into_iter().map(str::to_owned).collect(),
      days:  days.into_iter().collect(),
      hours: hours.into_iter().collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::record::{Location, Person, Slot, Vehicle};

  fn record(name: &str, id: &str, plate: &str, unit: &str, day: Weekday, hour: u8) -> Record {
    Record {
      timestamp:       Some(Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap()),
      registration_id: Some(Uuid::nil()),
      person:          Person {
        name:        name.into(),
        national_id: id.into(),
        phone:       None,
        email:       None,
      },
      vehicle:         Vehicle { vehicle_model: None, color: None, plate: plate.into() },
      location:        Location { unit: unit.into(), box_: None, place: None },
      slot:            Slot { day, hour: Hour::new(hour).unwrap() },
      note:            None,
      origin:          "web".into(),
    }
  }

  fn sample() -> Vec<Record> {
    use Weekday::*;
    vec![
      record("Ana", "1", "AAA111", "Cirugía", Tuesday, 9),
      record("Ana", "1", "AAA111", "Cirugía", Monday, 8),
      record("Luis", "2", "BBB222", "Anestesia", Monday, 8),
      record("Luis", "2", "BBB222", "Anestesia", Monday, 9),
      record("Luis", "2", "BBB222", "Anestesia", Sunday, 24),
      record("Eva", "3", "CCC333", "Pediatría", Monday, 8),
    ]
  }

  fn set<T: Ord + Clone>(items: &[T]) -> Option<BTreeSet<T>> {
    Some(items.iter().cloned().collect())
  }

  #[test]
  fn empty_input_yields_zeroes() {
    let report = Report::build(&[], &RecordFilter::default(), DEFAULT_TOP_PERSONS);
    assert_eq!(report, Report::default());
    assert_eq!(Facets::collect(&[]), Facets::default());
  }

  #[test]
  fn unfiltered_counts() {
    let report = Report::build(&sample(), &RecordFilter::default(), DEFAULT_TOP_PERSONS);

    assert_eq!(report.total, 6);
    assert_eq!(report.distinct_persons, 3);
    assert_eq!(report.distinct_vehicles, 3);
    assert_eq!(report.distinct_units, 3);

    let units: Vec<_> = report.by_unit.iter().map(|u| (u.unit.as_str(), u.count)).collect();
    assert_eq!(units, [("Anestesia", 3), ("Cirugía", 2), ("Pediatría", 1)]);

    let slots: Vec<_> = report
      .by_slot
      .iter()
      .map(|s| (s.day, s.hour.get(), s.count))
      .collect();
    assert_eq!(slots, [
      (Weekday::Monday, 8, 3),
      (Weekday::Monday, 9, 1),
      (Weekday::Tuesday, 9, 1),
      (Weekday::Sunday, 24, 1),
    ]);

    assert_eq!(report.top_persons[0].name, "Luis");
    assert_eq!(report.top_persons[0].count, 3);
  }

  #[test]
  fn unit_filter_restricts_every_grouping() {
    let filter = RecordFilter { units: set(&["Anestesia".to_owned()]), ..Default::default() };
    let records = sample();
    let report = Report::build(&records, &filter, DEFAULT_TOP_PERSONS);

    assert!(filter.apply(&records).iter().all(|r| r.location.unit == "Anestesia"));
    assert_eq!(report.total, 3);
    assert_eq!(report.by_unit, [UnitCount { unit: "Anestesia".into(), count: 3 }]);
    assert_eq!(report.distinct_units, 1);
    assert_eq!(report.top_persons.len(), 1);
  }

  #[test]
  fn filter_dimensions_combine() {
    let filter = RecordFilter {
      units: None,
      days:  set(&[Weekday::Monday]),
      hours: set(&[Hour::new(8).unwrap()]),
    };
    let report = Report::build(&sample(), &filter, DEFAULT_TOP_PERSONS);
    assert_eq!(report.total, 3);
    assert_eq!(report.by_slot.len(), 1);
  }

  #[test]
  fn empty_filter_sets_do_not_restrict() {
    let filter = RecordFilter {
      units: Some(BTreeSet::new()),
      days:  Some(BTreeSet::new()),
      hours: None,
    };
    assert_eq!(filter.apply(&sample()).len(), 6);
  }

  #[test]
  fn top_persons_truncates_and_keeps_tie_order() {
    let report = Report::build(&sample(), &RecordFilter::default(), 2);
    let names: Vec<_> = report.top_persons.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Luis", "Ana"]);
  }

  #[test]
  fn same_name_different_id_are_different_persons() {
    let records = vec![
      record("Ana", "1", "A", "U", Weekday::Monday, 8),
      record("Ana", "9", "B", "U", Weekday::Monday, 8),
    ];
    let report = Report::build(&records, &RecordFilter::default(), DEFAULT_TOP_PERSONS);
    assert_eq!(report.top_persons.len(), 2);
    assert_eq!(report.distinct_persons, 2);
  }

  #[test]
  fn facets_are_ordered() {
    let facets = Facets::collect(&sample());
    assert_eq!(facets.units, ["Anestesia", "Cirugía", "Pediatría"]);
    assert_eq!(facets.days, [Weekday::Monday, Weekday::Tuesday, Weekday::Sunday]);
    let hours: Vec<u8> = facets.hours.iter().map(|h| h.get()).collect();
    assert_eq!(hours, [8, 9, 24]);
  }
}
