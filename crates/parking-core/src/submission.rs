//! Submission: one form event, expanded into one record per selected slot.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  normalize::{normalize_name, normalize_plate},
  record::{Hour, Location, Person, Record, Slot, Vehicle, Weekday},
};

/// Origin tag used when the caller does not set one.
pub const DEFAULT_ORIGIN: &str = "web";

// ─── Raw form ────────────────────────────────────────────────────────────────

/// The fields of the reservation form exactly as entered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionForm {
  pub name:          String,
  pub national_id:   String,
  pub phone:         String,
  pub email:         String,
  pub vehicle_model: String,
  pub color:         String,
  pub plate:         String,
  pub unit:          String,
  #[serde(rename = "box")]
  pub box_:          String,
  pub place:         String,
  pub note:          String,
  /// Selected days, in the order the user picked them.
  pub days:          Vec<Weekday>,
  /// Selected hours, in the order the user picked them.
  pub hours:         Vec<Hour>,
}

/// A required part of the form that was left empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
  Name,
  NationalId,
  Plate,
  Unit,
  Day,
  Hour,
}

impl Requirement {
  pub(crate) fn join(missing: &[Requirement]) -> String {
    missing
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>()
      .join(", ")
  }
}

impl fmt::Display for Requirement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Name => "name",
      Self::NationalId => "national ID",
      Self::Plate => "plate",
      Self::Unit => "unit",
      Self::Day => "at least one day",
      Self::Hour => "at least one hour",
    })
  }
}

impl SubmissionForm {
  /// Normalize the form and check that every required field is present.
  ///
  /// Name and plate are normalized before the check, so a plate made only of
  /// separators counts as missing. Repeated day or hour selections collapse to
  /// their first occurrence.
  pub fn validate(self) -> Result<Submission> {
    let name = normalize_name(&self.name);
    let national_id = self.national_id.trim().to_owned();
    let plate = normalize_plate(&self.plate);
    let unit = self.unit.trim().to_owned();
    let days = dedup(self.days);
    let hours = dedup(self.hours);

    let missing: Vec<Requirement> = [
      (name.is_empty(), Requirement::Name),
      (national_id.is_empty(), Requirement::NationalId),
      (plate.is_empty(), Requirement::Plate),
      (unit.is_empty(), Requirement::Unit),
      (days.is_empty(), Requirement::Day),
      (hours.is_empty(), Requirement::Hour),
    ]
    .into_iter()
    .filter_map(|(absent, req)| absent.then_some(req))
    .collect();

    if !missing.is_empty() {
      return Err(Error::Validation(missing));
    }

    Ok(Submission {
      person: Person {
        name,
        national_id,
        phone: optional(self.phone),
        email: optional(self.email),
      },
      vehicle: Vehicle {
        vehicle_model: optional(self.vehicle_model),
        color: optional(self.color),
        plate,
      },
      location: Location {
        unit,
        box_: optional(self.box_),
        place: optional(self.place),
      },
      note: optional(self.note),
      days,
      hours,
      origin: DEFAULT_ORIGIN.to_owned(),
    })
  }
}

fn optional(s: String) -> Option<String> {
  let trimmed = s.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
  let mut out: Vec<T> = Vec::with_capacity(items.len());
  for item in items {
    if !out.contains(&item) {
      out.push(item);
    }
  }
  out
}

// ─── Validated submission ────────────────────────────────────────────────────

/// A validated, normalized submission. Only [`SubmissionForm::validate`]
/// constructs one, so every required field is known to be present.
#[derive(Debug, Clone)]
pub struct Submission {
  person:   Person,
  vehicle:  Vehicle,
  location: Location,
  note:     Option<String>,
  days:     Vec<Weekday>,
  hours:    Vec<Hour>,
  origin:   String,
}

impl Submission {
  /// Tag the records with the surface that created them.
  pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
    self.origin = origin.into();
    self
  }

  pub fn person(&self) -> &Person { &self.person }

  pub fn vehicle(&self) -> &Vehicle { &self.vehicle }

  /// Number of records [`Self::build_records`] will produce.
  pub fn slot_count(&self) -> usize { self.days.len() * self.hours.len() }

  /// Expand into one record per `(day, hour)` under a fresh registration id.
  pub fn build_records(&self, timestamp: DateTime<Utc>) -> Vec<Record> {
    self.build_records_with_id(Uuid::new_v4(), timestamp)
  }

  /// Expand under a caller-chosen registration id.
  ///
  /// Days are visited in selection order and, within each day, hours in
  /// selection order; nothing is sorted.
  pub fn build_records_with_id(
    &self,
    registration_id: Uuid,
    timestamp: DateTime<Utc>,
  ) -> Vec<Record> {
    let mut records = Vec::with_capacity(self.slot_count());
    for &day in &self.days {
      for &hour in &self.hours {
        records.push(Record {
          timestamp: Some(timestamp),
          registration_id: Some(registration_id),
          person: self.person.clone(),
          vehicle: self.vehicle.clone(),
          location: self.location.clone(),
          slot: Slot { day, hour },
          note: self.note.clone(),
          origin: self.origin.clone(),
        });
      }
    }
    records
  }
}
