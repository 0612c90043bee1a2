//! Record: one persisted row, reserving a single day×hour slot.
//!
//! A record is created once, when a submission is expanded, and never
//! changes afterwards. The store has no update or delete operation.

use std::{collections::HashMap, fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, schema::Column};

// ─── Slot ────────────────────────────────────────────────────────────────────

/// Day of the week, in canonical order. The Spanish names are the values
/// stored in the `day_of_week` column.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  EnumIter,
  IntoStaticStr,
  strum::Display,
  strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Weekday {
  #[serde(rename = "Lunes")]
  #[strum(to_string = "Lunes")]
  Monday,
  #[serde(rename = "Martes")]
  #[strum(to_string = "Martes")]
  Tuesday,
  #[serde(rename = "Miércoles", alias = "Miercoles")]
  #[strum(to_string = "Miércoles", serialize = "Miercoles")]
  Wednesday,
  #[serde(rename = "Jueves")]
  #[strum(to_string = "Jueves")]
  Thursday,
  #[serde(rename = "Viernes")]
  #[strum(to_string = "Viernes")]
  Friday,
  #[serde(rename = "Sábado", alias = "Sabado")]
  #[strum(to_string = "Sábado", serialize = "Sabado")]
  Saturday,
  #[serde(rename = "Domingo")]
  #[strum(to_string = "Domingo")]
  Sunday,
}

impl Weekday {
  /// All seven days, Monday first.
  pub fn all() -> impl Iterator<Item = Weekday> { Self::iter() }

  /// The stored column value, e.g. `"Miércoles"`.
  pub fn as_str(self) -> &'static str { self.into() }

  /// Parse a stored column value. Surrounding whitespace is ignored.
  pub fn parse(s: &str) -> Result<Self> {
    s.trim()
      .parse()
      .map_err(|_| Error::UnknownWeekday(s.to_owned()))
  }
}

/// An hour of the day in `0..=24`.
///
/// `24` is kept as a distinct value so that end-of-day reservations can be
/// expressed the way the form offers them.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Hour(u8);

impl Hour {
  pub const MAX: u8 = 24;

  pub fn new(value: u8) -> Option<Self> { (value <= Self::MAX).then_some(Self(value)) }

  /// Every valid hour, ascending.
  pub fn all() -> impl Iterator<Item = Hour> { (0..=Self::MAX).map(Self) }

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<u8> for Hour {
  type Error = Error;

  fn try_from(value: u8) -> Result<Self> {
    Self::new(value).ok_or_else(|| Error::InvalidHour(value.to_string()))
  }
}

impl From<Hour> for u8 {
  fn from(hour: Hour) -> Self { hour.0 }
}

impl FromStr for Hour {
  type Err = Error;

  /// Accepts plain integers and integral decimals (`"8"`, `"8.0"`); spreadsheet
  /// exports occasionally render whole numbers with a fractional part.
  fn from_str(s: &str) -> Result<Self> {
    let trimmed = s.trim();
    let invalid = || Error::InvalidHour(s.to_owned());
    let value = match trimmed.parse::<u8>() {
      Ok(v) => v,
      Err(_) => {
        let f: f64 = trimmed.parse().map_err(|_| invalid())?;
        if f.fract() != 0.0 || !(0.0..=f64::from(Self::MAX)).contains(&f) {
          return Err(invalid());
        }
        f as u8
      }
    };
    Self::new(value).ok_or_else(invalid)
  }
}

impl fmt::Display for Hour {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// One reservable `(day, hour)` pair.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Slot {
  #[serde(rename = "day_of_week")]
  pub day:  Weekday,
  pub hour: Hour,
}

// ─── Field groups ────────────────────────────────────────────────────────────

/// Who is requesting the slot. `name` + `national_id` identify a person
/// across submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub name:        String,
  pub national_id: String,
  pub phone:       Option<String>,
  pub email:       Option<String>,
}

/// The vehicle to be parked. `plate` is always stored normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
  pub vehicle_model: Option<String>,
  pub color:         Option<String>,
  pub plate:         String,
}

/// Where the requester works.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
  /// Organisational unit or service, e.g. "Anestesia".
  pub unit:  String,
  #[serde(rename = "box")]
  pub box_:  Option<String>,
  /// Free-text description of the parking place.
  pub place: Option<String>,
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One persisted row. All rows produced by the same submission share every
/// field except `slot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
  /// Absent on hand-typed rows, or when the cell does not parse.
  pub timestamp:       Option<DateTime<Utc>>,
  /// Shared by every row expanded from one submission. Absent on hand-typed
  /// rows.
  pub registration_id: Option<Uuid>,
  #[serde(flatten)]
  pub person:          Person,
  #[serde(flatten)]
  pub vehicle:         Vehicle,
  #[serde(flatten)]
  pub location:        Location,
  #[serde(flatten)]
  pub slot:            Slot,
  pub note:            Option<String>,
  /// Tag naming the surface that created the record (e.g. "web", "cli").
  pub origin:          String,
}

impl Record {
  /// The textual cell value stored under `column`.
  pub fn cell(&self, column: Column) -> String {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    match column {
      Column::Timestamp => self.timestamp.map(encode_timestamp).unwrap_or_default(),
      Column::RegistrationId => {
        self.registration_id.map(|id| id.hyphenated().to_string()).unwrap_or_default()
      }
      Column::Name => self.person.name.clone(),
      Column::NationalId => self.person.national_id.clone(),
      Column::Phone => opt(&self.person.phone),
      Column::Email => opt(&self.person.email),
      Column::VehicleModel => opt(&self.vehicle.vehicle_model),
      Column::Color => opt(&self.vehicle.color),
      Column::Plate => self.vehicle.plate.clone(),
      Column::Unit => self.location.unit.clone(),
      Column::Box => opt(&self.location.box_),
      Column::Place => opt(&self.location.place),
      Column::DayOfWeek => self.slot.day.as_str().to_owned(),
      Column::Hour => self.slot.hour.to_string(),
      Column::Note => opt(&self.note),
      Column::Origin => self.origin.clone(),
    }
  }

  /// Lay the record out under `header`. Columns that are not part of the
  /// canonical schema are left blank.
  pub fn to_row(&self, header: &[String]) -> Vec<String> {
    header
      .iter()
      .map(|name| Column::from_name(name).map(|c| self.cell(c)).unwrap_or_default())
      .collect()
  }

  /// Decode a stored row, locating each column by name in `header`.
  ///
  /// Only the slot is structural. A blank or unreadable timestamp or
  /// registration id decodes to `None`; every other column decodes to an
  /// empty or absent value when missing.
  pub fn from_row(header: &HeaderIndex, row: &[String]) -> Result<Self> {
    let text = |c: Column| header.get(c, row);
    let opt = |c: Column| Some(text(c).to_owned()).filter(|s| !s.is_empty());

    Ok(Self {
      timestamp:       decode_timestamp(text(Column::Timestamp)).ok(),
      registration_id: Uuid::parse_str(text(Column::RegistrationId)).ok(),
      person:          Person {
        name:        text(Column::Name).to_owned(),
        national_id: text(Column::NationalId).to_owned(),
        phone:       opt(Column::Phone),
        email:       opt(Column::Email),
      },
      vehicle:         Vehicle {
        vehicle_model: opt(Column::VehicleModel),
        color:         opt(Column::Color),
        plate:         crate::normalize::normalize_plate(text(Column::Plate)),
      },
      location:        Location {
        unit:  text(Column::Unit).to_owned(),
        box_:  opt(Column::Box),
        place: opt(Column::Place),
      },
      slot:            Slot {
        day:  Weekday::parse(text(Column::DayOfWeek))?,
        hour: text(Column::Hour).parse()?,
      },
      note:            opt(Column::Note),
      origin:          text(Column::Origin).to_owned(),
    })
  }
}

// ─── Header index ────────────────────────────────────────────────────────────

/// Position of every canonical column within a concrete header row.
///
/// When a header repeats a column name the first occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
  positions: HashMap<Column, usize>,
}

impl HeaderIndex {
  pub fn new(header: &[String]) -> Self {
    let mut positions = HashMap::new();
    for (i, name) in header.iter().enumerate() {
      if let Some(column) = Column::from_name(name) {
        positions.entry(column).or_insert(i);
      }
    }
    Self { positions }
  }

  /// The trimmed cell for `column`, or `""` if the column or cell is absent.
  pub fn get<'r>(&self, column: Column, row: &'r [String]) -> &'r str {
    self
      .positions
      .get(&column)
      .and_then(|&i| row.get(i))
      .map(|s| s.trim())
      .unwrap_or("")
  }
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn encode_timestamp(ts: DateTime<Utc>) -> String {
  ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse RFC 3339, falling back to naive ISO-8601 local times (interpreted
/// as UTC) as written by spreadsheet users and older exports.
pub fn decode_timestamp(s: &str) -> Result<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .map(|naive| naive.and_utc())
    .ok_or_else(|| Error::InvalidTimestamp(s.to_owned()))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::schema::canonical_header;

  fn sample() -> Record {
    Record {
      timestamp:       Some(Utc.with_ymd_and_hms(2024, 3, 4, 8, 30, 0).unwrap()),
      registration_id: Some(Uuid::nil()),
      person:          Person {
        name:        "Ana Gómez".into(),
        national_id: "1234567-8".into(),
        phone:       None,
        email:       Some("ana@example.com".into()),
      },
      vehicle:         Vehicle {
        vehicle_model: Some("Toyota Corolla".into()),
        color:         None,
        plate:         "ABC123".into(),
      },
      location:        Location {
        unit:  "Anestesia".into(),
        box_:  Some("Box 12".into()),
        place: None,
      },
      slot:            Slot { day: Weekday::Wednesday, hour: Hour::new(8).unwrap() },
      note:            None,
      origin:          "web".into(),
    }
  }

  #[test]
  fn weekday_names_follow_stored_spelling() {
    let names: Vec<_> = Weekday::all().map(Weekday::as_str).collect();
    assert_eq!(names, [
      "Lunes",
      "Martes",
      "Miércoles",
      "Jueves",
      "Viernes",
      "Sábado",
      "Domingo"
    ]);
    assert_eq!(Weekday::parse(" Miercoles ").unwrap(), Weekday::Wednesday);
    assert_eq!(Weekday::parse("lunes").unwrap(), Weekday::Monday);
    assert!(matches!(Weekday::parse("Funday"), Err(Error::UnknownWeekday(_))));
  }

  #[test]
  fn weekday_serde_uses_stored_names() {
    let json = serde_json::to_string(&Weekday::Saturday).unwrap();
    assert_eq!(json, "\"Sábado\"");
    let back: Weekday = serde_json::from_str("\"Sabado\"").unwrap();
    assert_eq!(back, Weekday::Saturday);
  }

  #[test]
  fn hour_bounds() {
    assert!(Hour::new(0).is_some());
    assert!(Hour::new(24).is_some());
    assert!(Hour::new(25).is_none());
    assert_eq!(Hour::all().count(), 25);
    assert_eq!("8".parse::<Hour>().unwrap().get(), 8);
    assert_eq!(" 9.0 ".parse::<Hour>().unwrap().get(), 9);
    assert!("8.5".parse::<Hour>().is_err());
    assert!("25".parse::<Hour>().is_err());
    assert!("-1".parse::<Hour>().is_err());
    assert!(serde_json::from_str::<Hour>("30").is_err());
  }

  #[test]
  fn row_layout_follows_header() {
    let record = sample();
    let header: Vec<String> =
      ["plate", "extra", "day_of_week", "hour"].map(String::from).into();
    assert_eq!(record.to_row(&header), ["ABC123", "", "Miércoles", "8"]);
  }

  #[test]
  fn row_decodes_back_by_header_name() {
    let record = sample();
    let header = canonical_header();
    let row = record.to_row(&header);
    let decoded = Record::from_row(&HeaderIndex::new(&header), &row).unwrap();
    assert_eq!(decoded, record);
  }

  #[test]
  fn row_with_bad_day_is_rejected() {
    let header = canonical_header();
    let mut row = sample().to_row(&header);
    let day_pos = header.iter().position(|h| h == "day_of_week").unwrap();
    row[day_pos] = "Someday".into();
    let err = Record::from_row(&HeaderIndex::new(&header), &row).unwrap_err();
    assert!(matches!(err, Error::UnknownWeekday(_)));
  }

  #[test]
  fn naive_timestamps_are_read_as_utc() {
    let ts = decode_timestamp("2024-03-04T08:30:00").unwrap();
    assert_eq!(encode_timestamp(ts), "2024-03-04T08:30:00Z");
    assert!(decode_timestamp("yesterday").is_err());
  }

  #[test]
  fn record_json_is_flat() {
    let value = serde_json::to_value(sample()).unwrap();
    assert_eq!(value["plate"], "ABC123");
    assert_eq!(value["day_of_week"], "Miércoles");
    assert_eq!(value["hour"], 8);
    assert_eq!(value["box"], "Box 12");
  }
}
