//! Query-string filters shared by the dashboard endpoints.
//!
//! Every dimension is a comma-separated list; an absent or blank parameter
//! places no restriction on that dimension.

use std::collections::BTreeSet;

use parking_core::{
  record::{Hour, Weekday},
  report::RecordFilter,
};
use serde::Deserialize;

use crate::error::ApiError;

/// `?unit=Anestesia,Cirugía&day=Lunes&hour=8,9`
#[derive(Debug, Deserialize, Default)]
pub struct FilterParams {
  pub unit: Option<String>,
  pub day:  Option<String>,
  pub hour: Option<String>,
}

impl FilterParams {
  pub fn to_filter(&self) -> Result<RecordFilter, ApiError> {
    Ok(RecordFilter {
      units: list(&self.unit, |s| Ok(s.to_owned()))?,
      days:  list(&self.day, |s| Weekday::parse(s).map_err(bad_request))?,
      hours: list(&self.hour, |s| s.parse::<Hour>().map_err(bad_request))?,
    })
  }
}

fn bad_request(e: parking_core::Error) -> ApiError { ApiError::BadRequest(e.to_string()) }

fn list<T: Ord>(
  raw: &Option<String>,
  parse: impl Fn(&str) -> Result<T, ApiError>,
) -> Result<Option<BTreeSet<T>>, ApiError> {
  let Some(raw) = raw else { return Ok(None) };
  let items = raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(parse)
    .collect::<Result<BTreeSet<T>, _>>()?;
  Ok((!items.is_empty()).then_some(items))
}
