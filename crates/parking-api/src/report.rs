//! Handler for `GET /report`.

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use parking_core::{
  report::{DEFAULT_TOP_PERSONS, Report},
  sheet::Sheet,
};
use parking_store::{ReadFailure, ReadOrigin};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError, filter::FilterParams};

/// Same filters as `/records`, plus the length of the top-persons list.
#[derive(Debug, Deserialize, Default)]
pub struct ReportParams {
  pub unit: Option<String>,
  pub day:  Option<String>,
  pub hour: Option<String>,
  pub top:  Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
  #[serde(flatten)]
  pub report:        Report,
  pub origin:        ReadOrigin,
  pub rejected_rows: usize,
  pub failures:      Vec<ReadFailure>,
  /// Set when there is nothing to show.
  pub warning:       Option<String>,
}

/// `GET /report[?unit=...][&day=...][&hour=...][&top=20]`
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  params: Result<Query<ReportParams>, QueryRejection>,
) -> Result<Json<ReportResponse>, ApiError>
where
  S: Sheet + 'static,
{
  let Query(params) = params?;
  let filter = FilterParams { unit: params.unit, day: params.day, hour: params.hour }
    .to_filter()?;
  let outcome = state.store.read_all().await;
  let report =
    Report::build(&outcome.records, &filter, params.top.unwrap_or(DEFAULT_TOP_PERSONS));

  let warning = match (&outcome.origin, outcome.records.is_empty()) {
    (ReadOrigin::Empty, _) => Some("no data source could be read".to_owned()),
    (_, true) => Some("no records yet".to_owned()),
    _ => None,
  };

  Ok(Json(ReportResponse {
    report,
    origin: outcome.origin.clone(),
    rejected_rows: outcome.rejected_rows,
    failures: outcome.failures.clone(),
    warning,
  }))
}
