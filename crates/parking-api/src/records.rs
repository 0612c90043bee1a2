//! Handlers for reading persisted records.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/records` | `?unit`, `?day`, `?hour` (comma-separated) |
//! | `GET`  | `/facets`  | Filter choices present in the data |
//! | `GET`  | `/export`  | Filtered CSV download |

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
  http::header,
  response::IntoResponse,
};
use chrono::Local;
use parking_core::{record::Record, report::Facets, sheet::Sheet};
use parking_store::ReadOrigin;
use serde::Serialize;

use crate::{ApiState, error::ApiError, filter::FilterParams};

#[derive(Debug, Serialize)]
pub struct RecordList {
  pub origin:  ReadOrigin,
  pub records: Vec<Record>,
}

/// `GET /records[?unit=...][&day=...][&hour=...]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  params: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Json<RecordList>, ApiError>
where
  S: Sheet + 'static,
{
  let Query(params) = params?;
  let filter = params.to_filter()?;
  let outcome = state.store.read_all().await;
  let records = filter.apply(&outcome.records).into_iter().cloned().collect();
  Ok(Json(RecordList { origin: outcome.origin.clone(), records }))
}

/// `GET /facets`
pub async fn facets<S>(State(state): State<ApiState<S>>) -> Json<Facets>
where
  S: Sheet + 'static,
{
  let outcome = state.store.read_all().await;
  Json(Facets::collect(&outcome.records))
}

/// `GET /export[?unit=...][&day=...][&hour=...]` returns `text/csv` with a BOM,
/// served as an attachment named after the current local time.
pub async fn export<S>(
  State(state): State<ApiState<S>>,
  params: Result<Query<FilterParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Sheet + 'static,
{
  let Query(params) = params?;
  let filter = params.to_filter()?;
  let outcome = state.store.read_all().await;
  let body = parking_csv::export_records(filter.apply(&outcome.records))?;
  let filename = parking_csv::export_filename(Local::now().naive_local());

  Ok((
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
      (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
    ],
    body,
  ))
}
