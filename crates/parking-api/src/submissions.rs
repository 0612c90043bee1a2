//! Handlers for the reservation form.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/options` | Days and hours the form offers |
//! | `POST` | `/submissions` | Body: [`SubmissionBody`]; returns 201 + [`SubmissionCreated`] |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use parking_core::{
  record::{Hour, Weekday},
  sheet::Sheet,
  submission::SubmissionForm,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── Options ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct FormOptions {
  pub days:  Vec<Weekday>,
  pub hours: Vec<Hour>,
}

/// `GET /options`
pub async fn options() -> Json<FormOptions> {
  Json(FormOptions { days: Weekday::all().collect(), hours: Hour::all().collect() })
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /submissions`: the form fields plus an
/// optional origin tag.
#[derive(Debug, Deserialize)]
pub struct SubmissionBody {
  #[serde(flatten)]
  pub form:   SubmissionForm,
  pub origin: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionCreated {
  pub registration_id: Uuid,
  pub rows:            usize,
}

/// `POST /submissions`: validates, expands into one record per slot and
/// appends them. 400 on missing fields or an unreadable body, 502 when the
/// sheet write fails.
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<SubmissionBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Sheet + 'static,
{
  let Json(body) = body?;
  let origin = body
    .origin
    .filter(|o| !o.trim().is_empty())
    .unwrap_or_else(|| state.origin.to_string());
  let submission = body.form.validate()?.with_origin(origin);

  let registration_id = Uuid::new_v4();
  let records = submission.build_records_with_id(registration_id, Utc::now());
  let receipt = state.store.append(&records).await?;

  info!(%registration_id, rows = receipt.rows, "submission stored");
  Ok((StatusCode::CREATED, Json(SubmissionCreated { registration_id, rows: receipt.rows })))
}
