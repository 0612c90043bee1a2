//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use parking_core::submission::Requirement;
use parking_store::WriteError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler. Every variant renders as a JSON
/// body with an `error` message.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  /// The submission lacks required fields; nothing was written.
  #[error("{source}")]
  Validation {
    missing: Vec<Requirement>,
    #[source]
    source:  parking_core::Error,
  },

  /// The primary sheet refused or failed the append.
  #[error("write failed: {0}")]
  Write(#[from] WriteError),

  #[error("export failed: {0}")]
  Export(#[from] parking_csv::Error),
}

impl From<parking_core::Error> for ApiError {
  fn from(e: parking_core::Error) -> Self {
    match e {
      parking_core::Error::Validation(ref missing) => {
        ApiError::Validation { missing: missing.clone(), source: e }
      }
      other => ApiError::BadRequest(other.to_string()),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Validation { missing, source } => (
        StatusCode::BAD_REQUEST,
        json!({ "error": source.to_string(), "missing": missing }),
      ),
      ApiError::Write(e) => (
        StatusCode::BAD_GATEWAY,
        json!({ "error": e.message, "kind": e.kind }),
      ),
      ApiError::Export(e) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() })),
    };
    (status, Json(body)).into_response()
  }
}
