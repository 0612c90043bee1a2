//! Error types for `parking-core`.

use thiserror::Error;

use crate::submission::Requirement;

#[derive(Debug, Error)]
pub enum Error {
  #[error("incomplete submission, required: {}", Requirement::join(.0))]
  Validation(Vec<Requirement>),

  #[error("hour out of range 0..=24: {0:?}")]
  InvalidHour(String),

  #[error("unknown day of week: {0:?}")]
  UnknownWeekday(String),

  #[error("invalid timestamp: {0:?}")]
  InvalidTimestamp(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
