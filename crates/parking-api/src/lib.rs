//! JSON REST API for the parking reservation store.
//!
//! Exposes an axum [`Router`] backed by a [`RecordStore`] over any
//! [`Sheet`]. TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", parking_api::api_router(state))
//! ```
//!
//! [`Sheet`]: parking_core::sheet::Sheet

pub mod error;
pub mod filter;
pub mod records;
pub mod report;
pub mod submissions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use parking_core::{sheet::Sheet, submission::DEFAULT_ORIGIN};
use parking_store::RecordStore;

pub use error::ApiError;

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:  Arc<RecordStore<S>>,
  /// Origin tag given to submissions that do not name one.
  pub origin: Arc<str>,
}

impl<S> ApiState<S> {
  pub fn new(store: RecordStore<S>) -> Self {
    Self { store: Arc::new(store), origin: Arc::from(DEFAULT_ORIGIN) }
  }

  pub fn with_origin(mut self, origin: &str) -> Self {
    self.origin = Arc::from(origin);
    self
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), origin: Arc::clone(&self.origin) }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: Sheet + 'static,
{
  Router::new()
    // Form
    .route("/options", get(submissions::options))
    .route("/submissions", post(submissions::create::<S>))
    // Dashboard
    .route("/records", get(records::list::<S>))
    .route("/facets", get(records::facets::<S>))
    .route("/report", get(report::handler::<S>))
    .route("/export", get(records::export::<S>))
    .with_state(state)
}
