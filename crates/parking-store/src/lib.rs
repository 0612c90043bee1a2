//! The record store client for the parking reservation store.
//!
//! [`RecordStore`] appends submissions to a primary [`Sheet`] and reads the
//! full record set back through an ordered fallback chain (primary sheet,
//! then published CSV snapshots), behind a time-bounded read cache.
//!
//! This crate also provides the Google Sheets backend ([`GoogleSheet`]) and
//! an in-process [`MemorySheet`].
//!
//! [`Sheet`]: parking_core::sheet::Sheet

pub mod cache;
pub mod credentials;
pub mod error;
pub mod google;
pub mod memory;
pub mod snapshot;
pub mod store;

use std::time::Duration;

pub use cache::ReadCache;
pub use credentials::{AccessToken, CredentialSource};
pub use error::{Error, Result};
pub use google::GoogleSheet;
pub use memory::MemorySheet;
pub use snapshot::SnapshotSource;
pub use store::{
  AppendReceipt, Primary, ReadFailure, ReadOrigin, ReadOutcome, ReadStrategy, RecordStore,
  WriteError,
};

/// Build the HTTP client shared by the Google Sheets backend and snapshot
/// downloads.
pub fn http_client() -> Result<reqwest::Client> {
  Ok(
    reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?,
  )
}
