//! SQLite backend for the parking store.
//!
//! Provides [`SqliteSheet`], a durable local [`parking_core::sheet::Sheet`].
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime.

mod encode;
mod schema;
mod sheet;

pub mod error;

pub use error::{Error, Result};
pub use sheet::SqliteSheet;

#[cfg(test)]
mod tests;
