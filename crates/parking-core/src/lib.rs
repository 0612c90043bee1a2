//! Core types and trait definitions for the parking reservation store.
//!
//! No HTTP or database dependencies live here; every other crate builds
//! on these types.

pub mod error;
pub mod normalize;
pub mod record;
pub mod report;
pub mod schema;
pub mod sheet;
pub mod submission;

pub use error::{Error, Result};
