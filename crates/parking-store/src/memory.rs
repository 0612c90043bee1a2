//! [`MemorySheet`]: an in-process [`Sheet`] for tests and demos.

use std::sync::{
  Arc, Mutex, MutexGuard, PoisonError,
  atomic::{AtomicBool, AtomicUsize, Ordering},
};

use parking_core::sheet::Sheet;

use crate::{Error, Result};

#[derive(Default)]
struct Inner {
  values:        Mutex<Vec<Vec<String>>>,
  offline:       AtomicBool,
  header_writes: AtomicUsize,
}

/// A sheet held in memory. Clones share the same rows.
///
/// While offline every operation fails with [`Error::Offline`], which
/// classifies as unreachable.
#[derive(Clone, Default)]
pub struct MemorySheet {
  inner: Arc<Inner>,
}

impl MemorySheet {
  pub fn new() -> Self { Self::default() }

  /// A sheet that already holds `values` (header first).
  pub fn with_values(values: Vec<Vec<String>>) -> Self {
    Self {
      inner: Arc::new(Inner { values: Mutex::new(values), ..Default::default() }),
    }
  }

  pub fn set_offline(&self, offline: bool) { self.inner.offline.store(offline, Ordering::SeqCst); }

  /// A copy of every row, header first.
  pub fn values(&self) -> Vec<Vec<String>> { self.lock().clone() }

  /// How many times the header row has been written.
  pub fn header_writes(&self) -> usize { self.inner.header_writes.load(Ordering::SeqCst) }

  fn lock(&self) -> MutexGuard<'_, Vec<Vec<String>>> {
    self.inner.values.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn online(&self) -> Result<()> {
    if self.inner.offline.load(Ordering::SeqCst) {
      return Err(Error::Offline);
    }
    Ok(())
  }
}

impl Sheet for MemorySheet {
  type Error = Error;

  // The sheet exists from construction.
  async fn ensure_sheet(&self) -> Result<()> { self.online() }

  async fn read_values(&self) -> Result<Vec<Vec<String>>> {
    self.online()?;
    Ok(self.values())
  }

  async fn header(&self) -> Result<Option<Vec<String>>> {
    self.online()?;
    Ok(self.lock().first().cloned())
  }

  async fn set_header(&self, header: Vec<String>) -> Result<()> {
    self.online()?;
    let mut values = self.lock();
    match values.first_mut() {
      Some(first) => *first = header,
      None => values.push(header),
    }
    self.inner.header_writes.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }

  async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<()> {
    self.online()?;
    self.lock().extend(rows);
    Ok(())
  }
}
