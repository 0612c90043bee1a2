//! A single-slot, time-bounded read cache.

use std::{
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use tokio::time::Instant;

/// Default time-to-live of a cached read.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Holds at most one value and the instant it was stored. A value older
/// than the TTL is never served.
///
/// Every [`invalidate`](Self::invalidate) bumps an epoch. A reader that
/// captured the epoch before a slow load can store its result with
/// [`put_since`](Self::put_since), which refuses values made stale by an
/// invalidation in the meantime.
pub struct ReadCache<T> {
  ttl:  Duration,
  slot: Mutex<Slot<T>>,
}

struct Slot<T> {
  value: Option<(Arc<T>, Instant)>,
  epoch: u64,
}

impl<T> ReadCache<T> {
  pub fn new(ttl: Duration) -> Self {
    Self { ttl, slot: Mutex::new(Slot { value: None, epoch: 0 }) }
  }

  pub fn ttl(&self) -> Duration { self.ttl }

  fn lock(&self) -> MutexGuard<'_, Slot<T>> {
    self.slot.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// The cached value, if one is present and still fresh.
  pub fn get(&self) -> Option<Arc<T>> {
    self
      .lock()
      .value
      .as_ref()
      .filter(|(_, at)| at.elapsed() < self.ttl)
      .map(|(value, _)| Arc::clone(value))
  }

  /// Store `value` as of now, replacing whatever was cached.
  pub fn put(&self, value: Arc<T>) { self.lock().value = Some((value, Instant::now())); }

  /// The current invalidation epoch.
  pub fn epoch(&self) -> u64 { self.lock().epoch }

  /// Store `value` only if nothing was invalidated since `epoch` was read.
  /// Returns whether the value was stored.
  pub fn put_since(&self, value: Arc<T>, epoch: u64) -> bool {
    let mut slot = self.lock();
    if slot.epoch != epoch {
      return false;
    }
    slot.value = Some((value, Instant::now()));
    true
  }

  pub fn invalidate(&self) {
    let mut slot = self.lock();
    slot.value = None;
    slot.epoch += 1;
  }
}

impl<T> Default for ReadCache<T> {
  fn default() -> Self { Self::new(DEFAULT_TTL) }
}
