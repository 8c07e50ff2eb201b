//! Mutex-guarded in-memory TTL store.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

use super::traits::{CacheStore, Clock, SystemClock};

/// Default time-to-live applied to every entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
  value: Value,
  stored_at: Instant,
}

#[derive(Default)]
struct Entries {
  map: HashMap<String, CacheEntry>,
  /// Bumped by every `clear`
  epoch: u64,
}

/// In-memory cache with a single global TTL.
///
/// Expiry is lazy: an entry past its TTL is removed the next time it is read
/// or when keys are listed. The map sits behind a `Mutex` because fetches run
/// on tokio worker threads.
pub struct TtlCache<C: Clock = SystemClock> {
  entries: Mutex<Entries>,
  ttl: Duration,
  clock: C,
}

impl TtlCache<SystemClock> {
  pub fn new(ttl: Duration) -> Self {
    Self::with_clock(ttl, SystemClock)
  }
}

impl Default for TtlCache<SystemClock> {
  fn default() -> Self {
    Self::new(DEFAULT_TTL)
  }
}

impl<C: Clock> TtlCache<C> {
  pub fn with_clock(ttl: Duration, clock: C) -> Self {
    Self {
      entries: Mutex::new(Entries::default()),
      ttl,
      clock,
    }
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
    now.saturating_duration_since(entry.stored_at) >= self.ttl
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
    // A panic while holding the lock cannot leave the map half-written,
    // so a poisoned guard is still usable.
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl<C: Clock> CacheStore for TtlCache<C> {
  fn get(&self, key: &str) -> Option<Value> {
    let now = self.clock.now();
    let mut entries = self.lock();

    match entries.map.get(key) {
      Some(entry) if !self.is_expired(entry, now) => {
        debug!(key, "cache hit");
        Some(entry.value.clone())
      }
      Some(_) => {
        entries.map.remove(key);
        debug!(key, "cache entry expired");
        None
      }
      None => {
        debug!(key, "cache miss");
        None
      }
    }
  }

  fn set(&self, key: &str, value: Value) {
    let stored_at = self.clock.now();
    self
      .lock()
      .map
      .insert(key.to_string(), CacheEntry { value, stored_at });
    debug!(key, ttl_secs = self.ttl.as_secs(), "cache set");
  }

  fn set_since(&self, key: &str, value: Value, epoch: u64) -> bool {
    let stored_at = self.clock.now();
    let mut entries = self.lock();
    if entries.epoch != epoch {
      debug!(key, epoch, current = entries.epoch, "cache cleared since fetch started, not storing");
      return false;
    }
    entries.map.insert(key.to_string(), CacheEntry { value, stored_at });
    debug!(key, ttl_secs = self.ttl.as_secs(), "cache set");
    true
  }

  fn clear(&self) {
    let mut entries = self.lock();
    let count = entries.map.len();
    entries.map.clear();
    entries.epoch += 1;
    debug!(count, epoch = entries.epoch, "cache cleared");
  }

  fn epoch(&self) -> u64 {
    self.lock().epoch
  }

  fn keys(&self) -> Vec<String> {
    let now = self.clock.now();
    let mut entries = self.lock();
    entries.map.retain(|_, entry| !self.is_expired(entry, now));
    let mut keys: Vec<String> = entries.map.keys().cloned().collect();
    keys.sort();
    keys
  }
}
