//! Core traits and types for the caching system.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Source of the current time for expiry checks.
///
/// The cache never calls `Instant::now()` directly so tests can drive expiry
/// with a [`ManualClock`].
pub trait Clock: Send + Sync {
  fn now(&self) -> Instant;
}

/// Wall clock used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> Instant {
    Instant::now()
  }
}

/// Clock that only moves when told to.
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
  now: std::sync::Mutex<Instant>,
}

#[cfg(test)]
impl ManualClock {
  pub fn new() -> Self {
    Self {
      now: std::sync::Mutex::new(Instant::now()),
    }
  }

  pub fn advance(&self, by: std::time::Duration) {
    let mut now = self.now.lock().unwrap();
    *now += by;
  }
}

#[cfg(test)]
impl Clock for ManualClock {
  fn now(&self) -> Instant {
    *self.now.lock().unwrap()
  }
}

#[cfg(test)]
impl Clock for Arc<ManualClock> {
  fn now(&self) -> Instant {
    self.as_ref().now()
  }
}

/// Key/value store with expiry, shared by every data-access module.
///
/// Values are serialized records. There is no per-key invalidation: a lookup
/// either hits a live entry or misses, and mutations wipe the whole store.
pub trait CacheStore: Send + Sync {
  /// Return the value iff present and not expired. Expired entries are purged.
  fn get(&self, key: &str) -> Option<Value>;

  /// Store a value stamped with the current time and the store's TTL.
  fn set(&self, key: &str, value: Value);

  /// Store a value only if no `clear` happened since `epoch` was read.
  /// Returns false when the write was dropped.
  fn set_since(&self, key: &str, value: Value, epoch: u64) -> bool;

  /// Drop every entry and advance the epoch.
  fn clear(&self);

  /// Number of `clear` calls so far.
  fn epoch(&self) -> u64;

  /// Keys of live (non-expired) entries.
  fn keys(&self) -> Vec<String>;

  fn len(&self) -> usize {
    self.keys().len()
  }

  fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Handle passed into data-access code instead of a module-level singleton.
pub type SharedCache = Arc<dyn CacheStore>;

/// Cache key built from an entity name and its filter parameters.
///
/// Parameters keep their declaration order so `personnel:school=38` and
/// `personnel:school=39` never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
  pub fn new(entity: &str) -> Self {
    Self(entity.to_string())
  }

  /// Append a `name=value` segment.
  pub fn param(mut self, name: &str, value: impl fmt::Display) -> Self {
    self.0.push(':');
    self.0.push_str(name);
    self.0.push('=');
    self.0.push_str(&value.to_string());
    self
  }

  /// Append a free-form segment (e.g. a detail path).
  pub fn segment(mut self, segment: &str) -> Self {
    self.0.push(':');
    self.0.push_str(segment);
    self
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Result from a cache operation, including data and where it came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  pub data: T,
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Api,
    }
  }

  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }
}

/// Indicates where fetched data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
  /// Served from a live cache entry
  Cache,
  /// Fresh data from the backend
  Api,
}

impl CacheSource {
  pub fn label(&self) -> &'static str {
    match self {
      CacheSource::Cache => "cache",
      CacheSource::Api => "api",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cache_key_keeps_parameter_order() {
    let key = CacheKey::new("affectations").param("school", 38).param("year", 226);
    assert_eq!(key.as_str(), "affectations:school=38:year=226");
  }

  #[test]
  fn test_cache_key_distinguishes_parameters() {
    let a = CacheKey::new("personnel").param("school", 38);
    let b = CacheKey::new("personnel").param("school", 39);
    assert_ne!(a, b);
  }

  #[test]
  fn test_manual_clock_advances() {
    let clock = ManualClock::new();
    let start = clock.now();
    clock.advance(std::time::Duration::from_secs(5));
    assert_eq!(clock.now() - start, std::time::Duration::from_secs(5));
  }
}
