//! Cache layer that orchestrates cache lookups with network fetching.

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use tracing::{debug, warn};

use super::traits::{CacheKey, CacheResult, SharedCache};

/// Cache layer that sits between the data-access code and the network.
///
/// Unlike a read-through cache with offline fallback, failures are never
/// masked: a failed fetch is returned to the caller and the previous entry
/// is left untouched.
#[derive(Clone)]
pub struct CacheLayer {
  store: SharedCache,
}

impl CacheLayer {
  pub fn new(store: SharedCache) -> Self {
    Self { store }
  }

  /// Drop every cached entry. Called after any successful mutation.
  pub fn invalidate_all(&self) {
    self.store.clear();
  }

  /// Fetch with a cache-first strategy.
  ///
  /// 1. Unless `force` is set, return a live cache entry immediately
  /// 2. Otherwise call `fetcher` (exactly one network round trip)
  /// 3. Store the result and return it
  ///
  /// An entry that no longer deserializes into `T` is treated as a miss.
  /// If the cache was invalidated while the fetcher ran, the result is still
  /// returned but not stored: it may predate the mutation that cleared it.
  pub async fn fetch<T, E, F, Fut>(
    &self,
    key: &CacheKey,
    force: bool,
    fetcher: F,
  ) -> Result<CacheResult<T>, E>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    if !force {
      if let Some(cached) = self.store.get(key.as_str()) {
        match serde_json::from_value::<T>(cached) {
          Ok(data) => return Ok(CacheResult::from_cache(data)),
          Err(e) => debug!(key = %key, error = %e, "discarding undecodable cache entry"),
        }
      }
    }

    let epoch = self.store.epoch();
    let data = fetcher().await?;

    match serde_json::to_value(&data) {
      Ok(value) => {
        self.store.set_since(key.as_str(), value, epoch);
      }
      Err(e) => warn!(key = %key, error = %e, "failed to serialize fetched data for cache"),
    }

    Ok(CacheResult::from_network(data))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, TtlCache};
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;
  use std::time::Duration;
  use tokio::sync::oneshot;

  fn layer() -> CacheLayer {
    CacheLayer::new(Arc::new(TtlCache::new(Duration::from_secs(60))))
  }

  #[tokio::test]
  async fn test_second_fetch_hits_cache() {
    let layer = layer();
    let calls = AtomicUsize::new(0);
    let key = CacheKey::new("numbers");

    let fetch = || async {
      calls.fetch_add(1, Ordering::SeqCst);
      Ok::<_, String>(vec![1, 2, 3])
    };

    let first = layer.fetch(&key, false, fetch).await.unwrap();
    let second = layer.fetch(&key, false, fetch).await.unwrap();

    assert_eq!(first.source, CacheSource::Api);
    assert_eq!(second.source, CacheSource::Cache);
    assert_eq!(first.data, second.data);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_force_bypasses_fresh_entry() {
    let layer = layer();
    let calls = AtomicUsize::new(0);
    let key = CacheKey::new("numbers");

    let fetch = || async {
      let n = calls.fetch_add(1, Ordering::SeqCst);
      Ok::<_, String>(n)
    };

    layer.fetch(&key, false, fetch).await.unwrap();
    let forced = layer.fetch(&key, true, fetch).await.unwrap();

    assert_eq!(forced.source, CacheSource::Api);
    assert_eq!(forced.data, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_failure_keeps_previous_entry() {
    let layer = layer();
    let key = CacheKey::new("numbers");

    layer
      .fetch(&key, false, || async { Ok::<_, String>(vec![7]) })
      .await
      .unwrap();

    let failed = layer
      .fetch(&key, true, || async { Err::<Vec<i32>, _>("boom".to_string()) })
      .await;
    assert_eq!(failed.unwrap_err(), "boom");

    let cached = layer
      .fetch(&key, false, || async { Ok::<_, String>(vec![0]) })
      .await
      .unwrap();
    assert_eq!(cached.data, vec![7]);
  }

  #[tokio::test]
  async fn test_fetch_outliving_invalidation_does_not_refill_cache() {
    let layer = layer();
    let key = CacheKey::new("personnel").param("school", 38);
    let (started_tx, started_rx) = oneshot::channel::<()>();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    let slow = tokio::spawn({
      let layer = layer.clone();
      let key = key.clone();
      async move {
        layer
          .fetch(&key, true, || async move {
            let _ = started_tx.send(());
            let _ = release_rx.await;
            Ok::<_, String>(vec!["Ancien".to_string()])
          })
          .await
      }
    });
    started_rx.await.unwrap();

    // A mutation lands while the slow fetch is in flight
    layer.invalidate_all();
    layer
      .fetch(&key, true, || async { Ok::<_, String>(vec!["Nouveau".to_string()]) })
      .await
      .unwrap();
    release_tx.send(()).unwrap();

    let stale = slow.await.unwrap().unwrap();
    assert_eq!(stale.data, vec!["Ancien".to_string()]);
    assert_eq!(stale.source, CacheSource::Api);

    let reopened = layer
      .fetch(&key, false, || async { Ok::<_, String>(vec!["réseau".to_string()]) })
      .await
      .unwrap();
    assert_eq!(reopened.source, CacheSource::Cache);
    assert_eq!(reopened.data, vec!["Nouveau".to_string()]);
  }
}
