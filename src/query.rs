//! Fetch pipeline: cache check, network call, normalization, view state.
//!
//! Inspired by TanStack Query. [`DataSource::fetch_list`] runs one fetch end
//! to end; [`FetchHook`] wraps it for views, running fetches on tokio tasks and
//! exposing loading/error/performance state that the event loop polls.
//!
//! # Example
//!
//! ```ignore
//! let mut hook = FetchHook::<Personnel>::new(source.clone(), SchoolParams { school_id: 38 });
//! hook.fetch();
//!
//! // In event loop tick
//! if hook.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // After a successful mutation
//! source.cache().invalidate_all();
//! hook.refresh();
//! ```

use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, Endpoint, Error, ErrorInfo, Result};
use crate::cache::{CacheKey, CacheLayer, CacheSource, SharedCache};
use crate::entities::Entity;

/// Timing and provenance of the last completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Performance {
  pub duration: Duration,
  pub source: CacheSource,
  pub item_count: usize,
}

/// Data plus performance telemetry.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
  pub data: T,
  pub performance: Performance,
}

/// Client and cache handed to every data-access call.
#[derive(Clone)]
pub struct DataSource {
  client: ApiClient,
  cache: CacheLayer,
}

impl DataSource {
  pub fn new(client: ApiClient, cache: SharedCache) -> Self {
    Self {
      client,
      cache: CacheLayer::new(cache),
    }
  }

  pub fn client(&self) -> &ApiClient {
    &self.client
  }

  pub fn cache(&self) -> &CacheLayer {
    &self.cache
  }

  /// Fetch and normalize an entity list.
  ///
  /// 1. Build the cache key from entity name + params
  /// 2. Unless `force`, serve a live cache entry
  /// 3. Otherwise GET the list endpoint once
  /// 4. Normalize every element and store the result
  pub async fn fetch_list<E: Entity>(
    &self,
    params: &E::Params,
    force: bool,
  ) -> Result<Fetched<Vec<E::Record>>> {
    let started = Instant::now();
    let key = E::cache_key(params);
    let endpoint = E::list_endpoint(params);

    let result = self
      .cache
      .fetch(&key, force, || async {
        let raw = self.client.get_json(&endpoint).await?;
        normalize_list::<E>(raw)
      })
      .await?;

    let performance = Performance {
      duration: started.elapsed(),
      source: result.source,
      item_count: result.data.len(),
    };
    info!(
      entity = E::NAME,
      key = %key,
      source = performance.source.label(),
      items = performance.item_count,
      duration_ms = performance.duration.as_millis() as u64,
      "fetched list"
    );

    Ok(Fetched {
      data: result.data,
      performance,
    })
  }

  /// Fetch and normalize a single object (detail screens).
  pub async fn fetch_object<E: Entity>(
    &self,
    endpoint: Endpoint,
    force: bool,
  ) -> Result<Fetched<E::Record>> {
    let started = Instant::now();
    let key = CacheKey::new(E::NAME).segment("detail").segment(&endpoint.path());

    let result = self
      .cache
      .fetch(&key, force, || async {
        let raw = self.client.get_json(&endpoint).await?;
        let raw = unwrap_envelope(raw);
        if raw.is_null() {
          return Err(Error::Decode(format!("{} introuvable", endpoint.path())));
        }
        E::normalize(&raw)
      })
      .await?;

    Ok(Fetched {
      data: result.data,
      performance: Performance {
        duration: started.elapsed(),
        source: result.source,
        item_count: 1,
      },
    })
  }
}

/// Peel `{data: ...}` / `{content: ...}` / `{items: ...}` wrappers.
fn unwrap_envelope(raw: Value) -> Value {
  match raw {
    Value::Object(mut obj) => {
      for key in ["data", "content", "items"] {
        if obj.get(key).map_or(false, |v| v.is_array() || v.is_object()) {
          if let Some(inner) = obj.remove(key) {
            return inner;
          }
        }
      }
      Value::Object(obj)
    }
    other => other,
  }
}

/// Normalize a list payload: a bare array, a wrapped array, or `null`.
pub fn normalize_list<E: Entity>(raw: Value) -> Result<Vec<E::Record>> {
  match unwrap_envelope(raw) {
    Value::Array(items) => items.iter().map(E::normalize).collect(),
    Value::Null => Ok(Vec::new()),
    other => Err(Error::Decode(format!(
      "liste attendue pour {}, reçu {}",
      E::NAME,
      json_kind(&other)
    ))),
  }
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "booléen",
    Value::Number(_) => "nombre",
    Value::String(_) => "texte",
    Value::Array(_) => "tableau",
    Value::Object(_) => "objet",
  }
}

/// What a view renders: rows, loading flag, last error, last performance.
#[derive(Debug, Clone)]
pub struct FetchState<T> {
  pub data: Vec<T>,
  pub loading: bool,
  pub error: Option<ErrorInfo>,
  pub performance: Option<Performance>,
}

impl<T> Default for FetchState<T> {
  fn default() -> Self {
    Self {
      data: Vec::new(),
      loading: false,
      error: None,
      performance: None,
    }
  }
}

type FetchMessage<T> = (u64, std::result::Result<Fetched<Vec<T>>, ErrorInfo>);

/// Per-view handle on an entity list.
///
/// Every run is stamped with a generation number. Only the result of the
/// most recently issued run is applied; anything older that arrives later
/// is dropped, so a slow response can never overwrite a newer one.
/// Dropping the hook drops the receiver and late results vanish with it.
pub struct FetchHook<E: Entity> {
  source: DataSource,
  params: E::Params,
  refresh_trigger: u64,
  generation: u64,
  state: FetchState<E::Record>,
  tx: mpsc::UnboundedSender<FetchMessage<E::Record>>,
  rx: mpsc::UnboundedReceiver<FetchMessage<E::Record>>,
}

impl<E: Entity> FetchHook<E> {
  pub fn new(source: DataSource, params: E::Params) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      source,
      params,
      refresh_trigger: 0,
      generation: 0,
      state: FetchState::default(),
      tx,
      rx,
    }
  }

  pub fn state(&self) -> &FetchState<E::Record> {
    &self.state
  }

  pub fn data(&self) -> &[E::Record] {
    &self.state.data
  }

  /// Start a cache-first fetch. No-op while a fetch is in flight.
  pub fn fetch(&mut self) {
    if self.state.loading {
      return;
    }
    self.run(false);
  }

  /// Bump the refresh trigger and fetch from the network, bypassing the cache.
  pub fn refresh(&mut self) {
    self.refresh_trigger += 1;
    debug!(entity = E::NAME, refresh_trigger = self.refresh_trigger, "refresh requested");
    self.run(true);
  }

  /// Apply any finished fetch results. Returns true if state changed.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;
    while let Ok(message) = self.rx.try_recv() {
      changed |= self.apply(message);
    }
    changed
  }

  /// Wait until the latest issued fetch has been applied.
  #[cfg(test)]
  pub async fn settle(&mut self) {
    while self.state.loading {
      match self.rx.recv().await {
        Some(message) => {
          self.apply(message);
        }
        None => return,
      }
    }
  }

  fn run(&mut self, force: bool) {
    self.generation += 1;
    self.state.loading = true;

    let generation = self.generation;
    let source = self.source.clone();
    let params = self.params.clone();
    let tx = self.tx.clone();

    debug!(entity = E::NAME, generation, force, "starting fetch");
    tokio::spawn(async move {
      let result = source
        .fetch_list::<E>(&params, force)
        .await
        .map_err(|e| ErrorInfo::from(&e));
      // Receiver may have been dropped with its view
      let _ = tx.send((generation, result));
    });
  }

  fn apply(&mut self, (generation, result): FetchMessage<E::Record>) -> bool {
    if generation != self.generation {
      debug!(
        entity = E::NAME,
        generation,
        latest = self.generation,
        "discarding stale fetch result"
      );
      return false;
    }

    self.state.loading = false;
    match result {
      Ok(fetched) => {
        self.state.data = fetched.data;
        self.state.performance = Some(fetched.performance);
        self.state.error = None;
      }
      Err(error) => {
        warn!(entity = E::NAME, code = %error.code, message = %error.message, "fetch failed");
        // Rows from the last successful fetch stay on screen
        self.state.error = Some(error);
      }
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::TtlCache;
  use crate::entities::{Personnel, SchoolParams};
  use crate::test_support::{Hits, MockBackend};
  use axum::http::StatusCode;
  use axum::response::{IntoResponse, Response};
  use axum::routing::get;
  use axum::{Json, Router};
  use serde_json::json;
  use std::sync::Arc;

  const PARAMS: SchoolParams = SchoolParams { school_id: 38 };

  fn source_for(backend: &MockBackend) -> DataSource {
    DataSource::new(
      backend.client(),
      Arc::new(TtlCache::new(Duration::from_secs(300))),
    )
  }

  fn staff(names: &[&str]) -> Value {
    Value::Array(
      names
        .iter()
        .enumerate()
        .map(|(i, n)| json!({ "personnelid": i + 1, "personnelnom": n }))
        .collect(),
    )
  }

  async fn counting_backend(hits: Hits) -> MockBackend {
    MockBackend::start(Router::new().route(
      "/personnels/ecole/38",
      get(move || {
        let hits = hits.clone();
        async move {
          hits.hit();
          Json(staff(&["Koffi", "Yao"]))
        }
      }),
    ))
    .await
  }

  #[tokio::test]
  async fn test_refetch_is_served_from_cache_with_identical_output() {
    let hits = Hits::default();
    let backend = counting_backend(hits.clone()).await;
    let source = source_for(&backend);

    let first = source.fetch_list::<Personnel>(&PARAMS, false).await.unwrap();
    let second = source.fetch_list::<Personnel>(&PARAMS, false).await.unwrap();

    assert_eq!(first.performance.source, CacheSource::Api);
    assert_eq!(second.performance.source, CacheSource::Cache);
    assert_eq!(
      serde_json::to_vec(&first.data).unwrap(),
      serde_json::to_vec(&second.data).unwrap()
    );
    assert_eq!(second.performance.item_count, 2);
    assert_eq!(hits.count(), 1);
  }

  #[tokio::test]
  async fn test_forced_fetch_always_hits_network() {
    let hits = Hits::default();
    let backend = counting_backend(hits.clone()).await;
    let source = source_for(&backend);

    source.fetch_list::<Personnel>(&PARAMS, false).await.unwrap();
    let forced = source.fetch_list::<Personnel>(&PARAMS, true).await.unwrap();

    assert_eq!(forced.performance.source, CacheSource::Api);
    assert_eq!(hits.count(), 2);
  }

  #[test]
  fn test_normalize_list_payload_shapes() {
    let bare = normalize_list::<Personnel>(staff(&["A"])).unwrap();
    assert_eq!(bare.len(), 1);

    let wrapped = normalize_list::<Personnel>(json!({ "content": staff(&["A", "B"]) })).unwrap();
    assert_eq!(wrapped.len(), 2);

    assert!(normalize_list::<Personnel>(Value::Null).unwrap().is_empty());

    let err = normalize_list::<Personnel>(json!("oops")).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
  }

  #[tokio::test]
  async fn test_hook_error_is_captured_in_state() {
    let backend = MockBackend::start(Router::new().route(
      "/personnels/ecole/38",
      get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
    ))
    .await;
    let mut hook = FetchHook::<Personnel>::new(source_for(&backend), PARAMS);

    hook.fetch();
    hook.settle().await;

    let error = hook.state().error.as_ref().unwrap();
    assert_eq!(error.code, "503");
    assert!(hook.data().is_empty());
    assert!(!hook.state().loading);
  }

  #[tokio::test]
  async fn test_hook_error_keeps_previous_rows() {
    let hits = Hits::default();
    let counter = hits.clone();
    let backend = MockBackend::start(Router::new().route(
      "/personnels/ecole/38",
      get(move || {
        let counter = counter.clone();
        async move {
          if counter.hit() == 0 {
            Json(staff(&["Koffi"])).into_response()
          } else {
            StatusCode::BAD_GATEWAY.into_response()
          }
        }
      }),
    ))
    .await;
    let mut hook = FetchHook::<Personnel>::new(source_for(&backend), PARAMS);

    hook.fetch();
    hook.settle().await;
    assert_eq!(hook.data().len(), 1);

    hook.refresh();
    hook.settle().await;

    assert_eq!(hook.state().error.as_ref().map(|e| e.code.as_str()), Some("502"));
    assert_eq!(hook.data()[0].nom, "Koffi");
    assert_eq!(hook.refresh_trigger, 1);
  }

  #[tokio::test]
  async fn test_stale_response_does_not_overwrite_newer() {
    let hits = Hits::default();
    let counter = hits.clone();
    let backend = MockBackend::start(Router::new().route(
      "/personnels/ecole/38",
      get(move || {
        let counter = counter.clone();
        async move {
          let body: Response = if counter.hit() == 0 {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Json(staff(&["Ancien"])).into_response()
          } else {
            Json(staff(&["Nouveau"])).into_response()
          };
          body
        }
      }),
    ))
    .await;
    let mut hook = FetchHook::<Personnel>::new(source_for(&backend), PARAMS);

    hook.fetch();
    tokio::time::sleep(Duration::from_millis(50)).await;
    hook.refresh();
    hook.settle().await;
    assert_eq!(hook.data()[0].nom, "Nouveau");

    // Let the slow first response arrive, then make sure it is ignored
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!hook.poll());
    assert_eq!(hook.data()[0].nom, "Nouveau");
  }

  #[tokio::test]
  async fn test_fetch_while_loading_is_noop() {
    let hits = Hits::default();
    let backend = counting_backend(hits.clone()).await;
    let mut hook = FetchHook::<Personnel>::new(source_for(&backend), PARAMS);

    hook.fetch();
    hook.fetch();
    hook.settle().await;

    assert_eq!(hits.count(), 1);
    assert_eq!(hook.state().performance.unwrap().source, CacheSource::Api);
  }

  #[tokio::test]
  async fn test_fetch_object_detail() {
    let backend = MockBackend::start(Router::new().route(
      "/personnels/7",
      get(|| async {
        Json(json!({ "data": { "personnelid": 7, "personnelnom": "Koffi", "personnelprenom": "Awa" } }))
      }),
    ))
    .await;
    let source = source_for(&backend);

    let fetched = source
      .fetch_object::<Personnel>(Endpoint::PersonnelDetail { personnel_id: 7 }, false)
      .await
      .unwrap();

    assert_eq!(fetched.data.nom_complet, "Awa Koffi");
    assert_eq!(fetched.performance.item_count, 1);
  }
}
