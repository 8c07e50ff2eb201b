//! In-process backend used by tests that exercise real HTTP round trips.

use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

use crate::api::ApiClient;

/// Axum server bound to an ephemeral localhost port, stopped on drop.
pub struct MockBackend {
  addr: SocketAddr,
  handle: JoinHandle<()>,
}

impl MockBackend {
  pub async fn start(router: Router) -> Self {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
      axum::serve(listener, router).await.unwrap();
    });
    Self { addr, handle }
  }

  pub fn url(&self) -> Url {
    Url::parse(&format!("http://{}/", self.addr)).unwrap()
  }

  pub fn client(&self) -> ApiClient {
    ApiClient::with_timeouts(self.url(), Duration::from_secs(5), Duration::from_secs(5)).unwrap()
  }

  /// Client pointed at a port nothing listens on.
  pub async fn unreachable_client() -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let url = Url::parse(&format!("http://{}/", addr)).unwrap();
    ApiClient::with_timeouts(url, Duration::from_secs(2), Duration::from_secs(2)).unwrap()
  }
}

impl Drop for MockBackend {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

/// Shared request counter for mock routes.
#[derive(Debug, Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
  pub fn hit(&self) -> usize {
    self.0.fetch_add(1, Ordering::SeqCst)
  }

  pub fn count(&self) -> usize {
    self.0.load(Ordering::SeqCst)
  }
}

/// Fresh, unique scratch directory under the system temp dir.
pub fn scratch_dir() -> PathBuf {
  let dir = std::env::temp_dir().join(format!("scolaire-test-{}", uuid::Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  dir
}
