use reqwest::{header::CONTENT_TYPE, Method, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::download::Download;
use super::error::{Error, Result, TransportKind};
use super::urls::Endpoint;
use crate::config::ApiConfig;

/// HTTP client wrapper for the school-management backend
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
  download_timeout: Duration,
}

impl ApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base_url = Url::parse(&config.url).map_err(|e| {
      Error::transport(
        TransportKind::Network,
        format!("URL d'API invalide {}: {}", config.url, e),
      )
    })?;
    Self::with_timeouts(
      base_url,
      Duration::from_secs(config.timeout_secs),
      Duration::from_secs(config.download_timeout_secs),
    )
  }

  pub fn with_timeouts(
    mut base_url: Url,
    timeout: Duration,
    download_timeout: Duration,
  ) -> Result<Self> {
    // Url::join drops the last segment unless the base ends with a slash
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }

    let http = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(Error::from)?;

    Ok(Self {
      http,
      base_url,
      download_timeout,
    })
  }

  /// Resolve an endpoint against the base URL
  pub fn url(&self, endpoint: &Endpoint) -> Result<Url> {
    self.base_url.join(&endpoint.path()).map_err(|e| {
      Error::transport(
        TransportKind::Network,
        format!("Chemin invalide {}: {}", endpoint.path(), e),
      )
    })
  }

  /// GET an endpoint and return its JSON body (`Null` for an empty body)
  pub async fn get_json(&self, endpoint: &Endpoint) -> Result<Value> {
    self.send_json(Method::GET, endpoint, None).await
  }

  /// Send a request with an optional JSON body and parse the JSON response
  pub async fn send_json(
    &self,
    method: Method,
    endpoint: &Endpoint,
    body: Option<&Value>,
  ) -> Result<Value> {
    let url = self.url(endpoint)?;
    debug!(%method, %url, "api request");

    let mut request = self.http.request(method, url);
    if let Some(body) = body {
      request = request.json(body);
    }

    let response = check_status(request.send().await?).await?;
    let bytes = response.bytes().await?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
      return Ok(Value::Null);
    }

    // Some write endpoints answer with a bare text message
    match serde_json::from_slice(&bytes) {
      Ok(value) => Ok(value),
      Err(_) => Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned())),
    }
  }

  /// POST and collect a binary body (report and certificate generation)
  pub async fn download(&self, endpoint: &Endpoint, body: &Value) -> Result<Download> {
    let url = self.url(endpoint)?;
    debug!(%url, timeout_secs = self.download_timeout.as_secs(), "download request");

    let response = self
      .http
      .post(url)
      .timeout(self.download_timeout)
      .json(body)
      .send()
      .await?;
    let response = check_status(response).await?;

    let content_type = response
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(String::from);
    let bytes = response.bytes().await?.to_vec();

    Ok(Download {
      bytes,
      content_type,
    })
  }
}

/// Turn a non-2xx response into a transport error, keeping the server's
/// message when the body carries one
async fn check_status(response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let body = response.text().await.unwrap_or_default();
  let message = server_message(&body).unwrap_or_else(|| {
    format!(
      "HTTP {} {}",
      status.as_u16(),
      status.canonical_reason().unwrap_or("")
    )
    .trim_end()
    .to_string()
  });

  Err(Error::transport(TransportKind::Status(status.as_u16()), message))
}

/// Extract `message` (or `error`) from a JSON error body
fn server_message(body: &str) -> Option<String> {
  let value: Value = serde_json::from_str(body).ok()?;
  ["message", "error"]
    .iter()
    .find_map(|k| value.get(k).and_then(Value::as_str))
    .filter(|s| !s.is_empty())
    .map(String::from)
}
