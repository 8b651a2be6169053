//! Network seam for the catalog client.

use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Something that can GET a URL and hand back the parsed JSON body.
pub trait Transport: Send + Sync {
  fn get_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value>>;
}

/// HTTP transport backed by reqwest.
#[derive(Clone)]
pub struct HttpTransport {
  client: reqwest::Client,
}

impl HttpTransport {
  pub fn new(timeout: Duration) -> Result<Self> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::builder()
      .default_headers(headers)
      .user_agent(concat!("sw9s/", env!("CARGO_PKG_VERSION")))
      .timeout(timeout)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

impl Transport for HttpTransport {
  fn get_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value>> {
    Box::pin(async move {
      debug!(url, "GET");
      let response = self
        .client
        .get(url)
        .send()
        .await
        .map_err(|e| eyre!("Failed to fetch {}: {}", url, e))?;

      // Error statuses still carry a JSON body (`{"detail": "Not found"}`),
      // which is returned and cached like any other
      let status = response.status();
      if !status.is_success() {
        warn!(url, %status, "non-success status");
      }

      let body = response
        .bytes()
        .await
        .map_err(|e| eyre!("Failed to read response from {}: {}", url, e))?;

      serde_json::from_slice(&body).map_err(|e| eyre!("Invalid JSON from {}: {}", url, e))
    })
  }
}

#[cfg(test)]
pub mod fake {
  //! Scripted transport for tests.

  use super::*;
  use std::collections::HashMap;
  use std::sync::Mutex;

  #[derive(Default)]
  pub struct FakeTransport {
    responses: HashMap<String, std::result::Result<Value, String>>,
    delays: HashMap<String, Duration>,
    requested: Mutex<Vec<String>>,
  }

  impl FakeTransport {
    pub fn new() -> Self {
      Self::default()
    }

    pub fn with(mut self, url: &str, body: Value) -> Self {
      self.responses.insert(url.to_string(), Ok(body));
      self
    }

    pub fn failing(mut self, url: &str, message: &str) -> Self {
      self
        .responses
        .insert(url.to_string(), Err(message.to_string()));
      self
    }

    pub fn delayed(mut self, url: &str, delay: Duration) -> Self {
      self.delays.insert(url.to_string(), delay);
      self
    }

    /// Every URL requested so far, in call order.
    pub fn requested(&self) -> Vec<String> {
      self.requested.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
      self.requested.lock().unwrap().len()
    }
  }

  impl Transport for FakeTransport {
    fn get_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value>> {
      Box::pin(async move {
        self.requested.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delays.get(url) {
          tokio::time::sleep(*delay).await;
        }
        match self.responses.get(url) {
          Some(Ok(body)) => Ok(body.clone()),
          Some(Err(message)) => Err(eyre!("{}", message)),
          // What the catalog serves for an unknown resource
          None => Ok(serde_json::json!({ "detail": "Not found" })),
        }
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStorage;
  use crate::catalog::CatalogClient;
  use serde_json::json;
  use std::sync::Arc;
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;
  use tokio::task::JoinHandle;

  /// Answer one request with `status` and `body`. The handle yields the raw
  /// request head, lowercased.
  async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut request = Vec::new();
      let mut buf = [0u8; 1024];
      while !request.windows(4).any(|w| w == &b"\r\n\r\n"[..]) {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
          break;
        }
        request.extend_from_slice(&buf[..n]);
      }

      let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
      );
      socket.write_all(response.as_bytes()).await.unwrap();
      let _ = socket.shutdown().await;
      String::from_utf8_lossy(&request).to_lowercase()
    });

    (format!("http://{}/", addr), handle)
  }

  fn transport() -> HttpTransport {
    HttpTransport::new(Duration::from_secs(5)).unwrap()
  }

  #[tokio::test]
  async fn test_get_json_sends_accept_and_parses_body() {
    let (root, server) = serve_once("200 OK", r#"{"name":"Luke Skywalker"}"#).await;
    let url = format!("{}people/1/", root);

    let value = transport().get_json(&url).await.unwrap();
    assert_eq!(value, json!({"name": "Luke Skywalker"}));

    let request = server.await.unwrap();
    assert!(request.starts_with("get /people/1/ http/1.1"));
    assert!(request.contains("accept: application/json"));
  }

  #[tokio::test]
  async fn test_error_status_body_is_returned() {
    let (root, _server) = serve_once("404 Not Found", r#"{"detail":"Not found"}"#).await;
    let url = format!("{}people/999", root);

    let value = transport().get_json(&url).await.unwrap();
    assert_eq!(value, json!({"detail": "Not found"}));
  }

  #[tokio::test]
  async fn test_non_json_body_is_an_error() {
    let (root, _server) = serve_once("200 OK", "<html>teapot</html>").await;
    let url = format!("{}people/1/", root);

    assert!(transport().get_json(&url).await.is_err());
  }

  #[tokio::test]
  async fn test_not_found_body_is_cached() {
    let (root, _server) = serve_once("404 Not Found", r#"{"detail":"Not found"}"#).await;
    let storage = Arc::new(MemoryStorage::new());
    let client = CatalogClient::with_parts(&root, Arc::new(transport()), storage.clone());

    let entity = client.get_resource_details("people", "999").await.unwrap();
    assert_eq!(entity.get("detail"), Some(&json!("Not found")));
    assert_eq!(storage.len(), 1);

    // Served from the cache: the server only answers once
    let again = client.get_resource_details("people", "999").await.unwrap();
    assert_eq!(again, entity);
  }
}
