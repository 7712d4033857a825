use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};
use url::Url;

use super::error::{error_message_from_body, ApiError};
use crate::config::Config;

/// Shared HTTP client for the tasks backend.
///
/// One instance is created at startup and cloned everywhere; clones share
/// the cookie jar, the bearer token slot, and the unauthorized latch.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base: Url,
  token: Arc<Mutex<Option<String>>>,
  unauthorized: Arc<AtomicBool>,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    Self::with_base_url(&config.server.url)
  }

  pub fn with_base_url(url: &str) -> Result<Self> {
    let mut base =
      Url::parse(url).map_err(|e| eyre!("Invalid server URL '{}': {}", url, e))?;

    // Url::join treats the last path segment as a file unless it ends in '/'
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let mut headers = HeaderMap::new();
    headers.insert(
      "X-Requested-With",
      HeaderValue::from_static("XMLHttpRequest"),
    );

    let http = reqwest::Client::builder()
      .cookie_store(true)
      .default_headers(headers)
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self {
      http,
      base,
      token: Arc::new(Mutex::new(None)),
      unauthorized: Arc::new(AtomicBool::new(false)),
    })
  }

  /// Arm or disarm the bearer token attached to every request.
  pub fn set_token(&self, token: Option<String>) {
    let mut slot = self
      .token
      .lock()
      .unwrap_or_else(PoisonError::into_inner);
    *slot = token;
  }

  #[allow(dead_code)]
  pub fn has_token(&self) -> bool {
    self
      .token
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .is_some()
  }

  /// Consume the latched 401 signal.
  ///
  /// Any response with status 401 sets the latch; the app drains it once
  /// per tick and decides whether a sign-out is due.
  pub fn take_unauthorized(&self) -> bool {
    self.unauthorized.swap(false, Ordering::SeqCst)
  }

  /// Prime the backend's CSRF cookie before the credential exchange.
  pub async fn prime_csrf(&self) -> Result<(), ApiError> {
    let response = self.send(Method::GET, "sanctum/csrf-cookie", None).await?;
    self.check(response).await?;
    Ok(())
  }

  pub async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(String, String)],
  ) -> Result<T, ApiError> {
    let response = self.send(Method::GET, path, Some(query)).await?;
    let response = self.check(response).await?;
    decode(response).await
  }

  pub async fn post_json<B: Serialize, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    let response = self.send_body(Method::POST, path, body).await?;
    let response = self.check(response).await?;
    decode(response).await
  }

  pub async fn patch_json<B: Serialize, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    let response = self.send_body(Method::PATCH, path, body).await?;
    let response = self.check(response).await?;
    decode(response).await
  }

  pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
    let response = self.send(Method::DELETE, path, None).await?;
    self.check(response).await?;
    Ok(())
  }

  fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
    self
      .base
      .join(path)
      .map_err(|e| ApiError::Transport(format!("invalid request path '{}': {}", path, e)))
  }

  fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
    let token = self
      .token
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone();

    match token {
      Some(token) => builder.bearer_auth(token),
      None => builder,
    }
  }

  async fn send(
    &self,
    method: Method,
    path: &str,
    query: Option<&[(String, String)]>,
  ) -> Result<reqwest::Response, ApiError> {
    let url = self.endpoint(path)?;
    debug!(%method, %url, "request");

    let mut builder = self.http.request(method, url);
    if let Some(query) = query {
      builder = builder.query(query);
    }

    self
      .authorize(builder)
      .send()
      .await
      .map_err(|e| ApiError::Transport(e.to_string()))
  }

  async fn send_body<B: Serialize>(
    &self,
    method: Method,
    path: &str,
    body: &B,
  ) -> Result<reqwest::Response, ApiError> {
    let url = self.endpoint(path)?;
    debug!(%method, %url, "request");

    let builder = self.http.request(method, url).json(body);
    self
      .authorize(builder)
      .send()
      .await
      .map_err(|e| ApiError::Transport(e.to_string()))
  }

  /// Turn error statuses into the error taxonomy, latching 401s.
  async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }

    if status == StatusCode::UNAUTHORIZED {
      self.unauthorized.store(true, Ordering::SeqCst);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message_from_body(&body).unwrap_or_else(|| {
      status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
    });

    warn!(%status, %message, "request failed");
    Err(ApiError::from_status(status, message))
  }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
  response
    .json()
    .await
    .map_err(|e| ApiError::Server(format!("unexpected response body: {}", e)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_endpoint_join() {
    let client = ApiClient::with_base_url("http://localhost").unwrap();
    assert_eq!(
      client.endpoint("api/tasks").unwrap().as_str(),
      "http://localhost/api/tasks"
    );
  }

  #[test]
  fn test_endpoint_join_with_base_path() {
    // Without the trailing-slash fixup, "nested" would be dropped by join
    let client = ApiClient::with_base_url("http://localhost/nested").unwrap();
    assert_eq!(
      client.endpoint("api/tasks").unwrap().as_str(),
      "http://localhost/nested/api/tasks"
    );
  }

  #[test]
  fn test_invalid_url_rejected() {
    assert!(ApiClient::with_base_url("not a url").is_err());
  }

  #[test]
  fn test_token_slot() {
    let client = ApiClient::with_base_url("http://localhost").unwrap();
    assert!(!client.has_token());

    client.set_token(Some("abc123".to_string()));
    assert!(client.has_token());

    // Clones share the slot
    let clone = client.clone();
    clone.set_token(None);
    assert!(!client.has_token());
  }

  #[test]
  fn test_unauthorized_latch_drains_once() {
    let client = ApiClient::with_base_url("http://localhost").unwrap();
    assert!(!client.take_unauthorized());

    client.unauthorized.store(true, Ordering::SeqCst);
    assert!(client.take_unauthorized());
    assert!(!client.take_unauthorized());
  }
}
