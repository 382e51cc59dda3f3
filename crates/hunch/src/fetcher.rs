use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::interest::Interest;

/// Response field expected to hold the candidate list.
const RESULTS_FIELD: &str = "interests";

/// Display name for candidates the service returns without one.
const PLACEHOLDER_NAME: &str = "Unnamed interest";

const DEFAULT_PAGE_SIZE: usize = 25;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum FetchError {
  #[error("Failed to fetch suggestions: {message}")]
  Network { message: String },

  /// The service answered 2xx but the body does not carry the expected
  /// candidate list. A contract violation, not a transient failure.
  #[error("Autocomplete service returned an invalid response format")]
  BadFormat,
}

impl FetchError {
  pub fn network(message: impl Into<String>) -> Self {
    Self::Network { message: message.into() }
  }
}

/// Anything that can answer an autocomplete query. The engine only ever
/// talks to this seam, never to a transport directly.
#[async_trait]
pub trait SuggestionSource {
  async fn fetch(&self, query: &str) -> Result<Vec<Interest>, FetchError>;
}

/// Configuration for the autocomplete HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// Base URL of the autocomplete service (e.g. "https://api.example.com")
  pub base_url: String,
  /// API key sent with every request
  pub api_key: String,
  /// Request timeout in seconds
  pub timeout_secs: u64,
  /// Fixed page size requested from the service
  pub page_size: usize,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:3000".to_string(),
      api_key: String::new(),
      timeout_secs: DEFAULT_TIMEOUT_SECS,
      page_size: DEFAULT_PAGE_SIZE,
    }
  }
}

impl ClientConfig {
  /// Build a config from environment variables, falling back to defaults.
  pub fn from_env() -> Self {
    let defaults = Self::default();

    let base_url = env::var("HUNCH_API_URL").unwrap_or(defaults.base_url);
    let api_key = env::var("HUNCH_API_KEY").unwrap_or(defaults.api_key);
    let timeout_secs = env::var("HUNCH_TIMEOUT_SECS")
      .ok()
      .and_then(|raw| raw.parse().ok())
      .unwrap_or(defaults.timeout_secs);

    Self { base_url, api_key, timeout_secs, page_size: defaults.page_size }
  }
}

/// HTTP implementation of [`SuggestionSource`] over the remote
/// autocomplete endpoint.
pub struct HttpSuggestionSource {
  client: Client,
  config: ClientConfig,
}

impl Default for HttpSuggestionSource {
  fn default() -> Self {
    Self::new()
  }
}

impl HttpSuggestionSource {
  pub fn new() -> Self {
    Self::with_config(ClientConfig::default())
  }

  pub fn with_config(config: ClientConfig) -> Self {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .expect("Failed to create HTTP client");

    Self { client, config }
  }
}

#[async_trait]
impl SuggestionSource for HttpSuggestionSource {
  async fn fetch(&self, query: &str) -> Result<Vec<Interest>, FetchError> {
    let url = format!("{}/interests/autocomplete", self.config.base_url);

    let response = self
      .client
      .get(&url)
      .query(&[("q", query)])
      .query(&[("limit", self.config.page_size as u64), ("from", 0)])
      .header(ACCEPT, "application/json")
      .header("X-Api-Key", &self.config.api_key)
      .send()
      .await
      .map_err(|e| FetchError::network(e.to_string()))?;

    if !response.status().is_success() {
      return Err(FetchError::network(format!("HTTP {}", response.status())));
    }

    let body: Value = response.json().await.map_err(|_| FetchError::BadFormat)?;
    shape_candidates(&body)
  }
}

/// Shape a raw response body into Interests.
///
/// The body must be an object whose `interests` field is a list; anything
/// else is a [`FetchError::BadFormat`]. Individual candidates are shaped
/// leniently, with a missing name defaulted to a placeholder.
pub fn shape_candidates(body: &Value) -> Result<Vec<Interest>, FetchError> {
  let list = body.get(RESULTS_FIELD).and_then(Value::as_array).ok_or(FetchError::BadFormat)?;
  Ok(list.iter().map(shape_candidate).collect())
}

fn shape_candidate(raw: &Value) -> Interest {
  let id = match raw.get("id") {
    Some(Value::String(id)) => Some(id.clone()),
    Some(Value::Number(id)) => Some(id.to_string()),
    _ => None,
  };

  Interest {
    id,
    name: raw
      .get("name")
      .and_then(Value::as_str)
      .unwrap_or(PLACEHOLDER_NAME)
      .to_string(),
    secondary_term: raw.get("secondary_term").and_then(Value::as_str).map(str::to_string),
    emoji: raw.get("emoji").and_then(Value::as_str).map(str::to_string),
    popularity: raw
      .get("popularity")
      .and_then(Value::as_u64)
      .and_then(|p| u32::try_from(p).ok()),
  }
}
