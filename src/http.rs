//! Resilient HTTP client
//!
//! Every outbound call (news API, language model) goes through [`HttpClient::send`],
//! which retries connection failures, timeouts and the statuses in
//! [`RETRYABLE_STATUS`](crate::retry::RETRYABLE_STATUS) according to one shared
//! [`RetryConfig`]. The attempt budget covers all failure kinds together.

use crate::config::RetryConfig;
use crate::error::{Error, NetworkError, PAYLOAD_SNIPPET_CHARS, Result, truncate_chars};
use crate::retry::retry_with_backoff;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("newsbrief/", env!("CARGO_PKG_VERSION"));

/// A fully described outbound request
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Target URL without query string
    pub url: String,
    /// Query parameters, in order
    pub params: Vec<(String, String)>,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
    /// Optional JSON body
    pub body: Option<Value>,
    /// Per-attempt timeout covering connect and read
    pub timeout: Duration,
}

impl HttpRequest {
    /// New request with no parameters, headers or body and a 30s timeout
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Append a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Append a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set a JSON body
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A successful (2xx) response
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

impl HttpResponse {
    /// Decode the body as JSON
    ///
    /// A body that is not valid JSON is an upstream contract violation and is reported
    /// as [`Error::ResponseShape`].
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| Error::response_shape(format!("invalid JSON body: {e}"), &self.body))
    }
}

/// HTTP client with bounded automatic retry
///
/// Cheap to clone; holds only the retry policy. A fresh connection pool is built for
/// each [`send`](Self::send) so no state leaks between calls.
#[derive(Clone, Debug, Default)]
pub struct HttpClient {
    retry: RetryConfig,
}

impl HttpClient {
    /// Create a client using the given retry policy
    pub fn new(retry: RetryConfig) -> Self {
        Self { retry }
    }

    /// The retry policy applied to every request
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Send a request, retrying transient failures
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] with the final failure once the attempt budget is
    /// spent, or immediately for a non-retryable status such as 404.
    pub async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(NetworkError::Transport)?;

        let label = format!("{} {}", request.method, request.url);
        retry_with_backoff(&self.retry, &label, || attempt(&client, request))
            .await
            .map_err(Error::Network)
    }
}

async fn attempt(
    client: &reqwest::Client,
    request: &HttpRequest,
) -> std::result::Result<HttpResponse, NetworkError> {
    let mut builder = client
        .request(request.method.clone(), &request.url)
        .query(&request.params)
        .timeout(request.timeout);
    for (key, value) in &request.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }

    let response = builder.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(NetworkError::Status {
            status: status.as_u16(),
            url: request.url.clone(),
            body: truncate_chars(&body, PAYLOAD_SNIPPET_CHARS),
        });
    }

    tracing::debug!(url = %request.url, status = status.as_u16(), bytes = body.len(), "HTTP request succeeded");
    Ok(HttpResponse {
        status: status.as_u16(),
        body,
    })
}
