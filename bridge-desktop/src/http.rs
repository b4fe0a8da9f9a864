//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Reqwest-based HTTP client implementation
///
/// Performs a single attempt per request and classifies failures:
/// - timeouts become [`BridgeError::Timeout`]
/// - connect and request errors become [`BridgeError::ConnectionLost`]
/// - body or decode errors become [`BridgeError::MalformedResponse`]
///
/// Retrying is left to the caller, which knows the retry budget.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a new HTTP client with custom timeout
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialised.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .user_agent(concat!("congregation-app-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Convert bridge HttpMethod to reqwest Method
    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    /// Build reqwest request from bridge request
    fn build_request(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    /// Map a reqwest failure onto the bridge error taxonomy.
    fn classify_error(error: &reqwest::Error) -> BridgeError {
        if error.is_timeout() {
            BridgeError::Timeout(error.to_string())
        } else if error.is_connect() || error.is_request() {
            BridgeError::ConnectionLost(error.to_string())
        } else if error.is_body() || error.is_decode() {
            BridgeError::MalformedResponse(error.to_string())
        } else {
            BridgeError::OperationFailed(error.to_string())
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        // Query parameters are kept out of the log line since they carry API keys.
        debug!(url = %request.url, method = ?request.method, "Executing HTTP request");

        let response = self.build_request(&request).send().await.map_err(|e| {
            let classified = Self::classify_error(&e);
            warn!(url = %request.url, error = %classified, "HTTP request failed");
            classified
        })?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        let body = response.bytes().await.map_err(|e| {
            warn!(url = %request.url, status, error = %e, "Failed to read response body");
            BridgeError::MalformedResponse(e.to_string())
        })?;

        debug!(url = %request.url, status, bytes = body.len(), "HTTP request completed");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_client_creation() {
        let _client = ReqwestHttpClient::new();
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Get),
            reqwest::Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Head),
            reqwest::Method::HEAD
        );
    }

    #[tokio::test]
    async fn test_build_request_appends_query() {
        let client = ReqwestHttpClient::new();
        let request = HttpRequest::get("https://example.com/items")
            .query("part", "snippet")
            .query("playlistId", "PL 1")
            .header("Accept", "application/json")
            .timeout(Duration::from_secs(3));

        let built = client.build_request(&request).build().unwrap();
        assert_eq!(built.method(), reqwest::Method::GET);
        assert_eq!(
            built.url().as_str(),
            "https://example.com/items?part=snippet&playlistId=PL+1"
        );
        assert_eq!(built.timeout(), Some(&Duration::from_secs(3)));
        assert_eq!(built.headers()["Accept"], "application/json");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transient() {
        let client = ReqwestHttpClient::with_timeout(Duration::from_millis(500));
        let request = HttpRequest::get("http://127.0.0.1:9/unreachable");

        let err = client.execute(request).await.unwrap_err();
        assert!(err.is_transient(), "expected transient error, got {err:?}");
    }
}
