use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect, Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::types::{ClientError, RemoteResponse};

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Connection settings for the AIForged API plus the HTTP client built from them.
///
/// Built once at startup and shared read-only by every sub-client.
#[derive(Debug, Clone)]
pub struct Config {
    base_url: Url,
    http: Client,
}

impl Config {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ClientError> {
        // A trailing slash keeps relative joins under any path prefix of the base URL.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| ClientError::Config(format!("invalid base URL '{}': {}", base_url, e)))?;

        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(api_key)
            .map_err(|e| ClientError::Config(format!("invalid API key: {}", e)))?;
        value.set_sensitive(true);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), value);

        let http = Client::builder()
            .default_headers(headers)
            .redirect(redirect::Policy::limited(10))
            .timeout(timeout)
            .user_agent(concat!("aiforged-integration-service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        log::debug!("🔧 AIForged client configured for {}", base_url);

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Absolute URL for an API path such as `api/Document/GetDocument`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Config(format!("invalid endpoint '{}': {}", path, e)))
    }

    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<(u16, Vec<u8>), ClientError> {
        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Http { operation, source })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Http { operation, source })?;

        if !status.is_success() {
            log::warn!("⚠️  {} returned {}", operation, status);
            return Err(ClientError::Status {
                operation,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }

        Ok((status.as_u16(), body.to_vec()))
    }

    /// Sends the request and decodes the body.
    ///
    /// Non-success statuses are errors. An empty or `null` body yields `result: None`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<RemoteResponse<T>, ClientError> {
        let (status_code, body) = self.execute(operation, request).await?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(RemoteResponse::empty(status_code));
        }

        let result: Option<T> = serde_json::from_slice(&body)
            .map_err(|source| ClientError::Decode { operation, source })?;

        Ok(RemoteResponse {
            status_code,
            result,
        })
    }

    /// Like [`Config::send`] for calls whose body is irrelevant.
    pub async fn send_unit(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<RemoteResponse<()>, ClientError> {
        let (status_code, _) = self.execute(operation, request).await?;
        Ok(RemoteResponse::empty(status_code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> Config {
        Config::new(base_url, "secret-key", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let cfg = config("https://portal.example.com/aiforged");
        assert_eq!(
            cfg.endpoint("api/Document/GetDocument").unwrap().as_str(),
            "https://portal.example.com/aiforged/api/Document/GetDocument"
        );

        let cfg = config("https://portal.example.com/");
        assert_eq!(
            cfg.endpoint("/api/Account/GetCurrentUser").unwrap().as_str(),
            "https://portal.example.com/api/Account/GetCurrentUser"
        );
    }

    #[test]
    fn test_debug_output_hides_api_key() {
        let cfg = config("https://portal.example.com");
        let debug = format!("{:?}", cfg);
        assert!(debug.contains("portal.example.com"));
        assert!(!debug.contains("secret-key"));
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let err = Config::new("not a url", "key", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_rejects_api_key_that_cannot_be_a_header() {
        let err = Config::new("https://portal.example.com", "bad\nkey", Duration::from_secs(5))
            .unwrap_err();
        assert!(err.to_string().contains("invalid API key"));
    }
}
