//! Device API client implementation

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use ixc_core::catalog;
use ixc_core::{ApiKey, PropertyMap, SerialNumber};

use crate::error::{ApiError, Result};

/// Production vendor endpoint
pub const API_BASE_URL: &str = "https://evcharger.ixcommand.com/api/v1";
/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for one charger's vendor API.
///
/// The API key is installed as a default header at construction and cannot
/// be changed afterwards; rotating a credential means building a new client.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    client: Client,
    base_url: Url,
}

impl DeviceClient {
    /// Create a client against the production vendor endpoint.
    pub fn new(api_key: &ApiKey) -> Result<Self> {
        Self::with_base_url(API_BASE_URL, api_key)
    }

    /// Create a client against a custom endpoint (tests, staging).
    pub fn with_base_url(base_url: &str, api_key: &ApiKey) -> Result<Self> {
        Self::with_config(base_url, api_key, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a client with custom timeouts.
    pub fn with_config(
        base_url: &str,
        api_key: &ApiKey,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key_value = HeaderValue::from_str(api_key.expose())
            .map_err(|e| ApiError::Config(format!("invalid API key: {e}")))?;
        headers.insert("X-API-KEY", key_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .default_headers(headers)
            .build()?;

        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL {base_url:?}: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// The base URL this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Read the given properties from the charger.
    ///
    /// Returns exactly the mapping the server answered — keys the server
    /// chose not to report are simply absent, not an error.
    #[instrument(skip(self))]
    pub async fn get_properties(
        &self,
        serial: &SerialNumber,
        keys: &[&str],
    ) -> Result<PropertyMap> {
        let url = self.properties_url(serial)?;
        debug!("reading {} properties for charger {serial}", keys.len());

        let query: Vec<(&str, &str)> = keys.iter().map(|key| ("keys", *key)).collect();
        let response = self.client.get(url).query(&query).send().await?;
        self.handle_response(response).await
    }

    /// Read the full default read-set.
    pub async fn get_all_properties(&self, serial: &SerialNumber) -> Result<PropertyMap> {
        self.get_properties(serial, catalog::ALL_READABLE).await
    }

    /// Write the given property patch to the charger.
    ///
    /// The patch is validated against the writable set before any network
    /// I/O: if any key is read-only the whole write is rejected locally and
    /// nothing is sent. On acceptance the server's acknowledgement body is
    /// returned verbatim; it may be empty and is not assumed to mirror the
    /// written values.
    #[instrument(skip(self, patch))]
    pub async fn set_properties(
        &self,
        serial: &SerialNumber,
        patch: &PropertyMap,
    ) -> Result<PropertyMap> {
        let read_only: Vec<String> = patch
            .keys()
            .filter(|key| !catalog::is_writable(key))
            .cloned()
            .collect();
        if !read_only.is_empty() {
            return Err(ApiError::ReadOnlyProperties { keys: read_only });
        }

        let url = self.properties_url(serial)?;
        debug!("writing {} properties for charger {serial}", patch.len());

        let response = self.client.patch(url).json(patch).send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Authentication);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(ApiError::status(status.as_u16(), body));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            Ok(PropertyMap::new())
        } else {
            serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
        }
    }

    /// Probe the connection with a minimal read of the first catalog
    /// property.
    ///
    /// A generic request failure reads as `Ok(false)`; a rejected credential
    /// propagates so setup flows can route to re-authentication. Used by
    /// setup and re-auth only, never by the coordinator.
    #[instrument(skip(self))]
    pub async fn test_connection(&self, serial: &SerialNumber) -> Result<bool> {
        match self.get_properties(serial, &catalog::ALL_READABLE[..1]).await {
            Ok(_) => Ok(true),
            Err(err @ ApiError::Authentication) => Err(err),
            Err(err) => {
                debug!("connection test for charger {serial} failed: {err}");
                Ok(false)
            }
        }
    }

    fn properties_url(&self, serial: &SerialNumber) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/thing/{serial}/properties"))
            .map_err(|e| ApiError::Config(e.to_string()))
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Authentication);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(ApiError::status(status.as_u16(), body));
        }
        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn api_key() -> ApiKey {
        ApiKey::new("test-key")
    }

    fn serial() -> SerialNumber {
        "ABC-DEF-123".parse().unwrap()
    }

    #[test]
    fn client_creation() {
        assert!(DeviceClient::new(&api_key()).is_ok());
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = DeviceClient::with_base_url("not a url", &api_key());
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn invalid_api_key_is_rejected() {
        let result = DeviceClient::new(&ApiKey::new("line\nbreak"));
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn properties_url_includes_serial() {
        let client = DeviceClient::new(&api_key()).unwrap();
        let url = client.properties_url(&serial()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://evcharger.ixcommand.com/api/v1/thing/ABC-DEF-123/properties"
        );
    }

    #[tokio::test]
    async fn read_only_write_fails_before_network() {
        // unroutable base URL: reaching the network would hang or error as
        // transport, so a ReadOnlyProperties error proves the local check
        let client =
            DeviceClient::with_base_url("http://192.0.2.1:9/api/v1", &api_key()).unwrap();

        let mut patch = PropertyMap::new();
        patch.insert("totalEnergy".into(), json!(0));
        patch.insert("chargingEnable".into(), json!(true));
        patch.insert("bssid".into(), json!("00:11:22:33:44:55"));

        match client.set_properties(&serial(), &patch).await {
            Err(ApiError::ReadOnlyProperties { keys }) => {
                assert_eq!(keys, vec!["bssid".to_string(), "totalEnergy".to_string()]);
            }
            other => panic!("expected ReadOnlyProperties, got {other:?}"),
        }
    }

    #[test]
    fn retryable_classification() {
        assert!(ApiError::status(500, "boom").is_retryable());
        assert!(!ApiError::Authentication.is_retryable());
        assert!(!ApiError::ReadOnlyProperties { keys: vec![] }.is_retryable());
    }
}
