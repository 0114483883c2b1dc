//! Infura IPFS pin client.
//!
//! Infura exposes the standard Kubo RPC, so pinning is `/api/v0/pin/add`.
//! It has no notion of host hints or metadata.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use ipfs_deploy_core::constants::{DEFAULT_TIMEOUT_SECONDS, INFURA_API_URL};
use ipfs_deploy_core::error::{DeployError, Result};
use ipfs_deploy_core::traits::RemotePinner;
use ipfs_deploy_core::types::{ContentId, PinMetadata, PinProvider};

use crate::transport_error;

/// Infura client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InfuraConfig {
    /// RPC base URL
    pub api_url: String,
    /// Project id used as the basic-auth user
    pub project_id: Option<String>,
    /// Project secret used as the basic-auth password
    pub project_secret: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for InfuraConfig {
    fn default() -> Self {
        Self {
            api_url: INFURA_API_URL.into(),
            project_id: None,
            project_secret: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl InfuraConfig {
    /// Creates a config authenticated with a project id and secret.
    pub fn new(project_id: impl Into<String>, project_secret: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id.into()),
            project_secret: Some(project_secret.into()),
            ..Default::default()
        }
    }
}

/// Client for Infura's pin endpoint.
pub struct InfuraClient {
    config: InfuraConfig,
    http_client: reqwest::Client,
}

impl InfuraClient {
    /// Creates a client with the given config.
    pub fn with_config(config: InfuraConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DeployError::InvalidConfiguration(format!("HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl RemotePinner for InfuraClient {
    fn provider(&self) -> PinProvider {
        PinProvider::Infura
    }

    #[instrument(skip(self, cid, _metadata, _host_hints), fields(cid = %cid))]
    async fn request_pin(
        &self,
        cid: &ContentId,
        _metadata: &PinMetadata,
        _host_hints: &[String],
    ) -> Result<()> {
        let url = format!("{}/api/v0/pin/add", self.config.api_url.trim_end_matches('/'));
        let mut request = self
            .http_client
            .post(&url)
            .query(&[("arg", cid.as_str()), ("recursive", "true")]);

        if let Some(project_id) = &self.config.project_id {
            request = request.basic_auth(project_id, self.config.project_secret.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(PinProvider::Infura, self.config.timeout_seconds, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DeployError::RemotePinFailed {
                provider: PinProvider::Infura,
                reason: format!("HTTP {status}: {text}"),
            });
        }

        let pinned: PinAddResponse = response
            .json()
            .await
            .map_err(|e| transport_error(PinProvider::Infura, self.config.timeout_seconds, e))?;
        if !pinned.pins.iter().any(|p| p == cid.as_str()) {
            return Err(DeployError::RemotePinFailed {
                provider: PinProvider::Infura,
                reason: format!("response did not list {cid}"),
            });
        }

        info!("Pinned to Infura");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct PinAddResponse {
    #[serde(rename = "Pins", default)]
    pins: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, config: InfuraConfig) -> InfuraClient {
        InfuraClient::with_config(InfuraConfig {
            api_url: server.uri(),
            timeout_seconds: 5,
            ..config
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_pin_add_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v0/pin/add"))
            .and(query_param("arg", "bafyABC123"))
            .and(query_param("recursive", "true"))
            // "id:secret" base64-encoded
            .and(header("authorization", "Basic aWQ6c2VjcmV0"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "Pins": ["bafyABC123"] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, InfuraConfig::new("id", "secret"));
        let cid = ContentId::new("bafyABC123").unwrap();
        client
            .request_pin(&cid, &PinMetadata::new("example.com"), &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_non_200_is_remote_pin_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v0/pin/add"))
            .respond_with(ResponseTemplate::new(403).set_body_string("project id required"))
            .mount(&server)
            .await;

        let client = client_for(&server, InfuraConfig::default());
        let cid = ContentId::new("bafyABC123").unwrap();
        let err = client
            .request_pin(&cid, &PinMetadata::new("example.com"), &[])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::RemotePinFailed { provider: PinProvider::Infura, .. }
        ));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v0/pin/add"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(serde_json::json!({ "Pins": ["bafyABC123"] })),
            )
            .mount(&server)
            .await;

        let client = InfuraClient::with_config(InfuraConfig {
            api_url: server.uri(),
            timeout_seconds: 1,
            ..Default::default()
        })
        .unwrap();
        let cid = ContentId::new("bafyABC123").unwrap();
        let err = client
            .request_pin(&cid, &PinMetadata::new("example.com"), &[])
            .await
            .unwrap_err();

        assert!(err.is_timeout());
    }
}
