//! Pinata pin-by-hash client.
//!
//! Pinata fetches the content from the IPFS network itself; host hints let it
//! dial the publishing node directly instead of waiting on discovery.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use ipfs_deploy_core::constants::{DEFAULT_TIMEOUT_SECONDS, PINATA_API_URL};
use ipfs_deploy_core::error::{DeployError, Result};
use ipfs_deploy_core::traits::RemotePinner;
use ipfs_deploy_core::types::{ContentId, PinMetadata, PinProvider};

use crate::transport_error;

/// Pinata client configuration.
///
/// Either a key pair or a JWT is required; the JWT wins when both are set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PinataConfig {
    /// API base URL
    pub api_url: String,
    /// Legacy API key
    pub api_key: Option<String>,
    /// Legacy API secret
    pub secret_api_key: Option<String>,
    /// Scoped JWT
    pub jwt: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for PinataConfig {
    fn default() -> Self {
        Self {
            api_url: PINATA_API_URL.into(),
            api_key: None,
            secret_api_key: None,
            jwt: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl PinataConfig {
    /// Creates a config with an API key pair.
    pub fn new(api_key: impl Into<String>, secret_api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            secret_api_key: Some(secret_api_key.into()),
            ..Default::default()
        }
    }

    /// Creates a config with a JWT.
    pub fn with_jwt(jwt: impl Into<String>) -> Self {
        Self {
            jwt: Some(jwt.into()),
            ..Default::default()
        }
    }

    /// Returns true if some usable credential is present.
    pub fn has_credentials(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        set(&self.jwt) || (set(&self.api_key) && set(&self.secret_api_key))
    }
}

/// Client for Pinata's `pinning/pinByHash` endpoint.
pub struct PinataClient {
    config: PinataConfig,
    http_client: reqwest::Client,
}

impl PinataClient {
    /// Creates a client with the given config.
    pub fn with_config(config: PinataConfig) -> Result<Self> {
        if !config.has_credentials() {
            return Err(DeployError::InvalidConfiguration(
                "Pinata needs an API key and secret, or a JWT".into(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DeployError::InvalidConfiguration(format!("HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.config.jwt, &self.config.api_key, &self.config.secret_api_key) {
            (Some(jwt), _, _) if !jwt.is_empty() => request.bearer_auth(jwt),
            (_, Some(key), Some(secret)) => request
                .header("pinata_api_key", key)
                .header("pinata_secret_api_key", secret),
            _ => request,
        }
    }
}

#[async_trait]
impl RemotePinner for PinataClient {
    fn provider(&self) -> PinProvider {
        PinProvider::Pinata
    }

    #[instrument(skip(self, cid, metadata, host_hints), fields(cid = %cid, hints = host_hints.len()))]
    async fn request_pin(
        &self,
        cid: &ContentId,
        metadata: &PinMetadata,
        host_hints: &[String],
    ) -> Result<()> {
        let body = PinByHashRequest {
            hash_to_pin: cid.as_str(),
            pinata_metadata: metadata,
            pinata_options: PinataOptions { host_nodes: host_hints },
        };

        let url = format!("{}/pinning/pinByHash", self.config.api_url.trim_end_matches('/'));
        let response = self
            .authorize(self.http_client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(PinProvider::Pinata, self.config.timeout_seconds, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DeployError::RemotePinFailed {
                provider: PinProvider::Pinata,
                reason: format!("HTTP {status}: {text}"),
            });
        }

        match response.json::<PinByHashResponse>().await {
            Ok(ack) => debug!(id = ?ack.id, status = ?ack.status, "Pinata accepted pin request"),
            Err(e) => debug!(error = %e, "Pinata acknowledgment not parsed"),
        }

        info!("Pinned to Pinata");
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PinByHashRequest<'a> {
    hash_to_pin: &'a str,
    pinata_metadata: &'a PinMetadata,
    pinata_options: PinataOptions<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PinataOptions<'a> {
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    host_nodes: &'a [String],
}

#[derive(Debug, Deserialize)]
struct PinByHashResponse {
    id: Option<String>,
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, config: PinataConfig) -> PinataClient {
        PinataClient::with_config(PinataConfig {
            api_url: server.uri(),
            timeout_seconds: 5,
            ..config
        })
        .unwrap()
    }

    #[test]
    fn test_requires_credentials() {
        assert!(matches!(
            PinataClient::with_config(PinataConfig::default()),
            Err(DeployError::InvalidConfiguration(_))
        ));
        assert!(!PinataConfig {
            api_key: Some("key".into()),
            ..Default::default()
        }
        .has_credentials());
        assert!(PinataConfig::with_jwt("jwt").has_credentials());
    }

    #[tokio::test]
    async fn test_pin_by_hash_sends_metadata_and_hosts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pinning/pinByHash"))
            .and(header("pinata_api_key", "key"))
            .and(header("pinata_secret_api_key", "secret"))
            .and(body_json(serde_json::json!({
                "hashToPin": "bafyABC123",
                "pinataMetadata": {
                    "name": "example.com",
                    "keyvalues": { "gitCommitHash": "abc123" }
                },
                "pinataOptions": {
                    "hostNodes": ["/ip4/203.0.113.9/tcp/4001"]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pin-1",
                "ipfsHash": "bafyABC123",
                "status": "prechecking",
                "name": "example.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, PinataConfig::new("key", "secret"));
        let cid = ContentId::new("bafyABC123").unwrap();
        let meta = PinMetadata::new("example.com").with_git_commit("abc123");

        client
            .request_pin(&cid, &meta, &["/ip4/203.0.113.9/tcp/4001".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_jwt_auth_and_empty_hints() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pinning/pinByHash"))
            .and(header("authorization", "Bearer token"))
            .and(body_json(serde_json::json!({
                "hashToPin": "bafyABC123",
                "pinataMetadata": { "name": "example.com" },
                "pinataOptions": {}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, PinataConfig::with_jwt("token"));
        let cid = ContentId::new("bafyABC123").unwrap();
        client
            .request_pin(&cid, &PinMetadata::new("example.com"), &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejection_is_remote_pin_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pinning/pinByHash"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let client = client_for(&server, PinataConfig::new("key", "bad"));
        let cid = ContentId::new("bafyABC123").unwrap();
        let err = client
            .request_pin(&cid, &PinMetadata::new("example.com"), &[])
            .await
            .unwrap_err();

        match err {
            DeployError::RemotePinFailed { provider, reason } => {
                assert_eq!(provider, PinProvider::Pinata);
                assert!(reason.contains("401"));
                assert!(reason.contains("invalid key"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
