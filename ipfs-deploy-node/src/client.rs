//! Kubo RPC client.
//!
//! Uses `/api/v0/add` for the recursive add, `/api/v0/pin/add` for the local
//! pin, and `/api/v0/id` for the advertised addresses. Every RPC call is a
//! POST, as Kubo requires.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use ipfs_deploy_core::constants::DEFAULT_NODE_TIMEOUT_SECONDS;
use ipfs_deploy_core::error::{DeployError, Result, Step};
use ipfs_deploy_core::traits::LocalNode;
use ipfs_deploy_core::types::{ContentId, NodeAddressSet};

use crate::endpoint::resolve_api_url;
use crate::upload::{collect_entries, UploadKind};

/// Local node client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// RPC base URL (e.g. "http://127.0.0.1:5001")
    pub api_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// CID version for added content; `None` keeps the daemon default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid_version: Option<u8>,
    /// Whether dotfiles are uploaded
    #[serde(default)]
    pub include_hidden: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api_url: resolve_api_url(None),
            timeout_seconds: DEFAULT_NODE_TIMEOUT_SECONDS,
            cid_version: None,
            include_hidden: false,
        }
    }
}

impl NodeConfig {
    /// Creates a config for the given RPC URL or multiaddr.
    pub fn new(api: impl AsRef<str>) -> Self {
        Self {
            api_url: resolve_api_url(Some(api.as_ref())),
            ..Default::default()
        }
    }
}

/// Client for a running Kubo daemon.
pub struct KuboClient {
    config: NodeConfig,
    http_client: reqwest::Client,
}

impl KuboClient {
    /// Creates a client with the given config.
    pub fn with_config(config: NodeConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DeployError::InvalidConfiguration(format!("HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn endpoint(&self, command: &str) -> String {
        format!("{}/api/v0/{}", self.config.api_url.trim_end_matches('/'), command)
    }

    fn transport_error(&self, step: Step, err: reqwest::Error) -> DeployError {
        if err.is_timeout() {
            DeployError::NetworkTimeout {
                step,
                seconds: self.config.timeout_seconds,
            }
        } else if err.is_connect() {
            DeployError::DaemonUnreachable(self.config.api_url.clone())
        } else {
            DeployError::LocalAddFailed(err.to_string())
        }
    }

    /// Sends an RPC request and returns the body of a successful response.
    async fn call(&self, step: Step, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(step, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(step, e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<RpcError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(DeployError::LocalAddFailed(format!(
                "{step} returned HTTP {status}: {message}"
            )));
        }

        Ok(body)
    }

    async fn build_form(&self, path: &Path) -> Result<(Form, usize)> {
        let entries = collect_entries(path, self.config.include_hidden)?;
        let count = entries.len();

        let mut form = Form::new();
        for entry in entries {
            let data = match &entry.kind {
                UploadKind::Directory => Vec::new(),
                UploadKind::File(source) => tokio::fs::read(source).await?,
            };
            let part = Part::bytes(data)
                .file_name(entry.encoded_name())
                .mime_str(entry.mime())
                .map_err(|e| DeployError::LocalAddFailed(e.to_string()))?;
            form = form.part("file", part);
        }

        Ok((form, count))
    }
}

#[async_trait]
impl LocalNode for KuboClient {
    #[instrument(skip(self), fields(api = %self.config.api_url))]
    async fn add_directory(&self, path: &Path) -> Result<ContentId> {
        let (form, count) = self.build_form(path).await?;
        debug!(entries = count, "Uploading directory tree");

        let mut query = vec![
            ("recursive", "true".to_string()),
            ("pin", "false".to_string()),
            ("progress", "false".to_string()),
            ("wrap-with-directory", "false".to_string()),
        ];
        if let Some(version) = self.config.cid_version {
            query.push(("cid-version", version.to_string()));
        }

        let body = self
            .call(
                Step::LocalAdd,
                self.http_client
                    .post(self.endpoint("add"))
                    .query(&query)
                    .multipart(form),
            )
            .await?;

        let cid = parse_add_output(&body)?;
        info!(%cid, "Added directory to local node");
        Ok(cid)
    }

    #[instrument(skip(self, cid), fields(cid = %cid))]
    async fn pin(&self, cid: &ContentId) -> Result<()> {
        let body = self
            .call(
                Step::LocalPin,
                self.http_client
                    .post(self.endpoint("pin/add"))
                    .query(&[("arg", cid.as_str()), ("recursive", "true")]),
            )
            .await?;

        let pinned: PinAddResponse = serde_json::from_str(&body)?;
        if !pinned.pins.iter().any(|p| p == cid.as_str()) {
            return Err(DeployError::LocalAddFailed(format!(
                "daemon did not confirm pin of {cid}"
            )));
        }

        debug!("Pinned locally");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_addresses(&self) -> Result<NodeAddressSet> {
        let body = self
            .call(
                Step::AddressDiscovery,
                self.http_client.post(self.endpoint("id")),
            )
            .await?;

        let id: IdResponse = serde_json::from_str(&body)?;
        let addresses = id.addresses.unwrap_or_default();
        debug!(peer = %id.id, count = addresses.len(), "Listed node addresses");
        Ok(NodeAddressSet::from(addresses))
    }
}

/// Picks the root identifier out of an `/api/v0/add` NDJSON stream.
///
/// The root is the last entry carrying a hash. An error object anywhere in the
/// stream fails the whole add.
fn parse_add_output(body: &str) -> Result<ContentId> {
    let mut root = None;

    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let item: AddItem = serde_json::from_str(line)?;

        if item.kind.as_deref() == Some("error") {
            return Err(DeployError::LocalAddFailed(
                item.message.unwrap_or_else(|| "daemon reported an error".into()),
            ));
        }
        if let Some(hash) = item.hash {
            root = Some(hash);
        }
    }

    let hash = root.ok_or_else(|| {
        DeployError::LocalAddFailed("daemon returned no entries for the add".into())
    })?;
    ContentId::new(hash)
}

#[derive(Debug, Deserialize)]
struct AddItem {
    #[serde(rename = "Hash")]
    hash: Option<String>,
    #[serde(rename = "Type")]
    kind: Option<String>,
    #[serde(rename = "Message")]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PinAddResponse {
    #[serde(rename = "Pins", default)]
    pins: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    #[serde(rename = "ID", default)]
    id: String,
    #[serde(rename = "Addresses")]
    addresses: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(rename = "Message")]
    message: String,
}
