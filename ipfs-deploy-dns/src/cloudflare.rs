//! Cloudflare DNSLink publisher.
//!
//! Upserts `_dnslink.<domain>` through the v4 API:
//! 1. Find the zone id (`GET /zones?name=...`)
//! 2. Look for an existing TXT record (`GET /zones/{id}/dns_records`)
//! 3. `PUT` it if found, otherwise `POST` a new one

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use ipfs_deploy_core::constants::{CLOUDFLARE_API_URL, DEFAULT_TIMEOUT_SECONDS};
use ipfs_deploy_core::error::{DeployError, Result, Step};
use ipfs_deploy_core::traits::DnsPublisher;
use ipfs_deploy_core::types::ContentId;

use crate::dnslink_record_name;

/// Cloudflare client configuration.
///
/// Authenticates with either a global API key plus account email, or a
/// scoped API token. The token wins when both are set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CloudflareConfig {
    /// API base URL
    pub api_url: String,
    /// Account email for global API key auth
    pub api_email: Option<String>,
    /// Global API key
    pub api_key: Option<String>,
    /// Scoped API token
    pub api_token: Option<String>,
    /// Zone name; when unset the domain and its parents are tried
    pub zone: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for CloudflareConfig {
    fn default() -> Self {
        Self {
            api_url: CLOUDFLARE_API_URL.into(),
            api_email: None,
            api_key: None,
            api_token: None,
            zone: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl CloudflareConfig {
    /// Creates a config using global API key auth.
    pub fn new(api_email: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_email: Some(api_email.into()),
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Creates a config using a scoped API token.
    pub fn with_token(api_token: impl Into<String>) -> Self {
        Self {
            api_token: Some(api_token.into()),
            ..Default::default()
        }
    }

    /// Returns true if some usable credential is present.
    pub fn has_credentials(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        set(&self.api_token) || (set(&self.api_email) && set(&self.api_key))
    }
}

/// Cloudflare DNSLink publisher.
pub struct CloudflareClient {
    config: CloudflareConfig,
    http_client: reqwest::Client,
}

impl CloudflareClient {
    /// Creates a client with the given config.
    ///
    /// Credentials are checked when publishing, not here, so a client can be
    /// built before the configuration is known to be complete.
    pub fn with_config(config: CloudflareConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DeployError::InvalidConfiguration(format!("HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.config.api_token, &self.config.api_email, &self.config.api_key) {
            (Some(token), _, _) if !token.is_empty() => request.bearer_auth(token),
            (_, Some(email), Some(key)) => request
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", key),
            _ => request,
        }
    }

    /// Sends a request and unwraps Cloudflare's `{success, errors, result}` envelope.
    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|_| {
            DeployError::DnsUpdateFailed(format!("HTTP {status}: unexpected response: {text}"))
        })?;

        match envelope.result {
            Some(result) if envelope.success && status.is_success() => Ok(result),
            _ => {
                let reasons: Vec<String> = envelope
                    .errors
                    .iter()
                    .map(|e| format!("{} ({})", e.message, e.code))
                    .collect();
                Err(DeployError::DnsUpdateFailed(format!(
                    "HTTP {status}: {}",
                    if reasons.is_empty() {
                        "request failed".to_string()
                    } else {
                        reasons.join("; ")
                    }
                )))
            }
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> DeployError {
        if err.is_timeout() {
            DeployError::NetworkTimeout {
                step: Step::DnsUpdate,
                seconds: self.config.timeout_seconds,
            }
        } else {
            DeployError::DnsUpdateFailed(err.to_string())
        }
    }

    /// Finds the zone id for `domain`.
    async fn zone_id(&self, domain: &str) -> Result<String> {
        let candidates = match &self.config.zone {
            Some(zone) if !zone.is_empty() => vec![zone.clone()],
            _ => zone_candidates(domain),
        };

        for name in &candidates {
            let zones: Vec<Zone> = self
                .send(
                    self.http_client
                        .get(self.url("/zones"))
                        .query(&[("name", name.as_str())]),
                )
                .await?;

            if let Some(zone) = zones.into_iter().next() {
                debug!(zone = %name, id = %zone.id, "Found zone");
                return Ok(zone.id);
            }
        }

        Err(DeployError::DnsUpdateFailed(format!(
            "no Cloudflare zone found for {} (tried {})",
            domain,
            candidates.join(", ")
        )))
    }
}

#[async_trait]
impl DnsPublisher for CloudflareClient {
    #[instrument(skip(self, cid), fields(cid = %cid))]
    async fn publish_link(&self, domain: &str, cid: &ContentId) -> Result<String> {
        let domain = domain.trim().trim_end_matches('.');
        if domain.is_empty() {
            return Err(DeployError::InvalidConfiguration(
                "site domain is required to update DNS".into(),
            ));
        }
        if !self.config.has_credentials() {
            return Err(DeployError::InvalidConfiguration(
                "Cloudflare needs an API email and key, or an API token".into(),
            ));
        }
        if cid.as_str().is_empty() {
            return Err(DeployError::InvalidConfiguration(
                "content identifier is required to update DNS".into(),
            ));
        }

        let zone_id = self.zone_id(domain).await?;
        let record_name = dnslink_record_name(domain);
        let body = RecordBody {
            kind: "TXT",
            name: &record_name,
            content: cid.dnslink_value(),
            ttl: 1,
        };

        let existing: Vec<DnsRecord> = self
            .send(
                self.http_client
                    .get(self.url(&format!("/zones/{zone_id}/dns_records")))
                    .query(&[("type", "TXT"), ("name", record_name.as_str())]),
            )
            .await?;

        let record: DnsRecord = match existing.into_iter().next() {
            Some(record) => {
                debug!(id = %record.id, old = %record.content, "Updating DNSLink record");
                self.send(
                    self.http_client
                        .put(self.url(&format!("/zones/{zone_id}/dns_records/{}", record.id)))
                        .json(&body),
                )
                .await?
            }
            None => {
                debug!("Creating DNSLink record");
                self.send(
                    self.http_client
                        .post(self.url(&format!("/zones/{zone_id}/dns_records")))
                        .json(&body),
                )
                .await?
            }
        };

        info!(record = %record_name, content = %record.content, "Updated DNSLink");
        Ok(record.content)
    }
}

/// `blog.example.com` → `["blog.example.com", "example.com"]`.
fn zone_candidates(domain: &str) -> Vec<String> {
    let labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return vec![domain.to_string()];
    }
    (0..=labels.len() - 2).map(|i| labels[i..].join(".")).collect()
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct RecordBody<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    content: String,
    /// 1 means "automatic" to Cloudflare.
    ttl: u32,
}
