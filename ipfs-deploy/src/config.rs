//! Deployment configuration.
//!
//! Loaded once per run, from defaults, the environment (`.env` included), and
//! finally CLI overrides. Never mutated once the pipeline starts.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ipfs_deploy_core::constants::DEFAULT_PUBLIC_DIR;
use ipfs_deploy_core::error::{DeployError, Result};
use ipfs_deploy_core::types::{PinMetadata, PinProvider};
use ipfs_deploy_dns::CloudflareConfig;
use ipfs_deploy_node::{resolve_api_url, NodeConfig};
use ipfs_deploy_pin::{InfuraConfig, PinataConfig};

/// Prefix shared by every environment variable read here.
pub const ENV_PREFIX: &str = "IPFS_DEPLOY_";

/// Which pinning providers run, and which of them must succeed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinPolicy {
    /// Providers asked to pin, in order
    pub enabled_providers: Vec<PinProvider>,
    /// Providers whose failure aborts the run before DNS is touched
    #[serde(default)]
    pub required_providers: Vec<PinProvider>,
}

impl Default for PinPolicy {
    fn default() -> Self {
        Self {
            enabled_providers: PinProvider::ALL.to_vec(),
            required_providers: Vec::new(),
        }
    }
}

impl PinPolicy {
    /// Returns true if a failure of `provider` must abort the run.
    pub fn is_required(&self, provider: PinProvider) -> bool {
        self.required_providers.contains(&provider)
    }

    /// Returns true if `provider` should be asked to pin.
    pub fn is_enabled(&self, provider: PinProvider) -> bool {
        self.enabled_providers.contains(&provider)
    }
}

/// Build provenance attached to remote pins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployMetadata {
    /// Commit the site was built from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
}

/// Everything one deployment needs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Whether to upsert the DNSLink record
    pub update_dns: bool,
    /// Whether to open `https://<site_domain>` afterwards
    pub open: bool,
    /// Directory to publish
    pub public_dir_path: PathBuf,
    /// Site domain, used for DNS, the pin name, and the opened URL
    pub site_domain: Option<String>,
    /// Local daemon
    pub node: NodeConfig,
    /// DNS provider
    pub cloudflare: CloudflareConfig,
    /// Pinata credentials
    pub pinata: PinataConfig,
    /// Infura credentials
    pub infura: InfuraConfig,
    /// Pinning policy
    pub pin_policy: PinPolicy,
    /// Build provenance
    pub metadata: DeployMetadata,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            update_dns: true,
            open: false,
            public_dir_path: PathBuf::from(DEFAULT_PUBLIC_DIR),
            site_domain: None,
            node: NodeConfig::default(),
            cloudflare: CloudflareConfig::default(),
            pinata: PinataConfig::default(),
            infura: InfuraConfig::default(),
            pin_policy: PinPolicy::default(),
            metadata: DeployMetadata::default(),
        }
    }
}

impl DeployConfig {
    /// Loads configuration from `IPFS_DEPLOY_*` variables, reading `.env` first.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which receives full variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            lookup(&format!("{ENV_PREFIX}{suffix}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(v) = var("UPDATE_DNS") {
            config.update_dns = parse_bool("UPDATE_DNS", &v)?;
        }
        if let Some(v) = var("OPEN") {
            config.open = parse_bool("OPEN", &v)?;
        }
        if let Some(v) = var("PUBLIC_DIR") {
            config.public_dir_path = PathBuf::from(v);
        }
        config.site_domain = var("SITE_DOMAIN");

        if let Some(api) = var("IPFS_API") {
            config = config.with_ipfs_api(api);
        }

        config.cloudflare.api_email = var("CLOUDFLARE__API_EMAIL");
        config.cloudflare.api_key = var("CLOUDFLARE__API_KEY");
        config.cloudflare.api_token = var("CLOUDFLARE__API_TOKEN");
        config.cloudflare.zone = var("CLOUDFLARE__ZONE");

        config.pinata.api_key = var("PINATA__API_KEY");
        config.pinata.secret_api_key = var("PINATA__SECRET_API_KEY");
        config.pinata.jwt = var("PINATA__JWT");

        config.infura.project_id = var("INFURA__PROJECT_ID");
        config.infura.project_secret = var("INFURA__PROJECT_SECRET");

        if let Some(v) = var("PINNERS") {
            config.pin_policy.enabled_providers = parse_providers(&v)?;
        }
        if let Some(v) = var("REQUIRED_PINNERS") {
            config.pin_policy.required_providers = parse_providers(&v)?;
        }

        config.metadata.git_commit = var("GIT_COMMIT");

        if let Some(v) = var("TIMEOUT") {
            let seconds = v.parse::<u64>().map_err(|_| {
                DeployError::InvalidConfiguration(format!("{ENV_PREFIX}TIMEOUT must be seconds, got '{v}'"))
            })?;
            config = config.with_timeout(seconds);
        }

        Ok(config)
    }

    /// Sets the per-request timeout of every remote client.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.pinata.timeout_seconds = seconds;
        self.infura.timeout_seconds = seconds;
        self.cloudflare.timeout_seconds = seconds;
        self
    }

    /// Points the local node client at `api`, a URL or a multiaddr.
    pub fn with_ipfs_api(mut self, api: impl AsRef<str>) -> Self {
        self.node.api_url = resolve_api_url(Some(api.as_ref()));
        self
    }

    /// Sets the directory to publish.
    pub fn with_public_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.public_dir_path = path.into();
        self
    }

    /// Sets the site domain.
    pub fn with_site_domain(mut self, domain: impl Into<String>) -> Self {
        self.site_domain = Some(domain.into());
        self
    }

    /// Returns the site domain if set and non-empty.
    pub fn site_domain(&self) -> Option<&str> {
        self.site_domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// Returns the URL opened after a deploy, if a domain is configured.
    pub fn site_url(&self) -> Option<String> {
        self.site_domain().map(|d| format!("https://{d}"))
    }

    /// Builds the metadata sent with remote pin requests.
    ///
    /// The pin is named after the site domain, or the directory when there is none.
    pub fn pin_metadata(&self) -> PinMetadata {
        let name = match self.site_domain() {
            Some(domain) => domain.to_string(),
            None => self
                .public_dir_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| DEFAULT_PUBLIC_DIR.to_string()),
        };

        let metadata = PinMetadata::new(name);
        match &self.metadata.git_commit {
            Some(commit) => metadata.with_git_commit(commit),
            None => metadata,
        }
    }

    /// Checks the configuration without touching the network.
    pub fn validate(&self) -> Result<()> {
        if self.public_dir_path.as_os_str().is_empty() {
            return Err(DeployError::InvalidConfiguration(
                "directory to publish cannot be empty".into(),
            ));
        }

        if self.update_dns {
            if self.site_domain().is_none() {
                return Err(DeployError::InvalidConfiguration(
                    "updating DNS needs a site domain".into(),
                ));
            }
            if !self.cloudflare.has_credentials() {
                return Err(DeployError::InvalidConfiguration(
                    "updating DNS needs Cloudflare credentials (email + key, or token)".into(),
                ));
            }
        }

        if self.open && self.site_domain().is_none() {
            return Err(DeployError::InvalidConfiguration(
                "opening the site needs a site domain".into(),
            ));
        }

        for required in &self.pin_policy.required_providers {
            if !self.pin_policy.is_enabled(*required) {
                return Err(DeployError::InvalidConfiguration(format!(
                    "{required} is required but not enabled"
                )));
            }
        }

        if self.pin_policy.is_enabled(PinProvider::Pinata) && !self.pinata.has_credentials() {
            return Err(DeployError::InvalidConfiguration(
                "Pinata is enabled but has no API key/secret or JWT".into(),
            ));
        }

        Ok(())
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DeployError::InvalidConfiguration(format!(
            "{ENV_PREFIX}{name} must be a boolean, got '{value}'"
        ))),
    }
}

/// Parses a comma-separated provider list, dropping duplicates.
pub fn parse_providers(value: &str) -> Result<Vec<PinProvider>> {
    let mut providers = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let provider = item.parse::<PinProvider>()?;
        if !providers.contains(&provider) {
            providers.push(provider);
        }
    }
    Ok(providers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn valid() -> DeployConfig {
        DeployConfig {
            pinata: PinataConfig::new("key", "secret"),
            cloudflare: CloudflareConfig::new("ops@example.com", "cf-key"),
            ..DeployConfig::default()
        }
        .with_site_domain("example.com")
    }

    #[test]
    fn test_defaults() {
        let config = DeployConfig::default();
        assert!(config.update_dns);
        assert!(!config.open);
        assert_eq!(config.public_dir_path, PathBuf::from("public"));
        assert_eq!(config.pin_policy.enabled_providers, vec![PinProvider::Pinata, PinProvider::Infura]);
        assert!(config.pin_policy.required_providers.is_empty());
    }

    #[test]
    fn test_from_lookup() {
        let config = DeployConfig::from_lookup(lookup(&[
            ("IPFS_DEPLOY_SITE_DOMAIN", "example.com"),
            ("IPFS_DEPLOY_CLOUDFLARE__API_EMAIL", "ops@example.com"),
            ("IPFS_DEPLOY_CLOUDFLARE__API_KEY", "cf-key"),
            ("IPFS_DEPLOY_PINATA__API_KEY", "key"),
            ("IPFS_DEPLOY_PINATA__SECRET_API_KEY", "secret"),
            ("IPFS_DEPLOY_REQUIRED_PINNERS", "pinata"),
            ("IPFS_DEPLOY_PUBLIC_DIR", "dist"),
            ("IPFS_DEPLOY_OPEN", "yes"),
            ("IPFS_DEPLOY_GIT_COMMIT", "abc123"),
            ("IPFS_DEPLOY_TIMEOUT", "12"),
            ("IPFS_DEPLOY_IPFS_API", "/ip4/127.0.0.1/tcp/5002"),
        ]))
        .unwrap();

        assert_eq!(config.site_domain(), Some("example.com"));
        assert_eq!(config.public_dir_path, PathBuf::from("dist"));
        assert!(config.open);
        assert_eq!(config.pin_policy.required_providers, vec![PinProvider::Pinata]);
        assert_eq!(config.cloudflare.timeout_seconds, 12);
        assert_eq!(config.node.api_url, "http://127.0.0.1:5002");
        assert_eq!(config.site_url().as_deref(), Some("https://example.com"));
        config.validate().unwrap();
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        assert!(DeployConfig::from_lookup(lookup(&[("IPFS_DEPLOY_OPEN", "maybe")])).is_err());
        assert!(DeployConfig::from_lookup(lookup(&[("IPFS_DEPLOY_PINNERS", "pinata,web3")])).is_err());
        assert!(DeployConfig::from_lookup(lookup(&[("IPFS_DEPLOY_TIMEOUT", "soon")])).is_err());
    }

    #[test]
    fn test_parse_providers_dedupes() {
        assert_eq!(
            parse_providers("infura, pinata,infura,").unwrap(),
            vec![PinProvider::Infura, PinProvider::Pinata]
        );
        assert!(parse_providers("").unwrap().is_empty());
    }

    #[test]
    fn test_validate_dns_needs_domain_and_credentials() {
        valid().validate().unwrap();

        let mut config = valid();
        config.site_domain = None;
        assert!(config.validate().unwrap_err().is_config_error());

        let mut config = valid();
        config.cloudflare = CloudflareConfig::default();
        assert!(config.validate().is_err());

        // Without DNS neither is needed.
        config.update_dns = false;
        config.site_domain = None;
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_pin_policy() {
        let mut config = valid();
        config.pin_policy = PinPolicy {
            enabled_providers: vec![PinProvider::Infura],
            required_providers: vec![PinProvider::Pinata],
        };
        assert!(config.validate().is_err());

        let mut config = valid();
        config.pinata = PinataConfig::default();
        assert!(config.validate().is_err());

        config.pin_policy.enabled_providers = vec![PinProvider::Infura];
        config.validate().unwrap();
    }

    #[test]
    fn test_pin_metadata() {
        let mut config = valid();
        config.metadata.git_commit = Some("abc123".into());
        let meta = config.pin_metadata();
        assert_eq!(meta.name, "example.com");
        assert_eq!(meta.keyvalues.get("gitCommitHash").map(String::as_str), Some("abc123"));

        let config = DeployConfig::default().with_public_dir("site/dist");
        assert_eq!(config.pin_metadata().name, "dist");
    }
}
