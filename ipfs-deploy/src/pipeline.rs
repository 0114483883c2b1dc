//! The deployment pipeline.
//!
//! ```text
//! preflight → local add → local pin → address discovery
//!           → remote pins (concurrent) → DNS update → post effects
//! ```
//!
//! Everything up to address discovery is fatal. Remote pins are fatal only
//! for providers named in [`PinPolicy::required_providers`]. DNS and the post
//! effects never abort a run: by then the content is already published.
//!
//! [`PinPolicy::required_providers`]: crate::config::PinPolicy

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, instrument, warn};

use ipfs_deploy_core::error::{DeployError, Result, Step};
use ipfs_deploy_core::traits::{DnsPublisher, LocalNode, RemotePinner, SideEffects};
use ipfs_deploy_core::types::{ContentId, PinProvider, StepResult};
use ipfs_deploy_dns::CloudflareClient;
use ipfs_deploy_node::KuboClient;
use ipfs_deploy_pin::{InfuraClient, PinataClient};

use crate::config::DeployConfig;
use crate::report::DeployReport;

/// Progress notifications emitted while a deploy runs.
#[derive(Clone, Debug)]
pub enum DeployEvent {
    /// A step is about to start.
    StepStarted(Step),
    /// The tree was added; carries the root identifier.
    Added(ContentId),
    /// The root is pinned on the local node.
    PinnedLocally,
    /// Node addresses were listed and filtered.
    AddressesDiscovered {
        /// Addresses the node advertises
        total: usize,
        /// Of those, publicly reachable ones
        public: usize,
    },
    /// A provider is being asked to pin.
    PinRequested(PinProvider),
    /// A provider accepted the pin.
    Pinned(PinProvider),
    /// A provider failed to pin.
    PinFailed(PinProvider, String),
    /// The DNSLink record now holds the given content.
    DnsUpdated {
        /// Record name that was written
        record: String,
        /// Stored record content
        content: String,
    },
    /// The DNSLink update failed.
    DnsFailed(String),
    /// The identifier is on the clipboard.
    Copied(ContentId),
    /// The site was opened in the browser.
    Opened(String),
    /// A post effect failed.
    EffectFailed(String),
}

/// Callback receiving [`DeployEvent`]s.
pub type EventCallback = Box<dyn Fn(&DeployEvent) + Send + Sync>;

/// Sequences one deployment.
pub struct Deployer {
    config: DeployConfig,
    node: Arc<dyn LocalNode>,
    pinners: Vec<Arc<dyn RemotePinner>>,
    dns: Option<Arc<dyn DnsPublisher>>,
    effects: Arc<dyn SideEffects>,
    on_event: Option<EventCallback>,
}

impl Deployer {
    /// Creates a deployer with no pinners and no DNS publisher.
    pub fn new(config: DeployConfig, node: Arc<dyn LocalNode>, effects: Arc<dyn SideEffects>) -> Self {
        Self {
            config,
            node,
            pinners: Vec::new(),
            dns: None,
            effects,
            on_event: None,
        }
    }

    /// Builds the real clients the configuration asks for.
    ///
    /// Fails with [`DeployError::InvalidConfiguration`] if the configuration
    /// does not validate; nothing is sent over the network.
    pub fn from_config(config: DeployConfig, effects: Arc<dyn SideEffects>) -> Result<Self> {
        config.validate()?;

        let node = Arc::new(KuboClient::with_config(config.node.clone())?);
        let mut pinners: Vec<Arc<dyn RemotePinner>> = Vec::new();
        for provider in &config.pin_policy.enabled_providers {
            match provider {
                PinProvider::Pinata => {
                    pinners.push(Arc::new(PinataClient::with_config(config.pinata.clone())?))
                }
                PinProvider::Infura => {
                    pinners.push(Arc::new(InfuraClient::with_config(config.infura.clone())?))
                }
            }
        }
        let dns: Option<Arc<dyn DnsPublisher>> = if config.update_dns {
            Some(Arc::new(CloudflareClient::with_config(config.cloudflare.clone())?))
        } else {
            None
        };

        let mut deployer = Self::new(config, node, effects);
        deployer.pinners = pinners;
        deployer.dns = dns;
        Ok(deployer)
    }

    /// Adds a remote pinner.
    pub fn with_pinner(mut self, pinner: Arc<dyn RemotePinner>) -> Self {
        self.pinners.push(pinner);
        self
    }

    /// Sets the DNS publisher.
    pub fn with_dns(mut self, dns: Arc<dyn DnsPublisher>) -> Self {
        self.dns = Some(dns);
        self
    }

    /// Registers a progress callback.
    pub fn on_event(mut self, callback: EventCallback) -> Self {
        self.on_event = Some(callback);
        self
    }

    fn emit(&self, event: DeployEvent) {
        if let Some(callback) = &self.on_event {
            callback(&event);
        }
    }

    /// Runs the pipeline to completion.
    ///
    /// Returns a report when the terminal state is reached, however many
    /// best-effort steps failed along the way. Returns an error only for
    /// fatal failures.
    #[instrument(skip(self), fields(dir = %self.config.public_dir_path.display()))]
    pub async fn run(&self) -> Result<DeployReport> {
        self.preflight().map_err(|e| fatal(Step::Preflight, e))?;

        self.emit(DeployEvent::StepStarted(Step::LocalAdd));
        let cid = self
            .node
            .add_directory(&self.config.public_dir_path)
            .await
            .map_err(|e| fatal(Step::LocalAdd, e))?;
        info!(%cid, "Added locally");
        self.emit(DeployEvent::Added(cid.clone()));

        self.emit(DeployEvent::StepStarted(Step::LocalPin));
        self.node
            .pin(&cid)
            .await
            .map_err(|e| fatal(Step::LocalPin, e))?;
        self.emit(DeployEvent::PinnedLocally);

        self.emit(DeployEvent::StepStarted(Step::AddressDiscovery));
        let addresses = self
            .node
            .list_addresses()
            .await
            .map_err(|e| fatal(Step::AddressDiscovery, e))?;
        let host_hints = addresses.public_only();
        info!(total = addresses.len(), public = host_hints.len(), "Discovered node addresses");
        self.emit(DeployEvent::AddressesDiscovered {
            total: addresses.len(),
            public: host_hints.len(),
        });

        let pins = self.pin_remotely(&cid, host_hints.as_slice()).await?;
        let dns = self.update_dns(&cid).await;
        let (clipboard, browser) = self.post_effects(&cid, dns.was_attempted()).await;

        Ok(DeployReport {
            cid,
            host_hints,
            pins,
            dns,
            clipboard,
            browser,
        })
    }

    fn preflight(&self) -> Result<()> {
        self.config.validate()?;

        for required in &self.config.pin_policy.required_providers {
            if !self.pinners.iter().any(|p| p.provider() == *required) {
                return Err(DeployError::InvalidConfiguration(format!(
                    "{required} is required but no client is configured for it"
                )));
            }
        }
        if self.config.update_dns && self.dns.is_none() {
            return Err(DeployError::InvalidConfiguration(
                "DNS update requested but no DNS publisher is configured".into(),
            ));
        }

        Ok(())
    }

    /// Asks every pinner concurrently; each is tried exactly once.
    async fn pin_remotely(
        &self,
        cid: &ContentId,
        host_hints: &[String],
    ) -> Result<BTreeMap<PinProvider, StepResult<()>>> {
        self.emit(DeployEvent::StepStarted(Step::RemotePin));
        let metadata = self.config.pin_metadata();

        let requests = self.pinners.iter().map(|pinner| {
            let metadata = &metadata;
            async move {
                let provider = pinner.provider();
                self.emit(DeployEvent::PinRequested(provider));
                (provider, pinner.request_pin(cid, metadata, host_hints).await)
            }
        });
        let outcomes = join_all(requests).await;

        let mut pins = BTreeMap::new();
        let mut required_failure = None;
        for (provider, outcome) in outcomes {
            match &outcome {
                Ok(()) => {
                    info!(%provider, "Pinned remotely");
                    self.emit(DeployEvent::Pinned(provider));
                }
                Err(e) => {
                    warn!(%provider, error = %e, "Remote pin failed");
                    self.emit(DeployEvent::PinFailed(provider, e.to_string()));
                }
            }

            let result = match outcome {
                Err(e) if self.config.pin_policy.is_required(provider) && required_failure.is_none() => {
                    let reason = e.to_string();
                    required_failure = Some(DeployError::RemotePinFailed {
                        provider,
                        reason: reason.clone(),
                    });
                    StepResult::Failed(reason)
                }
                other => other.into(),
            };
            pins.insert(provider, result);
        }

        match required_failure {
            Some(e) => Err(fatal(Step::RemotePin, e)),
            None => Ok(pins),
        }
    }

    async fn update_dns(&self, cid: &ContentId) -> StepResult<String> {
        if !self.config.update_dns {
            return StepResult::Skipped;
        }
        let (Some(dns), Some(domain)) = (&self.dns, self.config.site_domain()) else {
            return StepResult::Skipped;
        };

        self.emit(DeployEvent::StepStarted(Step::DnsUpdate));
        match dns.publish_link(domain, cid).await {
            Ok(content) => {
                info!(domain, %content, "DNSLink updated");
                self.emit(DeployEvent::DnsUpdated {
                    record: ipfs_deploy_dns::dnslink_record_name(domain),
                    content: content.clone(),
                });
                StepResult::Succeeded(content)
            }
            Err(e) => {
                warn!(domain, error = %e, "DNS update failed");
                self.emit(DeployEvent::DnsFailed(e.to_string()));
                StepResult::Failed(e.to_string())
            }
        }
    }

    async fn post_effects(
        &self,
        cid: &ContentId,
        dns_attempted: bool,
    ) -> (StepResult<()>, StepResult<String>) {
        self.emit(DeployEvent::StepStarted(Step::PostEffects));

        let clipboard = match self.effects.copy_to_clipboard(cid.as_str()).await {
            Ok(()) => {
                self.emit(DeployEvent::Copied(cid.clone()));
                StepResult::Succeeded(())
            }
            Err(e) => {
                warn!(error = %e, "Clipboard copy failed");
                self.emit(DeployEvent::EffectFailed(e.to_string()));
                StepResult::Failed(e.to_string())
            }
        };

        let browser = match self.config.site_url() {
            Some(url) if self.config.open && dns_attempted => {
                match self.effects.open_url(&url).await {
                    Ok(()) => {
                        self.emit(DeployEvent::Opened(url.clone()));
                        StepResult::Succeeded(url)
                    }
                    Err(e) => {
                        warn!(%url, error = %e, "Opening browser failed");
                        self.emit(DeployEvent::EffectFailed(e.to_string()));
                        StepResult::Failed(e.to_string())
                    }
                }
            }
            _ => StepResult::Skipped,
        };

        (clipboard, browser)
    }
}

fn fatal(step: Step, err: DeployError) -> DeployError {
    error!(%step, error = %err, "Deployment aborted");
    err
}
