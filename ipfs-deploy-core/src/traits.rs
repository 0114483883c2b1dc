//! Collaborator traits sequenced by the deployment orchestrator.
//!
//! The orchestrator only ever talks to these traits, so tests can swap any
//! service for an in-memory double.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ContentId, NodeAddressSet, PinMetadata, PinProvider};

// ═══════════════════════════════════════════════════════════════════════════════
// LOCAL NODE
// ═══════════════════════════════════════════════════════════════════════════════

/// A running IPFS daemon.
#[async_trait]
pub trait LocalNode: Send + Sync {
    /// Adds every file under `path` and returns the root identifier.
    ///
    /// The root is the last entry the daemon reports for the add.
    async fn add_directory(&self, path: &Path) -> Result<ContentId>;

    /// Pins `cid` recursively on the local node.
    async fn pin(&self, cid: &ContentId) -> Result<()>;

    /// Returns the node's currently advertised multiaddrs.
    async fn list_addresses(&self) -> Result<NodeAddressSet>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// REMOTE PINNING
// ═══════════════════════════════════════════════════════════════════════════════

/// A remote pinning service.
#[async_trait]
pub trait RemotePinner: Send + Sync {
    /// Which provider this client talks to.
    fn provider(&self) -> PinProvider;

    /// Asks the provider to fetch and retain `cid`.
    ///
    /// `host_hints` are multiaddrs the provider may dial directly; providers
    /// without support for them ignore the slice.
    async fn request_pin(
        &self,
        cid: &ContentId,
        metadata: &PinMetadata,
        host_hints: &[String],
    ) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// DNS
// ═══════════════════════════════════════════════════════════════════════════════

/// A DNS provider able to upsert DNSLink TXT records.
#[async_trait]
pub trait DnsPublisher: Send + Sync {
    /// Points `domain`'s DNSLink record at `cid` and returns the stored record content.
    async fn publish_link(&self, domain: &str, cid: &ContentId) -> Result<String>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROCESS SIDE EFFECTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Desktop side effects run after a successful publish.
#[async_trait]
pub trait SideEffects: Send + Sync {
    /// Writes `text` to the system clipboard.
    async fn copy_to_clipboard(&self, text: &str) -> Result<()>;

    /// Opens `url` in the default browser.
    async fn open_url(&self, url: &str) -> Result<()>;
}
