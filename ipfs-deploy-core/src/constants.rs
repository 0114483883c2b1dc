//! Named defaults for ipfs-deploy.
//!
//! Configuration structs start from these values; nothing here is mutable.

// ═══════════════════════════════════════════════════════════════════════════════
// LOCAL NODE
// ═══════════════════════════════════════════════════════════════════════════════

/// Kubo RPC endpoint used when no `api` file or override is found.
pub const DEFAULT_IPFS_API_URL: &str = "http://127.0.0.1:5001";

/// Name of the file a running daemon writes its RPC multiaddr to.
pub const IPFS_API_FILE: &str = "api";

/// Repo directory under the home directory when `IPFS_PATH` is unset.
pub const DEFAULT_IPFS_REPO_DIR: &str = ".ipfs";

/// Environment variable pointing at a non-default IPFS repo.
pub const IPFS_PATH_ENV: &str = "IPFS_PATH";

/// Directory published when none is given.
pub const DEFAULT_PUBLIC_DIR: &str = "public";

// ═══════════════════════════════════════════════════════════════════════════════
// REMOTE SERVICES
// ═══════════════════════════════════════════════════════════════════════════════

/// Pinata REST API base.
pub const PINATA_API_URL: &str = "https://api.pinata.cloud";

/// Infura IPFS RPC base.
pub const INFURA_API_URL: &str = "https://ipfs.infura.io:5001";

/// Cloudflare v4 API base.
pub const CLOUDFLARE_API_URL: &str = "https://api.cloudflare.com/client/v4";

/// Label prefixed to the site domain to form the DNSLink record name.
pub const DNSLINK_LABEL: &str = "_dnslink";

/// Pinata keyvalue carrying the build's commit hash.
pub const GIT_COMMIT_KEYVALUE: &str = "gitCommitHash";

// ═══════════════════════════════════════════════════════════════════════════════
// TIMEOUTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-request timeout for remote calls, in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Per-request timeout for the local daemon, in seconds.
///
/// Adding a large site can take a while, so this is looser than the remote one.
pub const DEFAULT_NODE_TIMEOUT_SECONDS: u64 = 300;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_urls_are_https() {
        for url in [PINATA_API_URL, INFURA_API_URL, CLOUDFLARE_API_URL] {
            assert!(url.starts_with("https://"), "{url} should be https");
        }
    }

    #[test]
    fn test_node_timeout_covers_remote_timeout() {
        assert!(DEFAULT_NODE_TIMEOUT_SECONDS >= DEFAULT_TIMEOUT_SECONDS);
    }
}
