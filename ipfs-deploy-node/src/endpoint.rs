//! Locating the daemon's RPC endpoint.
//!
//! A running Kubo daemon writes its RPC multiaddr to `$IPFS_PATH/api`
//! (`~/.ipfs/api` by default). Reading it lets deploys work against daemons
//! bound to non-default ports without extra flags.

use std::path::{Path, PathBuf};

use multiaddr::{Multiaddr, Protocol};
use tracing::debug;

use ipfs_deploy_core::constants::{
    DEFAULT_IPFS_API_URL, DEFAULT_IPFS_REPO_DIR, IPFS_API_FILE, IPFS_PATH_ENV,
};

/// Returns the RPC base URL to use.
///
/// Precedence: `explicit`, then the repo's `api` file, then
/// [`DEFAULT_IPFS_API_URL`].
pub fn resolve_api_url(explicit: Option<&str>) -> String {
    resolve_api_url_in(explicit, default_repo_dir().as_deref())
}

fn resolve_api_url_in(explicit: Option<&str>, repo_dir: Option<&Path>) -> String {
    if let Some(url) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
        return match multiaddr_to_url(url) {
            Some(converted) => converted,
            None => url.trim_end_matches('/').to_string(),
        };
    }

    if let Some(dir) = repo_dir {
        let api_file = dir.join(IPFS_API_FILE);
        if let Ok(contents) = std::fs::read_to_string(&api_file) {
            if let Some(url) = multiaddr_to_url(contents.trim()) {
                debug!(path = %api_file.display(), url, "Using daemon api file");
                return url;
            }
        }
    }

    DEFAULT_IPFS_API_URL.to_string()
}

fn default_repo_dir() -> Option<PathBuf> {
    match std::env::var_os(IPFS_PATH_ENV) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => dirs::home_dir().map(|home| home.join(DEFAULT_IPFS_REPO_DIR)),
    }
}

/// Converts a TCP multiaddr like `/ip4/127.0.0.1/tcp/5001` into an HTTP URL.
///
/// Returns `None` for anything that isn't `<ip4|ip6|dns|dns4|dns6>/<host>/tcp/<port>`,
/// optionally followed by `/http` or `/https`.
pub fn multiaddr_to_url(multiaddr: &str) -> Option<String> {
    let addr: Multiaddr = multiaddr.parse().ok()?;
    let mut parts = addr.iter();

    let host = match parts.next()? {
        Protocol::Ip4(ip) => ip.to_string(),
        Protocol::Ip6(ip) => format!("[{ip}]"),
        Protocol::Dns(name) | Protocol::Dns4(name) | Protocol::Dns6(name) => name.to_string(),
        _ => return None,
    };
    let Protocol::Tcp(port) = parts.next()? else {
        return None;
    };
    let scheme = match (parts.next(), parts.next()) {
        (None, _) | (Some(Protocol::Http), None) => "http",
        (Some(Protocol::Https), None) => "https",
        _ => return None,
    };

    Some(format!("{scheme}://{host}:{port}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("/ip4/127.0.0.1/tcp/5001", Some("http://127.0.0.1:5001") ; "ip4")]
    #[test_case("/ip6/::1/tcp/5001", Some("http://[::1]:5001") ; "ip6")]
    #[test_case("/dns4/ipfs.local/tcp/5001/https", Some("https://ipfs.local:5001") ; "dns https")]
    #[test_case("/unix/tmp/ipfs.sock", None ; "unix socket")]
    #[test_case("/ip4/127.0.0.1/udp/5001", None ; "udp")]
    #[test_case("/ip4/127.0.0.1/tcp/notaport", None ; "bad port")]
    #[test_case("/ip4/127.0.0.1/tcp/99999", None ; "port out of range")]
    #[test_case("/ip4/127.0.0.1/tcp/5001/ws", None ; "trailing websocket")]
    #[test_case("/ip4/127.0.0.1", None ; "no port")]
    #[test_case("http://127.0.0.1:5001", None ; "already a url")]
    fn test_multiaddr_to_url(addr: &str, expected: Option<&str>) {
        assert_eq!(multiaddr_to_url(addr).as_deref(), expected);
    }

    #[test]
    fn test_explicit_url_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("api"), "/ip4/127.0.0.1/tcp/9999").unwrap();

        assert_eq!(
            resolve_api_url_in(Some("http://10.0.0.5:5001/"), Some(dir.path())),
            "http://10.0.0.5:5001"
        );
        assert_eq!(
            resolve_api_url_in(Some("/ip4/10.0.0.5/tcp/5001"), Some(dir.path())),
            "http://10.0.0.5:5001"
        );
    }

    #[test]
    fn test_reads_api_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("api"), "/ip4/127.0.0.1/tcp/45005\n").unwrap();

        assert_eq!(resolve_api_url_in(None, Some(dir.path())), "http://127.0.0.1:45005");
    }

    #[test]
    fn test_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_api_url_in(None, Some(dir.path())), DEFAULT_IPFS_API_URL);
        assert_eq!(resolve_api_url_in(Some("  "), None), DEFAULT_IPFS_API_URL);
    }
}
