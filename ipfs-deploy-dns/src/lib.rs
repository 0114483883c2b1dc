//! DNSLink publishing for ipfs-deploy.
//!
//! A DNSLink record is a TXT record at `_dnslink.<domain>` whose value is
//! `dnslink=/ipfs/<cid>`. Gateways resolving `<domain>` follow it to the
//! published content.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cloudflare;

pub use cloudflare::{CloudflareClient, CloudflareConfig};

use ipfs_deploy_core::constants::DNSLINK_LABEL;

/// Returns the TXT record name carrying the DNSLink for `domain`.
pub fn dnslink_record_name(domain: &str) -> String {
    format!("{}.{}", DNSLINK_LABEL, domain.trim_end_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dnslink_record_name() {
        assert_eq!(dnslink_record_name("example.com"), "_dnslink.example.com");
        assert_eq!(dnslink_record_name("example.com."), "_dnslink.example.com");
    }
}
