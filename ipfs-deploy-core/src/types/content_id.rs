//! Content identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DeployError, Result};

/// Identifier of an immutable content tree on IPFS.
///
/// Opaque to this crate apart from being non-empty and free of whitespace
/// and path separators. One is produced per deployment and borrowed by every
/// later step.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// Wraps a raw identifier string.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(DeployError::InvalidConfiguration(
                "content identifier cannot be empty".into(),
            ));
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c == '?' || c == '&')
        {
            return Err(DeployError::InvalidConfiguration(format!(
                "content identifier contains invalid characters: {trimmed:?}"
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the IPFS path, e.g. `/ipfs/bafy...`.
    pub fn dnslink_path(&self) -> String {
        format!("/ipfs/{}", self.0)
    }

    /// Returns the TXT record value, e.g. `dnslink=/ipfs/bafy...`.
    pub fn dnslink_value(&self) -> String {
        format!("dnslink={}", self.dnslink_path())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContentId {
    type Error = DeployError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ContentId> for String {
    fn from(cid: ContentId) -> Self {
        cid.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dnslink_value() {
        let cid = ContentId::new("bafyABC123").unwrap();
        assert_eq!(cid.dnslink_path(), "/ipfs/bafyABC123");
        assert_eq!(cid.dnslink_value(), "dnslink=/ipfs/bafyABC123");
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let cid = ContentId::new("  QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG\n").unwrap();
        assert_eq!(cid.as_str(), "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG");
    }

    #[test]
    fn test_rejects_empty_and_paths() {
        assert!(ContentId::new("").is_err());
        assert!(ContentId::new("   ").is_err());
        assert!(ContentId::new("/ipfs/bafy").is_err());
        assert!(ContentId::new("bafy abc").is_err());
    }

    #[test]
    fn test_serde_validates() {
        let cid: ContentId = serde_json::from_str("\"bafyABC123\"").unwrap();
        assert_eq!(cid.to_string(), "bafyABC123");
        assert!(serde_json::from_str::<ContentId>("\"\"").is_err());
    }
}
