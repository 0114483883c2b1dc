//! Remote pinning providers and the metadata sent with a pin request.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::GIT_COMMIT_KEYVALUE;
use crate::error::DeployError;

/// A remote pinning service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinProvider {
    /// pinata.cloud
    Pinata,
    /// infura.io
    Infura,
}

impl PinProvider {
    /// All known providers, in default order.
    pub const ALL: [PinProvider; 2] = [PinProvider::Pinata, PinProvider::Infura];

    /// Human-facing host name of the service.
    pub fn host(self) -> &'static str {
        match self {
            PinProvider::Pinata => "pinata.cloud",
            PinProvider::Infura => "infura.io",
        }
    }
}

impl fmt::Display for PinProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinProvider::Pinata => f.write_str("pinata"),
            PinProvider::Infura => f.write_str("infura"),
        }
    }
}

impl FromStr for PinProvider {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pinata" => Ok(PinProvider::Pinata),
            "infura" => Ok(PinProvider::Infura),
            other => Err(DeployError::InvalidConfiguration(format!(
                "unknown pinning provider '{other}' (expected 'pinata' or 'infura')"
            ))),
        }
    }
}

/// Label and key/value tags shown on a provider's dashboard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinMetadata {
    /// Human-readable pin name, usually the site domain
    pub name: String,
    /// Extra string tags (e.g. build provenance)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub keyvalues: BTreeMap<String, String>,
}

impl PinMetadata {
    /// Creates metadata with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keyvalues: BTreeMap::new(),
        }
    }

    /// Adds a key/value tag.
    pub fn with_keyvalue(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.keyvalues.insert(key.into(), value.into());
        self
    }

    /// Tags the pin with the commit the site was built from.
    pub fn with_git_commit(self, commit: impl Into<String>) -> Self {
        self.with_keyvalue(GIT_COMMIT_KEYVALUE, commit)
    }
}
