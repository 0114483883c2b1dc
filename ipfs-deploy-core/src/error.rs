//! Error types for ipfs-deploy.
//!
//! One enum covers every step of the pipeline. Whether an error aborts a run
//! is decided by the orchestrator from the [`Step`] it happened in, never by
//! the error kind alone.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::PinProvider;

/// Result type alias using `DeployError`.
pub type Result<T> = std::result::Result<T, DeployError>;

/// A stage of the deployment pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Pre-flight configuration checks.
    Preflight,
    /// Adding the directory tree to the local node.
    LocalAdd,
    /// Pinning the root on the local node.
    LocalPin,
    /// Asking the local node for its advertised addresses.
    AddressDiscovery,
    /// Asking a remote provider to pin the root.
    RemotePin,
    /// Upserting the DNSLink record.
    DnsUpdate,
    /// Clipboard copy and browser open.
    PostEffects,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Preflight => "preflight",
            Step::LocalAdd => "local add",
            Step::LocalPin => "local pin",
            Step::AddressDiscovery => "address discovery",
            Step::RemotePin => "remote pin",
            Step::DnsUpdate => "DNS update",
            Step::PostEffects => "post effects",
        };
        f.write_str(name)
    }
}

/// Main error type for all ipfs-deploy operations.
#[derive(Debug, Error)]
pub enum DeployError {
    // ═══════════════════════════════════════════════════════════════════════════
    // LOCAL NODE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// No daemon answered on the configured RPC endpoint.
    #[error("Couldn't connect to local IPFS daemon at {0}. Is it running?")]
    DaemonUnreachable(String),

    /// The daemon answered but the add or local pin did not go through.
    #[error("Local add failed: {0}")]
    LocalAddFailed(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // REMOTE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A remote pinning provider rejected or failed the pin request.
    #[error("Remote pin to {provider} failed: {reason}")]
    RemotePinFailed {
        /// Provider that failed
        provider: PinProvider,
        /// Status line or transport error
        reason: String,
    },

    /// The DNSLink record could not be upserted.
    #[error("DNS update failed: {0}")]
    DnsUpdateFailed(String),

    /// A call did not complete within its timeout.
    #[error("Timed out during {step} after {seconds}s")]
    NetworkTimeout {
        /// Step the call belonged to
        step: Step,
        /// Timeout that elapsed
        seconds: u64,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // LOCAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Missing or inconsistent configuration, detected before any network call.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Clipboard copy or browser open failed.
    #[error("Side effect failed: {0}")]
    SideEffectFailed(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl DeployError {
    /// Returns true if this error came from a timed-out call.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeployError::NetworkTimeout { .. })
    }

    /// Returns true if this error was raised before touching the network.
    pub fn is_config_error(&self) -> bool {
        matches!(self, DeployError::InvalidConfiguration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeployError::RemotePinFailed {
            provider: PinProvider::Infura,
            reason: "HTTP 401".into(),
        };
        assert!(err.to_string().contains("infura"));
        assert!(err.to_string().contains("HTTP 401"));

        let err = DeployError::NetworkTimeout {
            step: Step::DnsUpdate,
            seconds: 30,
        };
        assert_eq!(err.to_string(), "Timed out during DNS update after 30s");
    }

    #[test]
    fn test_classification() {
        let err = DeployError::NetworkTimeout {
            step: Step::LocalAdd,
            seconds: 5,
        };
        assert!(err.is_timeout());
        assert!(!err.is_config_error());

        let err = DeployError::InvalidConfiguration("no domain".into());
        assert!(err.is_config_error());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let result: Result<serde_json::Value> = json_result.map_err(DeployError::from);
        assert!(matches!(result, Err(DeployError::JsonError(_))));
    }
}
