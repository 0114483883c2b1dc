//! What a completed run did.

use std::collections::BTreeMap;

use serde::Serialize;

use ipfs_deploy_core::types::{ContentId, NodeAddressSet, PinProvider, StepResult};

/// Summary of a run that reached its terminal state.
///
/// Fatal failures never produce a report; they surface as an error instead.
#[derive(Clone, Debug, Serialize)]
pub struct DeployReport {
    /// Root identifier of the published tree
    pub cid: ContentId,
    /// Addresses handed to providers as host hints
    pub host_hints: NodeAddressSet,
    /// Outcome per enabled pinning provider
    pub pins: BTreeMap<PinProvider, StepResult<()>>,
    /// Stored DNSLink record content
    pub dns: StepResult<String>,
    /// Clipboard copy of the identifier
    pub clipboard: StepResult<()>,
    /// Opened site URL
    pub browser: StepResult<String>,
}

impl DeployReport {
    /// Returns true if every attempted step succeeded.
    pub fn is_clean(&self) -> bool {
        let ok = |attempted: bool, success: bool| !attempted || success;

        self.pins.values().all(StepResult::is_success)
            && ok(self.dns.was_attempted(), self.dns.is_success())
            && ok(self.clipboard.was_attempted(), self.clipboard.is_success())
            && ok(self.browser.was_attempted(), self.browser.is_success())
    }

    /// Providers that failed to pin.
    pub fn failed_pins(&self) -> Vec<PinProvider> {
        self.pins
            .iter()
            .filter(|(_, result)| !result.is_success())
            .map(|(provider, _)| *provider)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> DeployReport {
        DeployReport {
            cid: ContentId::new("bafyABC123").unwrap(),
            host_hints: NodeAddressSet::new(),
            pins: BTreeMap::from([
                (PinProvider::Pinata, StepResult::Succeeded(())),
                (PinProvider::Infura, StepResult::Succeeded(())),
            ]),
            dns: StepResult::Skipped,
            clipboard: StepResult::Succeeded(()),
            browser: StepResult::Skipped,
        }
    }

    #[test]
    fn test_clean_report() {
        let report = report();
        assert!(report.is_clean());
        assert!(report.failed_pins().is_empty());
    }

    #[test]
    fn test_failed_pin_is_not_clean() {
        let mut report = report();
        report
            .pins
            .insert(PinProvider::Infura, StepResult::Failed("HTTP 500".into()));
        assert!(!report.is_clean());
        assert_eq!(report.failed_pins(), vec![PinProvider::Infura]);
    }

    #[test]
    fn test_serializes_for_json_output() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["cid"], "bafyABC123");
        assert_eq!(json["dns"]["status"], "skipped");
        assert_eq!(json["pins"]["pinata"]["status"], "succeeded");
    }
}
