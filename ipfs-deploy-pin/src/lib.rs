//! Remote pinning clients for ipfs-deploy.
//!
//! Each client asks one provider to fetch and keep a content identifier that
//! is already available from the local node.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod infura;
mod pinata;

pub use infura::{InfuraClient, InfuraConfig};
pub use pinata::{PinataClient, PinataConfig};

use ipfs_deploy_core::error::{DeployError, Step};
use ipfs_deploy_core::types::PinProvider;

/// Maps a transport failure to the pipeline's error taxonomy.
pub(crate) fn transport_error(
    provider: PinProvider,
    timeout_seconds: u64,
    err: reqwest::Error,
) -> DeployError {
    if err.is_timeout() {
        DeployError::NetworkTimeout {
            step: Step::RemotePin,
            seconds: timeout_seconds,
        }
    } else {
        DeployError::RemotePinFailed {
            provider,
            reason: err.to_string(),
        }
    }
}
