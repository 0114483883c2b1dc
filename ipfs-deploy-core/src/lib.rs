//! # ipfs-deploy core
//!
//! Shared types, errors, and traits for the ipfs-deploy pipeline.
//!
//! Every other crate in the workspace builds on this one:
//!
//! - **Types**: content identifiers, node address sets, pin metadata, step results
//! - **Errors**: the deployment error taxonomy and the pipeline [`Step`] it occurred in
//! - **Constants**: default endpoints, paths, and timeouts
//! - **Traits**: the collaborators the orchestrator sequences
//!
//! ## Example
//!
//! ```rust
//! use ipfs_deploy_core::{ContentId, NodeAddressSet};
//!
//! let cid = ContentId::new("bafyABC123").unwrap();
//! assert_eq!(cid.dnslink_value(), "dnslink=/ipfs/bafyABC123");
//!
//! let addrs = NodeAddressSet::from(vec!["/ip4/127.0.0.1/tcp/4001".to_string()]);
//! assert!(addrs.public_only().is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{DeployError, Result, Step};
pub use traits::*;
pub use types::*;
