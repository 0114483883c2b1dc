//! Local IPFS node client for ipfs-deploy.
//!
//! Talks to a running Kubo daemon over its HTTP RPC API. Starting or
//! installing a daemon is out of scope; this crate only finds and uses one.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod client;
mod endpoint;
mod upload;

pub use client::{KuboClient, NodeConfig};
pub use endpoint::{multiaddr_to_url, resolve_api_url};
pub use upload::{collect_entries, UploadEntry, UploadKind};
