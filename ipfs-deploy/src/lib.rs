//! # ipfs-deploy
//!
//! Publishes a static site directory to IPFS in one run:
//!
//! 1. Add the directory to the local daemon and pin the root
//! 2. Ask Pinata and Infura to pin it too, hinting at the local node's public addresses
//! 3. Point `_dnslink.<domain>` at the new root on Cloudflare
//! 4. Copy the identifier to the clipboard, and optionally open the site
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ipfs_deploy::{DeployConfig, Deployer};
//! # use ipfs_deploy_core::{Result, SideEffects};
//! # struct NoEffects;
//! # #[async_trait::async_trait]
//! # impl SideEffects for NoEffects {
//! #     async fn copy_to_clipboard(&self, _: &str) -> Result<()> { Ok(()) }
//! #     async fn open_url(&self, _: &str) -> Result<()> { Ok(()) }
//! # }
//!
//! # async fn run() -> Result<()> {
//! let config = DeployConfig::from_env()?.with_public_dir("dist");
//! let report = Deployer::from_config(config, Arc::new(NoEffects))?.run().await?;
//! println!("published {}", report.cid);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod pipeline;
pub mod report;

pub use config::{DeployConfig, DeployMetadata, PinPolicy};
pub use pipeline::{DeployEvent, Deployer, EventCallback};
pub use report::DeployReport;
