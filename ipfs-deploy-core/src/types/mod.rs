//! Domain types for ipfs-deploy.
//!
//! - [`ContentId`]: the root identifier produced by the local add
//! - [`NodeAddressSet`]: multiaddrs advertised by the local node
//! - [`PinProvider`] / [`PinMetadata`]: what remote pinners are asked to keep
//! - [`StepResult`]: the outcome of one non-fatal pipeline step

mod addresses;
mod content_id;
mod pin;
mod step;

pub use addresses::*;
pub use content_id::*;
pub use pin::*;
pub use step::*;
