//! Rigger core: idempotent, resumable provisioning of on-chain contract
//! graphs.
//!
//! ## Layering
//!
//! - `ledger/` is the seam to the external contract layer (factories,
//!   clients, pending transactions).
//! - `registry/` persists key → address per (environment, shard).
//! - `executor/` submits one transaction and waits for it, bounded by a
//!   timeout, a retry budget and a cancellation token.
//! - `resolve/` deploys or attaches one resource; `grant` guards role
//!   changes with a live query.
//! - `pipeline/` runs an ordered list of such steps; `session` wires
//!   everything for one run.
//!
//! The default flow is: session → pipeline → resolve / grant → executor →
//! ledger, with the registry written only after confirmation.

#[macro_use]
pub mod log;

pub mod batch;
pub mod config;
pub mod error;
pub mod executor;
pub mod grant;
pub mod ids;
pub mod ledger;
pub mod pipeline;
pub mod registry;
pub mod resolve;
pub mod session;

pub use error::{Error, ErrorClass, ErrorOrigin};
pub use session::{Session, SessionBuilder};

///
/// Crate Version
///

pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
