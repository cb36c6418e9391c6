//! Seam to the external contract layer.
//!
//! The engine never talks to a node directly. Everything it needs from the
//! remote ledger is expressed through three traits:
//! - [`ResourceFactory`] creates or attaches one resource kind,
//! - [`ResourceClient`] invokes and queries a deployed resource,
//! - [`PendingTx`] waits for a submitted transaction to be included.
//!
//! Business semantics of the resources stay on the other side of the seam.

mod args;
mod factory;

pub use args::{ArgValue, render_args};
pub use factory::FactoryTable;

use crate::ids::{Address, ResourceKind, RoleId, TxHash};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use thiserror::Error as ThisError;

pub type Pending = Box<dyn PendingTx>;

///
/// LedgerError
///
/// Failures reported by the contract layer itself.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum LedgerError {
    /// The request was refused before it reached the chain
    /// (validation, estimation, nonce or signing failure).
    #[error("rejected: {0}")]
    Rejected(String),

    /// The node could not be reached or answered garbage.
    #[error("transport: {0}")]
    Transport(String),

    #[error("no answer within {0:?}")]
    NoAnswer(Duration),

    #[error("cancelled while waiting on the node")]
    Cancelled,
}

///
/// TxStatus
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TxStatus {
    Success,
    Reverted(String),
}

///
/// Receipt
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub status: TxStatus,
    pub gas_used: u64,

    /// Set for contract-creation transactions.
    pub contract_address: Option<Address>,
}

///
/// PendingTx
///
/// A transaction that has been accepted for submission.
///

#[async_trait]
pub trait PendingTx: Send + Sync {
    fn tx_hash(&self) -> &TxHash;

    /// Resolve once the ledger reports inclusion.
    /// May never resolve; callers bound the wait.
    async fn confirm(&self) -> Result<Receipt, LedgerError>;
}

///
/// ResourceClient
///
/// Live binding to one deployed resource.
///

#[async_trait]
pub trait ResourceClient: Send + Sync {
    fn address(&self) -> &Address;

    /// Submit a state-changing call.
    async fn invoke(&self, method: &str, args: &[ArgValue]) -> Result<Pending, LedgerError>;

    /// Read-only call returning a boolean.
    async fn query_flag(&self, method: &str, args: &[ArgValue]) -> Result<bool, LedgerError>;

    async fn has_role(&self, role: &RoleId, principal: &Address) -> Result<bool, LedgerError>;

    async fn grant_role(&self, role: &RoleId, principal: &Address)
    -> Result<Pending, LedgerError>;

    async fn revoke_role(
        &self,
        role: &RoleId,
        principal: &Address,
    ) -> Result<Pending, LedgerError>;
}

///
/// ResourceFactory
///
/// Typed constructor/attach pair for one resource kind, registered in a
/// [`FactoryTable`] at startup.
///

#[async_trait]
pub trait ResourceFactory: Send + Sync {
    fn kind(&self) -> &ResourceKind;

    /// Submit a contract-creation transaction.
    async fn create(&self, args: &[ArgValue]) -> Result<Pending, LedgerError>;

    /// Bind to an existing instance without touching the ledger.
    fn attach(&self, address: &Address) -> Arc<dyn ResourceClient>;
}
