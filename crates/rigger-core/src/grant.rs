//! RoleGrantManager
//!
//! Query-guarded role changes. The live role state is read on every call;
//! a transaction is submitted only when the state actually has to change.

use crate::{
    executor::{TxError, TxExecutor},
    ids::{Address, ResourceKey, RoleId},
    ledger::LedgerError,
    log::Topic,
    resolve::DeployedHandle,
};
use derive_more::Display;
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// GrantError
///

#[derive(Debug, ThisError)]
pub enum GrantError {
    #[error("role query {role} for {principal} on {resource} failed: {source}")]
    RoleQueryFailure {
        resource: ResourceKey,
        role: RoleId,
        principal: Address,
        source: LedgerError,
    },

    #[error(transparent)]
    Tx(#[from] TxError),
}

///
/// GrantChange
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum GrantChange {
    Applied,
    Unchanged,
}

///
/// RoleGrantManager
///

#[derive(Clone, Debug)]
pub struct RoleGrantManager {
    executor: Arc<TxExecutor>,
}

impl RoleGrantManager {
    #[must_use]
    pub const fn new(executor: Arc<TxExecutor>) -> Self {
        Self { executor }
    }

    /// Grant `role` to `principal` unless it already holds it.
    pub async fn ensure_granted(
        &self,
        resource: &DeployedHandle,
        role: &RoleId,
        principal: &Address,
    ) -> Result<GrantChange, GrantError> {
        if self.holds(resource, role, principal).await? {
            log!(
                Topic::Grant,
                Debug,
                "{role} already granted to {principal} on {}",
                resource.key
            );
            return Ok(GrantChange::Unchanged);
        }

        let client = resource.client();
        let label = format!("{}.grantRole({role}, {principal})", resource.key);
        self.executor
            .submit(&label, || client.grant_role(role, principal))
            .await?;

        log!(
            Topic::Grant,
            Ok,
            "{role} granted to {principal} on {}",
            resource.key
        );

        Ok(GrantChange::Applied)
    }

    /// Revoke `role` from `principal` only while it holds it.
    pub async fn revoke_if_granted(
        &self,
        resource: &DeployedHandle,
        role: &RoleId,
        principal: &Address,
    ) -> Result<GrantChange, GrantError> {
        if !self.holds(resource, role, principal).await? {
            return Ok(GrantChange::Unchanged);
        }

        let client = resource.client();
        let label = format!("{}.revokeRole({role}, {principal})", resource.key);
        self.executor
            .submit(&label, || client.revoke_role(role, principal))
            .await?;

        log!(
            Topic::Grant,
            Ok,
            "{role} revoked from {principal} on {}",
            resource.key
        );

        Ok(GrantChange::Applied)
    }

    // Bounded by the executor's timeout and cancellation token.
    async fn holds(
        &self,
        resource: &DeployedHandle,
        role: &RoleId,
        principal: &Address,
    ) -> Result<bool, GrantError> {
        self.executor
            .query(resource.client().has_role(role, principal))
            .await
            .map_err(|source| GrantError::RoleQueryFailure {
                resource: resource.key.clone(),
                role: role.clone(),
                principal: principal.clone(),
                source,
            })
    }
}
