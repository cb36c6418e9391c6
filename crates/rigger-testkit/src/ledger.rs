use crate::Fake;
use async_trait::async_trait;
use rigger_core::{
    ids::{Address, ResourceKind, RoleId, TxHash},
    ledger::{
        ArgValue, FactoryTable, LedgerError, Pending, PendingTx, Receipt, ResourceClient,
        ResourceFactory, TxStatus,
    },
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

pub const DEPLOY_GAS: u64 = 1_200_000;
pub const CALL_GAS: u64 = 60_000;

///
/// Fault
///
/// Scripted misbehaviour for the next matching submission(s).
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Fault {
    /// Refused before submission; nothing reaches the chain.
    Reject(String),
    /// Included with a failure status; no effect.
    Revert(String),
    /// Never confirms; no effect.
    Hang,
    /// Creation confirms without reporting an address.
    NoAddress,
    /// Included and applied, but the confirmation is lost.
    ConfirmError(String),
}

///
/// Target
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Target {
    Deploy(ResourceKind),
    Call(String),
    Grant,
    Revoke,
    Any,
}

impl Target {
    #[must_use]
    pub fn deploy(kind: &'static str) -> Self {
        Self::Deploy(ResourceKind::new(kind))
    }

    #[must_use]
    pub fn call(method: impl Into<String>) -> Self {
        Self::Call(method.into())
    }

    fn matches(&self, op: &Op) -> bool {
        match (self, op) {
            (Self::Any, _) | (Self::Grant, Op::Grant { .. }) | (Self::Revoke, Op::Revoke { .. }) => {
                true
            }
            (Self::Deploy(kind), Op::Deploy { kind: k }) => kind == k,
            (Self::Call(method), Op::Call { method: m, .. }) => method == m,
            _ => false,
        }
    }
}

///
/// Invocation
///
/// A state-changing call the ledger applied.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invocation {
    pub address: Address,
    pub method: String,
    pub args: Vec<ArgValue>,
}

///
/// SimLedger
///
/// Cheap to clone; clones share state.
///

#[derive(Clone, Default)]
pub struct SimLedger {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    next_address: u64,
    next_tx: u64,
    faults: Vec<(Target, Fault, u32)>,
    role_query_failure: bool,
    queries_hang: bool,

    roles: BTreeSet<(Address, RoleId, Address)>,
    flags: BTreeSet<(Address, String, Option<String>)>,
    links: BTreeMap<String, String>,

    submissions: u64,
    deployments: BTreeMap<ResourceKind, u64>,
    invocations: Vec<Invocation>,
    grants: u64,
    revokes: u64,
}

enum Op {
    Deploy {
        kind: ResourceKind,
    },
    Call {
        address: Address,
        method: String,
        args: Vec<ArgValue>,
    },
    Grant {
        address: Address,
        role: RoleId,
        principal: Address,
    },
    Revoke {
        address: Address,
        role: RoleId,
        principal: Address,
    },
}

impl SimLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---------------------------------------------------------------------
    // Scripting
    // ---------------------------------------------------------------------

    /// Apply `fault` to the next `times` submissions matching `target`.
    pub fn fail(&self, target: Target, fault: Fault, times: u32) {
        self.state().faults.push((target, fault, times));
    }

    pub fn fail_once(&self, target: Target, fault: Fault) {
        self.fail(target, fault, 1);
    }

    pub fn clear_faults(&self) {
        self.state().faults.clear();
    }

    /// Make every `has_role` query fail until switched off.
    pub fn set_role_query_failure(&self, failing: bool) {
        self.state().role_query_failure = failing;
    }

    /// Make every `has_role` and `query_flag` call wait forever until
    /// switched off.
    pub fn set_queries_hang(&self, hang: bool) {
        self.state().queries_hang = hang;
    }

    /// After `call(.., x, ..)` is applied on a resource, `query()` and
    /// `query(x)` on the same resource report true, for every top-level
    /// argument `x`.
    pub fn link_flag(&self, query: impl Into<String>, call: impl Into<String>) {
        self.state().links.insert(call.into(), query.into());
    }

    /// Seed role state without a transaction.
    pub fn set_role(&self, resource: &Address, role: &RoleId, principal: &Address) {
        self.state()
            .roles
            .insert((resource.clone(), role.clone(), principal.clone()));
    }

    // ---------------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn holds_role(&self, resource: &Address, role: &RoleId, principal: &Address) -> bool {
        self.state()
            .roles
            .contains(&(resource.clone(), role.clone(), principal.clone()))
    }

    /// Every transaction accepted for submission, including reverted,
    /// hanging and retried ones.
    #[must_use]
    pub fn submissions(&self) -> u64 {
        self.state().submissions
    }

    /// Applied creations across all kinds.
    #[must_use]
    pub fn deployments(&self) -> u64 {
        self.state().deployments.values().sum()
    }

    #[must_use]
    pub fn deployments_of(&self, kind: &str) -> u64 {
        self.state().deployments.get(kind).copied().unwrap_or(0)
    }

    /// Applied calls of `method` across all resources.
    #[must_use]
    pub fn calls_of(&self, method: &str) -> usize {
        self.state()
            .invocations
            .iter()
            .filter(|inv| inv.method == method)
            .count()
    }

    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.state().invocations.clone()
    }

    #[must_use]
    pub fn grants(&self) -> u64 {
        self.state().grants
    }

    #[must_use]
    pub fn revokes(&self) -> u64 {
        self.state().revokes
    }

    // ---------------------------------------------------------------------
    // Factories
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn factory(&self, kind: impl Into<ResourceKind>) -> Arc<dyn ResourceFactory> {
        Arc::new(SimFactory {
            kind: kind.into(),
            ledger: self.clone(),
        })
    }

    /// Factory table with one simulated factory per kind.
    #[must_use]
    pub fn factory_table<I>(&self, kinds: I) -> FactoryTable
    where
        I: IntoIterator,
        I::Item: Into<ResourceKind>,
    {
        kinds
            .into_iter()
            .fold(FactoryTable::new(), |table, kind| table.with(self.factory(kind)))
    }

    // ---------------------------------------------------------------------
    // Submission
    // ---------------------------------------------------------------------

    fn submit(&self, op: &Op) -> Result<Pending, LedgerError> {
        let mut st = self.state();
        let fault = st.take_fault(op);

        if let Some(Fault::Reject(reason)) = &fault {
            return Err(LedgerError::Rejected(reason.clone()));
        }

        st.submissions += 1;
        st.next_tx += 1;
        let tx_hash = Fake::tx_hash(st.next_tx);
        let applied = matches!(
            fault,
            None | Some(Fault::NoAddress | Fault::ConfirmError(_))
        );

        let (gas_used, contract_address) = if applied {
            st.apply(op, matches!(fault, Some(Fault::NoAddress)))
        } else if matches!(op, Op::Deploy { .. }) {
            (DEPLOY_GAS, None)
        } else {
            (CALL_GAS, None)
        };

        let outcome = match fault {
            Some(Fault::Hang) => None,
            Some(Fault::ConfirmError(reason)) => Some(Err(LedgerError::Transport(reason))),
            Some(Fault::Revert(reason)) => Some(Ok(Receipt {
                tx_hash: tx_hash.clone(),
                status: TxStatus::Reverted(reason),
                gas_used,
                contract_address: None,
            })),
            _ => Some(Ok(Receipt {
                tx_hash: tx_hash.clone(),
                status: TxStatus::Success,
                gas_used,
                contract_address,
            })),
        };

        Ok(Box::new(SimPending { tx_hash, outcome }))
    }
}

impl State {
    fn take_fault(&mut self, op: &Op) -> Option<Fault> {
        let index = self
            .faults
            .iter()
            .position(|(target, _, remaining)| *remaining > 0 && target.matches(op))?;

        let entry = &mut self.faults[index];
        entry.2 -= 1;
        let fault = entry.1.clone();
        if entry.2 == 0 {
            self.faults.remove(index);
        }

        Some(fault)
    }

    fn apply(&mut self, op: &Op, withhold_address: bool) -> (u64, Option<Address>) {
        match op {
            Op::Deploy { kind } => {
                *self.deployments.entry(kind.clone()).or_default() += 1;
                self.next_address += 1;
                let address = Fake::address(self.next_address);

                (DEPLOY_GAS, (!withhold_address).then_some(address))
            }
            Op::Call {
                address,
                method,
                args,
            } => {
                if let Some(query) = self.links.get(method).cloned() {
                    self.flags.insert((address.clone(), query.clone(), None));
                    for arg in args {
                        self.flags
                            .insert((address.clone(), query.clone(), Some(arg.to_string())));
                    }
                }
                self.invocations.push(Invocation {
                    address: address.clone(),
                    method: method.clone(),
                    args: args.clone(),
                });

                (CALL_GAS, None)
            }
            Op::Grant {
                address,
                role,
                principal,
            } => {
                self.roles
                    .insert((address.clone(), role.clone(), principal.clone()));
                self.grants += 1;

                (CALL_GAS, None)
            }
            Op::Revoke {
                address,
                role,
                principal,
            } => {
                self.roles
                    .remove(&(address.clone(), role.clone(), principal.clone()));
                self.revokes += 1;

                (CALL_GAS, None)
            }
        }
    }
}

///
/// SimPending
///

struct SimPending {
    tx_hash: TxHash,
    outcome: Option<Result<Receipt, LedgerError>>,
}

#[async_trait]
impl PendingTx for SimPending {
    fn tx_hash(&self) -> &TxHash {
        &self.tx_hash
    }

    async fn confirm(&self) -> Result<Receipt, LedgerError> {
        match &self.outcome {
            Some(outcome) => outcome.clone(),
            None => futures::future::pending().await,
        }
    }
}

///
/// SimFactory
///

struct SimFactory {
    kind: ResourceKind,
    ledger: SimLedger,
}

#[async_trait]
impl ResourceFactory for SimFactory {
    fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    async fn create(&self, _args: &[ArgValue]) -> Result<Pending, LedgerError> {
        self.ledger.submit(&Op::Deploy {
            kind: self.kind.clone(),
        })
    }

    fn attach(&self, address: &Address) -> Arc<dyn ResourceClient> {
        Arc::new(SimClient {
            address: address.clone(),
            ledger: self.ledger.clone(),
        })
    }
}

///
/// SimClient
///

struct SimClient {
    address: Address,
    ledger: SimLedger,
}

impl SimClient {
    async fn stall_if_hung(&self) {
        let hang = self.ledger.state().queries_hang;
        if hang {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl ResourceClient for SimClient {
    fn address(&self) -> &Address {
        &self.address
    }

    async fn invoke(&self, method: &str, args: &[ArgValue]) -> Result<Pending, LedgerError> {
        self.ledger.submit(&Op::Call {
            address: self.address.clone(),
            method: method.to_string(),
            args: args.to_vec(),
        })
    }

    async fn query_flag(&self, method: &str, args: &[ArgValue]) -> Result<bool, LedgerError> {
        self.stall_if_hung().await;

        let key = (
            self.address.clone(),
            method.to_string(),
            args.first().map(ToString::to_string),
        );

        Ok(self.ledger.state().flags.contains(&key))
    }

    async fn has_role(&self, role: &RoleId, principal: &Address) -> Result<bool, LedgerError> {
        self.stall_if_hung().await;

        if self.ledger.state().role_query_failure {
            return Err(LedgerError::Transport("role query unavailable".to_string()));
        }

        Ok(self.ledger.holds_role(&self.address, role, principal))
    }

    async fn grant_role(
        &self,
        role: &RoleId,
        principal: &Address,
    ) -> Result<Pending, LedgerError> {
        self.ledger.submit(&Op::Grant {
            address: self.address.clone(),
            role: role.clone(),
            principal: principal.clone(),
        })
    }

    async fn revoke_role(
        &self,
        role: &RoleId,
        principal: &Address,
    ) -> Result<Pending, LedgerError> {
        self.ledger.submit(&Op::Revoke {
            address: self.address.clone(),
            role: role.clone(),
            principal: principal.clone(),
        })
    }
}

///
/// TESTS
///
