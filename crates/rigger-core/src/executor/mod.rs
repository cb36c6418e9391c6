//! TransactionExecutor
//!
//! Submits one state-changing call, waits for inclusion and classifies the
//! result. Every wait on the node (submission, confirmation, and read-only
//! queries through [`TxExecutor::query`]) is bounded by the configured
//! timeout and by the run's cancellation token.
//!
//! Retry policy:
//! - `SubmissionFailed` is surfaced immediately (nothing reached the chain).
//! - `Reverted` and `TimedOut` are retried until `max_attempts` is spent.
//! - `Cancelled` is surfaced immediately.
//!
//! Retrying re-submits a fresh request. Callers only hand in actions that
//! are safe to repeat.

use crate::{
    config::schema::ExecutorConfig,
    ledger::{LedgerError, Pending, Receipt, TxStatus},
    log::Topic,
};
use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use thiserror::Error as ThisError;
use tokio_util::sync::CancellationToken;

///
/// TxError
///
/// Terminal executor failures, after the retry budget was applied.
///

#[derive(Debug, ThisError)]
pub enum TxError {
    #[error("{label}: submission failed: {reason}")]
    SubmissionFailed { label: String, reason: String },

    #[error("{label}: reverted after {attempts} attempt(s): {reason}")]
    Reverted {
        label: String,
        reason: String,
        attempts: u32,
    },

    #[error("{label}: no confirmation after {attempts} attempt(s)")]
    TimedOut { label: String, attempts: u32 },

    #[error("{label}: cancelled")]
    Cancelled { label: String },
}

///
/// TxOutcome
///
/// Classification of a single attempt.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TxOutcome {
    Confirmed(Receipt),
    Reverted(String),
    TimedOut,
    SubmissionFailed(String),
    Cancelled,
}

impl TxOutcome {
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Reverted(_) | Self::TimedOut)
    }
}

///
/// ExecutorPolicy
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExecutorPolicy {
    pub max_attempts: u32,
    pub confirmation_timeout: Duration,
}

impl From<&ExecutorConfig> for ExecutorPolicy {
    fn from(cfg: &ExecutorConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts,
            confirmation_timeout: cfg.confirmation_timeout(),
        }
    }
}

impl Default for ExecutorPolicy {
    fn default() -> Self {
        Self::from(&ExecutorConfig::default())
    }
}

///
/// TxExecutor
///

#[derive(Debug)]
pub struct TxExecutor {
    policy: ExecutorPolicy,
    cancel: CancellationToken,
    submitted: AtomicU64,
    confirmed: AtomicU64,
    gas_used: AtomicU64,
}

impl TxExecutor {
    #[must_use]
    pub fn new(policy: ExecutorPolicy) -> Self {
        Self::with_cancellation(policy, CancellationToken::new())
    }

    #[must_use]
    pub const fn with_cancellation(policy: ExecutorPolicy, cancel: CancellationToken) -> Self {
        Self {
            policy,
            cancel,
            submitted: AtomicU64::new(0),
            confirmed: AtomicU64::new(0),
            gas_used: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> &ExecutorPolicy {
        &self.policy
    }

    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Transactions the ledger accepted for submission, retries included.
    #[must_use]
    pub fn submitted_count(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn confirmed_count(&self) -> u64 {
        self.confirmed.load(Ordering::Relaxed)
    }

    /// Gas used across every confirmed transaction of this executor.
    #[must_use]
    pub fn total_gas_used(&self) -> u64 {
        self.gas_used.load(Ordering::Relaxed)
    }

    // ---------------------------------------------------------------------
    // Execution
    // ---------------------------------------------------------------------

    /// Submit `action` and retry per policy until it confirms or fails
    /// terminally.
    pub async fn submit<F, Fut>(&self, label: &str, mut action: F) -> Result<Receipt, TxError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Pending, LedgerError>>,
    {
        let attempts = self.policy.max_attempts.max(1);
        let mut last = None;

        for attempt in 1..=attempts {
            match self.attempt(label, &mut action).await {
                TxOutcome::Confirmed(receipt) => {
                    self.record_confirmed(label, &receipt);
                    return Ok(receipt);
                }
                TxOutcome::SubmissionFailed(reason) => {
                    log!(
                        Topic::Tx,
                        Error,
                        "failed to execute transaction: {label}, error: {reason}"
                    );
                    return Err(TxError::SubmissionFailed {
                        label: label.to_string(),
                        reason,
                    });
                }
                TxOutcome::Cancelled => {
                    log!(Topic::Tx, Warn, "⚠️ {label} cancelled");
                    return Err(TxError::Cancelled {
                        label: label.to_string(),
                    });
                }
                TxOutcome::Reverted(reason) => {
                    log!(
                        Topic::Tx,
                        Warn,
                        "⚠️ {label} reverted (attempt {attempt}/{attempts}): {reason}"
                    );
                    last = Some(TxError::Reverted {
                        label: label.to_string(),
                        reason,
                        attempts: attempt,
                    });
                }
                TxOutcome::TimedOut => {
                    log!(
                        Topic::Tx,
                        Warn,
                        "⚠️ {label} not confirmed within {:?} (attempt {attempt}/{attempts})",
                        self.policy.confirmation_timeout
                    );
                    last = Some(TxError::TimedOut {
                        label: label.to_string(),
                        attempts: attempt,
                    });
                }
            }
        }

        Err(last.unwrap_or_else(|| TxError::TimedOut {
            label: label.to_string(),
            attempts,
        }))
    }

    /// Run one attempt and classify it. Never retries.
    pub async fn attempt<F, Fut>(&self, label: &str, action: &mut F) -> TxOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Pending, LedgerError>>,
    {
        if self.cancel.is_cancelled() {
            return TxOutcome::Cancelled;
        }

        let timeout = self.policy.confirmation_timeout;
        let submitted = tokio::select! {
            () = self.cancel.cancelled() => return TxOutcome::Cancelled,
            submitted = tokio::time::timeout(timeout, action()) => submitted,
        };

        // an unanswered submission may or may not have reached the chain
        let pending = match submitted {
            Ok(Ok(pending)) => pending,
            Ok(Err(err)) => return TxOutcome::SubmissionFailed(err.to_string()),
            Err(_elapsed) => {
                return TxOutcome::SubmissionFailed(LedgerError::NoAnswer(timeout).to_string());
            }
        };
        self.submitted.fetch_add(1, Ordering::Relaxed);

        log!(
            Topic::Tx,
            Info,
            "{label} executing, waiting for confirm... ({})",
            pending.tx_hash()
        );

        let waited = tokio::select! {
            () = self.cancel.cancelled() => return TxOutcome::Cancelled,
            waited = tokio::time::timeout(timeout, pending.confirm()) => waited,
        };

        match waited {
            Err(_elapsed) => TxOutcome::TimedOut,
            Ok(Err(err)) => {
                log!(
                    Topic::Tx,
                    Warn,
                    "⚠️ {label} confirmation lost ({}): {err}",
                    pending.tx_hash()
                );
                TxOutcome::TimedOut
            }
            Ok(Ok(receipt)) => match &receipt.status {
                TxStatus::Success => TxOutcome::Confirmed(receipt),
                TxStatus::Reverted(reason) => TxOutcome::Reverted(reason.clone()),
            },
        }
    }

    /// Run a read-only ledger query under the same timeout and cancellation
    /// as transactions.
    pub async fn query<T, Fut>(&self, query: Fut) -> Result<T, LedgerError>
    where
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let timeout = self.policy.confirmation_timeout;

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(LedgerError::Cancelled),
            answer = tokio::time::timeout(timeout, query) => {
                answer.unwrap_or(Err(LedgerError::NoAnswer(timeout)))
            }
        }
    }

    fn record_confirmed(&self, label: &str, receipt: &Receipt) {
        self.confirmed.fetch_add(1, Ordering::Relaxed);
        let total = self
            .gas_used
            .fetch_add(receipt.gas_used, Ordering::Relaxed)
            .saturating_add(receipt.gas_used);

        log!(
            Topic::Tx,
            Ok,
            "{label} executing success, txHash: {}, gasUsed: {}, total gasUsed: {total}",
            receipt.tx_hash,
            receipt.gas_used
        );
    }
}

///
/// TESTS
///
