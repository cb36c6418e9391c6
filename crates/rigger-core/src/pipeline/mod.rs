//! DeploymentPipeline
//!
//! A hand-authored, ordered list of steps. Each step is either idempotent
//! (resolve, attach, grant, revoke) or optionally query-guarded (invoke),
//! so rerunning a pipeline after a failure at step N attaches to what
//! steps before N produced and resumes at N. The pipeline keeps no state
//! of its own; everything durable lives in the registry.

mod arg;
mod context;
mod step;

pub use arg::{Arg, ResourceRef};
pub use context::RunContext;
pub use step::{Guard, ResourceTemplate, Step};

use crate::{
    executor::TxError,
    grant::{GrantChange, GrantError, RoleGrantManager},
    ids::RoleId,
    ledger::{ArgValue, LedgerError},
    log::Topic,
    resolve::{DeployedHandle, ResolveError, Resolver},
};
use arg::bind_all;
use thiserror::Error as ThisError;

///
/// PipelineError
///

#[derive(Debug, ThisError)]
pub enum PipelineError {
    #[error("pipeline {pipeline} failed at step {index} ({step}): {source}")]
    StepFailed {
        pipeline: String,
        index: usize,
        step: String,
        source: StepError,
    },
}

impl PipelineError {
    /// Underlying failure of the step.
    #[must_use]
    pub const fn step_error(&self) -> &StepError {
        match self {
            Self::StepFailed { source, .. } => source,
        }
    }
}

///
/// StepError
///

#[derive(Debug, ThisError)]
pub enum StepError {
    #[error("reference {0} was not resolved earlier in the run")]
    UnresolvedReference(ResourceRef),

    #[error("role principal must be an address, got {0}")]
    InvalidPrincipal(String),

    #[error("guard query {method} on {target} failed: {source}")]
    GuardQueryFailure {
        target: ResourceRef,
        method: String,
        source: LedgerError,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Grant(#[from] GrantError),

    #[error(transparent)]
    Tx(#[from] TxError),
}

///
/// PipelineReport
///
/// What a run did. Resumed runs report their attached resources here.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PipelineReport {
    pub created: Vec<ResourceRef>,
    pub attached: Vec<ResourceRef>,
    pub grants_applied: usize,
    pub grants_unchanged: usize,
    pub invocations: usize,
    pub skipped: usize,
}

impl PipelineReport {
    /// Fold another report into this one.
    pub fn absorb(&mut self, other: Self) {
        self.created.extend(other.created);
        self.attached.extend(other.attached);
        self.grants_applied += other.grants_applied;
        self.grants_unchanged += other.grants_unchanged;
        self.invocations += other.invocations;
        self.skipped += other.skipped;
    }

    fn track(&mut self, ctx: &mut RunContext, handle: DeployedHandle) {
        let created = handle.was_created();
        let reference = ctx.insert(handle);

        if created {
            self.created.push(reference);
        } else {
            self.attached.push(reference);
        }
    }

    const fn track_grant(&mut self, change: GrantChange) {
        match change {
            GrantChange::Applied => self.grants_applied += 1,
            GrantChange::Unchanged => self.grants_unchanged += 1,
        }
    }
}

///
/// Pipeline
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Pipeline {
    name: String,
    steps: Vec<Step>,
}

impl Pipeline {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    // ---------------------------------------------------------------------
    // Execution
    // ---------------------------------------------------------------------

    /// Run every step in order, stopping at the first terminal failure.
    pub async fn run(
        &self,
        resolver: &Resolver,
        grants: &RoleGrantManager,
        ctx: &mut RunContext,
    ) -> Result<PipelineReport, PipelineError> {
        let total = self.steps.len();
        let mut report = PipelineReport::default();

        log!(
            Topic::Pipeline,
            Info,
            "▶ {} ({total} steps) on {}",
            self.name,
            resolver.environment()
        );

        for (index, step) in self.steps.iter().enumerate() {
            log!(
                Topic::Pipeline,
                Debug,
                "{} [{}/{total}] {}",
                self.name,
                index + 1,
                step.describe()
            );

            if let Err(source) = run_step(step, resolver, grants, ctx, &mut report).await {
                log!(
                    Topic::Pipeline,
                    Error,
                    "{} failed at step {index} ({}): {source}",
                    self.name,
                    step.describe()
                );

                return Err(PipelineError::StepFailed {
                    pipeline: self.name.clone(),
                    index,
                    step: step.describe(),
                    source,
                });
            }
        }

        log!(
            Topic::Pipeline,
            Ok,
            "✅ {}: {} created, {} attached, {} grants applied, {} invocations, {} skipped",
            self.name,
            report.created.len(),
            report.attached.len(),
            report.grants_applied,
            report.invocations,
            report.skipped
        );

        Ok(report)
    }
}

async fn run_step(
    step: &Step,
    resolver: &Resolver,
    grants: &RoleGrantManager,
    ctx: &mut RunContext,
    report: &mut PipelineReport,
) -> Result<(), StepError> {
    match step {
        Step::Resolve(template) => {
            let desc = template.bind(ctx)?;
            let handle = resolver.resolve(&desc).await?;
            report.track(ctx, handle);
        }

        Step::Attach(template) => {
            let desc = template.bind(ctx)?;
            let handle = resolver.attach_existing(&desc)?;
            report.track(ctx, handle);
        }

        Step::ResolveUpgradeable {
            template,
            proxy_kind,
        } => {
            let desc = template.bind(ctx)?;
            let pair = resolver.resolve_upgradeable(&desc, proxy_kind).await?;
            report.track(ctx, pair.implementation);
            report.track(ctx, pair.proxy);
        }

        Step::Grant {
            target,
            role,
            principal,
        } => {
            let change = change_role(grants, ctx, target, role, principal, true).await?;
            report.track_grant(change);
        }

        Step::Revoke {
            target,
            role,
            principal,
        } => {
            let change = change_role(grants, ctx, target, role, principal, false).await?;
            report.track_grant(change);
        }

        Step::Invoke {
            target,
            method,
            args,
            skip_if,
        } => {
            let handle = ctx.handle(target)?;
            let client = handle.client();

            if let Some(guard) = skip_if {
                let guard_args = bind_all(&guard.args, ctx)?;
                let skip = resolver
                    .executor()
                    .query(client.query_flag(&guard.method, &guard_args))
                    .await
                    .map_err(|source| StepError::GuardQueryFailure {
                        target: target.clone(),
                        method: guard.method.clone(),
                        source,
                    })?;

                if skip {
                    log!(
                        Topic::Pipeline,
                        Info,
                        "{target}.{method} skipped, {} already true",
                        guard.method
                    );
                    report.skipped += 1;
                    return Ok(());
                }
            }

            let args = bind_all(args, ctx)?;
            let label = format!("{target}.{method}");
            resolver
                .executor()
                .submit(&label, || client.invoke(method, &args))
                .await?;
            report.invocations += 1;
        }
    }

    Ok(())
}

async fn change_role(
    grants: &RoleGrantManager,
    ctx: &RunContext,
    target: &ResourceRef,
    role: &RoleId,
    principal: &Arg,
    grant: bool,
) -> Result<GrantChange, StepError> {
    let handle = ctx.handle(target)?;
    let principal = match principal.bind(ctx)? {
        ArgValue::Address(address) => address,
        other => return Err(StepError::InvalidPrincipal(other.to_string())),
    };

    let change = if grant {
        grants.ensure_granted(handle, role, &principal).await?
    } else {
        grants.revoke_if_granted(handle, role, &principal).await?
    };

    Ok(change)
}
