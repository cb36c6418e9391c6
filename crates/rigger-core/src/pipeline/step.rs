use super::{Arg, ResourceRef, RunContext, StepError, arg::bind_all};
use crate::{
    ids::{ResourceKey, ResourceKind, RoleId, ShardKey},
    resolve::ResourceDescriptor,
};
use std::fmt::Write as _;

///
/// ResourceTemplate
///
/// A [`ResourceDescriptor`] whose arguments may still reference other
/// resources of the run.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceTemplate {
    pub kind: ResourceKind,
    pub args: Vec<Arg>,
    pub label: Option<ResourceKey>,
    pub shard: Option<ShardKey>,
}

impl ResourceTemplate {
    #[must_use]
    pub fn new(kind: impl Into<ResourceKind>) -> Self {
        Self {
            kind: kind.into(),
            args: Vec::new(),
            label: None,
            shard: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<ResourceKey>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn shard(mut self, shard: ShardKey) -> Self {
        self.shard = Some(shard);
        self
    }

    #[must_use]
    pub fn key(&self) -> ResourceKey {
        self.label
            .clone()
            .unwrap_or_else(|| ResourceKey::from(&self.kind))
    }

    /// Reference under which the resolved handle is tracked.
    #[must_use]
    pub fn reference(&self) -> ResourceRef {
        ResourceRef {
            shard: self.shard.clone(),
            key: self.key(),
        }
    }

    pub fn bind(&self, ctx: &RunContext) -> Result<ResourceDescriptor, StepError> {
        Ok(ResourceDescriptor {
            kind: self.kind.clone(),
            args: bind_all(&self.args, ctx)?,
            label: self.label.clone(),
            shard: self.shard.clone(),
        })
    }
}

///
/// Guard
///
/// Read-only boolean query on the step target; a `true` answer skips the
/// step.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Guard {
    pub method: String,
    pub args: Vec<Arg>,
}

///
/// Step
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Step {
    /// Deploy or attach.
    Resolve(ResourceTemplate),

    /// Bind to a recorded resource without ever deploying it.
    Attach(ResourceTemplate),

    /// Implementation plus proxy, recorded as `{label}Impl` and `{label}`.
    ResolveUpgradeable {
        template: ResourceTemplate,
        proxy_kind: ResourceKind,
    },

    Grant {
        target: ResourceRef,
        role: RoleId,
        principal: Arg,
    },

    Revoke {
        target: ResourceRef,
        role: RoleId,
        principal: Arg,
    },

    /// State-changing call. Re-submitted on rerun unless guarded.
    Invoke {
        target: ResourceRef,
        method: String,
        args: Vec<Arg>,
        skip_if: Option<Guard>,
    },
}

impl Step {
    #[must_use]
    pub const fn resolve(template: ResourceTemplate) -> Self {
        Self::Resolve(template)
    }

    #[must_use]
    pub const fn attach(template: ResourceTemplate) -> Self {
        Self::Attach(template)
    }

    #[must_use]
    pub fn upgradeable(template: ResourceTemplate, proxy_kind: impl Into<ResourceKind>) -> Self {
        Self::ResolveUpgradeable {
            template,
            proxy_kind: proxy_kind.into(),
        }
    }

    #[must_use]
    pub fn grant(target: ResourceRef, role: impl Into<RoleId>, principal: impl Into<Arg>) -> Self {
        Self::Grant {
            target,
            role: role.into(),
            principal: principal.into(),
        }
    }

    #[must_use]
    pub fn revoke(target: ResourceRef, role: impl Into<RoleId>, principal: impl Into<Arg>) -> Self {
        Self::Revoke {
            target,
            role: role.into(),
            principal: principal.into(),
        }
    }

    #[must_use]
    pub fn invoke(target: ResourceRef, method: impl Into<String>, args: Vec<Arg>) -> Self {
        Self::Invoke {
            target,
            method: method.into(),
            args,
            skip_if: None,
        }
    }

    /// Guard an `Invoke`; other steps are returned unchanged.
    #[must_use]
    pub fn skip_if(mut self, method: impl Into<String>, args: Vec<Arg>) -> Self {
        if let Self::Invoke { skip_if, .. } = &mut self {
            *skip_if = Some(Guard {
                method: method.into(),
                args,
            });
        }
        self
    }

    /// One-line description used in logs and errors.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Resolve(t) => format!("resolve {}", t.reference()),
            Self::Attach(t) => format!("attach {}", t.reference()),
            Self::ResolveUpgradeable { template, .. } => {
                format!("resolve upgradeable {}", template.reference())
            }
            Self::Grant {
                target,
                role,
                principal,
            } => format!("grant {role} on {target} to {principal}"),
            Self::Revoke {
                target,
                role,
                principal,
            } => format!("revoke {role} on {target} from {principal}"),
            Self::Invoke {
                target,
                method,
                args,
                skip_if,
            } => {
                let mut out = format!("invoke {target}.{method}(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{arg}");
                }
                out.push(')');
                if let Some(guard) = skip_if {
                    let _ = write!(out, " unless {}", guard.method);
                }
                out
            }
        }
    }
}

///
/// TESTS
///
