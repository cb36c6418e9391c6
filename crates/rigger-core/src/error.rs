use crate::{
    config::ConfigError,
    executor::TxError,
    grant::GrantError,
    ids::IdError,
    pipeline::{PipelineError, StepError},
    registry::RegistryError,
    resolve::ResolveError,
};
use derive_more::Display;
use thiserror::Error as ThisError;

///
/// Error
///
/// Crate-level error. Every module error folds into it; `class` and
/// `origin` give a stable pair of log fields regardless of nesting.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Grant(#[from] GrantError),

    #[error(transparent)]
    Id(#[from] IdError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Tx(#[from] TxError),
}

impl Error {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Config(_) | Self::Id(_) => ErrorClass::Config,
            Self::Grant(err) => grant_class(err),
            Self::Pipeline(err) => step_class(err.step_error()),
            Self::Registry(_) => ErrorClass::Infra,
            Self::Resolve(err) => resolve_class(err),
            Self::Tx(_) => ErrorClass::Ledger,
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::Config(_) | Self::Id(_) => ErrorOrigin::Config,
            Self::Grant(_) => ErrorOrigin::Grant,
            Self::Pipeline(_) => ErrorOrigin::Pipeline,
            Self::Registry(_) => ErrorOrigin::Registry,
            Self::Resolve(_) => ErrorOrigin::Resolve,
            Self::Tx(_) => ErrorOrigin::Executor,
        }
    }

    #[must_use]
    pub const fn log_fields(&self) -> (ErrorClass, ErrorOrigin) {
        (self.class(), self.origin())
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorClass {
    /// Bad configuration or identifiers; fix input and rerun.
    Config,
    /// Inconsistent deployment graph (unknown kind, missing reference).
    Domain,
    /// Registry storage could not be read, written or locked.
    Infra,
    /// The ledger refused, reverted or never confirmed a transaction.
    Ledger,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorOrigin {
    Config,
    Executor,
    Grant,
    Pipeline,
    Registry,
    Resolve,
}

const fn grant_class(err: &GrantError) -> ErrorClass {
    match err {
        GrantError::RoleQueryFailure { .. } | GrantError::Tx(_) => ErrorClass::Ledger,
    }
}

const fn resolve_class(err: &ResolveError) -> ErrorClass {
    match err {
        ResolveError::UnknownKind(_) | ResolveError::NotRecorded { .. } => ErrorClass::Domain,
        ResolveError::MissingAddress { .. } | ResolveError::Tx(_) => ErrorClass::Ledger,
        ResolveError::Registry(_) => ErrorClass::Infra,
    }
}

const fn step_class(err: &StepError) -> ErrorClass {
    match err {
        StepError::UnresolvedReference(_) | StepError::InvalidPrincipal(_) => ErrorClass::Domain,
        StepError::GuardQueryFailure { .. } | StepError::Tx(_) => ErrorClass::Ledger,
        StepError::Grant(err) => grant_class(err),
        StepError::Resolve(err) => resolve_class(err),
    }
}

///
/// TESTS
///
