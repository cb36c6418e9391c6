use super::{RunContext, StepError};
use crate::{
    ids::{Address, ResourceKey, ShardKey},
    ledger::ArgValue,
};
use std::fmt::{self, Display};

///
/// ResourceRef
///
/// Names a resource resolved earlier in the run: a registry key, optionally
/// inside a shard.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ResourceRef {
    pub shard: Option<ShardKey>,
    pub key: ResourceKey,
}

impl ResourceRef {
    #[must_use]
    pub fn global(key: impl Into<ResourceKey>) -> Self {
        Self {
            shard: None,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn sharded(shard: ShardKey, key: impl Into<ResourceKey>) -> Self {
        Self {
            shard: Some(shard),
            key: key.into(),
        }
    }
}

impl Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.shard {
            Some(shard) => write!(f, "{shard}/{}", self.key),
            None => write!(f, "{}", self.key),
        }
    }
}

///
/// Arg
///
/// Step argument before binding. References are replaced by the address of
/// the resource they name when the step runs.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Arg {
    Value(ArgValue),
    Ref(ResourceRef),
    Deployer,
    List(Vec<Self>),
}

impl Arg {
    #[must_use]
    pub fn global(key: impl Into<ResourceKey>) -> Self {
        Self::Ref(ResourceRef::global(key))
    }

    #[must_use]
    pub fn sharded(shard: ShardKey, key: impl Into<ResourceKey>) -> Self {
        Self::Ref(ResourceRef::sharded(shard, key))
    }

    pub fn bind(&self, ctx: &RunContext) -> Result<ArgValue, StepError> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Ref(reference) => Ok(ArgValue::Address(ctx.address(reference)?.clone())),
            Self::Deployer => Ok(ArgValue::Address(ctx.deployer().clone())),
            Self::List(items) => items
                .iter()
                .map(|item| item.bind(ctx))
                .collect::<Result<Vec<_>, _>>()
                .map(ArgValue::List),
        }
    }
}

impl Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Ref(reference) => write!(f, "@{reference}"),
            Self::Deployer => write!(f, "@deployer"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<ArgValue> for Arg {
    fn from(value: ArgValue) -> Self {
        Self::Value(value)
    }
}

impl From<Address> for Arg {
    fn from(address: Address) -> Self {
        Self::Value(ArgValue::Address(address))
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Self::Value(ArgValue::Bool(b))
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Self::Value(ArgValue::from(s))
    }
}

impl From<u128> for Arg {
    fn from(n: u128) -> Self {
        Self::Value(ArgValue::Uint(n))
    }
}

pub(crate) fn bind_all(args: &[Arg], ctx: &RunContext) -> Result<Vec<ArgValue>, StepError> {
    args.iter().map(|arg| arg.bind(ctx)).collect()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn eth() -> ShardKey {
        ShardKey::new("ETH").unwrap()
    }

    #[test]
    fn values_and_deployer_bind_without_handles() {
        let ctx = RunContext::new(Address::from("0xdeployer"));

        assert_eq!(
            Arg::from("USDC").bind(&ctx).unwrap(),
            ArgValue::Str("USDC".to_string())
        );
        assert_eq!(
            Arg::Deployer.bind(&ctx).unwrap(),
            ArgValue::Address(Address::from("0xdeployer"))
        );
    }

    #[test]
    fn missing_reference_is_unresolved() {
        let ctx = RunContext::new(Address::from("0xdeployer"));

        let err = Arg::sharded(eth(), "Market").bind(&ctx).unwrap_err();

        assert!(matches!(
            err,
            StepError::UnresolvedReference(ResourceRef { ref key, .. }) if key.as_str() == "Market"
        ));
    }

    #[test]
    fn refs_render_with_shard_prefix() {
        assert_eq!(ResourceRef::sharded(eth(), "Market").to_string(), "ETH/Market");
        assert_eq!(
            Arg::List(vec![Arg::global("CoreVault"), Arg::from(1_u128)]).to_string(),
            "[@CoreVault, 1]"
        );
    }
}
