use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

///
/// RoleId
///
/// Access-control role name as the contracts declare it (e.g.
/// "ROLE_CONTROLLER"). Hashing the name into the on-chain role id is the
/// contract layer's job.
///

#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct RoleId(pub Cow<'static, str>);

impl RoleId {
    #[must_use]
    pub const fn new(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for RoleId {
    fn from(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }
}

impl From<String> for RoleId {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}
