use crate::ids::Address;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

///
/// ArgValue
///
/// Constructor / call argument as handed to the contract layer. Encoding to
/// the wire ABI happens on the other side of the seam.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ArgValue {
    Address(Address),
    Bool(bool),
    List(Vec<Self>),
    Str(String),
    Uint(u128),
}

impl ArgValue {
    #[must_use]
    pub const fn as_address(&self) -> Option<&Address> {
        match self {
            Self::Address(addr) => Some(addr),
            _ => None,
        }
    }
}

impl Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(a) => write!(f, "\"{a}\""),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Uint(n) => write!(f, "{n}"),
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

impl From<Address> for ArgValue {
    fn from(a: Address) -> Self {
        Self::Address(a)
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<u128> for ArgValue {
    fn from(n: u128) -> Self {
        Self::Uint(n)
    }
}

/// Render an argument list the way deployment logs show it.
#[must_use]
pub fn render_args(args: &[ArgValue]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

///
/// TESTS
///
