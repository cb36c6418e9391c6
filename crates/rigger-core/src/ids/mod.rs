mod environment;
mod ledger;
mod resource;
mod role;
mod shard;

pub use environment::*;
pub use ledger::*;
pub use resource::*;
pub use role::*;
pub use shard::*;

use thiserror::Error as ThisError;

///
/// IdError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum IdError {
    #[error("{what} must not be empty")]
    Empty { what: &'static str },

    #[error("{what} '{value}' exceeds {max} bytes")]
    TooLong {
        what: &'static str,
        value: String,
        max: usize,
    },

    #[error("{what} '{value}' contains invalid character {ch:?}")]
    InvalidChar {
        what: &'static str,
        value: String,
        ch: char,
    },
}

// shared shape check for string-backed identifiers
fn check_chars(
    what: &'static str,
    value: &str,
    max: usize,
    allowed: impl Fn(char) -> bool,
) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty { what });
    }

    if value.len() > max {
        return Err(IdError::TooLong {
            what,
            value: value.to_string(),
            max,
        });
    }

    if let Some(ch) = value.chars().find(|c| !allowed(*c)) {
        return Err(IdError::InvalidChar {
            what,
            value: value.to_string(),
            ch,
        });
    }

    Ok(())
}
