//! Test utilities for exercising Rigger pipelines without a node.
//!
//! [`SimLedger`] is an in-process stand-in for the contract layer with
//! deterministic addresses, scripted faults and transaction counters.
//! [`Fake`] produces stable dummy addresses for fixtures.

pub mod ledger;

pub use ledger::{Fault, Invocation, SimLedger, Target};

use rigger_core::ids::{Address, TxHash};

///
/// Deterministic dummy-value generator for tests.
///

pub struct Fake;

impl Fake {
    /// 20-byte hex address derived from `seed`.
    #[must_use]
    pub fn address(seed: u64) -> Address {
        Address::new(format!("0x{seed:040x}"))
    }

    /// 32-byte hex transaction hash derived from `seed`.
    #[must_use]
    pub fn tx_hash(seed: u64) -> TxHash {
        TxHash::new(format!("0x{seed:064x}"))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_values_are_deterministic_and_unique() {
        assert_eq!(Fake::address(7), Fake::address(7));
        assert_ne!(Fake::address(7), Fake::address(8));
        assert_eq!(Fake::address(1).as_str().len(), 42);
        assert_eq!(Fake::tx_hash(1).as_str().len(), 66);
    }
}
